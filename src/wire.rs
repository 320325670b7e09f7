//! Decoding of raw listing payloads into records.
//!
//! Link listings come as a `Listing` envelope of `t3` children; a comment
//! page is a two-element array of listings, the second holding the `t1` reply
//! tree. `replies` on a comment is either a nested listing or the empty
//! string, and `more` stubs are skipped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::flatten::TreeNode;
use crate::models::{Comment, Distinguished, Post, VoteState};

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Child<T>>,
}

#[derive(Deserialize)]
struct Child<T> {
    data: T,
}

#[derive(Deserialize)]
struct RawLink {
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    likes: Option<bool>,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    distinguished: Option<String>,
}

fn vote_from_likes(likes: Option<bool>) -> VoteState {
    match likes {
        Some(true) => VoteState::Up,
        Some(false) => VoteState::Down,
        None => VoteState::None,
    }
}

fn distinguished_from_str(s: Option<&str>) -> Distinguished {
    match s {
        Some("moderator") => Distinguished::Moderator,
        Some("admin") => Distinguished::Admin,
        Some(_) => Distinguished::Special,
        None => Distinguished::None,
    }
}

impl RawLink {
    fn into_post(self) -> Post {
        Post {
            vote: vote_from_likes(self.likes),
            distinguished: distinguished_from_str(self.distinguished.as_deref()),
            fullname: self.name,
            author: self.author,
            created_utc: self.created_utc as i64,
            subreddit: self.subreddit,
            score: self.score,
            num_comments: self.num_comments,
            title: self.title,
            selftext: self.selftext,
            url: self.url,
            thumbnail_url: self.thumbnail,
            permalink: self.permalink,
            sticky: self.stickied,
            nsfw: self.over_18,
        }
    }
}

/// Decodes one page of a link listing.
pub fn decode_posts(bytes: &[u8]) -> Result<Vec<Post>> {
    let listing: Listing<RawLink> = serde_json::from_slice(bytes)?;
    let posts: Vec<Post> = listing
        .data
        .children
        .into_iter()
        .map(|c| c.data.into_post())
        .collect();
    debug!(count = posts.len(), "decoded link page");
    Ok(posts)
}

/// Decodes a comment page payload into the reply forest, server order intact.
pub fn decode_comment_tree(bytes: &[u8]) -> Result<Vec<TreeNode>> {
    let payload: Value = serde_json::from_slice(bytes)?;
    let listing = payload.get(1).ok_or_else(|| {
        Error::MalformedTree("comment payload is not a [link, comments] pair".into())
    })?;
    let roots = parse_comment_listing(listing)?;
    debug!(top_level = roots.len(), "decoded comment tree");
    Ok(roots)
}

fn parse_comment_listing(listing: &Value) -> Result<Vec<TreeNode>> {
    let children = listing
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array());
    let mut out = Vec::new();
    for child in children.into_iter().flatten() {
        let kind = child.get("kind").and_then(|k| k.as_str()).unwrap_or("");
        if kind != "t1" {
            // "more" stubs carry no comment body
            continue;
        }
        let data = child
            .get("data")
            .ok_or_else(|| Error::MalformedTree("comment child without data".into()))?;
        out.push(parse_comment(data)?);
    }
    Ok(out)
}

fn parse_comment(data: &Value) -> Result<TreeNode> {
    let fullname = data
        .get("name")
        .and_then(|x| x.as_str())
        .ok_or_else(|| Error::MalformedTree("comment without fullname".into()))?
        .to_string();

    // edited is false for never-edited comments, a timestamp otherwise
    let edited_utc = data.get("edited").and_then(|x| x.as_f64()).map(|t| t as i64);

    let comment = Comment {
        fullname,
        author: data
            .get("author")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .to_string(),
        body: data
            .get("body")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .to_string(),
        score: data.get("score").and_then(|x| x.as_i64()).unwrap_or(0),
        vote: vote_from_likes(data.get("likes").and_then(|x| x.as_bool())),
        created_utc: data
            .get("created_utc")
            .and_then(|x| x.as_f64())
            .unwrap_or(0.0) as i64,
        edited_utc,
        depth: 0,
        is_submitter: data
            .get("is_submitter")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
        distinguished: distinguished_from_str(data.get("distinguished").and_then(|x| x.as_str())),
        score_hidden: data
            .get("score_hidden")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
    };

    let children = match data.get("replies") {
        Some(replies) if replies.is_object() => parse_comment_listing(replies)?,
        // "" when the comment has no replies
        _ => Vec::new(),
    };

    Ok(TreeNode { comment, children })
}
