use crate::utils;

/// Local vote state on a link or comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoteState {
    Up,
    #[default]
    None,
    Down,
}

impl VoteState {
    /// Contribution of the vote to the displayed score.
    pub fn weight(self) -> i64 {
        match self {
            VoteState::Up => 1,
            VoteState::None => 0,
            VoteState::Down => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Distinguished {
    #[default]
    None,
    Moderator,
    Admin,
    Special,
}

impl Distinguished {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Distinguished::None => None,
            Distinguished::Moderator => Some(" [M]"),
            Distinguished::Admin => Some(" [A]"),
            Distinguished::Special => Some(" [?]"),
        }
    }
}

/// A link ("post") as shown in a subreddit or search listing.
#[derive(Debug, Clone)]
pub struct Post {
    pub fullname: String,
    pub author: String,
    pub created_utc: i64,
    pub subreddit: String,
    pub score: i64,
    pub vote: VoteState,
    pub num_comments: i64,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub thumbnail_url: String,
    pub permalink: String,
    pub sticky: bool,
    pub nsfw: bool,
    pub distinguished: Distinguished,
}

/// A single comment, depth-annotated for flat display.
///
/// `depth` is 0 for top-level comments; reply nesting lives in
/// [`crate::flatten::TreeNode`], never here.
#[derive(Debug, Clone)]
pub struct Comment {
    pub fullname: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub vote: VoteState,
    pub created_utc: i64,
    pub edited_utc: Option<i64>,
    pub depth: u32,
    pub is_submitter: bool,
    pub distinguished: Distinguished,
    pub score_hidden: bool,
}

/// Shared surface of [`Post`] and [`Comment`] used by the listing store
/// for identity and optimistic vote edits.
pub trait Votable {
    fn fullname(&self) -> &str;
    fn score(&self) -> i64;
    fn set_score(&mut self, score: i64);
    fn vote(&self) -> VoteState;
    fn set_vote(&mut self, vote: VoteState);
}

macro_rules! impl_votable {
    ($t:ty) => {
        impl Votable for $t {
            fn fullname(&self) -> &str {
                &self.fullname
            }
            fn score(&self) -> i64 {
                self.score
            }
            fn set_score(&mut self, score: i64) {
                self.score = score;
            }
            fn vote(&self) -> VoteState {
                self.vote
            }
            fn set_vote(&mut self, vote: VoteState) {
                self.vote = vote;
            }
        }
    };
}

impl_votable!(Post);
impl_votable!(Comment);

/// Optimistic local vote: the displayed score moves by the difference between
/// the new and the old vote weight. Re-applying the same vote is a no-op.
/// Server confirmation (or rollback) is not this layer's concern.
pub fn apply_vote<T: Votable + ?Sized>(record: &mut T, new_vote: VoteState) {
    let delta = new_vote.weight() - record.vote().weight();
    record.set_score(record.score() + delta);
    record.set_vote(new_vote);
}

/// View field of a rendered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Flag(bool),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRole {
    Fullname,
    Author,
    Created,
    Subreddit,
    Score,
    Likes,
    CommentsCount,
    Title,
    Domain,
    ThumbnailUrl,
    Text,
    Permalink,
    Url,
    IsSticky,
    IsNsfw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRole {
    Fullname,
    Author,
    Body,
    Score,
    Likes,
    Created,
    Depth,
    IsScoreHidden,
}

impl Post {
    /// Role-keyed view access. Derived fields (author suffix, relative time,
    /// link domain) are computed here at read time, never stored.
    pub fn role(&self, role: PostRole, now: i64) -> FieldValue {
        match role {
            PostRole::Fullname => FieldValue::Text(self.fullname.clone()),
            PostRole::Author => {
                let mut author = self.author.clone();
                if let Some(suffix) = self.distinguished.suffix() {
                    author.push_str(suffix);
                }
                FieldValue::Text(author)
            }
            PostRole::Created => FieldValue::Text(utils::time_diff(self.created_utc, now)),
            PostRole::Subreddit => FieldValue::Text(self.subreddit.clone()),
            PostRole::Score => FieldValue::Int(self.score),
            PostRole::Likes => FieldValue::Int(self.vote.weight()),
            PostRole::CommentsCount => FieldValue::Int(self.num_comments),
            PostRole::Title => FieldValue::Text(self.title.clone()),
            PostRole::Domain => FieldValue::Text(utils::url_host(&self.url).to_string()),
            PostRole::ThumbnailUrl => FieldValue::Text(self.thumbnail_url.clone()),
            PostRole::Text => FieldValue::Text(self.selftext.clone()),
            PostRole::Permalink => FieldValue::Text(self.permalink.clone()),
            PostRole::Url => FieldValue::Text(self.url.clone()),
            PostRole::IsSticky => FieldValue::Flag(self.sticky),
            PostRole::IsNsfw => FieldValue::Flag(self.nsfw),
        }
    }
}

impl Comment {
    pub fn role(&self, role: CommentRole, now: i64) -> FieldValue {
        match role {
            CommentRole::Fullname => FieldValue::Text(self.fullname.clone()),
            CommentRole::Author => {
                let mut author = self.author.clone();
                if self.is_submitter {
                    author.push_str(" [S]");
                }
                if let Some(suffix) = self.distinguished.suffix() {
                    author.push_str(suffix);
                }
                FieldValue::Text(author)
            }
            CommentRole::Body => FieldValue::Text(self.body.clone()),
            CommentRole::Score => FieldValue::Int(self.score),
            CommentRole::Likes => FieldValue::Int(self.vote.weight()),
            CommentRole::Created => {
                let mut diff = utils::time_diff(self.created_utc, now);
                if self.edited_utc.is_some() {
                    diff.push('*');
                }
                FieldValue::Text(diff)
            }
            CommentRole::Depth => FieldValue::Int(i64::from(self.depth)),
            CommentRole::IsScoreHidden => FieldValue::Flag(self.score_hidden),
        }
    }
}

/// Comment-page sort order, passed through to the service verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentSort {
    #[default]
    Confidence,
    Top,
    New,
    Hot,
    Controversial,
    Old,
}

impl CommentSort {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentSort::Confidence => "confidence",
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Hot => "hot",
            CommentSort::Controversial => "controversial",
            CommentSort::Old => "old",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "confidence" => CommentSort::Confidence,
            "top" => CommentSort::Top,
            "new" => CommentSort::New,
            "hot" => CommentSort::Hot,
            "controversial" => CommentSort::Controversial,
            "old" => CommentSort::Old,
            _ => return None,
        })
    }
}

/// Link listing section. `Search` switches the request to `/search`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Hot,
    New,
    Rising,
    Controversial,
    Top,
    Search,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Hot => "hot",
            Section::New => "new",
            Section::Rising => "rising",
            Section::Controversial => "controversial",
            Section::Top => "top",
            Section::Search => "search",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "hot" => Section::Hot,
            "new" => Section::New,
            "rising" => Section::Rising,
            "controversial" => Section::Controversial,
            "top" => Section::Top,
            "search" => Section::Search,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSort {
    #[default]
    Relevance,
    New,
    Hot,
    Top,
    Comments,
}

impl SearchSort {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchSort::Relevance => "relevance",
            SearchSort::New => "new",
            SearchSort::Hot => "hot",
            SearchSort::Top => "top",
            SearchSort::Comments => "comments",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "relevance" => SearchSort::Relevance,
            "new" => SearchSort::New,
            "hot" => SearchSort::Hot,
            "top" => SearchSort::Top,
            "comments" => SearchSort::Comments,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    #[default]
    All,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::All => "all",
            TimeRange::Hour => "hour",
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "all" => TimeRange::All,
            "hour" => TimeRange::Hour,
            "day" => TimeRange::Day,
            "week" => TimeRange::Week,
            "month" => TimeRange::Month,
            "year" => TimeRange::Year,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(score: i64, vote: VoteState) -> Comment {
        Comment {
            fullname: "t1_a".into(),
            author: "someone".into(),
            body: "hi".into(),
            score,
            vote,
            created_utc: 0,
            edited_utc: None,
            depth: 0,
            is_submitter: false,
            distinguished: Distinguished::None,
            score_hidden: false,
        }
    }

    #[test]
    fn upvote_then_downvote_swings_by_two() {
        let mut c = comment(10, VoteState::None);
        apply_vote(&mut c, VoteState::Up);
        assert_eq!(c.score, 11);
        assert_eq!(c.vote, VoteState::Up);
        apply_vote(&mut c, VoteState::Down);
        assert_eq!(c.score, 9);
        assert_eq!(c.vote, VoteState::Down);
    }

    #[test]
    fn reapplying_same_vote_is_idempotent() {
        let mut c = comment(5, VoteState::None);
        apply_vote(&mut c, VoteState::Up);
        let after_first = c.score;
        apply_vote(&mut c, VoteState::Up);
        assert_eq!(c.score, after_first);
    }

    #[test]
    fn unvote_restores_original_score() {
        let mut c = comment(3, VoteState::None);
        apply_vote(&mut c, VoteState::Down);
        apply_vote(&mut c, VoteState::None);
        assert_eq!(c.score, 3);
        assert_eq!(c.vote, VoteState::None);
    }

    #[test]
    fn author_role_appends_submitter_and_distinguished_suffixes() {
        let mut c = comment(0, VoteState::None);
        c.is_submitter = true;
        c.distinguished = Distinguished::Moderator;
        assert_eq!(
            c.role(CommentRole::Author, 0),
            FieldValue::Text("someone [S] [M]".into())
        );
    }

    #[test]
    fn edited_comment_gets_a_star_on_created() {
        let mut c = comment(0, VoteState::None);
        c.created_utc = 1000;
        c.edited_utc = Some(2000);
        match c.role(CommentRole::Created, 1000 + 120) {
            FieldValue::Text(s) => assert!(s.ends_with('*'), "got {s:?}"),
            other => panic!("unexpected field value {other:?}"),
        }
    }

    #[test]
    fn sort_tokens_round_trip() {
        for sort in [
            CommentSort::Confidence,
            CommentSort::Top,
            CommentSort::New,
            CommentSort::Hot,
            CommentSort::Controversial,
            CommentSort::Old,
        ] {
            assert_eq!(CommentSort::from_token(sort.as_str()), Some(sort));
        }
        assert_eq!(Section::Hot.as_str(), "hot");
        assert_eq!(SearchSort::Relevance.as_str(), "relevance");
        assert_eq!(TimeRange::All.as_str(), "all");
        assert!(CommentSort::from_token("best").is_none());
    }
}
