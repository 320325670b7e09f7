use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

mod cli;

use crate::cli::Args;
use threadview::comments::CommentModel;
use threadview::coordinator::ModelEvent;
use threadview::links::LinkModel;
use threadview::models::{CommentRole, CommentSort, PostRole, SearchSort, Section, TimeRange};
use threadview::transport::RedditTransport;
use threadview::utils::now_secs;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let transport = Arc::new(RedditTransport::new(
        &args.base_url,
        args.rpm,
        &args.user_agent,
        args.timeout,
    )?);

    if let Some(permalink) = args.permalink.clone() {
        show_comments(&args, transport, permalink).await
    } else {
        show_links(&args, transport).await
    }
}

fn drain_events(events: &mut UnboundedReceiver<ModelEvent>, pb: &ProgressBar) {
    while let Ok(ev) = events.try_recv() {
        match ev {
            ModelEvent::Error(msg) => eprintln!("[ERROR] {msg}"),
            ModelEvent::Busy(true) => pb.set_message("Fetching..."),
            ModelEvent::Busy(false) | ModelEvent::Changed(_) => {}
        }
    }
}

async fn show_links(args: &Args, transport: Arc<RedditTransport>) -> Result<()> {
    let (mut model, mut events) = LinkModel::new(transport);
    model.set_subreddit(args.subreddit.clone());
    if let Some(query) = &args.search {
        model.set_section(Section::Search);
        model.set_search_query(query.clone());
        model.set_search_sort(SearchSort::from_token(&args.search_sort).unwrap_or_default());
        model.set_search_time_range(TimeRange::from_token(&args.search_time).unwrap_or_default());
    } else {
        model.set_section(Section::from_token(&args.section).unwrap_or_default());
    }

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));

    model.refresh(false);
    for page in 1..=args.pages {
        pb.set_message(format!("{} — page {page}/{}", model.title(), args.pages));
        while model.is_busy() {
            model.pump().await;
            drain_events(&mut events, &pb);
        }
        if page < args.pages {
            // stay gentle between pages, same jitter shape as a human scroll
            let ms = (args.delay * 1000.0 * (0.6 + rand::random::<f64>() * 0.8)) as u64;
            tokio::time::sleep(Duration::from_millis(ms)).await;
            model.refresh(true);
        }
    }
    pb.finish_and_clear();

    let now = now_secs();
    let store = model.store();
    for i in 0..store.len() {
        let post = store.get(i);
        println!(
            "{:>6}  {}",
            post.role(PostRole::Score, now),
            post.role(PostRole::Title, now)
        );
        println!(
            "        {} • by {} • {} • {} comments • {}",
            post.role(PostRole::Subreddit, now),
            post.role(PostRole::Author, now),
            post.role(PostRole::Created, now),
            post.role(PostRole::CommentsCount, now),
            post.role(PostRole::Domain, now),
        );
    }
    eprintln!("[DONE] {} — {} posts", model.title(), store.len());

    Ok(())
}

async fn show_comments(
    args: &Args,
    transport: Arc<RedditTransport>,
    permalink: String,
) -> Result<()> {
    let (mut model, mut events) = CommentModel::new(transport);
    model.set_permalink(permalink);
    model.set_sort(CommentSort::from_token(&args.comment_sort).unwrap_or_default());

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("{} ({})", model.permalink(), model.sort().as_str()));

    model.refresh(false);
    while model.is_busy() {
        model.pump().await;
        drain_events(&mut events, &pb);
    }
    pb.finish_and_clear();

    let now = now_secs();
    let store = model.store();
    for i in 0..store.len() {
        let comment = store.get(i);
        let indent = "  ".repeat(comment.depth as usize);
        println!(
            "{indent}{} • {} points • {}",
            comment.role(CommentRole::Author, now),
            comment.role(CommentRole::Score, now),
            comment.role(CommentRole::Created, now),
        );
        for line in comment.body.lines() {
            println!("{indent}  {line}");
        }
    }
    eprintln!("[DONE] {} — {} comments", model.permalink(), store.len());

    Ok(())
}
