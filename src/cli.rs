use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Reddit listing viewer (listing sync + comment tree flattening)")]
pub struct Args {

    #[arg(long)]
    pub subreddit: Option<String>,


    #[arg(long, default_value = "hot", value_parser = ["hot","new","rising","controversial","top"])]
    pub section: String,


    #[arg(long)]
    pub search: Option<String>,


    #[arg(long, default_value = "relevance", value_parser = ["relevance","new","hot","top","comments"])]
    pub search_sort: String,


    #[arg(long, default_value = "all", value_parser = ["all","hour","day","week","month","year"])]
    pub search_time: String,


    /// Comment permalink, e.g. /r/rust/comments/abc123/title/; switches to comment mode
    #[arg(long)]
    pub permalink: Option<String>,


    #[arg(long, default_value = "confidence", value_parser = ["confidence","top","new","hot","controversial","old"])]
    pub comment_sort: String,


    /// Total listing pages to fetch (first page + load-older fetches)
    #[arg(long, default_value_t = 1)]
    pub pages: usize,


    #[arg(long, default_value_t = 24)]
    pub rpm: u32,


    #[arg(long, default_value_t = 0.8)]
    pub delay: f64,


    #[arg(long, default_value_t = 30)]
    pub timeout: u64,


    #[arg(long, default_value = "https://www.reddit.com")]
    pub base_url: String,


    #[arg(long, default_value = "threadview/0.1 (by /u/threadview)")]
    pub user_agent: String,
}
