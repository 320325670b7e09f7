use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::coordinator::{FetchCoordinator, FetchTicket, ModelEvent};
use crate::listing::ListingStore;
use crate::models::{Post, Section, SearchSort, TimeRange, VoteState};
use crate::transport::{FetchOutcome, Method, Transport};
use crate::wire;

const PAGE_LIMIT: &str = "50";

/// Link listing of a subreddit, frontpage section, or search.
///
/// Owns its store exclusively; all mutations happen on the caller's task, the
/// transport request being the only suspension point. `refresh` never blocks:
/// it spawns the fetch and the caller later applies the reply via
/// [`LinkModel::pump`].
pub struct LinkModel {
    store: ListingStore<Post>,
    fetch: FetchCoordinator,
    transport: Arc<dyn Transport>,
    reply_tx: mpsc::UnboundedSender<(FetchTicket, FetchOutcome)>,
    reply_rx: mpsc::UnboundedReceiver<(FetchTicket, FetchOutcome)>,
    events: mpsc::UnboundedSender<ModelEvent>,
    section: Section,
    subreddit: Option<String>,
    search_query: String,
    search_sort: SearchSort,
    search_time: TimeRange,
    title: String,
}

impl LinkModel {
    pub fn new(transport: Arc<dyn Transport>) -> (Self, mpsc::UnboundedReceiver<ModelEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let model = Self {
            store: ListingStore::new(),
            fetch: FetchCoordinator::new(),
            transport,
            reply_tx,
            reply_rx,
            events,
            section: Section::default(),
            subreddit: None,
            search_query: String::new(),
            search_sort: SearchSort::default(),
            search_time: TimeRange::default(),
            title: String::new(),
        };
        (model, events_rx)
    }

    pub fn store(&self) -> &ListingStore<Post> {
        &self.store
    }

    /// Relative URL of the last refresh, usable as a view heading.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_busy(&self) -> bool {
        self.fetch.is_busy()
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    pub fn set_subreddit(&mut self, subreddit: Option<String>) {
        self.subreddit = subreddit;
    }

    pub fn set_search_query(&mut self, query: String) {
        self.search_query = query;
    }

    pub fn set_search_sort(&mut self, sort: SearchSort) {
        self.search_sort = sort;
    }

    pub fn set_search_time_range(&mut self, range: TimeRange) {
        self.search_time = range;
    }

    /// Starts a fetch, superseding any in-flight one. A plain refresh clears
    /// the store up front; a load-older refresh keeps it and asks for the
    /// page after the current last fullname.
    pub fn refresh(&mut self, load_older: bool) {
        let mut params: Vec<(String, String)> = vec![("limit".into(), PAGE_LIMIT.into())];
        let mut path = String::from("/");

        if self.section == Section::Search {
            params.push(("q".into(), self.search_query.clone()));
            params.push(("sort".into(), self.search_sort.as_str().into()));
            params.push(("t".into(), self.search_time.as_str().into()));
            path.push_str("search");
        } else {
            if let Some(sub) = self.subreddit.as_deref().filter(|s| !s.is_empty()) {
                path.push_str("r/");
                path.push_str(sub);
                path.push('/');
            }
            path.push_str(self.section.as_str());
        }

        if !self.store.is_empty() {
            if load_older {
                params.push(("count".into(), self.store.len().to_string()));
                if let Some(last) = self.store.last_fullname() {
                    params.push(("after".into(), last.to_string()));
                }
            } else {
                for ev in self.store.replace_all(Vec::new()) {
                    let _ = self.events.send(ModelEvent::Changed(ev));
                }
            }
        }

        self.title = path.clone();
        self.begin_fetch(Method::Get, path, params);
    }

    /// Optimistic local vote; unknown fullnames are ignored.
    pub fn change_vote(&mut self, fullname: &str, vote: VoteState) {
        if let Some(ev) = self.store.change_vote(fullname, vote) {
            let _ = self.events.send(ModelEvent::Changed(ev));
        }
    }

    /// Applies the next transport reply. Replies of superseded fetches are
    /// dropped here without touching the store.
    pub async fn pump(&mut self) {
        if let Some((ticket, outcome)) = self.reply_rx.recv().await {
            self.apply_reply(ticket, outcome);
        }
    }

    fn begin_fetch(&mut self, method: Method, path: String, params: Vec<(String, String)>) {
        let ticket = self.fetch.start();
        let transport = Arc::clone(&self.transport);
        let tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.submit(method, &path, &params).await;
            let _ = tx.send((ticket, outcome));
        });
        let _ = self.events.send(ModelEvent::Busy(true));
    }

    fn apply_reply(&mut self, ticket: FetchTicket, outcome: FetchOutcome) {
        if !self.fetch.accept(ticket) {
            return;
        }
        match outcome {
            FetchOutcome::Completed(bytes) => match wire::decode_posts(&bytes) {
                Ok(posts) => {
                    debug!(count = posts.len(), title = %self.title, "link page applied");
                    if let Some(ev) = self.store.append_page(posts) {
                        let _ = self.events.send(ModelEvent::Changed(ev));
                    }
                }
                Err(e) => {
                    let _ = self.events.send(ModelEvent::Error(e.to_string()));
                }
            },
            FetchOutcome::Failed(message) => {
                let _ = self.events.send(ModelEvent::Error(message));
            }
            FetchOutcome::NoReply => {}
        }
        let _ = self.events.send(ModelEvent::Busy(false));
    }
}
