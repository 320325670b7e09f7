use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::coordinator::{FetchCoordinator, FetchTicket, ModelEvent};
use crate::flatten;
use crate::listing::ListingStore;
use crate::models::{Comment, CommentSort, VoteState};
use crate::transport::{FetchOutcome, Method, Transport};
use crate::wire;

/// Flat, depth-annotated comment listing of one post.
///
/// Comment pages are not paginated: every refresh replaces the whole store
/// with the newly fetched tree, flattened in server order.
pub struct CommentModel {
    store: ListingStore<Comment>,
    fetch: FetchCoordinator,
    transport: Arc<dyn Transport>,
    reply_tx: mpsc::UnboundedSender<(FetchTicket, FetchOutcome)>,
    reply_rx: mpsc::UnboundedReceiver<(FetchTicket, FetchOutcome)>,
    events: mpsc::UnboundedSender<ModelEvent>,
    permalink: String,
    sort: CommentSort,
}

impl CommentModel {
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
            permalink: String::new(),
            sort: CommentSort::default(),
        };
        (model, events_rx)
    }

    pub fn store(&self) -> &ListingStore<Comment> {
        &self.store
    }

    pub fn permalink(&self) -> &str {
        &self.permalink
    }

    pub fn set_permalink(&mut self, permalink: String) {
        self.permalink = permalink;
    }

    pub fn sort(&self) -> CommentSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: CommentSort) {
        self.sort = sort;
    }

    pub fn is_busy(&self) -> bool {
        self.fetch.is_busy()
    }

    /// Row index of the parent comment, walking back to the nearest shallower
    /// row. Top-level comments have no parent.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        let parent_depth = self.store.get(index).depth.checked_sub(1)?;
        (0..=index)
            .rev()
            .find(|&i| self.store.get(i).depth == parent_depth)
    }

    /// Refetches the whole comment tree. Refreshing without a permalink is a
    /// caller bug.
    pub fn refresh(&mut self, _load_older: bool) {
        debug_assert!(!self.permalink.is_empty(), "refresh without a permalink");
        if self.permalink.is_empty() {
            return;
        }

        for ev in self.store.replace_all(Vec::new()) {
            let _ = self.events.send(ModelEvent::Changed(ev));
        }

        let params = vec![("sort".to_string(), self.sort.as_str().to_string())];
        let path = self.permalink.trim_end_matches('/').to_string();
        self.begin_fetch(Method::Get, path, params);
    }

    /// Optimistic local vote; unknown fullnames are ignored.
    pub fn change_vote(&mut self, fullname: &str, vote: VoteState) {
        if let Some(ev) = self.store.change_vote(fullname, vote) {
            let _ = self.events.send(ModelEvent::Changed(ev));
        }
    }

    /// Applies the next transport reply; superseded replies are dropped.
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
            FetchOutcome::Completed(bytes) => {
                // decode and flatten as one unit: either the whole page lands
                // or the store stays as it is
                match wire::decode_comment_tree(&bytes).and_then(flatten::flatten) {
                    Ok(comments) => {
                        debug!(count = comments.len(), permalink = %self.permalink, "comment tree applied");
                        if let Some(ev) = self.store.append_page(comments) {
                            let _ = self.events.send(ModelEvent::Changed(ev));
                        }
                    }
                    Err(e) => {
                        let _ = self.events.send(ModelEvent::Error(e.to_string()));
                    }
                }
            }
            FetchOutcome::Failed(message) => {
                let _ = self.events.send(ModelEvent::Error(message));
            }
            FetchOutcome::NoReply => {}
        }
        let _ = self.events.send(ModelEvent::Busy(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ChangeEvent;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedTransport {
        replies: Mutex<VecDeque<FetchOutcome>>,
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<FetchOutcome>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn submit(
            &self,
            _method: Method,
            path: &str,
            params: &[(String, String)],
        ) -> FetchOutcome {
            self.seen
                .lock()
                .unwrap()
                .push((path.to_string(), params.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(FetchOutcome::NoReply)
        }
    }

    const TREE: &str = r#"[
        {"kind": "Listing", "data": {"children": []}},
        {"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"name": "t1_a", "body": "top", "score": 4,
                "replies": {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {"name": "t1_b", "body": "reply", "replies": ""}}
                ]}}
            }},
            {"kind": "t1", "data": {"name": "t1_c", "body": "other", "replies": ""}}
        ]}}
    ]"#;

    fn tree_reply() -> FetchOutcome {
        FetchOutcome::Completed(TREE.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn refresh_flattens_the_tree_in_server_order() {
        let transport = ScriptedTransport::new(vec![tree_reply()]);
        let (mut model, _events) = CommentModel::new(transport.clone());
        model.set_permalink("/r/rust/comments/abc/title/".into());
        model.set_sort(CommentSort::Top);

        model.refresh(false);
        assert!(model.is_busy());
        model.pump().await;
        assert!(!model.is_busy());

        let got: Vec<(&str, u32)> = model
            .store()
            .iter()
            .map(|c| (c.fullname.as_str(), c.depth))
            .collect();
        assert_eq!(got, vec![("t1_a", 0), ("t1_b", 1), ("t1_c", 0)]);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].0, "/r/rust/comments/abc/title");
        assert_eq!(seen[0].1, vec![("sort".to_string(), "top".to_string())]);
    }

    #[tokio::test]
    async fn second_refresh_replaces_previous_content() {
        let transport = ScriptedTransport::new(vec![tree_reply(), tree_reply()]);
        let (mut model, mut events) = CommentModel::new(transport);
        model.set_permalink("/r/rust/comments/abc/title/".into());

        model.refresh(false);
        model.pump().await;
        while events.try_recv().is_ok() {}

        model.refresh(false);
        model.pump().await;

        assert_eq!(model.store().len(), 3);
        let mut evs = Vec::new();
        while let Ok(ev) = events.try_recv() {
            evs.push(ev);
        }
        assert!(evs.contains(&ModelEvent::Changed(ChangeEvent::RangeRemoved { lo: 0, hi: 2 })));
        assert!(evs.contains(&ModelEvent::Changed(ChangeEvent::RangeInserted { lo: 0, hi: 2 })));
    }

    #[tokio::test]
    async fn malformed_tree_surfaces_an_error_and_applies_nothing() {
        let bad = FetchOutcome::Completed(
            br#"[
                {"kind": "Listing", "data": {"children": []}},
                {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {"body": "no fullname"}}
                ]}}
            ]"#
            .to_vec(),
        );
        let transport = ScriptedTransport::new(vec![bad]);
        let (mut model, mut events) = CommentModel::new(transport);
        model.set_permalink("/r/rust/comments/abc/title/".into());

        model.refresh(false);
        model.pump().await;

        assert!(model.store().is_empty());
        assert!(!model.is_busy());
        let mut saw_error = false;
        while let Ok(ev) = events.try_recv() {
            if matches!(ev, ModelEvent::Error(_)) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn stale_comment_reply_is_discarded() {
        let transport = ScriptedTransport::new(vec![]);
        let (mut model, _events) = CommentModel::new(transport);
        model.set_permalink("/r/rust/comments/abc/title/".into());

        let first = model.fetch.start();
        let _second = model.fetch.start();

        model.apply_reply(first, tree_reply());
        assert!(model.store().is_empty());
        assert!(model.is_busy());
    }

    #[tokio::test]
    async fn parent_index_walks_to_the_nearest_shallower_row() {
        let transport = ScriptedTransport::new(vec![tree_reply()]);
        let (mut model, _events) = CommentModel::new(transport);
        model.set_permalink("/r/rust/comments/abc/title/".into());
        model.refresh(false);
        model.pump().await;

        // rows: t1_a depth 0, t1_b depth 1, t1_c depth 0
        assert_eq!(model.parent_index(1), Some(0));
        assert_eq!(model.parent_index(0), None);
        assert_eq!(model.parent_index(2), None);
    }

    #[tokio::test]
    async fn vote_reversal_on_a_listed_comment() {
        let transport = ScriptedTransport::new(vec![tree_reply()]);
        let (mut model, _events) = CommentModel::new(transport);
        model.set_permalink("/r/rust/comments/abc/title/".into());
        model.refresh(false);
        model.pump().await;

        model.change_vote("t1_a", VoteState::Up);
        assert_eq!(model.store().get(0).score, 5);
        model.change_vote("t1_a", VoteState::Down);
        assert_eq!(model.store().get(0).score, 3);
    }
}
