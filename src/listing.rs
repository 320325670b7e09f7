use std::collections::HashMap;
use std::ops::Index;

use tracing::trace;

use crate::models::{apply_vote, Votable, VoteState};

/// Precise change notification for an incremental view. Ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    RangeRemoved { lo: usize, hi: usize },
    RangeInserted { lo: usize, hi: usize },
    RowChanged { index: usize },
}

/// Ordered, deduplicated collection of records backing one view.
///
/// Insertion order is display order. A fullname→index map is kept alongside
/// the sequence so vote lookups stay cheap on long listings; it is rebuilt on
/// [`ListingStore::replace_all`]. After every operation the set of fullnames
/// is duplicate-free.
#[derive(Debug, Default)]
pub struct ListingStore<T: Votable> {
    records: Vec<T>,
    by_fullname: HashMap<String, usize>,
}

impl<T: Votable> ListingStore<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            by_fullname: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Panics when out of range; an out-of-range index is a caller bug, not a
    /// recoverable condition.
    pub fn get(&self, index: usize) -> &T {
        &self.records[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Fullname of the last record, the `after` cursor for a load-older fetch.
    pub fn last_fullname(&self) -> Option<&str> {
        self.records.last().map(|r| r.fullname())
    }

    pub fn find(&self, fullname: &str) -> Option<usize> {
        self.by_fullname.get(fullname).copied()
    }

    /// Discards all current content and installs `records` as the new full
    /// ordered content. Reports the removal of the old range followed by the
    /// insertion of the new one; either event is omitted when the respective
    /// range is empty.
    pub fn replace_all(&mut self, records: Vec<T>) -> Vec<ChangeEvent> {
        let mut events = Vec::with_capacity(2);
        if !self.records.is_empty() {
            events.push(ChangeEvent::RangeRemoved {
                lo: 0,
                hi: self.records.len() - 1,
            });
        }
        self.records.clear();
        self.by_fullname.clear();
        self.insert_deduped(records);
        if !self.records.is_empty() {
            events.push(ChangeEvent::RangeInserted {
                lo: 0,
                hi: self.records.len() - 1,
            });
        }
        events
    }

    /// Appends a page after the current last record, in the order given.
    /// Records whose fullname already exists are dropped; servers do return
    /// overlapping pages. Returns the insertion range covering only what was
    /// actually added, or `None` when nothing survived dedup.
    pub fn append_page(&mut self, records: Vec<T>) -> Option<ChangeEvent> {
        let lo = self.records.len();
        self.insert_deduped(records);
        if self.records.len() > lo {
            Some(ChangeEvent::RangeInserted {
                lo,
                hi: self.records.len() - 1,
            })
        } else {
            None
        }
    }

    /// Optimistic in-place vote edit; the record keeps its position. Voting on
    /// a fullname not in the store is a silent no-op: the view may vote on a
    /// record a concurrent refresh already replaced.
    pub fn change_vote(&mut self, fullname: &str, vote: VoteState) -> Option<ChangeEvent> {
        match self.find(fullname) {
            Some(index) => {
                apply_vote(&mut self.records[index], vote);
                Some(ChangeEvent::RowChanged { index })
            }
            None => {
                trace!(fullname, "vote target not in store, ignoring");
                None
            }
        }
    }

    fn insert_deduped(&mut self, records: Vec<T>) {
        for record in records {
            if self.by_fullname.contains_key(record.fullname()) {
                trace!(fullname = record.fullname(), "dropping duplicate record");
                continue;
            }
            self.by_fullname
                .insert(record.fullname().to_string(), self.records.len());
            self.records.push(record);
        }
    }
}

impl<T: Votable> Index<usize> for ListingStore<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.records[index]
    }
}
