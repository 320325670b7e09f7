use tracing::trace;

use crate::listing::ChangeEvent;

/// Events a model surfaces to its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    Changed(ChangeEvent),
    Busy(bool),
    Error(String),
}

/// Tag for one logical fetch. A reply carrying a ticket from a superseded
/// generation is recognized and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Tracks the single logical in-flight fetch of one store.
///
/// Starting a new fetch supersedes any previous one: the transport may still
/// deliver the old reply asynchronously, but its ticket no longer matches and
/// [`FetchCoordinator::accept`] rejects it. Because only the latest
/// generation's result is ever accepted, completions are applied in the order
/// fetches were started.
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    generation: u64,
    busy: bool,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a fetch, detaching from any in-flight one, and marks the store
    /// busy.
    pub fn start(&mut self) -> FetchTicket {
        self.generation = self.generation.wrapping_add(1);
        self.busy = true;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Returns true and clears the busy flag iff the ticket belongs to the
    /// current fetch. A stale ticket leaves state untouched; the reply it
    /// tags must be dropped without any user-visible effect.
    pub fn accept(&mut self, ticket: FetchTicket) -> bool {
        if ticket.generation == self.generation {
            self.busy = false;
            true
        } else {
            trace!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded fetch result"
            );
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_until_started_then_busy_until_accepted() {
        let mut coord = FetchCoordinator::new();
        assert!(!coord.is_busy());
        let ticket = coord.start();
        assert!(coord.is_busy());
        assert!(coord.accept(ticket));
        assert!(!coord.is_busy());
    }

    #[test]
    fn superseded_ticket_is_rejected_and_busy_stays_set() {
        let mut coord = FetchCoordinator::new();
        let first = coord.start();
        let second = coord.start();

        // the late reply of the first fetch arrives after being superseded
        assert!(!coord.accept(first));
        assert!(coord.is_busy());

        assert!(coord.accept(second));
        assert!(!coord.is_busy());
    }

    #[test]
    fn a_ticket_is_good_once_per_generation() {
        let mut coord = FetchCoordinator::new();
        let ticket = coord.start();
        assert!(coord.accept(ticket));
        // same generation, so a duplicate delivery would still match; the
        // transport contract is exactly one outcome per handle
        let next = coord.start();
        assert!(!coord.accept(ticket));
        assert!(coord.accept(next));
    }
}
