//! Listing synchronization and comment-tree flattening for a Reddit client.
//!
//! Paginated, tree-shaped remote data becomes a single stable ordered
//! collection per view: [`links::LinkModel`] for post listings,
//! [`comments::CommentModel`] for flattened reply trees. Both keep their
//! [`listing::ListingStore`] consistent across incremental page loads, full
//! refreshes and optimistic local vote edits, and discard replies of
//! superseded fetches via [`coordinator::FetchCoordinator`].

pub mod comments;
pub mod coordinator;
pub mod error;
pub mod flatten;
pub mod links;
pub mod listing;
pub mod models;
pub mod throttle;
pub mod transport;
pub mod utils;
pub mod wire;

pub use error::{Error, Result};
