use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures a fetch attempt can surface to the view layer.
///
/// Stale fetch results and votes on records no longer in the store are *not*
/// errors; both are silently discarded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed comment tree: {0}")]
    MalformedTree(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
