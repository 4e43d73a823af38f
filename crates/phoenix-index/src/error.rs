//! Error types for index operations.

use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No page is indexed under this name.
    #[error("page ({authority}, {name}): not found")]
    PageNotFound { authority: String, name: String },

    /// No node is indexed under this name.
    #[error("node ({authority}, {page_name}, {name}): not found")]
    NodeNotFound {
        authority: String,
        page_name: String,
        name: String,
    },

    /// The input cannot be indexed as given.
    #[error("invalid index input: {0}")]
    Invalid(String),

    /// The configured endpoint cannot be used as a base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an unexpected status.
    #[error("{context} (status={status})")]
    Backend { status: u16, context: String },

    /// A backend response could not be decoded.
    #[error("unable to decode response: {0}")]
    Decode(String),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl IndexError {
    /// Whether this is one of the by-name "not found" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PageNotFound { .. } | Self::NodeNotFound { .. })
    }
}

/// Convenience type alias for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
