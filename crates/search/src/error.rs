//! Search error types.

use thiserror::Error;

/// Errors that can occur indexing or searching.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport failure talking to the search engine.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search engine answered with a non-success status.
    #[error("Search engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Loading the order to index failed.
    #[error("Order store error: {0}")]
    Store(#[from] order_store::StoreError),

    #[error("Search index unavailable")]
    Unavailable,
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
