use common::OrderId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Another customer already uses this email.
    #[error("Customer email already registered: {0}")]
    DuplicateEmail(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be mapped back onto the domain model.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] DomainError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
