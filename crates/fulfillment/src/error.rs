//! Fulfillment error types.

use broker::BrokerError;
use domain::DomainError;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur while fulfilling orders.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The payment gateway declined or could not process the charge.
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),

    /// Broker error.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// The message payload is not a fulfillment event.
    #[error("Undecodable message: {0}")]
    Decode(#[from] DomainError),

    /// The order's amounts cannot be charged.
    #[error("Invalid order amount: {0}")]
    Amount(DomainError),

    /// The delivery stream ended.
    #[error("Delivery stream closed")]
    StreamClosed,
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
