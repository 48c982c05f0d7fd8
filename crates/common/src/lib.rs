//! Shared types for the order fulfillment pipeline.

pub mod types;

pub use types::{CustomerId, OrderId};
