//! The message that triggers fulfillment, and the broker names it travels under.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Topic exchange carrying order-lifecycle messages.
pub const ORDER_EXCHANGE: &str = "order_exchange";

/// Durable queue the fulfillment worker consumes from.
pub const ORDERS_QUEUE: &str = "orders_queue";

/// Binding pattern covering every order-lifecycle routing key.
pub const ORDER_BINDING: &str = "order.*";

/// Routing key used when a new order is accepted.
pub const ORDER_CREATED: &str = "order.created";

/// Wire format: `{"orderId": <integer>}`.
///
/// Only the identity travels; the worker re-reads the order from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

impl FulfillmentEvent {
    pub fn new(order_id: OrderId) -> Self {
        Self { order_id }
    }

    /// Encodes the event as a JSON byte payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes an event from a JSON byte payload.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, DomainError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
