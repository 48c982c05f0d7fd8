//! Message broker for fulfillment events.
//!
//! Publishers send payloads to a topic exchange under a routing key; one
//! durable queue bound with a topic pattern feeds the fulfillment worker.
//! Delivery is at-least-once: every [`Delivery`] must be settled with
//! [`Delivery::ack`] or [`Delivery::reject`], and anything left unsettled
//! comes back marked as redelivered.
//!
//! - [`AmqpBroker`]: RabbitMQ via lapin
//! - [`InMemoryBroker`]: same routing and redelivery rules, for tests

pub mod amqp;
pub mod error;
pub mod memory;
pub mod topic;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

pub use amqp::{AmqpBroker, AmqpConfig};
pub use error::{BrokerError, Result};
pub use memory::InMemoryBroker;
pub use topic::topic_matches;

/// Stream of deliveries from the bound queue.
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery>> + Send>>;

/// Interface to the order exchange and the fulfillment queue.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes a persistent message to the exchange.
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<()>;

    /// Starts consuming the bound queue.
    async fn consume(&self) -> Result<DeliveryStream>;
}

#[async_trait]
impl<T: Broker + ?Sized> Broker for Arc<T> {
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<()> {
        (**self).publish(routing_key, payload).await
    }

    async fn consume(&self) -> Result<DeliveryStream> {
        (**self).consume().await
    }
}

/// Settles one delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send {
    async fn ack(self: Box<Self>) -> Result<()>;

    async fn reject(self: Box<Self>, requeue: bool) -> Result<()>;
}

/// A message handed to a consumer.
pub struct Delivery {
    pub payload: Vec<u8>,
    pub routing_key: String,
    /// True if this message was handed out before and not acknowledged.
    pub redelivered: bool,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(
        payload: Vec<u8>,
        routing_key: impl Into<String>,
        redelivered: bool,
        acker: Box<dyn Acknowledger>,
    ) -> Self {
        Self {
            payload,
            routing_key: routing_key.into(),
            redelivered,
            acker,
        }
    }

    /// Removes the message from the queue.
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }

    /// Rejects the message, optionally putting it back on the queue.
    pub async fn reject(self, requeue: bool) -> Result<()> {
        self.acker.reject(requeue).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("routing_key", &self.routing_key)
            .field("redelivered", &self.redelivered)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
