use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::event::ORDER_BINDING;
use futures_util::StreamExt;
use tokio::sync::Notify;

use crate::topic::topic_matches;
use crate::{Acknowledger, Broker, BrokerError, Delivery, DeliveryStream, Result};

#[derive(Debug, Clone)]
struct Message {
    payload: Vec<u8>,
    routing_key: String,
    redelivered: bool,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Message>,
    unacked: usize,
    acked: usize,
    dead: Vec<Message>,
    published: Vec<(String, Vec<u8>)>,
    fail_publish: bool,
}

struct Inner {
    binding: String,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_delivery(self: &Arc<Self>) -> Option<Delivery> {
        let message = {
            let mut state = self.lock();
            let message = state.ready.pop_front()?;
            state.unacked += 1;
            message
        };
        Some(Delivery::new(
            message.payload.clone(),
            message.routing_key.clone(),
            message.redelivered,
            Box::new(InMemoryAcker {
                inner: Arc::clone(self),
                message: Some(message),
            }),
        ))
    }

    fn requeue(&self, mut message: Message) {
        message.redelivered = true;
        {
            let mut state = self.lock();
            state.unacked -= 1;
            state.ready.push_front(message);
        }
        self.notify.notify_one();
    }
}

/// In-memory broker with a single bound queue.
///
/// Routes with the same topic rules as RabbitMQ; messages whose key does not
/// match the binding are dropped as unroutable. A delivery that is dropped
/// without being settled goes back to the front of the queue flagged as
/// redelivered, like an unacked message on a closed channel.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::with_binding(ORDER_BINDING)
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker whose queue is bound with `pattern`.
    pub fn with_binding(pattern: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                binding: pattern.into(),
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
            }),
        }
    }

    /// Makes `publish` fail while set.
    pub fn set_fail_publish(&self, fail: bool) {
        self.inner.lock().fail_publish = fail;
    }

    /// Every accepted publish, routed or not.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.lock().published.clone()
    }

    /// Messages waiting for a consumer.
    pub fn ready_count(&self) -> usize {
        self.inner.lock().ready.len()
    }

    /// Messages handed out and not yet settled.
    pub fn unacked_count(&self) -> usize {
        self.inner.lock().unacked
    }

    pub fn acked_count(&self) -> usize {
        self.inner.lock().acked
    }

    /// Payloads rejected without requeue.
    pub fn dead_letters(&self) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .dead
            .iter()
            .map(|m| m.payload.clone())
            .collect()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<()> {
        let routed = {
            let mut state = self.inner.lock();
            if state.fail_publish {
                return Err(BrokerError::Publish("broker unavailable".to_string()));
            }
            state
                .published
                .push((routing_key.to_string(), payload.clone()));

            let routed = topic_matches(&self.inner.binding, routing_key);
            if routed {
                state.ready.push_back(Message {
                    payload,
                    routing_key: routing_key.to_string(),
                    redelivered: false,
                });
            }
            routed
        };

        if routed {
            self.inner.notify.notify_one();
        } else {
            tracing::debug!(routing_key, binding = %self.inner.binding, "Unroutable message dropped");
        }
        Ok(())
    }

    async fn consume(&self) -> Result<DeliveryStream> {
        let stream = futures_util::stream::unfold(Arc::clone(&self.inner), |inner| async move {
            loop {
                if let Some(delivery) = inner.next_delivery() {
                    return Some((Ok(delivery), inner));
                }
                // notify_one leaves a permit if the publish lands before we wait
                inner.notify.notified().await;
            }
        });
        Ok(stream.boxed())
    }
}

struct InMemoryAcker {
    inner: Arc<Inner>,
    message: Option<Message>,
}

#[async_trait]
impl Acknowledger for InMemoryAcker {
    async fn ack(mut self: Box<Self>) -> Result<()> {
        if self.message.take().is_some() {
            let mut state = self.inner.lock();
            state.unacked -= 1;
            state.acked += 1;
        }
        Ok(())
    }

    async fn reject(mut self: Box<Self>, requeue: bool) -> Result<()> {
        if let Some(message) = self.message.take() {
            if requeue {
                self.inner.requeue(message);
            } else {
                let mut state = self.inner.lock();
                state.unacked -= 1;
                state.dead.push(message);
            }
        }
        Ok(())
    }
}

impl Drop for InMemoryAcker {
    fn drop(&mut self) {
        if let Some(message) = self.message.take() {
            self.inner.requeue(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::event::ORDER_CREATED;
    use std::time::Duration;

    async fn next(stream: &mut DeliveryStream) -> Delivery {
        tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out waiting for delivery")
            .expect("stream ended")
            .expect("delivery error")
    }

    #[tokio::test]
    async fn test_publish_then_consume_and_ack() {
        let broker = InMemoryBroker::new();
        broker.publish(ORDER_CREATED, b"{\"orderId\":1}".to_vec()).await.unwrap();

        let mut stream = broker.consume().await.unwrap();
        let delivery = next(&mut stream).await;
        assert_eq!(delivery.routing_key, ORDER_CREATED);
        assert!(!delivery.redelivered);
        assert_eq!(broker.unacked_count(), 1);

        delivery.ack().await.unwrap();
        assert_eq!(broker.unacked_count(), 0);
        assert_eq!(broker.acked_count(), 1);
        assert_eq!(broker.ready_count(), 0);
    }

    #[tokio::test]
    async fn test_consumer_waits_for_later_publish() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.consume().await.unwrap();

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish("order.created", b"late".to_vec()).await.unwrap();
        });

        let delivery = next(&mut stream).await;
        assert_eq!(delivery.payload, b"late");
    }

    #[tokio::test]
    async fn test_unroutable_messages_are_dropped() {
        let broker = InMemoryBroker::new();
        broker.publish("invoice.created", b"x".to_vec()).await.unwrap();

        assert_eq!(broker.ready_count(), 0);
        assert_eq!(broker.published().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_delivery_is_redelivered() {
        let broker = InMemoryBroker::new();
        broker.publish(ORDER_CREATED, b"crash".to_vec()).await.unwrap();

        let mut stream = broker.consume().await.unwrap();
        drop(next(&mut stream).await);
        assert_eq!(broker.ready_count(), 1);

        let again = next(&mut stream).await;
        assert!(again.redelivered);
        assert_eq!(again.payload, b"crash");
        again.ack().await.unwrap();
        assert_eq!(broker.ready_count(), 0);
    }

    #[tokio::test]
    async fn test_reject_with_and_without_requeue() {
        let broker = InMemoryBroker::new();
        broker.publish(ORDER_CREATED, b"retry".to_vec()).await.unwrap();
        broker.publish(ORDER_CREATED, b"poison".to_vec()).await.unwrap();

        let mut stream = broker.consume().await.unwrap();
        next(&mut stream).await.reject(true).await.unwrap();

        let retried = next(&mut stream).await;
        assert!(retried.redelivered);
        assert_eq!(retried.payload, b"retry");
        retried.ack().await.unwrap();

        next(&mut stream).await.reject(false).await.unwrap();
        assert_eq!(broker.dead_letters(), vec![b"poison".to_vec()]);
        assert_eq!(broker.unacked_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_injection() {
        let broker = InMemoryBroker::new();
        broker.set_fail_publish(true);
        assert!(broker.publish(ORDER_CREATED, vec![]).await.is_err());

        broker.set_fail_publish(false);
        assert!(broker.publish(ORDER_CREATED, vec![]).await.is_ok());
    }
}
