//! Order ingestion: validate, persist, enqueue, index.

use broker::Broker;
use common::OrderId;
use domain::event::ORDER_CREATED;
use domain::{FulfillmentEvent, OrderSubmission, OrderWithCustomer, ValidationError};
use order_store::{OrderStore, OrderStoreExt, StoreError};
use search::{SearchDocument, SearchIndex};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Why an order could not be created.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order could not be stored: {0}")]
    Store(#[from] StoreError),
}

/// Returned once the order row exists.
///
/// `enqueued` and `indexed` report the soft side effects; a `false` means
/// the order was created but that step failed and was only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub order_id: OrderId,
    pub enqueued: bool,
    pub indexed: bool,
}

/// Accepts new orders and hands them to the fulfillment pipeline.
///
/// Nothing here is transactional across systems. Store failures abort the
/// submission; broker and index failures do not roll back the order.
pub struct IngestionService<S, B, I>
where
    S: OrderStore,
    B: Broker,
    I: SearchIndex,
{
    store: S,
    broker: B,
    index: I,
}

impl<S, B, I> IngestionService<S, B, I>
where
    S: OrderStore,
    B: Broker,
    I: SearchIndex,
{
    pub fn new(store: S, broker: B, index: I) -> Self {
        Self {
            store,
            broker,
            index,
        }
    }

    #[tracing::instrument(skip(self, submission), fields(email = %submission.customer.email))]
    pub async fn submit_order(
        &self,
        submission: OrderSubmission,
    ) -> Result<SubmitReceipt, IngestError> {
        submission.validate()?;
        let (new_customer, details) = submission.into_parts();

        let customer = self.store.find_or_create_customer(new_customer).await?;
        let order = self.store.create_order(customer.id, details).await?;
        let order_id = order.id;
        metrics::counter!("orders_submitted_total").increment(1);
        info!(%order_id, customer_id = %customer.id, "order created");

        let enqueued = self.enqueue(order_id).await;

        let snapshot = OrderWithCustomer {
            order,
            customer: Some(customer),
        };
        let indexed = match self
            .index
            .index_document(&SearchDocument::from(&snapshot))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("orders_index_failed_total").increment(1);
                warn!(%order_id, error = %e, "initial indexing failed");
                false
            }
        };

        Ok(SubmitReceipt {
            order_id,
            enqueued,
            indexed,
        })
    }

    async fn enqueue(&self, order_id: OrderId) -> bool {
        let payload = match FulfillmentEvent::new(order_id).to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%order_id, error = %e, "could not encode fulfillment event");
                return false;
            }
        };

        match self.broker.publish(ORDER_CREATED, payload).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("orders_publish_failed_total").increment(1);
                warn!(%order_id, error = %e, "order will not be fulfilled automatically");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::InMemoryBroker;
    use domain::{LineItem, Money, NewCustomer, OrderStatus};
    use order_store::InMemoryOrderStore;
    use search::InMemorySearchIndex;

    struct Harness {
        service: IngestionService<InMemoryOrderStore, InMemoryBroker, InMemorySearchIndex>,
        store: InMemoryOrderStore,
        broker: InMemoryBroker,
        index: InMemorySearchIndex,
    }

    fn harness() -> Harness {
        let store = InMemoryOrderStore::new();
        let broker = InMemoryBroker::new();
        let index = InMemorySearchIndex::new();
        Harness {
            service: IngestionService::new(store.clone(), broker.clone(), index.clone()),
            store,
            broker,
            index,
        }
    }

    fn submission(email: &str) -> OrderSubmission {
        OrderSubmission::new(
            NewCustomer::new("Ada", email, "5551234567"),
            vec![LineItem::new("SKU-1", "Widget", 2, Money::from_cents(1000))],
        )
    }

    #[tokio::test]
    async fn test_submit_creates_pending_order_and_event() {
        let h = harness();

        let receipt = h.service.submit_order(submission("ada@example.com")).await.unwrap();

        assert!(receipt.enqueued);
        assert!(receipt.indexed);
        let order = h.store.require_order(receipt.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let published = h.broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, ORDER_CREATED);
        let event = FulfillmentEvent::from_bytes(&published[0].1).unwrap();
        assert_eq!(event.order_id, receipt.order_id);

        let doc = h.index.get(receipt.order_id).await.unwrap();
        assert_eq!(doc.status, OrderStatus::Pending);
        assert_eq!(doc.customer_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_customer_reused_by_email() {
        let h = harness();

        let first = h.service.submit_order(submission("ada@example.com")).await.unwrap();
        let second = h.service.submit_order(submission("ada@example.com")).await.unwrap();

        assert_ne!(first.order_id, second.order_id);
        assert_eq!(h.store.customer_count().await, 1);
        let a = h.store.require_order(first.order_id).await.unwrap();
        let b = h.store.require_order(second.order_id).await.unwrap();
        assert_eq!(a.customer_id, b.customer_id);
    }

    #[tokio::test]
    async fn test_invalid_submission_touches_nothing() {
        let h = harness();
        let mut bad = submission("ada@example.com");
        bad.items.clear();

        let err = h.service.submit_order(bad).await.unwrap_err();

        assert!(matches!(err, IngestError::Validation(ValidationError::NoItems)));
        assert_eq!(h.store.order_count().await, 0);
        assert!(h.broker.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_is_soft() {
        let h = harness();
        h.broker.set_fail_publish(true);

        let receipt = h.service.submit_order(submission("ada@example.com")).await.unwrap();

        assert!(!receipt.enqueued);
        assert!(receipt.indexed);
        assert!(h.store.find_order(receipt.order_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_index_failure_is_soft() {
        let h = harness();
        h.index.set_unavailable(true);

        let receipt = h.service.submit_order(submission("ada@example.com")).await.unwrap();

        assert!(receipt.enqueued);
        assert!(!receipt.indexed);
        assert_eq!(h.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_hard() {
        let h = harness();
        h.store.set_fail_on_create_order(true).await;

        let err = h.service.submit_order(submission("ada@example.com")).await.unwrap_err();

        assert!(matches!(err, IngestError::Store(_)));
        assert!(h.broker.published().is_empty());
        assert!(h.index.is_empty().await);
    }
}
