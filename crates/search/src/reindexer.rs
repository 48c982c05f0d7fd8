//! Pushes the current store state of an order into the search index.

use common::OrderId;
use order_store::OrderStore;

use crate::Result;
use crate::document::SearchDocument;
use crate::index::SearchIndex;

/// Rebuilds search documents from the order store.
///
/// Every call re-reads the order with its customer, so the indexed document
/// is never older than the row it was built from.
#[derive(Clone)]
pub struct Reindexer<S: OrderStore, I: SearchIndex> {
    store: S,
    index: I,
}

impl<S: OrderStore, I: SearchIndex> Reindexer<S, I> {
    pub fn new(store: S, index: I) -> Self {
        Self { store, index }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Re-reads and re-indexes one order.
    ///
    /// Returns the indexed document, or `None` if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn reindex(&self, order_id: OrderId) -> Result<Option<SearchDocument>> {
        let Some(snapshot) = self.store.find_order_with_customer(order_id).await? else {
            tracing::warn!("order vanished before it could be indexed");
            return Ok(None);
        };

        let document = SearchDocument::from(&snapshot);
        self.index.index_document(&document).await?;
        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySearchIndex;
    use domain::{LineItem, Money, NewCustomer, OrderDetails, OrderStatus};
    use order_store::InMemoryOrderStore;

    #[tokio::test]
    async fn test_reindex_reflects_current_status() {
        let store = InMemoryOrderStore::new();
        let customer = store
            .create_customer(NewCustomer::new("Ada", "ada@example.com", "5551234567"))
            .await
            .unwrap();
        let order = store
            .create_order(
                customer.id,
                OrderDetails::with_items(vec![LineItem::new("W", "Widget", 1, Money::from_cents(1000))]),
            )
            .await
            .unwrap();

        let reindexer = Reindexer::new(store.clone(), InMemorySearchIndex::new());
        reindexer.reindex(order.id).await.unwrap();
        assert_eq!(
            reindexer.index().get(order.id).await.unwrap().status,
            OrderStatus::Pending
        );

        store
            .update_order_status(order.id, OrderStatus::Failed)
            .await
            .unwrap();
        let doc = reindexer.reindex(order.id).await.unwrap().unwrap();
        assert_eq!(doc.status, OrderStatus::Failed);
        assert_eq!(doc.customer_name.as_deref(), Some("Ada"));
        assert_eq!(reindexer.index().len().await, 1);
    }

    #[tokio::test]
    async fn test_reindex_missing_order_is_none() {
        let reindexer = Reindexer::new(InMemoryOrderStore::new(), InMemorySearchIndex::new());
        assert!(reindexer.reindex(OrderId::new(9)).await.unwrap().is_none());
        assert!(reindexer.index().is_empty().await);
    }
}
