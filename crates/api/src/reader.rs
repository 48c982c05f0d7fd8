//! Read path: cache-aside order lookup, audit trail, search and report.

use std::time::Duration;

use cache::{Cache, CacheExt};
use chrono::TimeDelta;
use common::OrderId;
use domain::{OrderWithCustomer, ProcessingLog};
use order_store::{OrderReport, OrderStore, OrderStoreExt, StoreError};
use search::{SearchDocument, SearchError, SearchIndex, SearchQuery};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Where a looked-up order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    Cache,
    Store,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLookup {
    pub source: ReadSource,
    pub order: OrderWithCustomer,
}

/// Serves order reads.
///
/// Order lookups go through the cache first and populate it on a miss. The
/// cache is never written on order mutations, so a cached snapshot can be
/// up to one TTL stale. Cache failures degrade to store reads.
pub struct OrderReader<S, C, I>
where
    S: OrderStore,
    C: Cache,
    I: SearchIndex,
{
    store: S,
    cache: C,
    index: I,
    ttl: Duration,
}

impl<S, C, I> OrderReader<S, C, I>
where
    S: OrderStore,
    C: Cache,
    I: SearchIndex,
{
    pub fn new(store: S, cache: C, index: I, ttl: Duration) -> Self {
        Self {
            store,
            cache,
            index,
            ttl,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderLookup, ReadError> {
        let key = order_id.cache_key();

        match self.cache.get_json::<OrderWithCustomer>(&key).await {
            Ok(Some(order)) => {
                metrics::counter!("order_cache_hits_total").increment(1);
                return Ok(OrderLookup {
                    source: ReadSource::Cache,
                    order,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "cache read failed, falling back to store"),
        }
        metrics::counter!("order_cache_misses_total").increment(1);

        let order = self
            .store
            .find_order_with_customer(order_id)
            .await?
            .ok_or(ReadError::NotFound(order_id))?;

        if let Err(e) = self.cache.set_json(&key, &order, self.ttl).await {
            warn!(error = %e, "cache populate failed");
        }

        Ok(OrderLookup {
            source: ReadSource::Store,
            order,
        })
    }

    /// Processing log of an order, oldest first.
    pub async fn processing_logs(&self, order_id: OrderId) -> Result<Vec<ProcessingLog>, ReadError> {
        match self.store.require_order(order_id).await {
            Ok(_) => {}
            Err(StoreError::OrderNotFound(_)) => return Err(ReadError::NotFound(order_id)),
            Err(e) => return Err(e.into()),
        }
        Ok(self.store.processing_logs(order_id).await?)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchDocument>, ReadError> {
        Ok(self.index.search(query).await?)
    }

    pub async fn report(&self, window: TimeDelta) -> Result<OrderReport, ReadError> {
        Ok(self.store.report(window).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache::InMemoryCache;
    use domain::{LineItem, Money, NewCustomer, OrderDetails, OrderStatus};
    use order_store::InMemoryOrderStore;
    use search::InMemorySearchIndex;

    const TTL: Duration = Duration::from_secs(30);

    struct Harness {
        reader: OrderReader<InMemoryOrderStore, InMemoryCache, InMemorySearchIndex>,
        store: InMemoryOrderStore,
        cache: InMemoryCache,
    }

    fn harness() -> Harness {
        let store = InMemoryOrderStore::new();
        let cache = InMemoryCache::new();
        Harness {
            reader: OrderReader::new(store.clone(), cache.clone(), InMemorySearchIndex::new(), TTL),
            store,
            cache,
        }
    }

    async fn seed(store: &InMemoryOrderStore) -> OrderId {
        let customer = store
            .create_customer(NewCustomer::new("Ada", "ada@example.com", "5551234567"))
            .await
            .unwrap();
        let details = OrderDetails::with_items(vec![LineItem::new(
            "SKU-1",
            "Widget",
            1,
            Money::from_cents(1000),
        )]);
        store.create_order(customer.id, details).await.unwrap().id
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_then_hit_then_expiry() {
        let h = harness();
        let order_id = seed(&h.store).await;

        let first = h.reader.get_order(order_id).await.unwrap();
        assert_eq!(first.source, ReadSource::Store);
        assert_eq!(first.order.customer_name(), Some("Ada"));

        let second = h.reader.get_order(order_id).await.unwrap();
        assert_eq!(second.source, ReadSource::Cache);
        assert_eq!(second.order, first.order);

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        let third = h.reader.get_order(order_id).await.unwrap();
        assert_eq!(third.source, ReadSource::Store);
    }

    #[tokio::test]
    async fn test_cached_snapshot_is_not_written_through() {
        let h = harness();
        let order_id = seed(&h.store).await;
        h.reader.get_order(order_id).await.unwrap();

        h.store
            .update_order_status(order_id, OrderStatus::Processing)
            .await
            .unwrap();

        let cached = h.reader.get_order(order_id).await.unwrap();
        assert_eq!(cached.source, ReadSource::Cache);
        assert_eq!(cached.order.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_cached() {
        let h = harness();

        let err = h.reader.get_order(OrderId::new(99)).await.unwrap_err();

        assert!(matches!(err, ReadError::NotFound(id) if id == OrderId::new(99)));
        assert!(h.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_store() {
        let h = harness();
        let order_id = seed(&h.store).await;
        h.cache.set_unavailable(true);

        let lookup = h.reader.get_order(order_id).await.unwrap();
        assert_eq!(lookup.source, ReadSource::Store);
    }

    #[tokio::test]
    async fn test_logs_of_missing_order() {
        let h = harness();
        let err = h.reader.processing_logs(OrderId::new(7)).await.unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }
}
