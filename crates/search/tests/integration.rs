//! Search round trips through the order store and the in-memory index.

use domain::{LineItem, Money, NewCustomer, OrderDetails, OrderStatus};
use order_store::{InMemoryOrderStore, OrderStore};
use search::{InMemorySearchIndex, Reindexer, SearchIndex, SearchQuery};

async fn order_with_items(store: &InMemoryOrderStore, email: &str, name: &str, items: &[&str]) -> i64 {
    let customer = store
        .create_customer(NewCustomer::new(name, email, "5551234567"))
        .await
        .unwrap();
    let details = OrderDetails::with_items(
        items
            .iter()
            .map(|item| LineItem::new("SKU", *item, 1, Money::from_cents(500)))
            .collect(),
    );
    store.create_order(customer.id, details).await.unwrap().id.as_i64()
}

#[tokio::test]
async fn text_and_status_search_over_indexed_orders() {
    let store = InMemoryOrderStore::new();
    let index = InMemorySearchIndex::new();
    let reindexer = Reindexer::new(store.clone(), index.clone());

    let widget = order_with_items(&store, "a@example.com", "Ada", &["Widget"]).await;
    let sprocket = order_with_items(&store, "b@example.com", "Bob", &["Sprocket"]).await;

    store
        .update_order_status(widget.into(), OrderStatus::Processing)
        .await
        .unwrap();
    store
        .update_order_status(widget.into(), OrderStatus::Completed)
        .await
        .unwrap();
    for id in [widget, sprocket] {
        reindexer.reindex(id.into()).await.unwrap();
    }

    let by_text = index.search(&SearchQuery::text("Widget")).await.unwrap();
    assert_eq!(by_text.len(), 1);
    assert_eq!(by_text[0].order_id.as_i64(), widget);

    let pending = index
        .search(&SearchQuery::status(OrderStatus::Pending))
        .await
        .unwrap();
    assert!(pending.iter().all(|doc| doc.order_id.as_i64() != widget));
    assert_eq!(pending.len(), 1);

    let completed = index
        .search(&SearchQuery::from_input("completed", 1, 10))
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, OrderStatus::Completed);
}
