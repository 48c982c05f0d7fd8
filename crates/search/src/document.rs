//! The denormalized search document.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{LineItem, OrderStatus, OrderWithCustomer};
use serde::{Deserialize, Serialize};

/// One order as seen by search.
///
/// Always built from the full current order; indexing replaces the stored
/// document wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderWithCustomer> for SearchDocument {
    fn from(snapshot: &OrderWithCustomer) -> Self {
        let order = &snapshot.order;
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            customer_name: snapshot.customer_name().map(str::to_string),
            status: order.status,
            items: order.order_details.items.clone(),
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, Order, OrderDetails};

    #[test]
    fn test_document_from_order_without_customer() {
        let now = Utc::now();
        let snapshot = OrderWithCustomer {
            order: Order {
                id: OrderId::new(42),
                customer_id: CustomerId::new(7),
                status: OrderStatus::Completed,
                order_details: OrderDetails::with_items(vec![LineItem::new(
                    "W-1",
                    "Widget",
                    2,
                    Money::from_cents(250),
                )]),
                created_at: now,
                updated_at: now,
            },
            customer: None,
        };

        let doc = SearchDocument::from(&snapshot);
        assert_eq!(doc.order_id, OrderId::new(42));
        assert_eq!(doc.customer_name, None);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["orderId"], 42);
        assert_eq!(json["customerId"], 7);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["items"][0]["name"], "Widget");
        assert_eq!(json["items"][0]["price"], 2.5);
        assert!(json["customerName"].is_null());
    }
}
