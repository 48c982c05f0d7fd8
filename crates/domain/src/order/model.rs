//! Stored order rows.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use super::{OrderDetails, OrderStatus};
use crate::customer::Customer;

/// An order as recorded by the order store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub order_details: OrderDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with its owning customer.
///
/// This is the snapshot shape cached under `order:{id}` and returned by the
/// read path. The customer is optional because the join is a left join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithCustomer {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<Customer>,
}

impl OrderWithCustomer {
    /// Returns the customer name, if the customer is known.
    pub fn customer_name(&self) -> Option<&str> {
        self.customer.as_ref().map(|c| c.name.as_str())
    }
}
