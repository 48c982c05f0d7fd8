use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use common::{CustomerId, OrderId};
use domain::{
    Customer, NewCustomer, NewProcessingLog, Order, OrderDetails, OrderStatus, OrderWithCustomer,
    ProcessingLog,
};

use crate::report::{OrderReport, ReportLine, StatusCount};
use crate::{Result, StoreError};

/// Core trait for order store implementations.
///
/// Every method is transactional on its own; nothing spans calls.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a customer.
    ///
    /// Fails with `DuplicateEmail` if the email is already registered.
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer>;

    /// Looks up a customer by exact email.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Inserts an order in `pending` status.
    async fn create_order(&self, customer_id: CustomerId, details: OrderDetails) -> Result<Order>;

    /// Loads an order row.
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads an order joined with its customer.
    async fn find_order_with_customer(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithCustomer>>;

    /// Moves an order to `status` if its current status allows it.
    ///
    /// Returns `Ok(false)` when the current status forbids the transition
    /// (for instance the order is already terminal), and `OrderNotFound`
    /// when there is no such order.
    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Appends one audit row.
    async fn append_processing_log(&self, entry: NewProcessingLog) -> Result<ProcessingLog>;

    /// Returns the audit trail of an order in creation order.
    async fn processing_logs(&self, order_id: OrderId) -> Result<Vec<ProcessingLog>>;

    /// Counts orders per status, in pipeline order.
    async fn status_counts(&self) -> Result<Vec<StatusCount>>;

    /// Report lines for every log row of orders created at or after `since`.
    async fn recent_transitions(&self, since: DateTime<Utc>) -> Result<Vec<ReportLine>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Returns the customer registered under `customer.email`, creating it if absent.
    ///
    /// Existing customers are returned as stored; submitted name and phone
    /// do not overwrite them.
    async fn find_or_create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        if let Some(existing) = self.find_customer_by_email(&customer.email).await? {
            return Ok(existing);
        }
        self.create_customer(customer).await
    }

    /// Loads an order, failing with `OrderNotFound` if it does not exist.
    async fn require_order(&self, order_id: OrderId) -> Result<Order> {
        self.find_order(order_id)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    /// Builds the status/transition report over the last `window`.
    async fn report(&self, window: TimeDelta) -> Result<OrderReport> {
        let status_counts = self.status_counts().await?;
        let recent_transitions = self.recent_transitions(Utc::now() - window).await?;
        Ok(OrderReport {
            status_counts,
            recent_transitions,
        })
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
