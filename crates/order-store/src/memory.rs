use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{
    Customer, NewCustomer, NewProcessingLog, Order, OrderDetails, OrderStatus, OrderWithCustomer,
    ProcessingLog, ProcessingStep,
};
use tokio::sync::RwLock;

use crate::report::{ReportLine, StatusCount, sort_counts};
use crate::store::OrderStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, Order>,
    logs: Vec<ProcessingLog>,
    next_customer_id: i64,
    next_order_id: i64,
    next_log_id: i64,
    unavailable: bool,
    fail_on_create_order: bool,
    fail_next_append: Option<ProcessingStep>,
}

impl State {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// In-memory order store for tests and local runs.
///
/// Mirrors the PostgreSQL implementation, including email uniqueness and the
/// conditional status update, and adds switches for injecting failures.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail as if the database were unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Makes `create_order` fail while set.
    pub async fn set_fail_on_create_order(&self, fail: bool) {
        self.state.write().await.fail_on_create_order = fail;
    }

    /// Fails the next audit append for `step`, once.
    pub async fn fail_next_log_append(&self, step: ProcessingStep) {
        self.state.write().await.fail_next_append = Some(step);
    }

    /// Overwrites an order's status without any transition check.
    pub async fn force_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    /// Backdates an order, for report window tests.
    pub async fn set_created_at(&self, order_id: OrderId, created_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.created_at = created_at;
        Ok(())
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn customer_count(&self) -> usize {
        self.state.read().await.customers.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut state = self.state.write().await;
        state.check_available()?;

        if state.customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::DuplicateEmail(customer.email));
        }

        state.next_customer_id += 1;
        let now = Utc::now();
        let stored = Customer {
            id: CustomerId::new(state.next_customer_id),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            created_at: now,
            updated_at: now,
        };
        state.customers.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.customers.values().find(|c| c.email == email).cloned())
    }

    async fn create_order(&self, customer_id: CustomerId, details: OrderDetails) -> Result<Order> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if state.fail_on_create_order {
            return Err(StoreError::Database(sqlx::Error::WorkerCrashed));
        }
        if !state.customers.contains_key(&customer_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        state.next_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(state.next_order_id),
            customer_id,
            status: OrderStatus::Pending,
            order_details: details,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn find_order_with_customer(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithCustomer>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.orders.get(&order_id).map(|order| OrderWithCustomer {
            order: order.clone(),
            customer: state.customers.get(&order.customer_id).cloned(),
        }))
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut state = self.state.write().await;
        state.check_available()?;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(status) {
            return Ok(false);
        }
        order.status = status;
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn append_processing_log(&self, entry: NewProcessingLog) -> Result<ProcessingLog> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if state.fail_next_append == Some(entry.step) {
            state.fail_next_append = None;
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if !state.orders.contains_key(&entry.order_id) {
            return Err(StoreError::OrderNotFound(entry.order_id));
        }

        state.next_log_id += 1;
        let log = ProcessingLog {
            id: state.next_log_id,
            order_id: entry.order_id,
            step: entry.step,
            status: entry.status,
            log_message: entry.log_message,
            created_at: Utc::now(),
        };
        state.logs.push(log.clone());
        Ok(log)
    }

    async fn processing_logs(&self, order_id: OrderId) -> Result<Vec<ProcessingLog>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>> {
        let state = self.state.read().await;
        state.check_available()?;
        let mut counts: Vec<StatusCount> = OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                total_orders: state.orders.values().filter(|o| o.status == status).count() as i64,
            })
            .filter(|c| c.total_orders > 0)
            .collect();
        sort_counts(&mut counts);
        Ok(counts)
    }

    async fn recent_transitions(&self, since: DateTime<Utc>) -> Result<Vec<ReportLine>> {
        let state = self.state.read().await;
        state.check_available()?;
        let mut lines: Vec<ReportLine> = state
            .logs
            .iter()
            .filter_map(|log| {
                state
                    .orders
                    .get(&log.order_id)
                    .filter(|order| order.created_at >= since)
                    .map(|order| (order, log))
            })
            .flat_map(|(order, log)| ReportLine::expand(order, log))
            .collect();
        lines.sort_by(|a, b| {
            b.transition_time
                .cmp(&a.transition_time)
                .then(a.order_id.cmp(&b.order_id))
        });
        Ok(lines)
    }
}
