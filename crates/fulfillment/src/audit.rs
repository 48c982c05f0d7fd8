//! Audit log writer.

use common::OrderId;
use domain::{NewProcessingLog, ProcessingLog, ProcessingStep, StepStatus};
use order_store::OrderStore;

use crate::Result;

/// Appends processing-log rows for the worker.
#[derive(Clone)]
pub struct AuditLog<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Appends one row and returns it as stored.
    pub async fn record(
        &self,
        order_id: OrderId,
        step: ProcessingStep,
        status: StepStatus,
        message: impl Into<String>,
    ) -> Result<ProcessingLog> {
        let log = self
            .store
            .append_processing_log(NewProcessingLog::new(order_id, step, status, message))
            .await?;
        tracing::info!(
            %order_id,
            step = %log.step,
            status = %log.status,
            message = %log.log_message,
            "audit entry recorded"
        );
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, Money, NewCustomer, OrderDetails};
    use order_store::InMemoryOrderStore;

    #[tokio::test]
    async fn test_record_appends_in_order() {
        let store = InMemoryOrderStore::new();
        let customer = store
            .create_customer(NewCustomer::new("Ada", "ada@example.com", "5551234567"))
            .await
            .unwrap();
        let order = store
            .create_order(
                customer.id,
                OrderDetails::with_items(vec![LineItem::new("A", "Widget", 1, Money::from_cents(100))]),
            )
            .await
            .unwrap();

        let audit = AuditLog::new(store.clone());
        audit
            .record(order.id, ProcessingStep::Validation, StepStatus::Success, "Order validated")
            .await
            .unwrap();
        audit
            .record(order.id, ProcessingStep::Payment, StepStatus::Processing, "Payment started")
            .await
            .unwrap();

        let logs = store.processing_logs(order.id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].log_message, "Payment started");
    }
}
