//! Payment gateway trait and the simulated gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::Money;

use crate::error::FulfillmentError;

/// Default artificial gateway latency.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(1000);

/// Result of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment_id: String,
}

/// Trait for charging orders.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the order total. An error means the payment did not go through.
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentReceipt, FulfillmentError>;
}

/// Gateway stand-in that sleeps for a fixed delay and then approves.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentGateway {
    delay: Duration,
    fail_on_charge: Arc<AtomicBool>,
    charges: Arc<AtomicU32>,
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

impl SimulatedPaymentGateway {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_on_charge: Arc::new(AtomicBool::new(false)),
            charges: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Makes every charge decline while set.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.fail_on_charge.store(fail, Ordering::SeqCst);
    }

    /// Number of charge attempts so far.
    pub fn charge_count(&self) -> u32 {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentReceipt, FulfillmentError> {
        let attempt = self.charges.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        if self.fail_on_charge.load(Ordering::SeqCst) {
            return Err(FulfillmentError::Payment("Payment declined".to_string()));
        }

        tracing::debug!(%order_id, %amount, "simulated charge approved");
        Ok(PaymentReceipt {
            payment_id: format!("PAY-{attempt:04}"),
        })
    }
}
