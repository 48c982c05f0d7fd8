//! Fulfillment worker for submitted orders.
//!
//! Each fulfillment event drives one order through a fixed step sequence:
//! 1. Validation
//! 2. Payment (simulated gateway round-trip)
//! 3. Invoice
//!
//! Every step attempt is appended to the order's processing log before the
//! next one starts. The order ends `completed` or `failed`, and the search
//! document is refreshed at either outcome. Orders already in a terminal
//! state are acknowledged without touching anything.

pub mod audit;
pub mod error;
pub mod payment;
pub mod steps;
pub mod worker;

pub use audit::AuditLog;
pub use error::{FulfillmentError, Result};
pub use payment::{DEFAULT_PAYMENT_DELAY, PaymentGateway, PaymentReceipt, SimulatedPaymentGateway};
pub use worker::{CachePolicy, FulfillmentWorker, Outcome};
