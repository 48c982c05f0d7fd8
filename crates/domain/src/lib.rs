//! Domain model for the order fulfillment pipeline.
//!
//! This crate holds the types every other layer agrees on:
//! - [`OrderStatus`] and its monotonic transition rules
//! - the typed order document ([`OrderDetails`], [`LineItem`], [`Shipping`], [`Money`])
//! - [`Customer`] records and [`OrderSubmission`] input validation
//! - the append-only audit trail ([`ProcessingLog`])
//! - the [`FulfillmentEvent`] carried over the broker

pub mod customer;
pub mod error;
pub mod event;
pub mod order;
pub mod processing_log;

pub use common::{CustomerId, OrderId};
pub use customer::{Customer, NewCustomer};
pub use error::DomainError;
pub use event::FulfillmentEvent;
pub use order::{
    LineItem, Money, Order, OrderDetails, OrderStatus, OrderSubmission, OrderWithCustomer,
    Shipping, ValidationError,
};
pub use processing_log::{NewProcessingLog, ProcessingLog, ProcessingStep, StepStatus};
