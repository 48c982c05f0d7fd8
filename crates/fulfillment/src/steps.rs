//! Audit messages written by the fulfillment steps.

pub const MSG_VALIDATED: &str = "Order validated";

pub const MSG_PAYMENT_STARTED: &str = "Payment started";

pub const MSG_PAYMENT_DONE: &str = "Payment done";

pub const MSG_PAYMENT_FAILED: &str = "Payment failed";

pub const MSG_INVOICE_GENERATED: &str = "Invoice generated";
