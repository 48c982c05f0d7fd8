//! Orders and the ingestion-time validation rules.

mod model;
mod status;
mod submission;
mod value_objects;

pub use model::{Order, OrderWithCustomer};
pub use status::OrderStatus;
pub use submission::OrderSubmission;
pub use value_objects::{LineItem, Money, OrderDetails, Shipping, checked_total};

use thiserror::Error;

/// Reasons a submitted order is rejected before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Customer name is empty or blank.
    #[error("Customer name is required")]
    CustomerNameRequired,

    /// Customer name exceeds the length limit.
    #[error("Customer name is too long: {len} characters (max 20)")]
    CustomerNameTooLong { len: usize },

    /// Email is not well-formed.
    #[error("Invalid email: {email:?}")]
    InvalidEmail { email: String },

    /// Phone is not exactly ten digits.
    #[error("Invalid phone: {phone:?} (must be exactly 10 digits)")]
    InvalidPhone { phone: String },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// A line item has an empty SKU.
    #[error("Item {index}: sku is required")]
    MissingSku { index: usize },

    /// A line item has an empty name.
    #[error("Item {index}: name is required")]
    MissingItemName { index: usize },

    /// A line item quantity is zero.
    #[error("Item {index}: invalid quantity {qty} (must be greater than 0)")]
    InvalidQuantity { index: usize, qty: u32 },

    /// A line item price is outside 0..=1,000,000.
    #[error("Item {index}: invalid price {price} (must be between 0 and 1000000)")]
    InvalidPrice { index: usize, price: Money },

    /// The sum of all line totals is too large to charge.
    #[error("Order total exceeds {max}")]
    TotalTooLarge { max: Money },
}

impl ValidationError {
    /// Path of the offending input field, e.g. `items[1].qty`.
    pub fn field(&self) -> String {
        match self {
            ValidationError::CustomerNameRequired | ValidationError::CustomerNameTooLong { .. } => {
                "customer.name".to_string()
            }
            ValidationError::InvalidEmail { .. } => "customer.email".to_string(),
            ValidationError::InvalidPhone { .. } => "customer.phone".to_string(),
            ValidationError::NoItems => "items".to_string(),
            ValidationError::MissingSku { index } => format!("items[{index}].sku"),
            ValidationError::MissingItemName { index } => format!("items[{index}].name"),
            ValidationError::InvalidQuantity { index, .. } => format!("items[{index}].qty"),
            ValidationError::InvalidPrice { index, .. } => format!("items[{index}].price"),
            ValidationError::TotalTooLarge { .. } => "items".to_string(),
        }
    }
}
