//! Domain error types.

use thiserror::Error;

use crate::order::ValidationError;

/// Errors that can occur while working with domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Submitted input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A stored or transmitted value does not name a known variant.
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// An order total does not fit in the money representation.
    #[error("Order total overflows")]
    AmountOverflow,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
