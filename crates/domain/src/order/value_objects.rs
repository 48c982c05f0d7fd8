//! Value objects making up the order document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Money amount represented in cents to avoid floating point drift.
///
/// On the wire and in the stored order document a price is a plain decimal
/// number (`10.5`), so serde converts between that and whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Largest accepted unit price, in cents (1,000,000.00).
    pub const MAX_PRICE: Money = Money {
        cents: 100_000_000,
    };

    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a Money amount from a decimal value, rounding to the nearest cent.
    pub fn from_decimal(value: f64) -> Self {
        Self {
            cents: (value * 100.0).round() as i64,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal number.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Money::from_decimal)
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Stock keeping unit.
    pub sku: String,

    /// Human-readable product name.
    pub name: String,

    /// Quantity ordered.
    pub qty: u32,

    /// Unit price.
    pub price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, qty: u32, price: Money) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            qty,
            price,
        }
    }

    /// Returns qty * price, or `None` if it does not fit.
    pub fn total(&self) -> Option<Money> {
        self.price.checked_mul(self.qty)
    }
}

/// Sum of `qty * price` over `items`, or `None` if any step overflows.
pub fn checked_total(items: &[LineItem]) -> Option<Money> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total()?))
}

/// Shipping instructions attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tracking: Option<String>,
}

/// The order document stored alongside the order row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Line items in submission order.
    pub items: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Shipping>,

    /// Free-form fields supplied by the client, kept verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl OrderDetails {
    /// Creates a document with the given items and no shipping or extras.
    pub fn with_items(items: Vec<LineItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Sum of all line totals.
    pub fn total(&self) -> Result<Money, DomainError> {
        checked_total(&self.items).ok_or(DomainError::AmountOverflow)
    }
}
