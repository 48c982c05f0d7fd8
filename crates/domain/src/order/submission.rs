//! Order submission input.

use serde::{Deserialize, Serialize};

use super::{LineItem, Money, OrderDetails, Shipping, ValidationError, checked_total};
use crate::customer::NewCustomer;

/// Everything a client sends to place an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub customer: NewCustomer,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl OrderSubmission {
    pub fn new(customer: NewCustomer, items: Vec<LineItem>) -> Self {
        Self {
            customer,
            items,
            shipping: None,
            extra: serde_json::Value::Null,
        }
    }

    /// Sets the shipping block.
    pub fn with_shipping(mut self, shipping: Shipping) -> Self {
        self.shipping = Some(shipping);
        self
    }

    /// Checks the customer and every line item. Reports the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.customer.validate()?;

        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.sku.trim().is_empty() {
                return Err(ValidationError::MissingSku { index });
            }
            if item.name.trim().is_empty() {
                return Err(ValidationError::MissingItemName { index });
            }
            if item.qty == 0 {
                return Err(ValidationError::InvalidQuantity {
                    index,
                    qty: item.qty,
                });
            }
            if item.price.is_negative() || item.price > Money::MAX_PRICE {
                return Err(ValidationError::InvalidPrice {
                    index,
                    price: item.price,
                });
            }
        }

        if checked_total(&self.items).is_none() {
            return Err(ValidationError::TotalTooLarge {
                max: Money::from_cents(i64::MAX),
            });
        }

        Ok(())
    }

    /// Splits the submission into the customer and the order document.
    pub fn into_parts(self) -> (NewCustomer, OrderDetails) {
        let details = OrderDetails {
            items: self.items,
            shipping: self.shipping,
            extra: self.extra,
        };
        (self.customer, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(items: Vec<LineItem>) -> OrderSubmission {
        OrderSubmission::new(
            NewCustomer::new("Ada", "ada@example.com", "5551234567"),
            items,
        )
    }

    fn widget() -> LineItem {
        LineItem::new("SKU-1", "Widget", 1, Money::from_cents(1000))
    }

    #[test]
    fn test_valid_submission() {
        assert!(submission(vec![widget()]).validate().is_ok());
    }

    #[test]
    fn test_customer_errors_surface_first() {
        let mut s = submission(vec![]);
        s.customer.phone = "123".into();
        assert!(matches!(
            s.validate(),
            Err(ValidationError::InvalidPhone { .. })
        ));
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(submission(vec![]).validate(), Err(ValidationError::NoItems));
    }

    #[test]
    fn test_item_rules() {
        let mut item = widget();
        item.sku = " ".into();
        assert_eq!(
            submission(vec![widget(), item]).validate(),
            Err(ValidationError::MissingSku { index: 1 })
        );

        let mut item = widget();
        item.name.clear();
        assert_eq!(
            submission(vec![item]).validate(),
            Err(ValidationError::MissingItemName { index: 0 })
        );

        let mut item = widget();
        item.qty = 0;
        assert_eq!(
            submission(vec![item]).validate(),
            Err(ValidationError::InvalidQuantity { index: 0, qty: 0 })
        );
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let mut item = widget();
        item.price = Money::zero();
        assert!(submission(vec![item.clone()]).validate().is_ok());

        item.price = Money::MAX_PRICE;
        assert!(submission(vec![item.clone()]).validate().is_ok());

        item.price = Money::from_cents(100_000_001);
        assert!(matches!(
            submission(vec![item.clone()]).validate(),
            Err(ValidationError::InvalidPrice { index: 0, .. })
        ));

        item.price = Money::from_cents(-1);
        assert!(submission(vec![item]).validate().is_err());
    }

    #[test]
    fn test_total_that_overflows_is_rejected() {
        let mut item = widget();
        item.qty = u32::MAX;
        item.price = Money::MAX_PRICE;
        assert!(submission(vec![item.clone()]).validate().is_ok());

        let err = submission(vec![item; 25]).validate().unwrap_err();
        assert!(matches!(err, ValidationError::TotalTooLarge { .. }));
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_field_paths() {
        assert_eq!(ValidationError::NoItems.field(), "items");
        assert_eq!(
            ValidationError::InvalidQuantity { index: 2, qty: 0 }.field(),
            "items[2].qty"
        );
        assert_eq!(ValidationError::CustomerNameRequired.field(), "customer.name");
    }

    #[test]
    fn test_deserializes_client_payload() {
        let s: OrderSubmission = serde_json::from_value(serde_json::json!({
            "customer": {"name": "Ada", "email": "ada@example.com", "phone": "5551234567"},
            "items": [{"sku": "A1", "name": "Widget", "qty": 1, "price": 10.0}]
        }))
        .unwrap();
        assert!(s.shipping.is_none());
        assert!(s.extra.is_null());

        let (customer, details) = s.into_parts();
        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(details.total().unwrap().cents(), 1000);
    }
}
