//! Customer records.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::order::ValidationError;

/// Longest accepted customer name, in characters.
pub const MAX_NAME_LEN: usize = 20;

/// Required number of digits in a phone number.
pub const PHONE_DIGITS: usize = 10;

/// A stored customer. Customers are unique by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer details as submitted with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl NewCustomer {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Checks name, email and phone constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::CustomerNameRequired);
        }
        let len = self.name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::CustomerNameTooLong { len });
        }
        if !is_well_formed_email(&self.email) {
            return Err(ValidationError::InvalidEmail {
                email: self.email.clone(),
            });
        }
        if self.phone.len() != PHONE_DIGITS || !self.phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPhone {
                phone: self.phone.clone(),
            });
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and no empty domain labels.
fn is_well_formed_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewCustomer {
        NewCustomer::new("Ada Lovelace", "ada@example.com", "5551234567")
    }

    #[test]
    fn test_valid_customer_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let customer = NewCustomer { name: "   ".into(), ..valid() };
        assert!(matches!(
            customer.validate(),
            Err(ValidationError::CustomerNameRequired)
        ));
    }

    #[test]
    fn test_name_length_counts_characters() {
        let customer = NewCustomer { name: "é".repeat(20), ..valid() };
        assert!(customer.validate().is_ok());

        let customer = NewCustomer { name: "x".repeat(21), ..valid() };
        assert!(matches!(
            customer.validate(),
            Err(ValidationError::CustomerNameTooLong { len: 21 })
        ));
    }

    #[test]
    fn test_malformed_emails_rejected() {
        for email in [
            "",
            "plain",
            "@example.com",
            "ada@",
            "ada@example",
            "ada@@example.com",
            "ada@exa mple.com",
            "ada@.com",
            "ada@example..com",
        ] {
            let customer = NewCustomer { email: email.into(), ..valid() };
            assert!(
                matches!(customer.validate(), Err(ValidationError::InvalidEmail { .. })),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        for phone in ["555123456", "55512345678", "555-123-45", "555123456a"] {
            let customer = NewCustomer { phone: phone.into(), ..valid() };
            assert!(
                matches!(customer.validate(), Err(ValidationError::InvalidPhone { .. })),
                "{phone:?} should be rejected"
            );
        }
    }
}
