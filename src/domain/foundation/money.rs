//! Money value objects.
//!
//! Amounts are integer minor units (e.g. kopecks, cents). Floats never appear
//! in monetary arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// ISO-4217 currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a currency code, normalising to uppercase.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter ISO-4217 code",
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative amount in minor units of a currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Creates a monetary amount. Negative amounts are rejected.
    pub fn new(amount: i64, currency: Currency) -> Result<Self, ValidationError> {
        if amount < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, amount));
        }
        Ok(Self { amount, currency })
    }

    /// Creates a strictly positive amount, as required for prices and charges.
    pub fn positive(amount: i64, currency: Currency) -> Result<Self, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, amount));
        }
        Ok(Self { amount, currency })
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { amount: 0, currency }
    }

    /// Amount in minor units.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Adds two amounts of the same currency. `None` on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        Some(Money {
            amount: self.amount.checked_add(other.amount)?,
            currency: self.currency.clone(),
        })
    }

    /// Subtracts `other`. `None` on currency mismatch or if the result would be negative.
    pub fn checked_sub(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency || other.amount > self.amount {
            return None;
        }
        Some(Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rub() -> Currency {
        Currency::new("RUB").unwrap()
    }

    #[test]
    fn currency_normalises_case() {
        assert_eq!(Currency::new("rub").unwrap().as_str(), "RUB");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("RUBL").is_err());
        assert!(Currency::new("R1B").is_err());
    }

    #[test]
    fn money_rejects_negative() {
        assert!(Money::new(-1, rub()).is_err());
        assert!(Money::new(0, rub()).is_ok());
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(Money::positive(0, rub()).is_err());
        assert!(Money::positive(1, rub()).is_ok());
    }

    #[test]
    fn checked_sub_never_goes_negative() {
        let a = Money::new(100, rub()).unwrap();
        let b = Money::new(150, rub()).unwrap();
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&a).unwrap().amount(), 50);
    }

    #[test]
    fn arithmetic_rejects_mixed_currencies() {
        let a = Money::new(100, rub()).unwrap();
        let b = Money::new(100, Currency::new("USD").unwrap()).unwrap();
        assert!(a.checked_add(&b).is_none());
        assert!(a.checked_sub(&b).is_none());
    }

    #[test]
    fn currency_deserialization_validates() {
        assert!(serde_json::from_str::<Currency>("\"RUB\"").is_ok());
        assert!(serde_json::from_str::<Currency>("\"RUBLES\"").is_err());
    }
}
