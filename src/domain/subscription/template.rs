//! Subscription template - the sellable product definition.
//!
//! Templates are soft-deactivated and never deleted: issued subscriptions
//! keep pointing at them for audit even after they leave the catalog.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, TemplateId, Timestamp, UserId, ValidationError};

use super::Tariff;

/// Maximum template name length in characters.
const MAX_NAME_LEN: usize = 200;

/// A template defining tariff and price for purchasable subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTemplate {
    pub id: TemplateId,
    pub name: String,
    pub tariff: Tariff,
    pub price: Money,
    pub active: bool,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionTemplate {
    /// Creates a new active template.
    pub fn create(
        id: TemplateId,
        name: impl Into<String>,
        tariff: Tariff,
        price: Money,
        created_by: UserId,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        validate_price(&price)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            name,
            tariff,
            price,
            active: true,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Edits catalog terms. Subscriptions already issued keep their snapshot.
    pub fn update_terms(
        &mut self,
        name: Option<String>,
        tariff: Option<Tariff>,
        price: Option<Money>,
    ) -> Result<(), ValidationError> {
        if let Some(name) = name {
            self.name = validate_name(name)?;
        }
        if let Some(price) = price {
            validate_price(&price)?;
            self.price = price;
        }
        if let Some(tariff) = tariff {
            self.tariff = tariff;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Removes the template from sale. Idempotent.
    pub fn deactivate(&mut self) {
        if self.active {
            self.active = false;
            self.updated_at = Timestamp::now();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

fn validate_name(name: String) -> Result<String, ValidationError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::out_of_range(
            "name",
            1,
            MAX_NAME_LEN as i64,
            name.chars().count() as i64,
        ));
    }
    Ok(name)
}

fn validate_price(price: &Money) -> Result<(), ValidationError> {
    if price.is_zero() {
        return Err(ValidationError::out_of_range("price", 1, i64::MAX, 0));
    }
    Ok(())
}
