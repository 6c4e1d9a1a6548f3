//! Tariff - the credit policy of a template.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Credit policy: a fixed number of lessons, or unlimited attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tariff {
    /// Fixed number of redeemable lessons.
    Lessons { count: u32 },

    /// No credit accounting; every valid redemption succeeds.
    Unlimited,
}

impl Tariff {
    /// Upper bound on lessons per subscription.
    pub const MAX_LESSONS: u32 = 1000;

    /// Creates a finite tariff.
    pub fn lessons(count: u32) -> Result<Self, ValidationError> {
        if count == 0 || count > Self::MAX_LESSONS {
            return Err(ValidationError::out_of_range(
                "lessons",
                1,
                i64::from(Self::MAX_LESSONS),
                i64::from(count),
            ));
        }
        Ok(Tariff::Lessons { count })
    }

    /// Number of credits issued with this tariff; `None` for unlimited.
    pub fn credits(&self) -> Option<u32> {
        match self {
            Tariff::Lessons { count } => Some(*count),
            Tariff::Unlimited => None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Tariff::Unlimited)
    }
}
