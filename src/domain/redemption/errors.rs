//! Redemption error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidToken | 404 |
//! | DuplicateRedemption | 409 |
//! | CreditsExhausted | 409 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, LocationId, SubscriptionId, Timestamp, ValidationError,
};
use crate::domain::subscription::SubscriptionError;

/// Errors returned when a scanned code is redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionError {
    /// Token unknown or subscription not active.
    InvalidToken,

    /// Same subscription already redeemed at this location within the window.
    DuplicateRedemption {
        subscription_id: SubscriptionId,
        location_id: LocationId,
        previous_visit_at: Timestamp,
    },

    /// No credits remain.
    CreditsExhausted(SubscriptionId),

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl RedemptionError {
    pub fn invalid_token() -> Self {
        RedemptionError::InvalidToken
    }

    pub fn duplicate(
        subscription_id: SubscriptionId,
        location_id: LocationId,
        previous_visit_at: Timestamp,
    ) -> Self {
        RedemptionError::DuplicateRedemption {
            subscription_id,
            location_id,
            previous_visit_at,
        }
    }

    pub fn credits_exhausted(id: SubscriptionId) -> Self {
        RedemptionError::CreditsExhausted(id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        RedemptionError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RedemptionError::InvalidToken => ErrorCode::InvalidToken,
            RedemptionError::DuplicateRedemption { .. } => ErrorCode::DuplicateRedemption,
            RedemptionError::CreditsExhausted(_) => ErrorCode::CreditsExhausted,
            RedemptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            RedemptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            RedemptionError::InvalidToken => "Code is not valid for entry".to_string(),
            RedemptionError::DuplicateRedemption {
                previous_visit_at, ..
            } => format!(
                "Code was already used here at {}",
                previous_visit_at.as_datetime().format("%H:%M:%S UTC")
            ),
            RedemptionError::CreditsExhausted(_) => "No visits left on this pass".to_string(),
            RedemptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            RedemptionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RedemptionError::Infrastructure(_))
    }
}

impl std::fmt::Display for RedemptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RedemptionError {}

impl From<SubscriptionError> for RedemptionError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::Exhausted(id) => RedemptionError::CreditsExhausted(id),
            SubscriptionError::NotFound(_)
            | SubscriptionError::InvalidToken
            | SubscriptionError::InvalidState { .. } => RedemptionError::InvalidToken,
            SubscriptionError::ValidationFailed { field, message } => {
                RedemptionError::ValidationFailed { field, message }
            }
            other => RedemptionError::Infrastructure(other.to_string()),
        }
    }
}

impl From<ValidationError> for RedemptionError {
    fn from(err: ValidationError) -> Self {
        RedemptionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for RedemptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidToken | ErrorCode::SubscriptionNotFound => {
                RedemptionError::InvalidToken
            }
            _ => RedemptionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<RedemptionError> for DomainError {
    fn from(err: RedemptionError) -> Self {
        let domain = DomainError::new(err.code(), err.message());
        match err {
            RedemptionError::DuplicateRedemption {
                subscription_id,
                location_id,
                previous_visit_at,
            } => domain
                .with_detail("subscription_id", subscription_id.to_string())
                .with_detail("location_id", location_id.to_string())
                .with_detail("previous_visit_at", previous_visit_at.to_string()),
            RedemptionError::CreditsExhausted(id) => {
                domain.with_detail("subscription_id", id.to_string())
            }
            _ => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCategory;

    #[test]
    fn exhausted_subscription_maps_to_credits_exhausted() {
        let id = SubscriptionId::new();
        let err: RedemptionError = SubscriptionError::exhausted(id).into();
        assert_eq!(err, RedemptionError::CreditsExhausted(id));
    }

    #[test]
    fn inactive_subscription_maps_to_invalid_token() {
        let err: RedemptionError =
            SubscriptionError::invalid_state("expired", "redeem").into();
        assert_eq!(err, RedemptionError::InvalidToken);
    }

    #[test]
    fn duplicate_is_a_conflict_with_details() {
        let err = RedemptionError::duplicate(SubscriptionId::new(), LocationId::new(), Timestamp::now());
        assert_eq!(err.code().category(), ErrorCategory::Conflict);

        let domain: DomainError = err.into();
        assert!(domain.details.contains_key("previous_visit_at"));
    }
}
