//! Subscription-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | TemplateNotFound | 404 |
//! | InvalidToken | 404 |
//! | TemplateInactive | 409 |
//! | Exhausted | 409 |
//! | InvalidState | 409 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, SubscriptionId, TemplateId, ValidationError,
};

/// Subscription ledger errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Subscription was not found.
    NotFound(SubscriptionId),

    /// Template was not found.
    TemplateNotFound(TemplateId),

    /// Template exists but is no longer on sale.
    TemplateInactive(TemplateId),

    /// Token does not resolve to an active subscription.
    InvalidToken,

    /// No credits remain on a finite subscription.
    Exhausted(SubscriptionId),

    /// Invalid state for the requested operation.
    InvalidState {
        current: String,
        attempted: String,
    },

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl SubscriptionError {
    pub fn not_found(id: SubscriptionId) -> Self {
        SubscriptionError::NotFound(id)
    }

    pub fn template_not_found(id: TemplateId) -> Self {
        SubscriptionError::TemplateNotFound(id)
    }

    pub fn template_inactive(id: TemplateId) -> Self {
        SubscriptionError::TemplateInactive(id)
    }

    pub fn invalid_token() -> Self {
        SubscriptionError::InvalidToken
    }

    pub fn exhausted(id: SubscriptionId) -> Self {
        SubscriptionError::Exhausted(id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        SubscriptionError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::NotFound(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            SubscriptionError::TemplateInactive(_) => ErrorCode::TemplateInactive,
            SubscriptionError::InvalidToken => ErrorCode::InvalidToken,
            SubscriptionError::Exhausted(_) => ErrorCode::CreditsExhausted,
            SubscriptionError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::NotFound(id) => format!("Subscription not found: {}", id),
            SubscriptionError::TemplateNotFound(id) => format!("Template not found: {}", id),
            SubscriptionError::TemplateInactive(id) => {
                format!("Template {} is no longer available", id)
            }
            SubscriptionError::InvalidToken => {
                "Token does not match an active subscription".to_string()
            }
            SubscriptionError::Exhausted(id) => {
                format!("Subscription {} has no credits left", id)
            }
            SubscriptionError::InvalidState { current, attempted } => {
                format!("Cannot {} subscription in {} state", attempted, current)
            }
            SubscriptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SubscriptionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubscriptionError::Infrastructure(_))
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidToken => SubscriptionError::InvalidToken,
            ErrorCode::InvalidStateTransition => SubscriptionError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.message,
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => SubscriptionError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        let domain = DomainError::new(err.code(), err.message());
        match err {
            SubscriptionError::NotFound(id) | SubscriptionError::Exhausted(id) => {
                domain.with_detail("subscription_id", id.to_string())
            }
            SubscriptionError::TemplateNotFound(id) | SubscriptionError::TemplateInactive(id) => {
                domain.with_detail("template_id", id.to_string())
            }
            SubscriptionError::ValidationFailed { field, .. } => domain.with_detail("field", field),
            _ => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCategory;

    #[test]
    fn exhausted_is_a_conflict() {
        let err = SubscriptionError::exhausted(SubscriptionId::new());
        assert_eq!(err.code(), ErrorCode::CreditsExhausted);
        assert_eq!(err.code().category(), ErrorCategory::Conflict);
    }

    #[test]
    fn invalid_token_is_not_found() {
        assert_eq!(
            SubscriptionError::invalid_token().code().category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn only_infrastructure_is_retryable() {
        assert!(SubscriptionError::infrastructure("db down").is_retryable());
        assert!(!SubscriptionError::invalid_token().is_retryable());
        assert!(!SubscriptionError::exhausted(SubscriptionId::new()).is_retryable());
    }

    #[test]
    fn converts_to_domain_error_with_detail() {
        let id = SubscriptionId::new();
        let domain: DomainError = SubscriptionError::not_found(id).into();
        assert_eq!(domain.code, ErrorCode::SubscriptionNotFound);
        assert_eq!(domain.details.get("subscription_id"), Some(&id.to_string()));
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: SubscriptionError = ValidationError::empty_field("name").into();
        assert!(matches!(
            err,
            SubscriptionError::ValidationFailed { ref field, .. } if field == "name"
        ));
    }

    #[test]
    fn domain_error_round_trip_keeps_field() {
        let domain: DomainError = ValidationError::empty_field("token").into();
        let err: SubscriptionError = domain.into();
        assert!(matches!(
            err,
            SubscriptionError::ValidationFailed { ref field, .. } if field == "token"
        ));
    }
}
