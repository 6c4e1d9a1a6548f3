//! Payment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | InvalidState | 409 |
//! | NotRefundable | 409 |
//! | NotCancellable | 409 |
//! | RefundExceedsBalance | 409 |
//! | GatewayTransient | 503 |
//! | GatewayRejected | 502 |
//! | Subscription | per subscription error |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, ValidationError};
use crate::domain::subscription::SubscriptionError;

use super::PaymentStatus;

/// Payment ledger errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Payment was not found.
    NotFound(PaymentId),

    /// Invalid state for the requested operation.
    InvalidState {
        current: String,
        attempted: String,
    },

    /// Only succeeded payments can be refunded.
    NotRefundable(PaymentStatus),

    /// Settled payments cannot be cancelled.
    NotCancellable(PaymentStatus),

    /// Requested refund exceeds what is left on the payment.
    RefundExceedsBalance { requested: i64, available: i64 },

    /// Gateway unreachable or timed out.
    GatewayTransient(String),

    /// Gateway refused the request.
    GatewayRejected {
        code: Option<String>,
        message: String,
    },

    /// The linked subscription rejected the operation.
    Subscription(SubscriptionError),

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl PaymentError {
    pub fn not_found(id: PaymentId) -> Self {
        PaymentError::NotFound(id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PaymentError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn not_refundable(status: PaymentStatus) -> Self {
        PaymentError::NotRefundable(status)
    }

    pub fn not_cancellable(status: PaymentStatus) -> Self {
        PaymentError::NotCancellable(status)
    }

    pub fn refund_exceeds_balance(requested: i64, available: i64) -> Self {
        PaymentError::RefundExceedsBalance {
            requested,
            available,
        }
    }

    pub fn gateway_transient(message: impl Into<String>) -> Self {
        PaymentError::GatewayTransient(message.into())
    }

    pub fn gateway_rejected(code: Option<String>, message: impl Into<String>) -> Self {
        PaymentError::GatewayRejected {
            code,
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::NotRefundable(_) => ErrorCode::PaymentNotRefundable,
            PaymentError::NotCancellable(_) => ErrorCode::PaymentNotCancellable,
            PaymentError::RefundExceedsBalance { .. } => ErrorCode::RefundExceedsBalance,
            PaymentError::GatewayTransient(_) => ErrorCode::GatewayTransient,
            PaymentError::GatewayRejected { .. } => ErrorCode::GatewayRejected,
            PaymentError::Subscription(err) => err.code(),
            PaymentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::NotFound(id) => format!("Payment not found: {}", id),
            PaymentError::InvalidState { current, attempted } => {
                format!("Cannot {} payment in {} state", attempted, current)
            }
            PaymentError::NotRefundable(status) => {
                format!("Payment in {} state cannot be refunded", status)
            }
            PaymentError::NotCancellable(status) => {
                format!("Payment in {} state cannot be cancelled", status)
            }
            PaymentError::RefundExceedsBalance {
                requested,
                available,
            } => format!(
                "Refund of {} exceeds refundable balance of {}",
                requested, available
            ),
            PaymentError::GatewayTransient(msg) => {
                format!("Payment gateway unavailable: {}", msg)
            }
            PaymentError::GatewayRejected { code, message } => match code {
                Some(code) => format!("Payment gateway rejected request ({}): {}", code, message),
                None => format!("Payment gateway rejected request: {}", message),
            },
            PaymentError::Subscription(err) => err.message(),
            PaymentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::GatewayTransient(_) | PaymentError::Infrastructure(_) => true,
            PaymentError::Subscription(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<SubscriptionError> for PaymentError {
    fn from(err: SubscriptionError) -> Self {
        PaymentError::Subscription(err)
    }
}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        PaymentError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => PaymentError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.message,
            },
            ErrorCode::GatewayTransient => PaymentError::GatewayTransient(err.message),
            ErrorCode::GatewayRejected => PaymentError::GatewayRejected {
                code: err.details.get("provider_code").cloned(),
                message: err.message,
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => PaymentError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Subscription(inner) => inner.into(),
            PaymentError::NotFound(id) => {
                DomainError::new(err.code(), err.message()).with_detail("payment_id", id.to_string())
            }
            PaymentError::GatewayRejected {
                code: Some(ref code),
                ..
            } => DomainError::new(err.code(), err.message()).with_detail("provider_code", code),
            PaymentError::ValidationFailed { ref field, .. } => {
                DomainError::new(err.code(), err.message()).with_detail("field", field)
            }
            _ => DomainError::new(err.code(), err.message()),
        }
    }
}
