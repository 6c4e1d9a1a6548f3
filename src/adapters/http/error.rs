//! Error rendering for the REST API.
//!
//! Every failure is rendered as `{ "code": "<STABLE_CODE>", "message": "..." }`
//! with the HTTP status derived from the error category.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adapters::gateway::CallbackError;
use crate::domain::foundation::{DomainError, ErrorCategory, ErrorCode, ValidationError};
use crate::domain::payment::PaymentError;
use crate::domain::redemption::RedemptionError;
use crate::domain::subscription::SubscriptionError;

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

/// Any error leaving an HTTP handler.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self(DomainError::validation(field, message))
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::GatewayTransient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::GatewayRejected => StatusCode::BAD_GATEWAY,
            ErrorCategory::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err.into())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err.into())
    }
}

impl From<RedemptionError> for ApiError {
    fn from(err: RedemptionError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::new(ErrorCode::InvalidFormat, rejection.body_text()))
    }
}

impl From<CallbackError> for ApiError {
    fn from(err: CallbackError) -> Self {
        Self(DomainError::validation("signature", err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let DomainError {
            code,
            message,
            details,
        } = self.0;

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = %code, error = %message, "Request failed");
            ErrorResponse {
                code: code.as_str().to_string(),
                message: "Internal error".to_string(),
                details: HashMap::new(),
            }
        } else {
            ErrorResponse {
                code: code.as_str().to_string(),
                message,
                details,
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Parses a path segment into a typed id.
pub fn parse_id<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(field, format!("'{}' is not a valid id", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{LocationId, PaymentId, SubscriptionId, Timestamp};

    #[test]
    fn categories_map_to_statuses() {
        let cases = [
            (ApiError::validation("amount", "bad"), StatusCode::BAD_REQUEST),
            (
                SubscriptionError::not_found(SubscriptionId::new()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                RedemptionError::credits_exhausted(SubscriptionId::new()).into(),
                StatusCode::CONFLICT,
            ),
            (
                PaymentError::gateway_transient("timeout").into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                PaymentError::gateway_rejected(Some("DECLINED".to_string()), "no").into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PaymentError::infrastructure("db down").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let err: ApiError = err;
            assert_eq!(err.status(), status, "{:?}", err);
        }
    }

    #[test]
    fn duplicate_redemption_is_a_conflict() {
        let err: ApiError =
            RedemptionError::duplicate(SubscriptionId::new(), LocationId::new(), Timestamp::now())
                .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), ErrorCode::DuplicateRedemption);
    }

    #[test]
    fn refund_over_balance_is_a_conflict() {
        let err: ApiError = PaymentError::refund_exceeds_balance(100, 50).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), ErrorCode::RefundExceedsBalance);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id::<PaymentId>("payment_id", "nope").is_err());
        let id = PaymentId::new();
        assert_eq!(parse_id::<PaymentId>("payment_id", &id.to_string()).unwrap(), id);
    }
}
