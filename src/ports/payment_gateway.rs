//! Payment gateway port for the external payment provider.
//!
//! The gateway is a pure protocol boundary: it holds no business state, and
//! every call may be repeated safely because payment creation is keyed by the
//! local payment id (`invoice_id`).
//!
//! # Design
//!
//! - **Typed status**: provider vocabulary is mapped to `GatewayPaymentStatus`;
//!   unknown strings become `Unknown` instead of failing
//! - **Two failure classes**: `Transient` (retry later) and `Rejected` (terminal)
//! - **Opaque raw body**: kept only for logging

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, Money};
use crate::domain::payment::{PaymentError, PaymentStatus, RefundStatus};

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a payment with the provider and returns where the payer pays.
    async fn create_payment(
        &self,
        request: CreateGatewayPayment,
    ) -> Result<GatewayPayment, GatewayError>;

    /// Queries the provider's view of a payment.
    async fn get_status(&self, external_id: &str) -> Result<GatewayStatusReport, GatewayError>;

    /// Returns money to the payer. `amount = None` refunds the full remainder.
    async fn refund(
        &self,
        external_id: &str,
        amount: Option<i64>,
        reason: Option<String>,
    ) -> Result<GatewayRefund, GatewayError>;
}

/// Request to create a payment at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGatewayPayment {
    /// Local payment id; the provider deduplicates on it.
    pub invoice_id: String,
    pub amount: Money,
    pub payer_ref: String,
    pub description: String,
    pub callback_urls: CallbackUrls,
    pub options: PaymentOptions,
}

/// Where the provider sends the payer (and notifications) afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackUrls {
    pub success: Option<String>,
    pub failure: Option<String>,
    pub notify: Option<String>,
}

/// Provider-specific knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    /// Capture immediately after authorisation.
    pub auto_charge: bool,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        Self { auto_charge: true }
    }
}

/// Provider's acknowledgement of a created payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPayment {
    pub external_id: String,
    pub redirect_url: String,
}

/// Provider's view of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayStatusReport {
    pub status: GatewayPaymentStatus,
    pub error_code: Option<String>,

    /// Raw response text, for logs only.
    pub raw: String,
}

/// Provider's acknowledgement of a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRefund {
    pub refund_id: String,
    pub status: RefundStatus,
}

/// Payment status in provider vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayPaymentStatus {
    New,
    Auth,
    Success,
    Error,
    Return,
    Refund,
    Unblock,
    Unknown,
}

impl GatewayPaymentStatus {
    /// Maps a provider string. Never fails.
    pub fn from_provider(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => GatewayPaymentStatus::New,
            "auth" => GatewayPaymentStatus::Auth,
            "success" => GatewayPaymentStatus::Success,
            "error" => GatewayPaymentStatus::Error,
            "return" => GatewayPaymentStatus::Return,
            "refund" => GatewayPaymentStatus::Refund,
            "unblock" => GatewayPaymentStatus::Unblock,
            _ => GatewayPaymentStatus::Unknown,
        }
    }

    /// Local status a payment should move to, or `None` to leave it alone.
    pub fn settlement_target(&self) -> Option<PaymentStatus> {
        match self {
            GatewayPaymentStatus::Success => Some(PaymentStatus::Succeeded),
            GatewayPaymentStatus::Error => Some(PaymentStatus::Failed),
            GatewayPaymentStatus::Auth => Some(PaymentStatus::Processing),
            _ => None,
        }
    }
}

/// Errors from gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network failure, timeout, or an unstructured 5xx. Safe to retry.
    #[error("gateway unavailable: {0}")]
    Transient(String),

    /// Provider answered with a structured error. Terminal for this attempt.
    #[error("gateway rejected request [{code}]: {message}")]
    Rejected { code: String, message: String },

    /// Provider answered successfully with a body we could not understand.
    #[error("unexpected gateway response: {0}")]
    Protocol(String),
}

impl GatewayError {
    pub fn transient(message: impl Into<String>) -> Self {
        GatewayError::Transient(message.into())
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        GatewayError::Protocol(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }

    /// Provider error code, if the provider sent one.
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transient(msg) => PaymentError::gateway_transient(msg),
            GatewayError::Rejected { code, message } => {
                PaymentError::gateway_rejected(Some(code), message)
            }
            GatewayError::Protocol(msg) => PaymentError::gateway_rejected(None, msg),
        }
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = if err.is_retryable() {
            ErrorCode::GatewayTransient
        } else {
            ErrorCode::GatewayRejected
        };
        let domain = DomainError::new(code, err.to_string());
        match err.provider_code() {
            Some(provider_code) => domain.with_detail("provider_code", provider_code),
            None => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_vocabulary_maps_case_insensitively() {
        assert_eq!(
            GatewayPaymentStatus::from_provider("SUCCESS"),
            GatewayPaymentStatus::Success
        );
        assert_eq!(
            GatewayPaymentStatus::from_provider(" auth "),
            GatewayPaymentStatus::Auth
        );
    }

    #[test]
    fn unknown_provider_status_never_fails() {
        assert_eq!(
            GatewayPaymentStatus::from_provider("chargeback_pending"),
            GatewayPaymentStatus::Unknown
        );
        assert_eq!(GatewayPaymentStatus::Unknown.settlement_target(), None);
    }

    #[test]
    fn settlement_targets() {
        assert_eq!(
            GatewayPaymentStatus::Success.settlement_target(),
            Some(PaymentStatus::Succeeded)
        );
        assert_eq!(
            GatewayPaymentStatus::Error.settlement_target(),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(
            GatewayPaymentStatus::Auth.settlement_target(),
            Some(PaymentStatus::Processing)
        );
        assert_eq!(GatewayPaymentStatus::New.settlement_target(), None);
        assert_eq!(GatewayPaymentStatus::Return.settlement_target(), None);
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(GatewayError::transient("timeout").is_retryable());
        assert!(!GatewayError::rejected("E1", "declined").is_retryable());
        assert!(!GatewayError::protocol("bad json").is_retryable());
    }

    #[test]
    fn rejected_converts_with_provider_code() {
        let err: PaymentError = GatewayError::rejected("E1", "declined").into();
        assert_eq!(err.code(), ErrorCode::GatewayRejected);

        let domain: DomainError = GatewayError::rejected("E1", "declined").into();
        assert_eq!(domain.details.get("provider_code").map(String::as_str), Some("E1"));
    }
}
