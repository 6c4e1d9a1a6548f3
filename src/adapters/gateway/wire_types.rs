//! Per-endpoint wire structs for the gateway's JSON protocol.
//!
//! These never leave the adapter; `http_gateway` maps them to port types.

use serde::{Deserialize, Serialize};

use crate::domain::payment::RefundStatus;

// ════════════════════════════════════════════════════════════════════════════════
// Auth
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct AuthRequest<'a> {
    pub service_user: &'a str,
    pub service_password: &'a str,
    pub terminal_id: &'a str,
}

#[derive(Deserialize)]
pub struct AuthResponse {
    pub bearer_token: String,

    /// Token lifetime in seconds, when the provider reports one.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreatePaymentBody<'a> {
    pub invoice_id: &'a str,
    pub amount: i64,
    pub currency: &'a str,
    pub payer_account_id: &'a str,
    pub description: &'a str,
    pub callback_urls: CallbackUrlsBody<'a>,
    pub auto_charge_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct CallbackUrlsBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentResponse {
    pub external_payment_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Refunds
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct RefundBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct RefundResponse {
    pub refund_id: String,
    pub status: String,
}

/// Maps the provider's refund vocabulary. Unknown values stay pending.
pub fn refund_status_from_provider(s: &str) -> RefundStatus {
    match s.trim().to_ascii_lowercase().as_str() {
        "success" | "succeeded" | "done" => RefundStatus::Succeeded,
        "error" | "failed" | "rejected" => RefundStatus::Failed,
        _ => RefundStatus::Pending,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Structured error body returned on 4xx/5xx.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_omits_missing_callbacks() {
        let body = CreatePaymentBody {
            invoice_id: "inv-1",
            amount: 28000,
            currency: "RUB",
            payer_account_id: "payer-1",
            description: "8 lessons",
            callback_urls: CallbackUrlsBody {
                success_url: Some("https://example.com/ok"),
                failure_url: None,
                notify_url: None,
            },
            auto_charge_mode: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["callback_urls"]["success_url"], "https://example.com/ok");
        assert!(json["callback_urls"].get("failure_url").is_none());
    }

    #[test]
    fn auth_response_lifetime_is_optional() {
        let r: AuthResponse = serde_json::from_str(r#"{"bearer_token":"t"}"#).unwrap();
        assert_eq!(r.expires_in, None);
    }

    #[test]
    fn refund_vocabulary() {
        assert_eq!(refund_status_from_provider("success"), RefundStatus::Succeeded);
        assert_eq!(refund_status_from_provider("ERROR"), RefundStatus::Failed);
        assert_eq!(refund_status_from_provider("queued"), RefundStatus::Pending);
    }

    #[test]
    fn status_response_tolerates_extra_fields() {
        let r: StatusResponse =
            serde_json::from_str(r#"{"status":"auth","amount":100,"foo":"bar"}"#).unwrap();
        assert_eq!(r.status, "auth");
        assert_eq!(r.error_code, None);
    }
}
