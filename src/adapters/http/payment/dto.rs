//! HTTP DTOs for payment endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::http::subscription::dto::{iso, MoneyDto};
use crate::domain::payment::{Payment, PaymentRefund, PaymentStatus, RefundStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundRequest {
    /// Minor units; omitted refunds everything still refundable.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Provider notification. Only the invoice id is used; the status is
/// always fetched from the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCallback {
    pub invoice_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub payer_id: String,
    pub subscription_id: Option<String>,
    pub amount: MoneyDto,
    pub description: String,
    pub status: PaymentStatus,
    pub redirect_url: Option<String>,
    pub last_error_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            payer_id: payment.payer_id.to_string(),
            subscription_id: payment.subscription_id.map(|id| id.to_string()),
            amount: MoneyDto::from(&payment.amount),
            description: payment.description.clone(),
            status: payment.status,
            redirect_url: payment.redirect_url.clone(),
            last_error_code: payment.last_error_code.clone(),
            created_at: iso(&payment.created_at),
            updated_at: iso(&payment.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundResponse {
    pub id: String,
    pub amount: MoneyDto,
    pub status: RefundStatus,
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<&PaymentRefund> for RefundResponse {
    fn from(refund: &PaymentRefund) -> Self {
        Self {
            id: refund.id.to_string(),
            amount: MoneyDto::from(&refund.amount),
            status: refund.status,
            reason: refund.reason.clone(),
            created_at: iso(&refund.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundPaymentResponse {
    pub payment: PaymentResponse,
    pub refund: RefundResponse,
    pub remaining: MoneyDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelPaymentResponse {
    pub payment: PaymentResponse,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    pub status: PaymentStatus,
}
