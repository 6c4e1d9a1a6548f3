//! HTTP handlers for payment endpoints and the provider callback.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tracing::debug;

use crate::application::handlers::payment::{
    CancelPaymentCommand, CheckPaymentQuery, ReconcilePaymentCommand, RefundPaymentCommand,
};
use crate::domain::foundation::PaymentId;

use super::dto::{
    CallbackAck, CancelPaymentResponse, GatewayCallback, PaymentResponse, PaymentStatusResponse,
    RefundPaymentResponse, RefundRequest, RefundResponse,
};
use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::state::AppState;
use crate::adapters::http::subscription::dto::MoneyDto;
use crate::adapters::http::subscription::StaffUser;

/// Header carrying the hex HMAC-SHA256 of the callback body.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// POST /api/payments/:id/check - Ask the gateway and return the settled status
pub async fn check_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment_id: PaymentId = parse_id("payment_id", &id)?;
    let status = state
        .check_payment
        .handle(CheckPaymentQuery { payment_id })
        .await?;
    Ok(Json(PaymentStatusResponse {
        payment_id: payment_id.to_string(),
        status,
    }))
}

/// POST /api/payments/:id/refund - Full or partial refund (staff)
pub async fn refund_payment(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let command = RefundPaymentCommand {
        payment_id: parse_id("payment_id", &id)?,
        amount: request.amount,
        reason: request.reason,
    };
    let result = state.refund.handle(command).await?;
    Ok(Json(RefundPaymentResponse {
        payment: PaymentResponse::from(&result.payment),
        refund: RefundResponse::from(&result.refund),
        remaining: MoneyDto::from(&result.remaining),
    }))
}

/// POST /api/payments/:id/cancel - Withdraw an unsettled payment
pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CancelPaymentCommand {
        payment_id: parse_id("payment_id", &id)?,
    };
    let result = state.cancel_payment.handle(command).await?;
    Ok(Json(CancelPaymentResponse {
        payment: PaymentResponse::from(&result.payment),
        cancelled: result.cancelled,
    }))
}

/// POST /api/gateway/callback - Provider notification
///
/// The body is only trusted for the invoice id; the payment is reconciled
/// against the gateway exactly as the poller would.
pub async fn gateway_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    state.callback_verifier.verify(&body, signature)?;

    let callback: GatewayCallback = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation("body", e.to_string()))?;
    let payment_id: PaymentId = parse_id("invoice_id", &callback.invoice_id)?;
    debug!(payment_id = %payment_id, "Gateway callback received");

    let result = state
        .reconcile
        .handle(ReconcilePaymentCommand { payment_id })
        .await?;
    Ok(Json(CallbackAck {
        status: result.payment.status,
    }))
}
