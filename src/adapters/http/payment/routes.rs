//! Axum routes for payment endpoints.

use axum::{routing::post, Router};

use super::handlers::{cancel_payment, check_payment, gateway_callback, refund_payment};
use crate::adapters::http::state::AppState;

/// Payment routes, mounted under `/api`.
///
/// # Routes
/// - `POST /payments/:id/check` - Reconcile now and report the status
/// - `POST /payments/:id/refund` - Refund (staff)
/// - `POST /payments/:id/cancel` - Cancel before settlement
/// - `POST /gateway/callback` - Provider notification (signature verified)
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/:id/check", post(check_payment))
        .route("/payments/:id/refund", post(refund_payment))
        .route("/payments/:id/cancel", post(cancel_payment))
        .route("/gateway/callback", post(gateway_callback))
}
