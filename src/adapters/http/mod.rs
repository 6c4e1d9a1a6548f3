//! HTTP adapters - REST API implementations.
//!
//! Each ledger module has its own HTTP adapter; `router` assembles them
//! under `/api` with tracing and request timeouts.

pub mod error;
pub mod payment;
pub mod redemption;
pub mod state;
pub mod subscription;

use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, LedgerPorts, LedgerSettings};

/// Builds the complete application router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(subscription::subscription_routes())
        .merge(subscription::template_routes())
        .merge(payment::payment_routes())
        .merge(redemption::redemption_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// GET /health - Liveness probe
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
