//! Axum routes for redemption.

use axum::{routing::post, Router};

use super::handlers::redeem;
use crate::adapters::http::state::AppState;

/// Redemption routes, mounted under `/api`.
pub fn redemption_routes() -> Router<AppState> {
    Router::new().route("/redemptions", post(redeem))
}
