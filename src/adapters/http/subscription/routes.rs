//! Axum routes for subscription and template endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    cancel_subscription, create_template, deactivate_template, list_subscriptions,
    list_templates, lookup_by_token, purchase_subscription, reissue_token, update_template,
};
use crate::adapters::http::state::AppState;

/// Subscription routes, mounted under `/api`.
///
/// # Routes
/// - `POST /subscriptions` - Purchase
/// - `GET /subscriptions/by-token/:token` - Resolve a code
/// - `POST /subscriptions/:id/token` - Reissue the code
/// - `POST /subscriptions/:id/cancel` - Support cancellation (staff)
/// - `GET /payers/:payer_id/subscriptions` - A payer's subscriptions
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", post(purchase_subscription))
        .route("/subscriptions/by-token/:token", get(lookup_by_token))
        .route("/subscriptions/:id/token", post(reissue_token))
        .route("/subscriptions/:id/cancel", post(cancel_subscription))
        .route("/payers/:payer_id/subscriptions", get(list_subscriptions))
}

/// Template catalog routes, mounted under `/api`. Writes require staff.
///
/// # Routes
/// - `GET /templates` - Active templates
/// - `POST /templates` - Create
/// - `PUT /templates/:id` - Edit
/// - `POST /templates/:id/deactivate` - Withdraw from sale
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/:id", put(update_template))
        .route("/templates/:id/deactivate", post(deactivate_template))
}
