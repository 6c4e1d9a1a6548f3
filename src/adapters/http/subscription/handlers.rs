//! HTTP handlers for subscription and template endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Json, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::subscription::{
    CancelReason, CancelSubscriptionCommand, CreateTemplateCommand, DeactivateTemplateCommand,
    ListSubscriptionsQuery, LookupByTokenQuery, PurchaseSubscriptionCommand, ReissueTokenCommand,
    UpdateTemplateCommand,
};
use crate::domain::foundation::{DependentId, Money, PayerId, SubscriptionId, TemplateId, UserId};
use crate::domain::subscription::Tariff;

use super::dto::{
    CancelSubscriptionResponse, CreateTemplateRequest, PurchaseResponse,
    PurchaseSubscriptionRequest, SubscriptionListResponse, SubscriptionResponse,
    TemplateListResponse, TemplateResponse, UpdateTemplateRequest,
};
use crate::adapters::http::error::{parse_id, ApiError, ErrorResponse};
use crate::adapters::http::state::AppState;

// ════════════════════════════════════════════════════════════════════════════════
// Staff identity
// ════════════════════════════════════════════════════════════════════════════════

/// Staff member managing the catalog, identified by the `X-User-Id` header
/// set by the upstream auth proxy.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub user_id: UserId,
}

pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse {
            code: "AUTHENTICATION_REQUIRED".to_string(),
            message: "Authentication is required".to_string(),
            details: Default::default(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<UserId>().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(StaffUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscriptions - Purchase a subscription from a template
pub async fn purchase_subscription(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let command = PurchaseSubscriptionCommand {
        payer_id: parse_id::<PayerId>("payer_id", &request.payer_id)?,
        template_id: parse_id::<TemplateId>("template_id", &request.template_id)?,
        dependent_id: request
            .dependent_id
            .as_deref()
            .map(|raw| parse_id::<DependentId>("dependent_id", raw))
            .transpose()?,
    };

    let result = state.purchase.handle(command).await?;

    let response = PurchaseResponse {
        subscription: SubscriptionResponse::from(&result.subscription),
        payment_id: result.payment.id.to_string(),
        payment_redirect_url: result.payment_redirect_url,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/payers/:payer_id/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(payer_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListSubscriptionsQuery {
        payer_id: parse_id("payer_id", &payer_id)?,
    };
    let subscriptions = state.list_subscriptions.handle(query).await?;

    Ok(Json(SubscriptionListResponse {
        subscriptions: subscriptions.iter().map(SubscriptionResponse::from).collect(),
    }))
}

/// GET /api/subscriptions/by-token/:token - Resolve a scanned code
pub async fn lookup_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .lookup_by_token
        .handle(LookupByTokenQuery { token })
        .await?;
    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// POST /api/subscriptions/:id/token - Issue a fresh code, invalidating the old one
pub async fn reissue_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ReissueTokenCommand {
        subscription_id: parse_id::<SubscriptionId>("subscription_id", &id)?,
    };
    let result = state.reissue_token.handle(command).await?;
    Ok(Json(SubscriptionResponse::from(&result.subscription)))
}

/// POST /api/subscriptions/:id/cancel - Support-initiated cancellation
pub async fn cancel_subscription(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CancelSubscriptionCommand {
        subscription_id: parse_id("subscription_id", &id)?,
        reason: CancelReason::Support,
    };
    let result = state.cancel_subscription.handle(command).await?;
    Ok(Json(CancelSubscriptionResponse {
        subscription: SubscriptionResponse::from(&result.subscription),
        cancelled: result.cancelled,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Templates
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/templates - Templates currently on sale
pub async fn list_templates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let templates = state.list_templates.handle().await?;
    Ok(Json(TemplateListResponse {
        templates: templates.iter().map(TemplateResponse::from).collect(),
    }))
}

/// POST /api/templates
pub async fn create_template(
    State(state): State<AppState>,
    staff: StaffUser,
    payload: Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let command = CreateTemplateCommand {
        name: request.name,
        tariff: request.tariff.try_into()?,
        price: request.price.try_into()?,
        created_by: staff.user_id,
    };
    let template = state.create_template.handle(command).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::from(&template))))
}

/// PUT /api/templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTemplateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let command = UpdateTemplateCommand {
        template_id: parse_id("template_id", &id)?,
        name: request.name,
        tariff: request.tariff.map(Tariff::try_from).transpose()?,
        price: request.price.map(Money::try_from).transpose()?,
    };
    let template = state.update_template.handle(command).await?;
    Ok(Json(TemplateResponse::from(&template)))
}

/// POST /api/templates/:id/deactivate
pub async fn deactivate_template(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let command = DeactivateTemplateCommand {
        template_id: parse_id("template_id", &id)?,
    };
    let template = state.deactivate_template.handle(command).await?;
    Ok(Json(TemplateResponse::from(&template)))
}
