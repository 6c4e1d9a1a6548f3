//! HTTP handler for redemption.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::redemption::RedeemVisitCommand;
use crate::domain::foundation::LessonId;

use super::dto::{RedeemRequest, VisitResponse};
use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::state::AppState;

/// POST /api/redemptions - Redeem a scanned code at a location
pub async fn redeem(
    State(state): State<AppState>,
    payload: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let command = RedeemVisitCommand {
        token: request.token,
        location_id: parse_id("location_id", &request.location_id)?,
        lesson_id: request
            .lesson_id
            .as_deref()
            .map(|raw| parse_id::<LessonId>("lesson_id", raw))
            .transpose()?,
    };

    let result = state.redeem.handle(command).await?;
    Ok((StatusCode::CREATED, Json(VisitResponse::from(&result))))
}
