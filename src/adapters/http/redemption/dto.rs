//! HTTP DTOs for redemption.

use serde::{Deserialize, Serialize};

use crate::adapters::http::subscription::dto::iso;
use crate::application::handlers::redemption::RedeemVisitResult;
use crate::domain::subscription::SubscriptionStatus;

/// A scan at a kiosk.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemRequest {
    pub token: String,
    pub location_id: String,
    #[serde(default)]
    pub lesson_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitResponse {
    pub visit_id: String,
    pub subscription_id: String,
    pub payer_id: String,
    pub dependent_id: Option<String>,
    pub location_id: String,
    pub lesson_id: Option<String>,
    pub visited_at: String,
    /// `null` for unlimited tariffs.
    pub remaining_credits: Option<u32>,
    pub subscription_status: SubscriptionStatus,
}

impl From<&RedeemVisitResult> for VisitResponse {
    fn from(result: &RedeemVisitResult) -> Self {
        let visit = &result.visit;
        Self {
            visit_id: visit.id.to_string(),
            subscription_id: visit.subscription_id.to_string(),
            payer_id: visit.payer_id.to_string(),
            dependent_id: visit.dependent_id.map(|id| id.to_string()),
            location_id: visit.location_id.to_string(),
            lesson_id: visit.lesson_id.map(|id| id.to_string()),
            visited_at: iso(&visit.visited_at),
            remaining_credits: result.remaining_credits,
            subscription_status: result.subscription_status,
        }
    }
}
