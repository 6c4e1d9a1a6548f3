//! Visit - append-only audit record of a redemption.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DependentId, LessonId, LocationId, PayerId, SubscriptionId, Timestamp, ValidationError,
    VisitId,
};
use crate::domain::subscription::Subscription;

/// One redemption at a location. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub subscription_id: SubscriptionId,
    pub payer_id: PayerId,
    pub dependent_id: Option<DependentId>,
    pub location_id: LocationId,
    pub lesson_id: Option<LessonId>,
    pub visited_at: Timestamp,
}

impl Visit {
    /// Records a visit against `subscription` at `location_id`.
    pub fn record(
        subscription: &Subscription,
        location_id: LocationId,
        lesson_id: Option<LessonId>,
        visited_at: Timestamp,
    ) -> Self {
        Self {
            id: VisitId::new(),
            subscription_id: subscription.id,
            payer_id: subscription.payer_id,
            dependent_id: subscription.dependent_id,
            location_id,
            lesson_id,
            visited_at,
        }
    }
}

/// Interval within which a second scan at the same location is treated as
/// an accidental duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateWindow(Duration);

impl DuplicateWindow {
    /// Largest accepted window (one day).
    pub const MAX_SECS: i64 = 86_400;

    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        if !(0..=Self::MAX_SECS).contains(&secs) {
            return Err(ValidationError::out_of_range(
                "duplicate_window_secs",
                0,
                Self::MAX_SECS,
                secs,
            ));
        }
        Ok(Self(Duration::seconds(secs)))
    }

    /// Earliest visit time that still counts as a duplicate at `now`.
    pub fn start_at(&self, now: Timestamp) -> Timestamp {
        now.minus(self.0)
    }

    /// Returns true if a visit at `previous` blocks a redemption at `now`.
    pub fn blocks(&self, previous: Timestamp, now: Timestamp) -> bool {
        now.duration_since(&previous) < self.0
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for DuplicateWindow {
    fn default() -> Self {
        Self(Duration::minutes(5))
    }
}
