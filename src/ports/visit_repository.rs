//! Visit repository port. Append-only.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LocationId, SubscriptionId, Timestamp};
use crate::domain::redemption::Visit;

#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn append(&self, visit: &Visit) -> Result<(), DomainError>;

    /// Most recent visit for (subscription, location) at or after `since`.
    async fn find_latest_at(
        &self,
        subscription_id: &SubscriptionId,
        location_id: &LocationId,
        since: Timestamp,
    ) -> Result<Option<Visit>, DomainError>;

    /// All visits for a subscription, oldest first.
    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Visit>, DomainError>;
}
