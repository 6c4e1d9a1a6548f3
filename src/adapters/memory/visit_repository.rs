//! In-memory visit ledger.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, LocationId, SubscriptionId, Timestamp};
use crate::domain::redemption::Visit;
use crate::ports::VisitRepository;

#[derive(Default)]
pub struct InMemoryVisitRepository {
    visits: RwLock<Vec<Visit>>,
}

impl InMemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.visits.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.visits.read().await.is_empty()
    }
}

#[async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn append(&self, visit: &Visit) -> Result<(), DomainError> {
        self.visits.write().await.push(visit.clone());
        Ok(())
    }

    async fn find_latest_at(
        &self,
        subscription_id: &SubscriptionId,
        location_id: &LocationId,
        since: Timestamp,
    ) -> Result<Option<Visit>, DomainError> {
        Ok(self
            .visits
            .read()
            .await
            .iter()
            .filter(|v| {
                &v.subscription_id == subscription_id
                    && &v.location_id == location_id
                    && v.visited_at >= since
            })
            .max_by_key(|v| v.visited_at)
            .cloned())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Visit>, DomainError> {
        let mut visits: Vec<Visit> = self
            .visits
            .read()
            .await
            .iter()
            .filter(|v| &v.subscription_id == subscription_id)
            .cloned()
            .collect();
        visits.sort_by_key(|v| v.visited_at);
        Ok(visits)
    }
}
