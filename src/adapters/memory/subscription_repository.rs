//! In-memory subscription repository.
//!
//! Every operation takes the write lock for its whole duration, which gives
//! the same atomicity the conditional SQL updates give in PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    DomainError, ErrorCode, PayerId, StateMachine, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{
    RedemptionToken, Subscription, SubscriptionError, SubscriptionStatus,
};
use crate::ports::{CreditOutcome, SubscriptionRepository};

/// In-memory implementation of `SubscriptionRepository`.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions.
    pub async fn len(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscriptions.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Subscription {} already exists", subscription.id),
            ));
        }
        if subscriptions
            .values()
            .any(|s| s.token == subscription.token)
        {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                "Redemption token already in use",
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.subscriptions.read().await.get(id).cloned())
    }

    async fn find_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| &s.token == token)
            .cloned())
    }

    async fn find_active_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| &s.token == token && s.status == SubscriptionStatus::Active)
            .cloned())
    }

    async fn list_by_payer(&self, payer_id: &PayerId) -> Result<Vec<Subscription>, DomainError> {
        let mut list: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| &s.payer_id == payer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn redeem_credit(&self, id: &SubscriptionId) -> Result<CreditOutcome, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let Some(subscription) = subscriptions.get_mut(id) else {
            return Ok(CreditOutcome::NotActive);
        };
        if subscription.status == SubscriptionStatus::Expired {
            return Ok(CreditOutcome::Exhausted);
        }

        match subscription.redeem_credit() {
            Ok(redemption) => Ok(CreditOutcome::Redeemed(redemption)),
            Err(SubscriptionError::Exhausted(_)) => Ok(CreditOutcome::Exhausted),
            Err(SubscriptionError::InvalidState { .. }) => Ok(CreditOutcome::NotActive),
            Err(other) => Err(other.into()),
        }
    }

    async fn replace_token(
        &self,
        id: &SubscriptionId,
        token: &RedemptionToken,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.values().any(|s| &s.token == token) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                "Redemption token already in use",
            ));
        }
        let Some(subscription) = subscriptions.get_mut(id) else {
            return Ok(false);
        };
        if subscription.status.is_terminal() {
            return Ok(false);
        }
        subscription.token = token.clone();
        subscription.updated_at = Timestamp::now();
        Ok(true)
    }

    async fn update_status_if(
        &self,
        subscription: &Subscription,
        expected: SubscriptionStatus,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let Some(stored) = subscriptions.get_mut(&subscription.id) else {
            return Ok(false);
        };
        if stored.status != expected {
            return Ok(false);
        }
        stored.status = subscription.status;
        stored.activated_at = subscription.activated_at;
        stored.updated_at = subscription.updated_at;
        Ok(true)
    }
}
