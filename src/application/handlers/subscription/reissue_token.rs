//! ReissueTokenHandler - Support workflow replacing a lost or leaked code.
//!
//! The store swaps the token in a single write, so the old token stops
//! resolving in the same moment the new one starts.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{RedemptionToken, Subscription, SubscriptionError};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct ReissueTokenCommand {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Clone)]
pub struct ReissueTokenResult {
    pub subscription: Subscription,
    pub token: RedemptionToken,
}

pub struct ReissueTokenHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ReissueTokenHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: ReissueTokenCommand,
    ) -> Result<ReissueTokenResult, SubscriptionError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| SubscriptionError::not_found(cmd.subscription_id))?;

        let token = subscription.reissue_token()?;

        if !self
            .subscriptions
            .replace_token(&subscription.id, &token)
            .await?
        {
            return Err(SubscriptionError::invalid_state(
                "terminal",
                "reissue token for",
            ));
        }

        info!(subscription_id = %subscription.id, "Redemption token reissued");
        Ok(ReissueTokenResult {
            subscription,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::application::handlers::test_support::active_subscription;
    use crate::domain::subscription::SubscriptionStatus;

    #[tokio::test]
    async fn old_token_stops_resolving() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let sub = active_subscription(&repo, 4).await;

        let result = ReissueTokenHandler::new(repo.clone())
            .handle(ReissueTokenCommand {
                subscription_id: sub.id,
            })
            .await
            .unwrap();

        assert_ne!(result.token, sub.token);
        assert!(repo.find_active_by_token(&sub.token).await.unwrap().is_none());
        let resolved = repo.find_active_by_token(&result.token).await.unwrap().unwrap();
        assert_eq!(resolved.id, sub.id);
    }

    #[tokio::test]
    async fn cancelled_subscription_keeps_its_token() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let mut sub = active_subscription(&repo, 4).await;
        sub.cancel().unwrap();
        repo.update_status_if(&sub, SubscriptionStatus::Active)
            .await
            .unwrap();

        let err = ReissueTokenHandler::new(repo.clone())
            .handle(ReissueTokenCommand {
                subscription_id: sub.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidState { .. }));
        assert_eq!(
            repo.find_by_id(&sub.id).await.unwrap().unwrap().token,
            sub.token
        );
    }
}
