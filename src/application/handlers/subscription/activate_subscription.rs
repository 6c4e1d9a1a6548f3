//! ActivateSubscriptionHandler - Payment-gated activation.
//!
//! Invoked by the payment ledger when a payment settles. Idempotent: an
//! already active subscription is left alone and reported as unchanged.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct ActivateSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Clone)]
pub struct ActivateSubscriptionResult {
    pub subscription: Subscription,
    /// False when the subscription was already active.
    pub activated: bool,
}

pub struct ActivateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ActivateSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<ActivateSubscriptionResult, SubscriptionError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| SubscriptionError::not_found(cmd.subscription_id))?;

        if !subscription.activate()? {
            return Ok(ActivateSubscriptionResult {
                subscription,
                activated: false,
            });
        }

        if !self
            .subscriptions
            .update_status_if(&subscription, SubscriptionStatus::PendingPayment)
            .await?
        {
            // Someone else moved it first; report what they left behind.
            let current = self
                .subscriptions
                .find_by_id(&cmd.subscription_id)
                .await?
                .ok_or_else(|| SubscriptionError::not_found(cmd.subscription_id))?;
            if current.status == SubscriptionStatus::Active {
                return Ok(ActivateSubscriptionResult {
                    subscription: current,
                    activated: false,
                });
            }
            return Err(SubscriptionError::invalid_state(
                current.status.as_str(),
                "activate",
            ));
        }

        info!(subscription_id = %subscription.id, "Subscription activated");
        Ok(ActivateSubscriptionResult {
            subscription,
            activated: true,
        })
    }

    /// Activates only while the subscription still awaits payment.
    ///
    /// Returns `None` for an unknown subscription or one that has already
    /// left PENDING_PAYMENT, so a settled payment can retry this freely.
    pub async fn activate_if_pending(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<Option<ActivateSubscriptionResult>, SubscriptionError> {
        let awaiting = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .is_some_and(|s| s.status == SubscriptionStatus::PendingPayment);
        if !awaiting {
            return Ok(None);
        }
        self.handle(cmd).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::application::handlers::test_support::pending_subscription;

    #[tokio::test]
    async fn activates_pending_subscription_once() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let sub = pending_subscription(5);
        repo.save(&sub).await.unwrap();
        let handler = ActivateSubscriptionHandler::new(repo.clone());

        let first = handler
            .handle(ActivateSubscriptionCommand { subscription_id: sub.id })
            .await
            .unwrap();
        assert!(first.activated);
        assert_eq!(first.subscription.status, SubscriptionStatus::Active);
        assert!(first.subscription.activated_at.is_some());

        let second = handler
            .handle(ActivateSubscriptionCommand { subscription_id: sub.id })
            .await
            .unwrap();
        assert!(!second.activated);
        assert_eq!(second.subscription.remaining_credits, Some(5));
    }

    #[tokio::test]
    async fn cancelled_subscription_cannot_be_activated() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let mut sub = pending_subscription(5);
        repo.save(&sub).await.unwrap();
        sub.cancel().unwrap();
        repo.update_status_if(&sub, SubscriptionStatus::PendingPayment)
            .await
            .unwrap();

        let err = ActivateSubscriptionHandler::new(repo)
            .handle(ActivateSubscriptionCommand { subscription_id: sub.id })
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn activate_if_pending_skips_settled_and_unknown() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = ActivateSubscriptionHandler::new(repo.clone());

        let unknown = handler
            .activate_if_pending(ActivateSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
            })
            .await
            .unwrap();
        assert!(unknown.is_none());

        let mut cancelled = pending_subscription(3);
        repo.save(&cancelled).await.unwrap();
        cancelled.cancel().unwrap();
        repo.update_status_if(&cancelled, SubscriptionStatus::PendingPayment)
            .await
            .unwrap();
        let skipped = handler
            .activate_if_pending(ActivateSubscriptionCommand {
                subscription_id: cancelled.id,
            })
            .await
            .unwrap();
        assert!(skipped.is_none());

        let sub = pending_subscription(3);
        repo.save(&sub).await.unwrap();
        let activated = handler
            .activate_if_pending(ActivateSubscriptionCommand { subscription_id: sub.id })
            .await
            .unwrap()
            .unwrap();
        assert!(activated.activated);
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let err = ActivateSubscriptionHandler::new(repo)
            .handle(ActivateSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::NotFound(_)));
    }
}
