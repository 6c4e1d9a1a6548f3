//! CancelSubscriptionHandler - Withdraws a subscription.
//!
//! The reason decides which statuses may be cancelled: payment failures
//! only withdraw subscriptions still waiting for payment, refunds only
//! withdraw active ones, support may withdraw either.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// Why a subscription is being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    PaymentFailed,
    PaymentCancelled,
    PaymentRefunded,
    Support,
}

impl CancelReason {
    fn applies_to(&self, status: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        match self {
            CancelReason::PaymentFailed | CancelReason::PaymentCancelled => {
                status == PendingPayment
            }
            CancelReason::PaymentRefunded => status == Active,
            CancelReason::Support => matches!(status, PendingPayment | Active),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::PaymentFailed => "payment_failed",
            CancelReason::PaymentCancelled => "payment_cancelled",
            CancelReason::PaymentRefunded => "payment_refunded",
            CancelReason::Support => "support",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub reason: CancelReason,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
    /// False when there was nothing to do for this reason.
    pub cancelled: bool,
}

pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl CancelSubscriptionHandler {
    const MAX_ATTEMPTS: usize = 3;

    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, SubscriptionError> {
        for _ in 0..Self::MAX_ATTEMPTS {
            let mut subscription = self
                .subscriptions
                .find_by_id(&cmd.subscription_id)
                .await?
                .ok_or_else(|| SubscriptionError::not_found(cmd.subscription_id))?;

            if subscription.status == SubscriptionStatus::Cancelled {
                return Ok(CancelSubscriptionResult {
                    subscription,
                    cancelled: false,
                });
            }
            if !cmd.reason.applies_to(subscription.status) {
                if cmd.reason == CancelReason::Support {
                    return Err(SubscriptionError::invalid_state(
                        subscription.status.as_str(),
                        "cancel",
                    ));
                }
                return Ok(CancelSubscriptionResult {
                    subscription,
                    cancelled: false,
                });
            }

            let expected = subscription.status;
            subscription.cancel()?;
            if self
                .subscriptions
                .update_status_if(&subscription, expected)
                .await?
            {
                info!(
                    subscription_id = %subscription.id,
                    reason = cmd.reason.as_str(),
                    "Subscription cancelled"
                );
                return Ok(CancelSubscriptionResult {
                    subscription,
                    cancelled: true,
                });
            }
            // Status moved underneath us (e.g. a redemption expired it); re-read.
        }

        Err(SubscriptionError::infrastructure(
            "subscription status kept changing during cancellation",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::application::handlers::test_support::pending_subscription;

    async fn stored(status: SubscriptionStatus) -> (Arc<InMemorySubscriptionRepository>, Subscription) {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let mut sub = pending_subscription(3);
        repo.save(&sub).await.unwrap();
        if status == SubscriptionStatus::Active {
            sub.activate().unwrap();
            repo.update_status_if(&sub, SubscriptionStatus::PendingPayment)
                .await
                .unwrap();
        }
        (repo, sub)
    }

    fn cmd(sub: &Subscription, reason: CancelReason) -> CancelSubscriptionCommand {
        CancelSubscriptionCommand {
            subscription_id: sub.id,
            reason,
        }
    }

    #[tokio::test]
    async fn payment_failure_cancels_pending() {
        let (repo, sub) = stored(SubscriptionStatus::PendingPayment).await;
        let result = CancelSubscriptionHandler::new(repo.clone())
            .handle(cmd(&sub, CancelReason::PaymentFailed))
            .await
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(
            repo.find_by_id(&sub.id).await.unwrap().unwrap().status,
            SubscriptionStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn payment_failure_leaves_active_alone() {
        let (repo, sub) = stored(SubscriptionStatus::Active).await;
        let result = CancelSubscriptionHandler::new(repo.clone())
            .handle(cmd(&sub, CancelReason::PaymentFailed))
            .await
            .unwrap();
        assert!(!result.cancelled);
        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn refund_cancels_active() {
        let (repo, sub) = stored(SubscriptionStatus::Active).await;
        let result = CancelSubscriptionHandler::new(repo)
            .handle(cmd(&sub, CancelReason::PaymentRefunded))
            .await
            .unwrap();
        assert!(result.cancelled);
    }

    #[tokio::test]
    async fn cancelling_twice_is_a_no_op() {
        let (repo, sub) = stored(SubscriptionStatus::Active).await;
        let handler = CancelSubscriptionHandler::new(repo);
        assert!(handler.handle(cmd(&sub, CancelReason::Support)).await.unwrap().cancelled);
        assert!(!handler.handle(cmd(&sub, CancelReason::Support)).await.unwrap().cancelled);
    }

    #[tokio::test]
    async fn support_cannot_cancel_expired() {
        let (repo, sub) = stored(SubscriptionStatus::Active).await;
        for _ in 0..3 {
            repo.redeem_credit(&sub.id).await.unwrap();
        }

        let err = CancelSubscriptionHandler::new(repo)
            .handle(cmd(&sub, CancelReason::Support))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidState { .. }));
    }
}
