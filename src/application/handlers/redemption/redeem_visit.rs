//! RedeemVisitHandler - The redemption guard run when a code is scanned.
//!
//! 1. Resolve the token
//! 2. Reject a repeat scan at the same location inside the duplicate window
//! 3. Consume a credit (conditional update in the store)
//! 4. Append the visit
//!
//! Steps 2-4 hold a per-subscription lock, so two kiosks scanning the same
//! code at once cannot both pass the duplicate check.

use std::sync::Arc;

use tracing::{error, info};

use crate::application::KeyedLocks;
use crate::domain::foundation::{LessonId, LocationId, SubscriptionId};
use crate::domain::redemption::{DuplicateWindow, RedemptionError, Visit};
use crate::domain::subscription::{RedemptionToken, SubscriptionStatus};
use crate::ports::{Clock, CreditOutcome, SubscriptionRepository, VisitRepository};

#[derive(Debug, Clone)]
pub struct RedeemVisitCommand {
    /// Raw scanned value.
    pub token: String,
    pub location_id: LocationId,
    pub lesson_id: Option<LessonId>,
}

#[derive(Debug, Clone)]
pub struct RedeemVisitResult {
    pub visit: Visit,
    /// Credits left; `None` for unlimited tariffs.
    pub remaining_credits: Option<u32>,
    pub subscription_status: SubscriptionStatus,
}

pub struct RedeemVisitHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    visits: Arc<dyn VisitRepository>,
    clock: Arc<dyn Clock>,
    window: DuplicateWindow,
    locks: KeyedLocks<SubscriptionId>,
}

impl RedeemVisitHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        visits: Arc<dyn VisitRepository>,
        clock: Arc<dyn Clock>,
        window: DuplicateWindow,
    ) -> Self {
        Self {
            subscriptions,
            visits,
            clock,
            window,
            locks: KeyedLocks::new(),
        }
    }

    /// # Errors
    ///
    /// - `InvalidToken` for unknown, pending or cancelled subscriptions
    /// - `CreditsExhausted` once a finite subscription is used up
    /// - `DuplicateRedemption` for a repeat scan inside the window
    pub async fn handle(&self, cmd: RedeemVisitCommand) -> Result<RedeemVisitResult, RedemptionError> {
        let token = RedemptionToken::parse(&cmd.token).map_err(|_| RedemptionError::invalid_token())?;

        let subscription = self
            .subscriptions
            .find_by_token(&token)
            .await?
            .ok_or_else(RedemptionError::invalid_token)?;
        match subscription.status {
            SubscriptionStatus::Active => {}
            SubscriptionStatus::Expired => {
                return Err(RedemptionError::credits_exhausted(subscription.id))
            }
            SubscriptionStatus::PendingPayment | SubscriptionStatus::Cancelled => {
                return Err(RedemptionError::invalid_token())
            }
        }

        let _guard = self.locks.acquire(&subscription.id).await;
        let now = self.clock.now();

        if let Some(previous) = self
            .visits
            .find_latest_at(&subscription.id, &cmd.location_id, self.window.start_at(now))
            .await?
        {
            if self.window.blocks(previous.visited_at, now) {
                return Err(RedemptionError::duplicate(
                    subscription.id,
                    cmd.location_id,
                    previous.visited_at,
                ));
            }
        }

        let redemption = match self.subscriptions.redeem_credit(&subscription.id).await? {
            CreditOutcome::Redeemed(redemption) => redemption,
            CreditOutcome::Exhausted => {
                return Err(RedemptionError::credits_exhausted(subscription.id))
            }
            CreditOutcome::NotActive => return Err(RedemptionError::invalid_token()),
        };

        let visit = Visit::record(&subscription, cmd.location_id, cmd.lesson_id, now);
        if let Err(e) = self.visits.append(&visit).await {
            // The credit stays consumed.
            error!(
                subscription_id = %subscription.id,
                location_id = %cmd.location_id,
                error = %e,
                "Credit redeemed but visit not recorded"
            );
            return Err(e.into());
        }

        info!(
            subscription_id = %subscription.id,
            location_id = %cmd.location_id,
            remaining = ?redemption.remaining,
            "Visit redeemed"
        );
        Ok(RedeemVisitResult {
            visit,
            remaining_credits: redemption.remaining,
            subscription_status: redemption.status,
        })
    }
}
