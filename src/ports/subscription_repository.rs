//! Subscription repository port.
//!
//! # Concurrency
//!
//! `redeem_credit` and `replace_token` are single conditional updates in the
//! store. They stay correct when several service instances share one database,
//! independent of any in-process locking.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PayerId, SubscriptionId};
use crate::domain::subscription::{
    CreditRedemption, RedemptionToken, Subscription, SubscriptionStatus,
};

/// Outcome of the store-level credit decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// One credit consumed (or none needed, for unlimited tariffs).
    Redeemed(CreditRedemption),

    /// Finite and out of credits, including subscriptions already expired
    /// by their last redemption.
    Exhausted,

    /// Missing, or not in the active state.
    NotActive,
}

/// Repository port for Subscription aggregates.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new subscription.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Resolves a token regardless of status.
    async fn find_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Resolves a token. Only active subscriptions are returned.
    async fn find_active_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError>;

    /// All subscriptions of a payer, newest first.
    async fn list_by_payer(&self, payer_id: &PayerId) -> Result<Vec<Subscription>, DomainError>;

    /// Consumes one credit with a conditional update
    /// (`remaining = remaining - 1 WHERE status = 'active' AND remaining > 0`),
    /// expiring the subscription when the last credit goes.
    async fn redeem_credit(&self, id: &SubscriptionId) -> Result<CreditOutcome, DomainError>;

    /// Swaps the token in one write. Returns `false` if the subscription is
    /// missing or no longer pending/active.
    async fn replace_token(
        &self,
        id: &SubscriptionId,
        token: &RedemptionToken,
    ) -> Result<bool, DomainError>;

    /// Writes status, `activated_at` and `updated_at` from `subscription` if
    /// the stored status equals `expected`. Credit counters are never touched.
    async fn update_status_if(
        &self,
        subscription: &Subscription,
        expected: SubscriptionStatus,
    ) -> Result<bool, DomainError>;
}
