//! Subscription aggregate entity.
//!
//! A Subscription is an issued, redeemable instance of a template bound to a
//! payer. It carries its own snapshot of the template terms so that later
//! catalog edits never change what was sold.
//!
//! # Design Decisions
//!
//! - **Payment-gated**: instantiation persists `PendingPayment`; the payment
//!   ledger activates on settlement
//! - **Credits only move down**: `remaining_credits` is mutated by redemption
//!   alone and flips the status to `Expired` on reaching zero
//! - **Unlimited has no accounting**: both credit fields are `None`

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DependentId, Money, PayerId, StateMachine, SubscriptionId, TemplateId, Timestamp,
};

use super::{RedemptionToken, SubscriptionError, SubscriptionStatus, SubscriptionTemplate, Tariff};

/// Subscription aggregate.
///
/// # Invariants
///
/// - `total_credits` and `remaining_credits` are both `Some` for finite
///   tariffs and both `None` for unlimited ones
/// - `remaining_credits <= total_credits`
/// - `status == Expired` iff a finite subscription reached zero credits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub payer_id: PayerId,
    pub dependent_id: Option<DependentId>,

    /// Template the subscription was bought from (audit only).
    pub template_id: TemplateId,

    /// Template name at purchase time.
    pub template_name: String,

    /// Tariff at purchase time.
    pub tariff: Tariff,

    /// Price at purchase time.
    pub price: Money,

    pub total_credits: Option<u32>,
    pub remaining_credits: Option<u32>,
    pub token: RedemptionToken,
    pub status: SubscriptionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub activated_at: Option<Timestamp>,
}

/// Result of consuming one credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRedemption {
    /// Credits left after the redemption; `None` for unlimited tariffs.
    pub remaining: Option<u32>,

    /// Status after the redemption.
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// Issues a new subscription from a template, awaiting payment.
    ///
    /// # Errors
    ///
    /// `TemplateInactive` if the template is no longer on sale.
    pub fn instantiate(
        template: &SubscriptionTemplate,
        payer_id: PayerId,
        dependent_id: Option<DependentId>,
    ) -> Result<Self, SubscriptionError> {
        if !template.is_active() {
            return Err(SubscriptionError::template_inactive(template.id));
        }

        let credits = template.tariff.credits();
        let now = Timestamp::now();
        Ok(Self {
            id: SubscriptionId::new(),
            payer_id,
            dependent_id,
            template_id: template.id,
            template_name: template.name.clone(),
            tariff: template.tariff,
            price: template.price.clone(),
            total_credits: credits,
            remaining_credits: credits,
            token: RedemptionToken::generate(),
            status: SubscriptionStatus::PendingPayment,
            created_at: now,
            updated_at: now,
            activated_at: None,
        })
    }

    /// Activates after payment settlement.
    ///
    /// Returns `false` when the subscription was already active.
    pub fn activate(&mut self) -> Result<bool, SubscriptionError> {
        if self.status == SubscriptionStatus::Active {
            return Ok(false);
        }
        self.transition_to(SubscriptionStatus::Active, "activate")?;
        self.activated_at = Some(self.updated_at);
        Ok(true)
    }

    /// Consumes one credit.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the subscription is not active
    /// - `Exhausted` if a finite subscription has no credits left
    pub fn redeem_credit(&mut self) -> Result<CreditRedemption, SubscriptionError> {
        if !self.status.is_redeemable() {
            return Err(SubscriptionError::invalid_state(self.status.as_str(), "redeem"));
        }

        let Some(remaining) = self.remaining_credits else {
            return Ok(CreditRedemption {
                remaining: None,
                status: self.status,
            });
        };

        if remaining == 0 {
            return Err(SubscriptionError::exhausted(self.id));
        }

        let left = remaining - 1;
        self.remaining_credits = Some(left);
        self.updated_at = Timestamp::now();
        if left == 0 {
            self.transition_to(SubscriptionStatus::Expired, "expire")?;
        }

        Ok(CreditRedemption {
            remaining: Some(left),
            status: self.status,
        })
    }

    /// Withdraws the subscription.
    ///
    /// Returns `false` when it was already cancelled.
    pub fn cancel(&mut self) -> Result<bool, SubscriptionError> {
        if self.status == SubscriptionStatus::Cancelled {
            return Ok(false);
        }
        self.transition_to(SubscriptionStatus::Cancelled, "cancel")?;
        Ok(true)
    }

    /// Replaces the redemption token, returning the new one.
    pub fn reissue_token(&mut self) -> Result<RedemptionToken, SubscriptionError> {
        if self.status.is_terminal() {
            return Err(SubscriptionError::invalid_state(
                self.status.as_str(),
                "reissue token for",
            ));
        }
        self.token = RedemptionToken::generate();
        self.updated_at = Timestamp::now();
        Ok(self.token.clone())
    }

    pub fn is_redeemable(&self) -> bool {
        self.status.is_redeemable()
    }

    fn transition_to(
        &mut self,
        target: SubscriptionStatus,
        attempted: &str,
    ) -> Result<(), SubscriptionError> {
        let current = self.status;
        self.status = current
            .transition_to(target)
            .map_err(|_| SubscriptionError::invalid_state(current.as_str(), attempted))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
