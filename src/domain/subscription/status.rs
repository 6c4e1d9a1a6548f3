//! Subscription status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of an issued subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Issued, awaiting payment settlement. Token does not redeem yet.
    PendingPayment,

    /// Paid and redeemable.
    Active,

    /// All credits consumed.
    Expired,

    /// Withdrawn (failed/cancelled/refunded payment, or support action).
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns true if the token may be redeemed.
    pub fn is_redeemable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Stable lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::PendingPayment => "pending_payment",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(SubscriptionStatus::PendingPayment),
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (PendingPayment, Active)
                | (PendingPayment, Cancelled)
                | (Active, Expired)
                | (Active, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            PendingPayment => vec![Active, Cancelled],
            Active => vec![Expired, Cancelled],
            Expired => vec![],
            Cancelled => vec![],
        }
    }
}
