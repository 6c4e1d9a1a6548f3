//! Payment status state machine.
//!
//! ```text
//! NEW ──> PENDING ──> PROCESSING ──> SUCCEEDED ──> REFUNDED
//!  │         │  │          │    └──> FAILED
//!  │         │  └──> SUCCEEDED / FAILED
//!  ├──> FAILED (gateway refused creation)
//!  └──> CANCELLED <── PENDING, PROCESSING
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Persisted locally, not yet accepted by the gateway.
    New,

    /// Accepted by the gateway; awaiting payer action.
    Pending,

    /// Provider reported authorisation; awaiting final capture.
    Processing,

    /// Settled.
    Succeeded,

    /// Declined or refused by the provider.
    Failed,

    /// Withdrawn before settlement.
    Cancelled,

    /// Fully refunded after settlement.
    Refunded,
}

impl PaymentStatus {
    /// Returns true while the gateway alone knows the outcome.
    pub fn is_awaiting_settlement(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::New => "new",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(PaymentStatus::New),
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "succeeded" => Some(PaymentStatus::Succeeded),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (New, Pending)
                | (New, Failed)
                | (New, Cancelled)
                | (Pending, Processing)
                | (Pending, Succeeded)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Succeeded)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Succeeded, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            New => vec![Pending, Failed, Cancelled],
            Pending => vec![Processing, Succeeded, Failed, Cancelled],
            Processing => vec![Succeeded, Failed, Cancelled],
            Succeeded => vec![Refunded],
            Failed | Cancelled | Refunded => vec![],
        }
    }
}
