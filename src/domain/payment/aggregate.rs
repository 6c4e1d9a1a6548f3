//! Payment aggregate entity.
//!
//! A Payment is a charge collected through the external gateway. The gateway
//! alone knows whether the payer completed it, so after creation the status
//! only moves when reconciliation observes a provider status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PayerId, PaymentId, StateMachine, SubscriptionId, Timestamp};

use super::{PaymentError, PaymentStatus};

/// Payment aggregate.
///
/// # Invariants
///
/// - `amount` is strictly positive
/// - `external_id` is set whenever status is past `New`, except when the
///   gateway refused creation
/// - `Refunded` is only reached from `Succeeded`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub payer_id: PayerId,
    pub subscription_id: Option<SubscriptionId>,
    pub amount: Money,
    pub description: String,
    pub status: PaymentStatus,

    /// Provider's correlation id.
    pub external_id: Option<String>,

    /// Where the payer completes the payment.
    pub redirect_url: Option<String>,

    /// Last error code reported by the provider.
    pub last_error_code: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a new local payment, not yet sent to the gateway.
    pub fn new(
        payer_id: PayerId,
        amount: Money,
        description: impl Into<String>,
        subscription_id: Option<SubscriptionId>,
    ) -> Result<Self, PaymentError> {
        if amount.is_zero() {
            return Err(PaymentError::validation("amount", "must be positive"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: PaymentId::new(),
            payer_id,
            subscription_id,
            amount,
            description: description.into(),
            status: PaymentStatus::New,
            external_id: None,
            redirect_url: None,
            last_error_code: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Records gateway acceptance.
    pub fn mark_pending(
        &mut self,
        external_id: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<(), PaymentError> {
        self.advance_to(PaymentStatus::Pending)?;
        self.external_id = Some(external_id.into());
        self.redirect_url = Some(redirect_url.into());
        Ok(())
    }

    /// Records a provider failure, keeping the provider's error code.
    pub fn mark_failed(&mut self, error_code: Option<String>) -> Result<(), PaymentError> {
        self.advance_to(PaymentStatus::Failed)?;
        if error_code.is_some() {
            self.last_error_code = error_code;
        }
        Ok(())
    }

    /// Withdraws an unsettled payment.
    ///
    /// Returns `false` if the payment was already cancelled.
    pub fn cancel(&mut self) -> Result<bool, PaymentError> {
        if self.status == PaymentStatus::Cancelled {
            return Ok(false);
        }
        if !self.status.can_transition_to(&PaymentStatus::Cancelled) {
            return Err(PaymentError::not_cancellable(self.status));
        }
        self.advance_to(PaymentStatus::Cancelled)?;
        Ok(true)
    }

    /// Moves to `target` if the state machine allows it.
    pub fn advance_to(&mut self, target: PaymentStatus) -> Result<(), PaymentError> {
        let current = self.status;
        self.status = current
            .transition_to(target)
            .map_err(|_| PaymentError::invalid_state(current.as_str(), format!("move to {}", target)))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Gateway idempotency key for this payment.
    pub fn invoice_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;

    fn payment() -> Payment {
        Payment::new(
            PayerId::new(),
            Money::new(28000, Currency::new("RUB").unwrap()).unwrap(),
            "8 lessons",
            Some(SubscriptionId::new()),
        )
        .unwrap()
    }

    #[test]
    fn new_payment_starts_new() {
        let p = payment();
        assert_eq!(p.status, PaymentStatus::New);
        assert!(p.external_id.is_none());
        assert_eq!(p.invoice_id(), p.id.to_string());
    }

    #[test]
    fn zero_amount_rejected() {
        let err = Payment::new(
            PayerId::new(),
            Money::zero(Currency::new("RUB").unwrap()),
            "free",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::ValidationFailed { .. }));
    }

    #[test]
    fn mark_pending_stores_gateway_refs() {
        let mut p = payment();
        p.mark_pending("ext-1", "https://pay.example/ext-1").unwrap();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.external_id.as_deref(), Some("ext-1"));
        assert_eq!(p.redirect_url.as_deref(), Some("https://pay.example/ext-1"));
    }

    #[test]
    fn mark_failed_keeps_error_code() {
        let mut p = payment();
        p.mark_failed(Some("INSUFFICIENT_FUNDS".into())).unwrap();
        assert_eq!(p.status, PaymentStatus::Failed);
        assert_eq!(p.last_error_code.as_deref(), Some("INSUFFICIENT_FUNDS"));
    }

    #[test]
    fn cancel_succeeded_is_rejected() {
        let mut p = payment();
        p.mark_pending("ext-1", "url").unwrap();
        p.advance_to(PaymentStatus::Succeeded).unwrap();
        assert_eq!(
            p.cancel().unwrap_err(),
            PaymentError::NotCancellable(PaymentStatus::Succeeded)
        );
    }

    #[test]
    fn cancel_twice_is_noop() {
        let mut p = payment();
        assert!(p.cancel().unwrap());
        assert!(!p.cancel().unwrap());
    }

    #[test]
    fn advance_rejects_invalid_transition() {
        let mut p = payment();
        assert!(matches!(
            p.advance_to(PaymentStatus::Refunded),
            Err(PaymentError::InvalidState { .. })
        ));
        assert_eq!(p.status, PaymentStatus::New);
    }
}
