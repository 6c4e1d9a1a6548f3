//! Payment refunds - append-only records against a settled payment.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Money, PaymentId, RefundId, Timestamp};

/// Outcome of a refund as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RefundStatus {
    /// Failed refunds return nothing to the payer and do not reduce the balance.
    pub fn counts_against_balance(&self) -> bool {
        !matches!(self, RefundStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Succeeded => "succeeded",
            RefundStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RefundStatus::Pending),
            "succeeded" => Some(RefundStatus::Succeeded),
            "failed" => Some(RefundStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single refund against a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefund {
    pub id: RefundId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub external_refund_id: Option<String>,
    pub reason: Option<String>,
    pub status: RefundStatus,
    pub created_at: Timestamp,
}

impl PaymentRefund {
    pub fn new(
        payment_id: PaymentId,
        amount: Money,
        external_refund_id: Option<String>,
        reason: Option<String>,
        status: RefundStatus,
    ) -> Self {
        Self {
            id: RefundId::new(),
            payment_id,
            amount,
            external_refund_id,
            reason,
            status,
            created_at: Timestamp::now(),
        }
    }
}

/// Amount still refundable on `original` after `refunds`.
///
/// Returns `None` if the refunds are in another currency or already exceed
/// the original, which would mean the ledger is corrupt.
pub fn refundable_balance(original: &Money, refunds: &[PaymentRefund]) -> Option<Money> {
    refunds
        .iter()
        .filter(|r| r.status.counts_against_balance())
        .try_fold(original.clone(), |left, r| left.checked_sub(&r.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::new("RUB").unwrap()).unwrap()
    }

    fn refund(payment_id: PaymentId, amount: i64, status: RefundStatus) -> PaymentRefund {
        PaymentRefund::new(payment_id, rub(amount), None, None, status)
    }

    #[test]
    fn balance_without_refunds_is_original() {
        assert_eq!(refundable_balance(&rub(1000), &[]), Some(rub(1000)));
    }

    #[test]
    fn failed_refunds_do_not_count() {
        let id = PaymentId::new();
        let refunds = vec![
            refund(id, 300, RefundStatus::Succeeded),
            refund(id, 500, RefundStatus::Failed),
            refund(id, 200, RefundStatus::Pending),
        ];
        assert_eq!(refundable_balance(&rub(1000), &refunds), Some(rub(500)));
    }

    #[test]
    fn over_refunded_ledger_is_reported() {
        let id = PaymentId::new();
        let refunds = vec![refund(id, 1200, RefundStatus::Succeeded)];
        assert_eq!(refundable_balance(&rub(1000), &refunds), None);
    }
}
