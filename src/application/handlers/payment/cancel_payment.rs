//! CancelPaymentHandler - Withdraws a payment that has not settled.
//!
//! NEW, PENDING and PROCESSING payments may be cancelled. Cancelling twice is
//! a no-op; cancelling a settled payment is rejected. A subscription still
//! waiting on this payment is cancelled with it.

use std::sync::Arc;

use tracing::{info, warn};

use super::super::subscription::{
    CancelReason, CancelSubscriptionCommand, CancelSubscriptionHandler,
};
use crate::domain::foundation::PaymentId;
use crate::domain::payment::{Payment, PaymentError};
use crate::ports::PaymentRepository;

#[derive(Debug, Clone)]
pub struct CancelPaymentCommand {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct CancelPaymentResult {
    pub payment: Payment,
    /// False when the payment was already cancelled.
    pub cancelled: bool,
}

pub struct CancelPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    cancel_subscription: Arc<CancelSubscriptionHandler>,
}

impl CancelPaymentHandler {
    const MAX_ATTEMPTS: usize = 3;

    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        cancel_subscription: Arc<CancelSubscriptionHandler>,
    ) -> Self {
        Self {
            payments,
            cancel_subscription,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelPaymentCommand,
    ) -> Result<CancelPaymentResult, PaymentError> {
        for _ in 0..Self::MAX_ATTEMPTS {
            let mut payment = self
                .payments
                .find_by_id(&cmd.payment_id)
                .await?
                .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;

            let expected = payment.status;
            if !payment.cancel()? {
                return Ok(CancelPaymentResult {
                    payment,
                    cancelled: false,
                });
            }

            if self.payments.update_if_status(&payment, expected).await? {
                info!(payment_id = %payment.id, from = %expected, "Payment cancelled");
                self.cancel_pending_subscription(&payment).await;
                return Ok(CancelPaymentResult {
                    payment,
                    cancelled: true,
                });
            }
            // Reconciliation moved it meanwhile; decide again on the new status.
        }

        Err(PaymentError::infrastructure(
            "payment status kept changing during cancellation",
        ))
    }

    async fn cancel_pending_subscription(&self, payment: &Payment) {
        let Some(subscription_id) = payment.subscription_id else {
            return;
        };
        if let Err(e) = self
            .cancel_subscription
            .handle(CancelSubscriptionCommand {
                subscription_id,
                reason: CancelReason::PaymentCancelled,
            })
            .await
        {
            warn!(
                payment_id = %payment.id,
                subscription_id = %subscription_id,
                error = %e,
                "Failed to cancel subscription for cancelled payment"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Ledger;
    use crate::domain::payment::PaymentStatus;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::SubscriptionRepository;

    #[tokio::test]
    async fn cancels_pending_payment_and_subscription() {
        let ledger = Ledger::new();
        let purchase = ledger.purchase(4).await;

        let result = ledger
            .cancel_payment_handler()
            .handle(CancelPaymentCommand {
                payment_id: purchase.payment.id,
            })
            .await
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.payment.status, PaymentStatus::Cancelled);

        let sub = ledger
            .subscriptions
            .find_by_id(&purchase.subscription.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn second_cancel_is_a_no_op() {
        let ledger = Ledger::new();
        let purchase = ledger.purchase(4).await;
        let handler = ledger.cancel_payment_handler();
        let cmd = CancelPaymentCommand {
            payment_id: purchase.payment.id,
        };

        assert!(handler.handle(cmd.clone()).await.unwrap().cancelled);
        assert!(!handler.handle(cmd).await.unwrap().cancelled);
    }

    #[tokio::test]
    async fn settled_payment_cannot_be_cancelled() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(4, 10000).await;

        let err = ledger
            .cancel_payment_handler()
            .handle(CancelPaymentCommand {
                payment_id: purchase.payment.id,
            })
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::NotCancellable(PaymentStatus::Succeeded));
    }
}
