//! ReconcilePaymentHandler - Converges a payment to the gateway's view.
//!
//! Safe to call repeatedly and concurrently (poller, user check, provider
//! callback). The stored status is updated with a compare-and-set, so only
//! one caller moves the payment. Activation itself is a compare-and-set on
//! the subscription, and a SUCCEEDED payment whose subscription still awaits
//! payment retries it on every call; credits are issued at most once.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::super::subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, CancelReason,
    CancelSubscriptionCommand, CancelSubscriptionHandler,
};
use crate::domain::foundation::PaymentId;
use crate::domain::payment::{Payment, PaymentError, PaymentStatus};
use crate::ports::{PaymentGateway, PaymentRepository};

#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct ReconcilePaymentResult {
    /// The payment as stored after reconciliation.
    pub payment: Payment,
    /// Status before, when this call moved the payment.
    pub transitioned_from: Option<PaymentStatus>,
}

impl ReconcilePaymentResult {
    fn unchanged(payment: Payment) -> Self {
        Self {
            payment,
            transitioned_from: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.transitioned_from.is_some()
    }
}

pub struct ReconcilePaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    activate: Arc<ActivateSubscriptionHandler>,
    cancel_subscription: Arc<CancelSubscriptionHandler>,
}

impl ReconcilePaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        activate: Arc<ActivateSubscriptionHandler>,
        cancel_subscription: Arc<CancelSubscriptionHandler>,
    ) -> Self {
        Self {
            payments,
            gateway,
            activate,
            cancel_subscription,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` for an unknown payment id
    /// - `GatewayTransient` / `GatewayRejected` when the status query fails;
    ///   the stored status is left as it was
    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconcilePaymentResult, PaymentError> {
        let payment = self
            .payments
            .find_by_id(&cmd.payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;

        if payment.status == PaymentStatus::Succeeded {
            self.ensure_activated(&payment).await;
            return Ok(ReconcilePaymentResult::unchanged(payment));
        }
        if !payment.status.is_awaiting_settlement() {
            return Ok(ReconcilePaymentResult::unchanged(payment));
        }
        let Some(external_id) = payment.external_id.clone() else {
            warn!(payment_id = %payment.id, "Awaiting payment has no external id");
            return Ok(ReconcilePaymentResult::unchanged(payment));
        };

        let report = self.gateway.get_status(&external_id).await?;
        debug!(payment_id = %payment.id, raw = %report.raw, "Gateway status");

        let Some(target) = report.status.settlement_target() else {
            return Ok(ReconcilePaymentResult::unchanged(payment));
        };
        if target == payment.status {
            return Ok(ReconcilePaymentResult::unchanged(payment));
        }

        let from = payment.status;
        let mut next = payment.clone();
        if target == PaymentStatus::Failed {
            next.mark_failed(report.error_code)?;
        } else {
            next.advance_to(target)?;
        }

        if !self.payments.update_if_status(&next, from).await? {
            // Another reconciler got there first.
            let current = self
                .payments
                .find_by_id(&cmd.payment_id)
                .await?
                .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;
            if current.status == PaymentStatus::Succeeded {
                self.ensure_activated(&current).await;
            }
            return Ok(ReconcilePaymentResult::unchanged(current));
        }

        info!(
            payment_id = %next.id,
            from = %from,
            to = %next.status,
            "Payment status reconciled"
        );
        self.apply_to_subscription(&next).await;

        Ok(ReconcilePaymentResult {
            payment: next,
            transitioned_from: Some(from),
        })
    }

    /// Subscription follow-ups. Failures are logged; the payment transition
    /// is already committed and stays.
    async fn apply_to_subscription(&self, payment: &Payment) {
        let Some(subscription_id) = payment.subscription_id else {
            return;
        };

        match payment.status {
            PaymentStatus::Succeeded => self.ensure_activated(payment).await,
            PaymentStatus::Failed => {
                if let Err(e) = self
                    .cancel_subscription
                    .handle(CancelSubscriptionCommand {
                        subscription_id,
                        reason: CancelReason::PaymentFailed,
                    })
                    .await
                {
                    warn!(
                        payment_id = %payment.id,
                        subscription_id = %subscription_id,
                        error = %e,
                        "Failed to cancel subscription for failed payment"
                    );
                }
            }
            _ => {}
        }
    }

    /// Activates the paid-for subscription if it is still PENDING_PAYMENT.
    /// A failure is logged and retried by the next reconcile of this payment.
    async fn ensure_activated(&self, payment: &Payment) {
        let Some(subscription_id) = payment.subscription_id else {
            return;
        };
        match self
            .activate
            .activate_if_pending(ActivateSubscriptionCommand { subscription_id })
            .await
        {
            Ok(Some(result)) if result.activated => {
                info!(
                    payment_id = %payment.id,
                    subscription_id = %subscription_id,
                    "Subscription activated for settled payment"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    payment_id = %payment.id,
                    subscription_id = %subscription_id,
                    error = %e,
                    "Failed to activate subscription for settled payment"
                );
            }
        }
    }
}
