//! RefundPaymentHandler - Partial or full refund of a settled payment.
//!
//! Refunds for one payment run one at a time in this process, so the
//! balance check and the refund row it guards cannot interleave. The refund
//! row is written as pending before the gateway is asked, so money the
//! provider may already have returned is never offered again.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::super::subscription::{
    CancelReason, CancelSubscriptionCommand, CancelSubscriptionHandler,
};
use crate::application::KeyedLocks;
use crate::domain::foundation::{Money, PaymentId};
use crate::domain::payment::{
    refundable_balance, Payment, PaymentError, PaymentRefund, PaymentStatus, RefundStatus,
};
use crate::ports::{GatewayError, PaymentGateway, PaymentRepository};

#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub payment_id: PaymentId,
    /// Minor units; `None` refunds everything still refundable.
    pub amount: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundPaymentResult {
    pub payment: Payment,
    pub refund: PaymentRefund,
    /// What may still be refunded afterwards.
    pub remaining: Money,
}

pub struct RefundPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    cancel_subscription: Arc<CancelSubscriptionHandler>,
    locks: KeyedLocks<PaymentId>,
}

impl RefundPaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        cancel_subscription: Arc<CancelSubscriptionHandler>,
    ) -> Self {
        Self {
            payments,
            gateway,
            cancel_subscription,
            locks: KeyedLocks::new(),
        }
    }

    /// # Errors
    ///
    /// - `ValidationFailed` for a non-positive amount
    /// - `NotRefundable` unless the payment is SUCCEEDED
    /// - `RefundExceedsBalance` when asking for more than is left
    /// - gateway errors; a refused refund is recorded as failed, an unknown
    ///   outcome keeps its amount reserved
    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
    ) -> Result<RefundPaymentResult, PaymentError> {
        if matches!(cmd.amount, Some(amount) if amount <= 0) {
            return Err(PaymentError::validation("amount", "must be positive"));
        }

        let _guard = self.locks.acquire(&cmd.payment_id).await;

        let mut payment = self
            .payments
            .find_by_id(&cmd.payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;
        if payment.status != PaymentStatus::Succeeded {
            return Err(PaymentError::not_refundable(payment.status));
        }

        // 1. Work out what is left
        let refunds = self.payments.refunds_for(&payment.id).await?;
        let balance = refundable_balance(&payment.amount, &refunds).ok_or_else(|| {
            PaymentError::infrastructure(format!(
                "refunds recorded for payment {} exceed its amount",
                payment.id
            ))
        })?;
        let requested = cmd.amount.unwrap_or(balance.amount());
        if balance.is_zero() || requested > balance.amount() {
            return Err(PaymentError::refund_exceeds_balance(
                requested,
                balance.amount(),
            ));
        }
        let amount = Money::new(requested, balance.currency().clone())?;

        let external_id = payment.external_id.clone().ok_or_else(|| {
            PaymentError::infrastructure(format!("payment {} has no external id", payment.id))
        })?;

        // 2. Reserve the amount before the gateway moves money
        let mut refund = PaymentRefund::new(
            payment.id,
            amount.clone(),
            None,
            cmd.reason.clone(),
            RefundStatus::Pending,
        );
        self.payments.record_refund(&refund).await?;

        // 3. Ask the gateway
        let gateway_refund = match self
            .gateway
            .refund(&external_id, Some(requested), cmd.reason)
            .await
        {
            Ok(gateway_refund) => gateway_refund,
            Err(err) => {
                self.release_if_refused(&mut refund, &err).await;
                return Err(err.into());
            }
        };

        // 4. Record the outcome
        refund.external_refund_id = Some(gateway_refund.refund_id);
        refund.status = gateway_refund.status;
        let stored = match self.payments.settle_refund(&refund).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(
                    payment_id = %payment.id,
                    refund_id = %refund.id,
                    external_refund_id = refund.external_refund_id.as_deref().unwrap_or_default(),
                    amount = requested,
                    error = %e,
                    "Gateway refunded but the outcome was not stored; amount stays reserved"
                );
                return Err(e.into());
            }
        };
        if !stored {
            return Err(PaymentError::infrastructure(format!(
                "refund {} is no longer pending",
                refund.id
            )));
        }

        let remaining = if refund.status.counts_against_balance() {
            balance.checked_sub(&amount).ok_or_else(|| {
                PaymentError::infrastructure("refund balance underflow")
            })?
        } else {
            balance
        };

        info!(
            payment_id = %payment.id,
            amount = requested,
            refund_status = refund.status.as_str(),
            remaining = remaining.amount(),
            "Refund recorded"
        );

        // 5. Fully refunded payments close out
        if remaining.is_zero() {
            let mut refunded = payment.clone();
            refunded.advance_to(PaymentStatus::Refunded)?;
            if self
                .payments
                .update_if_status(&refunded, PaymentStatus::Succeeded)
                .await?
            {
                info!(payment_id = %refunded.id, "Payment fully refunded");
                self.cancel_refunded_subscription(&refunded).await;
                payment = refunded;
            } else {
                payment = self
                    .payments
                    .find_by_id(&cmd.payment_id)
                    .await?
                    .ok_or_else(|| PaymentError::not_found(cmd.payment_id))?;
            }
        }

        Ok(RefundPaymentResult {
            payment,
            refund,
            remaining,
        })
    }

    /// A refused refund frees its reservation. After a timeout or an
    /// unreadable answer the provider may still have refunded, so the
    /// reservation stays pending.
    async fn release_if_refused(&self, refund: &mut PaymentRefund, err: &GatewayError) {
        if !matches!(err, GatewayError::Rejected { .. }) {
            warn!(
                payment_id = %refund.payment_id,
                refund_id = %refund.id,
                amount = refund.amount.amount(),
                error = %err,
                "Refund outcome unknown; amount stays reserved"
            );
            return;
        }

        refund.status = RefundStatus::Failed;
        if let Err(e) = self.payments.settle_refund(refund).await {
            error!(
                payment_id = %refund.payment_id,
                refund_id = %refund.id,
                error = %e,
                "Failed to release refused refund"
            );
        }
    }

    async fn cancel_refunded_subscription(&self, payment: &Payment) {
        let Some(subscription_id) = payment.subscription_id else {
            return;
        };
        if let Err(e) = self
            .cancel_subscription
            .handle(CancelSubscriptionCommand {
                subscription_id,
                reason: CancelReason::PaymentRefunded,
            })
            .await
        {
            error!(
                payment_id = %payment.id,
                subscription_id = %subscription_id,
                error = %e,
                "Failed to cancel subscription for refunded payment"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::adapters::memory::InMemoryPaymentRepository;
    use crate::application::handlers::test_support::Ledger;
    use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::SubscriptionRepository;

    /// In-memory payments that can fail refund settlement or lose every
    /// status compare-and-set to an unseen writer.
    struct FlakyPayments {
        inner: Arc<InMemoryPaymentRepository>,
        fail_settle: bool,
        lose_status_race: bool,
    }

    #[async_trait]
    impl PaymentRepository for FlakyPayments {
        async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
            self.inner.save(payment).await
        }

        async fn update_if_status(
            &self,
            payment: &Payment,
            expected: PaymentStatus,
        ) -> Result<bool, DomainError> {
            if self.lose_status_race {
                return Ok(false);
            }
            self.inner.update_if_status(payment, expected).await
        }

        async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_awaiting_settlement(
            &self,
            created_before: Timestamp,
            limit: u32,
        ) -> Result<Vec<Payment>, DomainError> {
            self.inner.find_awaiting_settlement(created_before, limit).await
        }

        async fn record_refund(&self, refund: &PaymentRefund) -> Result<(), DomainError> {
            self.inner.record_refund(refund).await
        }

        async fn settle_refund(&self, refund: &PaymentRefund) -> Result<bool, DomainError> {
            if self.fail_settle {
                return Err(DomainError::new(ErrorCode::DatabaseError, "connection reset"));
            }
            self.inner.settle_refund(refund).await
        }

        async fn refunds_for(
            &self,
            payment_id: &PaymentId,
        ) -> Result<Vec<PaymentRefund>, DomainError> {
            self.inner.refunds_for(payment_id).await
        }
    }

    fn flaky_handler(
        ledger: &Ledger,
        fail_settle: bool,
        lose_status_race: bool,
    ) -> RefundPaymentHandler {
        RefundPaymentHandler::new(
            Arc::new(FlakyPayments {
                inner: ledger.payments.clone(),
                fail_settle,
                lose_status_race,
            }),
            Arc::new(ledger.gateway.clone()),
            ledger.cancel_subscription_handler(),
        )
    }

    fn refund(payment_id: PaymentId, amount: Option<i64>) -> RefundPaymentCommand {
        RefundPaymentCommand {
            payment_id,
            amount,
            reason: Some("customer request".to_string()),
        }
    }

    #[tokio::test]
    async fn partial_then_full_refund() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;
        let handler = ledger.refund_handler();

        let partial = handler
            .handle(refund(purchase.payment.id, Some(10000)))
            .await
            .unwrap();
        assert_eq!(partial.payment.status, PaymentStatus::Succeeded);
        assert_eq!(partial.remaining.amount(), 20000);

        let rest = handler.handle(refund(purchase.payment.id, None)).await.unwrap();
        assert_eq!(rest.refund.amount.amount(), 20000);
        assert_eq!(rest.payment.status, PaymentStatus::Refunded);

        let sub = ledger
            .subscriptions
            .find_by_id(&purchase.subscription.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn over_refund_is_a_conflict_and_records_nothing() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;

        let err = ledger
            .refund_handler()
            .handle(refund(purchase.payment.id, Some(30001)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsBalance);
        assert!(ledger
            .payments
            .refunds_for(&purchase.payment.id)
            .await
            .unwrap()
            .is_empty());
        assert!(!ledger.gateway.was_called("refund"));
    }

    #[tokio::test]
    async fn non_positive_amount_is_invalid() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;

        for amount in [0, -5] {
            let err = ledger
                .refund_handler()
                .handle(refund(purchase.payment.id, Some(amount)))
                .await
                .unwrap_err();
            assert!(matches!(err, PaymentError::ValidationFailed { .. }));
        }
    }

    #[tokio::test]
    async fn unsettled_payment_is_not_refundable() {
        let ledger = Ledger::new();
        let purchase = ledger.purchase(8).await;

        let err = ledger
            .refund_handler()
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::NotRefundable(PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn unknown_gateway_outcome_keeps_amount_reserved() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;
        let handler = ledger.refund_handler();
        ledger
            .gateway
            .set_method_error("refund", GatewayError::transient("timeout"));

        let err = handler
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        let refunds = ledger.payments.refunds_for(&purchase.payment.id).await.unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].status, RefundStatus::Pending);

        ledger.gateway.clear_errors();
        let err = handler
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsBalance);
        assert_eq!(ledger.gateway.call_count("refund"), 1);
    }

    #[tokio::test]
    async fn refused_refund_releases_the_reservation() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;
        let handler = ledger.refund_handler();
        ledger
            .gateway
            .set_method_error("refund", GatewayError::rejected("DECLINED", "not allowed"));

        let err = handler
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::GatewayRejected);
        let refunds = ledger.payments.refunds_for(&purchase.payment.id).await.unwrap();
        assert_eq!(refunds[0].status, RefundStatus::Failed);

        ledger.gateway.clear_errors();
        let done = handler.handle(refund(purchase.payment.id, None)).await.unwrap();
        assert_eq!(done.refund.amount.amount(), 30000);
        assert_eq!(done.payment.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn unstored_gateway_refund_is_not_refunded_twice() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;

        let err = flaky_handler(&ledger, true, false)
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert_eq!(ledger.gateway.call_count("refund"), 1);

        let err = ledger
            .refund_handler()
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsBalance);
        assert_eq!(ledger.gateway.call_count("refund"), 1);

        let refunds = ledger.payments.refunds_for(&purchase.payment.id).await.unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].status, RefundStatus::Pending);
        assert_eq!(refunds[0].amount.amount(), 30000);
    }

    #[tokio::test]
    async fn lost_close_out_race_reports_stored_payment() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;

        let result = flaky_handler(&ledger, false, true)
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap();
        assert!(result.remaining.is_zero());
        assert_eq!(result.payment.status, PaymentStatus::Succeeded);

        let sub = ledger
            .subscriptions
            .find_by_id(&purchase.subscription.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn failed_refund_keeps_balance() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;
        ledger.gateway.set_refund_status(RefundStatus::Failed);

        let result = ledger
            .refund_handler()
            .handle(refund(purchase.payment.id, None))
            .await
            .unwrap();
        assert_eq!(result.refund.status, RefundStatus::Failed);
        assert_eq!(result.remaining.amount(), 30000);
        assert_eq!(result.payment.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn concurrent_refunds_never_exceed_original() {
        let ledger = Ledger::new();
        let purchase = ledger.settled_purchase(8, 30000).await;
        let handler = Arc::new(ledger.refund_handler());

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                let payment_id = purchase.payment.id;
                tokio::spawn(async move { handler.handle(refund(payment_id, Some(10000))).await })
            })
            .collect();

        let mut ok = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 3);

        let total: i64 = ledger
            .payments
            .refunds_for(&purchase.payment.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.amount.amount())
            .sum();
        assert_eq!(total, 30000);
    }
}
