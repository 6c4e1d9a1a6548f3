//! PurchaseSubscriptionHandler - Buys a subscription from a template.
//!
//! The subscription is stored in PENDING_PAYMENT before the gateway is
//! called, so a settlement that races the purchase always finds it. A refused
//! payment cancels it again. Activation happens when the payment settles.

use std::sync::Arc;

use tracing::{error, info};

use super::super::payment::{CreatePaymentCommand, CreatePaymentHandler};
use super::cancel_subscription::{
    CancelReason, CancelSubscriptionCommand, CancelSubscriptionHandler,
};
use crate::domain::foundation::{DependentId, PayerId, TemplateId};
use crate::domain::payment::{Payment, PaymentError};
use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::ports::{CallbackUrls, PaymentOptions, SubscriptionRepository, TemplateCatalog};

#[derive(Debug, Clone)]
pub struct PurchaseSubscriptionCommand {
    pub payer_id: PayerId,
    pub template_id: TemplateId,
    pub dependent_id: Option<DependentId>,
}

#[derive(Debug, Clone)]
pub struct PurchaseSubscriptionResult {
    pub subscription: Subscription,
    pub payment: Payment,
    pub payment_redirect_url: String,
}

pub struct PurchaseSubscriptionHandler {
    catalog: Arc<dyn TemplateCatalog>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    create_payment: Arc<CreatePaymentHandler>,
    cancel_subscription: Arc<CancelSubscriptionHandler>,
    callback_urls: CallbackUrls,
    payment_options: PaymentOptions,
}

impl PurchaseSubscriptionHandler {
    pub fn new(
        catalog: Arc<dyn TemplateCatalog>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        create_payment: Arc<CreatePaymentHandler>,
        cancel_subscription: Arc<CancelSubscriptionHandler>,
        callback_urls: CallbackUrls,
    ) -> Self {
        Self {
            catalog,
            subscriptions,
            create_payment,
            cancel_subscription,
            callback_urls,
            payment_options: PaymentOptions::default(),
        }
    }

    pub fn with_payment_options(mut self, options: PaymentOptions) -> Self {
        self.payment_options = options;
        self
    }

    /// # Errors
    ///
    /// - `Subscription(TemplateNotFound | TemplateInactive)` for a bad template
    /// - gateway errors from payment creation; the subscription is cancelled
    pub async fn handle(
        &self,
        cmd: PurchaseSubscriptionCommand,
    ) -> Result<PurchaseSubscriptionResult, PaymentError> {
        // 1. Snapshot the template
        let template = self
            .catalog
            .get_template(&cmd.template_id)
            .await?
            .ok_or_else(|| SubscriptionError::template_not_found(cmd.template_id))?;
        let subscription = Subscription::instantiate(&template, cmd.payer_id, cmd.dependent_id)?;

        // 2. Issue the subscription
        self.subscriptions.save(&subscription).await?;

        // 3. Collect payment
        let payment = match self
            .create_payment
            .handle(CreatePaymentCommand {
                payer_id: cmd.payer_id,
                amount: subscription.price.clone(),
                description: subscription.template_name.clone(),
                subscription_id: Some(subscription.id),
                callback_urls: self.callback_urls.clone(),
                options: self.payment_options,
            })
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                self.withdraw(&subscription).await;
                return Err(e);
            }
        };

        let payment_redirect_url = payment.redirect_url.clone().ok_or_else(|| {
            PaymentError::infrastructure(format!("payment {} has no redirect url", payment.id))
        })?;

        info!(
            subscription_id = %subscription.id,
            payment_id = %payment.id,
            template_id = %template.id,
            "Subscription purchased, awaiting payment"
        );
        Ok(PurchaseSubscriptionResult {
            subscription,
            payment,
            payment_redirect_url,
        })
    }

    async fn withdraw(&self, subscription: &Subscription) {
        if let Err(e) = self
            .cancel_subscription
            .handle(CancelSubscriptionCommand {
                subscription_id: subscription.id,
                reason: CancelReason::PaymentFailed,
            })
            .await
        {
            error!(
                subscription_id = %subscription.id,
                error = %e,
                "Failed to cancel subscription after payment was refused"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Ledger;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::payment::PaymentStatus;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::{GatewayError, SubscriptionRepository, TemplateRepository};

    #[tokio::test]
    async fn purchase_issues_pending_subscription_and_payment() {
        let ledger = Ledger::new();
        let template = ledger.template(8, 28000).await;

        let result = ledger
            .purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id: PayerId::new(),
                template_id: template.id,
                dependent_id: Some(DependentId::new()),
            })
            .await
            .unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::PendingPayment);
        assert_eq!(result.subscription.remaining_credits, Some(8));
        assert_eq!(result.payment.status, PaymentStatus::Pending);
        assert_eq!(result.payment.amount.amount(), 28000);
        assert_eq!(result.payment.subscription_id, Some(result.subscription.id));
        assert!(result.payment_redirect_url.starts_with("https://pay.mock/"));
        assert!(ledger
            .subscriptions
            .find_by_id(&result.subscription.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn gateway_refusal_cancels_the_subscription() {
        let ledger = Ledger::new();
        let template = ledger.template(8, 28000).await;
        ledger
            .gateway
            .set_method_error("create_payment", GatewayError::rejected("BLOCKED", "no"));
        let payer_id = PayerId::new();

        let err = ledger
            .purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id,
                template_id: template.id,
                dependent_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::GatewayRejected);
        let issued = ledger.subscriptions.list_by_payer(&payer_id).await.unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].status, SubscriptionStatus::Cancelled);
        let payments = ledger.payments.all().await;
        assert_eq!(payments[0].status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn inactive_template_is_rejected_before_payment() {
        let ledger = Ledger::new();
        let mut template = ledger.template(8, 28000).await;
        template.deactivate();
        ledger.templates.update(&template).await.unwrap();

        let err = ledger
            .purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id: PayerId::new(),
                template_id: template.id,
                dependent_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::TemplateInactive);
        assert!(!ledger.gateway.was_called("create_payment"));
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let ledger = Ledger::new();
        let err = ledger
            .purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id: PayerId::new(),
                template_id: TemplateId::new(),
                dependent_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TemplateNotFound);
        assert!(ledger.payments.all().await.is_empty());
    }
}
