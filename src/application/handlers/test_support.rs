//! Shared fixtures for handler tests.

use std::sync::Arc;

use crate::adapters::gateway::MockPaymentGateway;
use crate::adapters::memory::{
    InMemoryPaymentRepository, InMemorySubscriptionRepository, InMemoryTemplateRepository,
    InMemoryVisitRepository, ManualClock,
};
use crate::domain::foundation::{
    Currency, Money, PayerId, PaymentId, TemplateId, Timestamp, UserId,
};
use crate::domain::payment::PaymentError;
use crate::domain::redemption::DuplicateWindow;
use crate::domain::subscription::{
    Subscription, SubscriptionStatus, SubscriptionTemplate, Tariff,
};
use crate::ports::{
    CallbackUrls, GatewayPaymentStatus, SubscriptionRepository, TemplateRepository,
};

use super::payment::{
    CancelPaymentHandler, CreatePaymentHandler, ReconcilePaymentCommand, ReconcilePaymentHandler,
    ReconcilePaymentResult, RefundPaymentHandler,
};
use super::redemption::RedeemVisitHandler;
use super::subscription::{
    ActivateSubscriptionHandler, CancelSubscriptionHandler, PurchaseSubscriptionCommand,
    PurchaseSubscriptionHandler, PurchaseSubscriptionResult,
};

pub fn rub(amount: i64) -> Money {
    Money::new(amount, Currency::new("RUB").unwrap()).unwrap()
}

fn template_with(tariff: Tariff, price: i64) -> SubscriptionTemplate {
    SubscriptionTemplate::create(
        TemplateId::new(),
        "Swimming, 8 lessons",
        tariff,
        rub(price),
        UserId::new(),
    )
    .unwrap()
}

/// A freshly purchased, unsaved subscription.
pub fn pending_subscription(credits: u32) -> Subscription {
    let template = template_with(Tariff::lessons(credits).unwrap(), 10_000);
    Subscription::instantiate(&template, PayerId::new(), None).unwrap()
}

/// Stores a subscription that is already paid for.
pub async fn active_subscription(
    repo: &InMemorySubscriptionRepository,
    credits: u32,
) -> Subscription {
    activate_stored(repo, pending_subscription(credits)).await
}

async fn activate_stored(repo: &InMemorySubscriptionRepository, mut sub: Subscription) -> Subscription {
    repo.save(&sub).await.unwrap();
    sub.activate().unwrap();
    assert!(repo
        .update_status_if(&sub, SubscriptionStatus::PendingPayment)
        .await
        .unwrap());
    sub
}

/// In-memory stores, a mock gateway and a manual clock, with handler
/// builders wired the same way the server wires them.
pub struct Ledger {
    pub payments: Arc<InMemoryPaymentRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub templates: Arc<InMemoryTemplateRepository>,
    pub visits: Arc<InMemoryVisitRepository>,
    pub gateway: MockPaymentGateway,
    pub clock: Arc<ManualClock>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            payments: Arc::new(InMemoryPaymentRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            templates: Arc::new(InMemoryTemplateRepository::new()),
            visits: Arc::new(InMemoryVisitRepository::new()),
            gateway: MockPaymentGateway::new(),
            clock: Arc::new(ManualClock::new(Timestamp::now())),
        }
    }

    pub async fn template(&self, credits: u32, price: i64) -> SubscriptionTemplate {
        let template = template_with(Tariff::lessons(credits).unwrap(), price);
        self.templates.save(&template).await.unwrap();
        template
    }

    pub async fn active(&self, credits: u32) -> Subscription {
        active_subscription(&self.subscriptions, credits).await
    }

    pub async fn active_unlimited(&self) -> Subscription {
        let template = template_with(Tariff::Unlimited, 50_000);
        let sub = Subscription::instantiate(&template, PayerId::new(), None).unwrap();
        activate_stored(&self.subscriptions, sub).await
    }

    pub async fn purchase(&self, credits: u32) -> PurchaseSubscriptionResult {
        let template = self.template(credits, 10_000 * i64::from(credits)).await;
        self.purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id: PayerId::new(),
                template_id: template.id,
                dependent_id: None,
            })
            .await
            .unwrap()
    }

    /// Purchases and settles through reconciliation.
    pub async fn settled_purchase(&self, credits: u32, price: i64) -> PurchaseSubscriptionResult {
        let template = self.template(credits, price).await;
        let mut purchase = self
            .purchase_handler()
            .handle(PurchaseSubscriptionCommand {
                payer_id: PayerId::new(),
                template_id: template.id,
                dependent_id: None,
            })
            .await
            .unwrap();
        self.gateway.set_status_for_invoice(
            &purchase.payment.invoice_id(),
            GatewayPaymentStatus::Success,
            None,
        );
        let settled = self.reconcile(purchase.payment.id).await.unwrap();
        purchase.payment = settled.payment;
        purchase.subscription = self
            .subscriptions
            .find_by_id(&purchase.subscription.id)
            .await
            .unwrap()
            .unwrap();
        purchase
    }

    pub async fn reconcile(
        &self,
        payment_id: PaymentId,
    ) -> Result<ReconcilePaymentResult, PaymentError> {
        self.reconcile_handler()
            .handle(ReconcilePaymentCommand { payment_id })
            .await
    }

    pub fn cancel_subscription_handler(&self) -> Arc<CancelSubscriptionHandler> {
        Arc::new(CancelSubscriptionHandler::new(self.subscriptions.clone()))
    }

    pub fn reconcile_handler(&self) -> Arc<ReconcilePaymentHandler> {
        Arc::new(ReconcilePaymentHandler::new(
            self.payments.clone(),
            Arc::new(self.gateway.clone()),
            Arc::new(ActivateSubscriptionHandler::new(self.subscriptions.clone())),
            self.cancel_subscription_handler(),
        ))
    }

    pub fn refund_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(
            self.payments.clone(),
            Arc::new(self.gateway.clone()),
            self.cancel_subscription_handler(),
        )
    }

    pub fn cancel_payment_handler(&self) -> CancelPaymentHandler {
        CancelPaymentHandler::new(self.payments.clone(), self.cancel_subscription_handler())
    }

    pub fn purchase_handler(&self) -> PurchaseSubscriptionHandler {
        PurchaseSubscriptionHandler::new(
            self.templates.clone(),
            self.subscriptions.clone(),
            Arc::new(CreatePaymentHandler::new(
                self.payments.clone(),
                Arc::new(self.gateway.clone()),
            )),
            self.cancel_subscription_handler(),
            CallbackUrls::default(),
        )
    }

    pub fn redeem_handler(&self) -> RedeemVisitHandler {
        RedeemVisitHandler::new(
            self.subscriptions.clone(),
            self.visits.clone(),
            self.clock.clone(),
            DuplicateWindow::default(),
        )
    }
}
