//! Shared application state.
//!
//! Handlers that serialise work per key (redemption, refunds) hold their own
//! lock tables, so they are built once here and shared by every request.

use std::sync::Arc;

use crate::adapters::gateway::CallbackVerifier;
use crate::application::handlers::payment::{
    CancelPaymentHandler, CheckPaymentHandler, CreatePaymentHandler, ReconcilePaymentHandler,
    RefundPaymentHandler,
};
use crate::application::handlers::redemption::RedeemVisitHandler;
use crate::application::handlers::subscription::{
    ActivateSubscriptionHandler, CancelSubscriptionHandler, CreateTemplateHandler,
    DeactivateTemplateHandler, ListSubscriptionsHandler, ListTemplatesHandler,
    LookupByTokenHandler, PurchaseSubscriptionHandler, ReissueTokenHandler,
    UpdateTemplateHandler,
};
use crate::domain::redemption::DuplicateWindow;
use crate::ports::{
    CallbackUrls, Clock, PaymentGateway, PaymentOptions, PaymentRepository,
    SubscriptionRepository, TemplateCatalog, TemplateRepository, VisitRepository,
};

/// Storage and gateway implementations the handlers run against.
#[derive(Clone)]
pub struct LedgerPorts {
    pub payments: Arc<dyn PaymentRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub catalog: Arc<dyn TemplateCatalog>,
    pub visits: Arc<dyn VisitRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
}

/// Tunables taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct LedgerSettings {
    pub callback_urls: CallbackUrls,
    pub payment_options: PaymentOptions,
    pub duplicate_window: DuplicateWindow,
    pub callback_verifier: CallbackVerifier,
}

/// Handler set shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub purchase: Arc<PurchaseSubscriptionHandler>,
    pub list_subscriptions: Arc<ListSubscriptionsHandler>,
    pub lookup_by_token: Arc<LookupByTokenHandler>,
    pub reissue_token: Arc<ReissueTokenHandler>,
    pub cancel_subscription: Arc<CancelSubscriptionHandler>,
    pub create_template: Arc<CreateTemplateHandler>,
    pub update_template: Arc<UpdateTemplateHandler>,
    pub deactivate_template: Arc<DeactivateTemplateHandler>,
    pub list_templates: Arc<ListTemplatesHandler>,
    pub reconcile: Arc<ReconcilePaymentHandler>,
    pub check_payment: Arc<CheckPaymentHandler>,
    pub refund: Arc<RefundPaymentHandler>,
    pub cancel_payment: Arc<CancelPaymentHandler>,
    pub redeem: Arc<RedeemVisitHandler>,
    pub callback_verifier: Arc<CallbackVerifier>,
}

impl AppState {
    pub fn new(ports: LedgerPorts, settings: LedgerSettings) -> Self {
        let cancel_subscription =
            Arc::new(CancelSubscriptionHandler::new(ports.subscriptions.clone()));
        let activate = Arc::new(ActivateSubscriptionHandler::new(ports.subscriptions.clone()));

        let reconcile = Arc::new(ReconcilePaymentHandler::new(
            ports.payments.clone(),
            ports.gateway.clone(),
            activate,
            cancel_subscription.clone(),
        ));
        let cancel_payment = Arc::new(CancelPaymentHandler::new(
            ports.payments.clone(),
            cancel_subscription.clone(),
        ));
        let create_payment = Arc::new(CreatePaymentHandler::new(
            ports.payments.clone(),
            ports.gateway.clone(),
        ));

        let purchase = PurchaseSubscriptionHandler::new(
            ports.catalog.clone(),
            ports.subscriptions.clone(),
            create_payment,
            cancel_subscription.clone(),
            settings.callback_urls,
        )
        .with_payment_options(settings.payment_options);

        Self {
            purchase: Arc::new(purchase),
            list_subscriptions: Arc::new(ListSubscriptionsHandler::new(
                ports.subscriptions.clone(),
            )),
            lookup_by_token: Arc::new(LookupByTokenHandler::new(ports.subscriptions.clone())),
            reissue_token: Arc::new(ReissueTokenHandler::new(ports.subscriptions.clone())),
            cancel_subscription: cancel_subscription.clone(),
            create_template: Arc::new(CreateTemplateHandler::new(ports.templates.clone())),
            update_template: Arc::new(UpdateTemplateHandler::new(ports.templates.clone())),
            deactivate_template: Arc::new(DeactivateTemplateHandler::new(ports.templates.clone())),
            list_templates: Arc::new(ListTemplatesHandler::new(ports.templates.clone())),
            check_payment: Arc::new(CheckPaymentHandler::new(reconcile.clone())),
            reconcile,
            refund: Arc::new(RefundPaymentHandler::new(
                ports.payments.clone(),
                ports.gateway.clone(),
                cancel_subscription,
            )),
            cancel_payment,
            redeem: Arc::new(RedeemVisitHandler::new(
                ports.subscriptions,
                ports.visits,
                ports.clock,
                settings.duplicate_window,
            )),
            callback_verifier: Arc::new(settings.callback_verifier),
        }
    }
}
