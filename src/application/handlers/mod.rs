//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.
//!
//! - `subscription` - Templates, purchase, activation, lookup, cancellation
//! - `payment` - Payment creation, reconciliation, refunds, cancellation
//! - `redemption` - The scan-time redemption guard

pub mod payment;
pub mod redemption;
pub mod subscription;

#[cfg(test)]
pub(crate) mod test_support;

pub use payment::{
    CancelPaymentCommand, CancelPaymentHandler, CancelPaymentResult, CheckPaymentHandler,
    CheckPaymentQuery, CreatePaymentCommand, CreatePaymentHandler, ReconcilePaymentCommand,
    ReconcilePaymentHandler, ReconcilePaymentResult, RefundPaymentCommand, RefundPaymentHandler,
    RefundPaymentResult,
};
pub use redemption::{RedeemVisitCommand, RedeemVisitHandler, RedeemVisitResult};
pub use subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivateSubscriptionResult,
    CancelReason, CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CreateTemplateCommand, CreateTemplateHandler, DeactivateTemplateCommand,
    DeactivateTemplateHandler, ListSubscriptionsHandler, ListSubscriptionsQuery,
    ListTemplatesHandler, LookupByTokenHandler, LookupByTokenQuery, PurchaseSubscriptionCommand,
    PurchaseSubscriptionHandler, PurchaseSubscriptionResult, ReissueTokenCommand,
    ReissueTokenHandler, ReissueTokenResult, UpdateTemplateCommand, UpdateTemplateHandler,
};
