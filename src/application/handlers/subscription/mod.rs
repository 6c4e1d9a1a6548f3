//! Subscription ledger handlers.

mod activate_subscription;
mod cancel_subscription;
mod list_subscriptions;
mod lookup_by_token;
mod manage_templates;
mod purchase_subscription;
mod reissue_token;

pub use activate_subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivateSubscriptionResult,
};
pub use cancel_subscription::{
    CancelReason, CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use list_subscriptions::{ListSubscriptionsHandler, ListSubscriptionsQuery};
pub use lookup_by_token::{LookupByTokenHandler, LookupByTokenQuery};
pub use manage_templates::{
    CreateTemplateCommand, CreateTemplateHandler, DeactivateTemplateCommand,
    DeactivateTemplateHandler, ListTemplatesHandler, UpdateTemplateCommand, UpdateTemplateHandler,
};
pub use purchase_subscription::{
    PurchaseSubscriptionCommand, PurchaseSubscriptionHandler, PurchaseSubscriptionResult,
};
pub use reissue_token::{ReissueTokenCommand, ReissueTokenHandler, ReissueTokenResult};
