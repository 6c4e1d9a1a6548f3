//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Gateway Port
//!
//! - `PaymentGateway` - External payment provider
//!
//! ## Ledger Ports
//!
//! - `PaymentRepository` - Payments and refunds, with status compare-and-set
//! - `SubscriptionRepository` - Subscriptions, with conditional credit decrement
//! - `TemplateRepository` / `TemplateCatalog` - Template management and lookup
//! - `VisitRepository` - Append-only visit ledger
//!
//! ## Utility Ports
//!
//! - `Clock` - Time source

mod clock;
mod payment_gateway;
mod payment_repository;
mod subscription_repository;
mod template_repository;
mod visit_repository;

pub use clock::{Clock, SystemClock};
pub use payment_gateway::{
    CallbackUrls, CreateGatewayPayment, GatewayError, GatewayPayment, GatewayPaymentStatus,
    GatewayRefund, GatewayStatusReport, PaymentGateway, PaymentOptions,
};
pub use payment_repository::PaymentRepository;
pub use subscription_repository::{CreditOutcome, SubscriptionRepository};
pub use template_repository::{TemplateCatalog, TemplateRepository};
pub use visit_repository::VisitRepository;
