//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPaymentRepository` - Payments and their refunds
//! - `PostgresSubscriptionRepository` - Subscriptions, with conditional credit decrement
//! - `PostgresTemplateRepository` - Templates; also the catalog lookup
//! - `PostgresVisitRepository` - Append-only visit ledger
//!
//! Tables: `subscription_templates`, `subscriptions` (unique `token`),
//! `payments`, `payment_refunds` (FK to `payments`), `visits`.

mod columns;
mod payment_repository;
mod subscription_repository;
mod template_repository;
mod visit_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use template_repository::PostgresTemplateRepository;
pub use visit_repository::PostgresVisitRepository;
