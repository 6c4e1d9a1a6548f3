//! In-memory adapters.
//!
//! Thread-safe via `tokio::sync::RwLock`. Suitable for tests and local
//! development; nothing survives a restart.

mod clock;
mod payment_repository;
mod subscription_repository;
mod template_repository;
mod visit_repository;

pub use clock::ManualClock;
pub use payment_repository::InMemoryPaymentRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use template_repository::InMemoryTemplateRepository;
pub use visit_repository::InMemoryVisitRepository;
