//! Template ports.
//!
//! `TemplateCatalog` is the read-only lookup the purchase flow consumes;
//! `TemplateRepository` is the management side.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TemplateId};
use crate::domain::subscription::SubscriptionTemplate;

/// Read-only catalog lookup.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Returns the template, active or not.
    async fn get_template(&self, id: &TemplateId)
        -> Result<Option<SubscriptionTemplate>, DomainError>;
}

/// Repository port for template management.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn save(&self, template: &SubscriptionTemplate) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `TemplateNotFound` if the template doesn't exist
    async fn update(&self, template: &SubscriptionTemplate) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TemplateId)
        -> Result<Option<SubscriptionTemplate>, DomainError>;

    /// Templates currently on sale, by name.
    async fn list_active(&self) -> Result<Vec<SubscriptionTemplate>, DomainError>;
}
