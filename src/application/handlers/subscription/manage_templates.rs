//! Template management handlers.
//!
//! Templates are edited in place and soft-deactivated. Issued subscriptions
//! carry their own snapshot, so nothing here touches them.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{Money, TemplateId, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionTemplate, Tariff};
use crate::ports::TemplateRepository;

// ════════════════════════════════════════════════════════════════════════════
// Create
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct CreateTemplateCommand {
    pub name: String,
    pub tariff: Tariff,
    pub price: Money,
    pub created_by: UserId,
}

pub struct CreateTemplateHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl CreateTemplateHandler {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    pub async fn handle(
        &self,
        cmd: CreateTemplateCommand,
    ) -> Result<SubscriptionTemplate, SubscriptionError> {
        let template = SubscriptionTemplate::create(
            TemplateId::new(),
            cmd.name,
            cmd.tariff,
            cmd.price,
            cmd.created_by,
        )?;
        self.templates.save(&template).await?;

        info!(template_id = %template.id, name = %template.name, "Template created");
        Ok(template)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Update
// ════════════════════════════════════════════════════════════════════════════

/// Partial edit; `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplateCommand {
    pub template_id: TemplateId,
    pub name: Option<String>,
    pub tariff: Option<Tariff>,
    pub price: Option<Money>,
}

pub struct UpdateTemplateHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl UpdateTemplateHandler {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    pub async fn handle(
        &self,
        cmd: UpdateTemplateCommand,
    ) -> Result<SubscriptionTemplate, SubscriptionError> {
        let mut template = self
            .templates
            .find_by_id(&cmd.template_id)
            .await?
            .ok_or_else(|| SubscriptionError::template_not_found(cmd.template_id))?;

        template.update_terms(cmd.name, cmd.tariff, cmd.price)?;
        self.templates.update(&template).await?;

        info!(template_id = %template.id, "Template updated");
        Ok(template)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Deactivate
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DeactivateTemplateCommand {
    pub template_id: TemplateId,
}

pub struct DeactivateTemplateHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl DeactivateTemplateHandler {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    /// Idempotent; deactivating an inactive template succeeds.
    pub async fn handle(
        &self,
        cmd: DeactivateTemplateCommand,
    ) -> Result<SubscriptionTemplate, SubscriptionError> {
        let mut template = self
            .templates
            .find_by_id(&cmd.template_id)
            .await?
            .ok_or_else(|| SubscriptionError::template_not_found(cmd.template_id))?;

        if template.is_active() {
            template.deactivate();
            self.templates.update(&template).await?;
            info!(template_id = %template.id, "Template deactivated");
        }
        Ok(template)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// List
// ════════════════════════════════════════════════════════════════════════════

pub struct ListTemplatesHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl ListTemplatesHandler {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    /// Templates currently on sale.
    pub async fn handle(&self) -> Result<Vec<SubscriptionTemplate>, SubscriptionError> {
        Ok(self.templates.list_active().await?)
    }
}
