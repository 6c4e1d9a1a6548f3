//! In-memory template store. Serves both the catalog and management ports.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, TemplateId};
use crate::domain::subscription::SubscriptionTemplate;
use crate::ports::{TemplateCatalog, TemplateRepository};

#[derive(Default)]
pub struct InMemoryTemplateRepository {
    templates: RwLock<HashMap<TemplateId, SubscriptionTemplate>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `templates`.
    pub fn with_templates(templates: impl IntoIterator<Item = SubscriptionTemplate>) -> Self {
        Self {
            templates: RwLock::new(templates.into_iter().map(|t| (t.id, t)).collect()),
        }
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn save(&self, template: &SubscriptionTemplate) -> Result<(), DomainError> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Template {} already exists", template.id),
            ));
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn update(&self, template: &SubscriptionTemplate) -> Result<(), DomainError> {
        let mut templates = self.templates.write().await;
        match templates.get_mut(&template.id) {
            Some(stored) => {
                *stored = template.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::TemplateNotFound,
                format!("Template {} not found", template.id),
            )),
        }
    }

    async fn find_by_id(
        &self,
        id: &TemplateId,
    ) -> Result<Option<SubscriptionTemplate>, DomainError> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<SubscriptionTemplate>, DomainError> {
        let mut active: Vec<SubscriptionTemplate> = self
            .templates
            .read()
            .await
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

#[async_trait]
impl TemplateCatalog for InMemoryTemplateRepository {
    async fn get_template(
        &self,
        id: &TemplateId,
    ) -> Result<Option<SubscriptionTemplate>, DomainError> {
        TemplateRepository::find_by_id(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, UserId};
    use crate::domain::subscription::Tariff;

    fn template(name: &str) -> SubscriptionTemplate {
        SubscriptionTemplate::create(
            TemplateId::new(),
            name,
            Tariff::Unlimited,
            Money::new(100, Currency::new("RUB").unwrap()).unwrap(),
            UserId::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_active_skips_deactivated() {
        let mut hidden = template("B");
        hidden.deactivate();
        let repo = InMemoryTemplateRepository::with_templates(vec![template("A"), hidden]);

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "A");
    }

    #[tokio::test]
    async fn catalog_returns_inactive_templates_too() {
        let mut hidden = template("B");
        hidden.deactivate();
        let id = hidden.id;
        let repo = InMemoryTemplateRepository::with_templates(vec![hidden]);

        assert!(repo.get_template(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_missing_template_fails() {
        let repo = InMemoryTemplateRepository::new();
        let err = repo.update(&template("A")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TemplateNotFound);
    }
}
