//! PostgreSQL implementation of TemplateRepository and TemplateCatalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::columns::{db_error, money_from, tariff_columns, tariff_from};
use crate::domain::foundation::{DomainError, ErrorCode, TemplateId, Timestamp, UserId};
use crate::domain::subscription::SubscriptionTemplate;
use crate::ports::{TemplateCatalog, TemplateRepository};

const SELECT_TEMPLATE: &str = r#"
    SELECT id, name, tariff_kind, lesson_count, price_amount, currency, active,
           created_by, created_at, updated_at
    FROM subscription_templates
"#;

pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    tariff_kind: String,
    lesson_count: Option<i32>,
    price_amount: i64,
    currency: String,
    active: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for SubscriptionTemplate {
    type Error = DomainError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionTemplate {
            id: TemplateId::from_uuid(row.id),
            name: row.name,
            tariff: tariff_from(&row.tariff_kind, row.lesson_count)?,
            price: money_from(row.price_amount, &row.currency)?,
            active: row.active,
            created_by: UserId::from_uuid(row.created_by),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn save(&self, template: &SubscriptionTemplate) -> Result<(), DomainError> {
        let (tariff_kind, lesson_count) = tariff_columns(&template.tariff);

        sqlx::query(
            r#"
            INSERT INTO subscription_templates (
                id, name, tariff_kind, lesson_count, price_amount, currency, active,
                created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(&template.name)
        .bind(tariff_kind)
        .bind(lesson_count)
        .bind(template.price.amount())
        .bind(template.price.currency().as_str())
        .bind(template.active)
        .bind(template.created_by.as_uuid())
        .bind(template.created_at.as_datetime())
        .bind(template.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("save template"))?;

        Ok(())
    }

    async fn update(&self, template: &SubscriptionTemplate) -> Result<(), DomainError> {
        let (tariff_kind, lesson_count) = tariff_columns(&template.tariff);

        let result = sqlx::query(
            r#"
            UPDATE subscription_templates SET
                name = $2,
                tariff_kind = $3,
                lesson_count = $4,
                price_amount = $5,
                currency = $6,
                active = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(&template.name)
        .bind(tariff_kind)
        .bind(lesson_count)
        .bind(template.price.amount())
        .bind(template.price.currency().as_str())
        .bind(template.active)
        .bind(template.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("update template"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TemplateNotFound,
                format!("Template {} not found", template.id),
            ));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &TemplateId,
    ) -> Result<Option<SubscriptionTemplate>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_TEMPLATE);
        let row: Option<TemplateRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find template"))?;

        row.map(SubscriptionTemplate::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<SubscriptionTemplate>, DomainError> {
        let sql = format!("{} WHERE active ORDER BY name ASC", SELECT_TEMPLATE);
        let rows: Vec<TemplateRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list templates"))?;

        rows.into_iter().map(SubscriptionTemplate::try_from).collect()
    }
}

#[async_trait]
impl TemplateCatalog for PostgresTemplateRepository {
    async fn get_template(
        &self,
        id: &TemplateId,
    ) -> Result<Option<SubscriptionTemplate>, DomainError> {
        TemplateRepository::find_by_id(self, id).await
    }
}
