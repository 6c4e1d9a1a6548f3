//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Credit redemption and token replacement are single conditional `UPDATE`s,
//! so they stay correct with several service instances on one database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::columns::{
    corrupt, credits_column, credits_from, db_error, money_from, tariff_columns, tariff_from,
    violates,
};
use crate::domain::foundation::{
    DependentId, DomainError, ErrorCode, PayerId, SubscriptionId, TemplateId, Timestamp,
};
use crate::domain::subscription::{
    CreditRedemption, RedemptionToken, Subscription, SubscriptionStatus,
};
use crate::ports::{CreditOutcome, SubscriptionRepository};

const SELECT_COLUMNS: &str = r#"
    SELECT id, payer_id, dependent_id, template_id, template_name, tariff_kind, lesson_count,
           price_amount, currency, total_credits, remaining_credits, token, status,
           created_at, updated_at, activated_at
    FROM subscriptions
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    payer_id: Uuid,
    dependent_id: Option<Uuid>,
    template_id: Uuid,
    template_name: String,
    tariff_kind: String,
    lesson_count: Option<i32>,
    price_amount: i64,
    currency: String,
    total_credits: Option<i32>,
    remaining_credits: Option<i32>,
    token: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            payer_id: PayerId::from_uuid(row.payer_id),
            dependent_id: row.dependent_id.map(DependentId::from_uuid),
            template_id: TemplateId::from_uuid(row.template_id),
            template_name: row.template_name,
            tariff: tariff_from(&row.tariff_kind, row.lesson_count)?,
            price: money_from(row.price_amount, &row.currency)?,
            total_credits: credits_from("total_credits", row.total_credits)?,
            remaining_credits: credits_from("remaining_credits", row.remaining_credits)?,
            token: RedemptionToken::parse(&row.token).map_err(|_| corrupt("token", "<redacted>"))?,
            status: parse_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            activated_at: row.activated_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    SubscriptionStatus::parse(s).ok_or_else(|| corrupt("subscription status", s))
}

#[derive(Debug, sqlx::FromRow)]
struct CreditRow {
    remaining_credits: Option<i32>,
    status: String,
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let (tariff_kind, lesson_count) = tariff_columns(&subscription.tariff);

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, payer_id, dependent_id, template_id, template_name, tariff_kind, lesson_count,
                price_amount, currency, total_credits, remaining_credits, token, status,
                created_at, updated_at, activated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.payer_id.as_uuid())
        .bind(subscription.dependent_id.map(|d| *d.as_uuid()))
        .bind(subscription.template_id.as_uuid())
        .bind(&subscription.template_name)
        .bind(tariff_kind)
        .bind(lesson_count)
        .bind(subscription.price.amount())
        .bind(subscription.price.currency().as_str())
        .bind(credits_column(subscription.total_credits))
        .bind(credits_column(subscription.remaining_credits))
        .bind(subscription.token.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.activated_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "subscriptions_token_key") {
                return DomainError::new(ErrorCode::AlreadyExists, "Redemption token already in use");
            }
            db_error("save subscription")(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find subscription"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE token = $1", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find subscription by token"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active_by_token(
        &self,
        token: &RedemptionToken,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE token = $1 AND status = 'active'", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find subscription by token"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn list_by_payer(&self, payer_id: &PayerId) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!("{} WHERE payer_id = $1 ORDER BY created_at DESC", SELECT_COLUMNS);
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(payer_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list subscriptions"))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn redeem_credit(&self, id: &SubscriptionId) -> Result<CreditOutcome, DomainError> {
        // SET expressions see the pre-update row.
        let updated: Option<CreditRow> = sqlx::query_as(
            r#"
            UPDATE subscriptions SET
                remaining_credits = CASE
                    WHEN tariff_kind = 'lessons' THEN remaining_credits - 1
                    ELSE remaining_credits
                END,
                status = CASE
                    WHEN tariff_kind = 'lessons' AND remaining_credits = 1 THEN 'expired'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'active'
              AND (tariff_kind = 'unlimited' OR remaining_credits > 0)
            RETURNING remaining_credits, status
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("redeem credit"))?;

        if let Some(row) = updated {
            return Ok(CreditOutcome::Redeemed(CreditRedemption {
                remaining: credits_from("remaining_credits", row.remaining_credits)?,
                status: parse_status(&row.status)?,
            }));
        }

        // Lost the race or never eligible; tell the two apart.
        let current: Option<CreditRow> =
            sqlx::query_as("SELECT remaining_credits, status FROM subscriptions WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("read credits"))?;

        Ok(match current {
            Some(row) if row.status == "expired" => CreditOutcome::Exhausted,
            Some(row) if row.status == "active" && row.remaining_credits == Some(0) => {
                CreditOutcome::Exhausted
            }
            _ => CreditOutcome::NotActive,
        })
    }

    async fn replace_token(
        &self,
        id: &SubscriptionId,
        token: &RedemptionToken,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET token = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending_payment', 'active')
            "#,
        )
        .bind(id.as_uuid())
        .bind(token.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "subscriptions_token_key") {
                return DomainError::new(ErrorCode::AlreadyExists, "Redemption token already in use");
            }
            db_error("replace token")(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_status_if(
        &self,
        subscription: &Subscription,
        expected: SubscriptionStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                activated_at = $3,
                updated_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(subscription.activated_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("update subscription status"))?;

        Ok(result.rows_affected() == 1)
    }
}
