//! PostgreSQL implementation of VisitRepository. Insert-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::columns::db_error;
use crate::domain::foundation::{
    DependentId, DomainError, LessonId, LocationId, PayerId, SubscriptionId, Timestamp, VisitId,
};
use crate::domain::redemption::Visit;
use crate::ports::VisitRepository;

pub struct PostgresVisitRepository {
    pool: PgPool,
}

impl PostgresVisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VisitRow {
    id: Uuid,
    subscription_id: Uuid,
    payer_id: Uuid,
    dependent_id: Option<Uuid>,
    location_id: Uuid,
    lesson_id: Option<Uuid>,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Visit {
            id: VisitId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            payer_id: PayerId::from_uuid(row.payer_id),
            dependent_id: row.dependent_id.map(DependentId::from_uuid),
            location_id: LocationId::from_uuid(row.location_id),
            lesson_id: row.lesson_id.map(LessonId::from_uuid),
            visited_at: Timestamp::from_datetime(row.visited_at),
        }
    }
}

#[async_trait]
impl VisitRepository for PostgresVisitRepository {
    async fn append(&self, visit: &Visit) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO visits (
                id, subscription_id, payer_id, dependent_id, location_id, lesson_id, visited_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(visit.id.as_uuid())
        .bind(visit.subscription_id.as_uuid())
        .bind(visit.payer_id.as_uuid())
        .bind(visit.dependent_id.map(|d| *d.as_uuid()))
        .bind(visit.location_id.as_uuid())
        .bind(visit.lesson_id.map(|l| *l.as_uuid()))
        .bind(visit.visited_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("append visit"))?;

        Ok(())
    }

    async fn find_latest_at(
        &self,
        subscription_id: &SubscriptionId,
        location_id: &LocationId,
        since: Timestamp,
    ) -> Result<Option<Visit>, DomainError> {
        let row: Option<VisitRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, payer_id, dependent_id, location_id, lesson_id, visited_at
            FROM visits
            WHERE subscription_id = $1 AND location_id = $2 AND visited_at >= $3
            ORDER BY visited_at DESC
            LIMIT 1
            "#,
        )
        .bind(subscription_id.as_uuid())
        .bind(location_id.as_uuid())
        .bind(since.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find latest visit"))?;

        Ok(row.map(Visit::from))
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Visit>, DomainError> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, payer_id, dependent_id, location_id, lesson_id, visited_at
            FROM visits
            WHERE subscription_id = $1
            ORDER BY visited_at ASC
            "#,
        )
        .bind(subscription_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list visits"))?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }
}
