//! PostgreSQL implementation of PaymentRepository.
//!
//! Payments live in `payments`; refunds are an append-only child table
//! `payment_refunds`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::columns::{corrupt, db_error, money_from};
use crate::domain::foundation::{
    DomainError, ErrorCode, PayerId, PaymentId, RefundId, SubscriptionId, Timestamp,
};
use crate::domain::payment::{Payment, PaymentRefund, PaymentStatus, RefundStatus};
use crate::ports::PaymentRepository;

const SELECT_PAYMENT: &str = r#"
    SELECT id, payer_id, subscription_id, amount, currency, description, status,
           external_id, redirect_url, last_error_code, created_at, updated_at
    FROM payments
"#;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    payer_id: Uuid,
    subscription_id: Option<Uuid>,
    amount: i64,
    currency: String,
    description: String,
    status: String,
    external_id: Option<String>,
    redirect_url: Option<String>,
    last_error_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            payer_id: PayerId::from_uuid(row.payer_id),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            amount: money_from(row.amount, &row.currency)?,
            description: row.description,
            status: PaymentStatus::parse(&row.status)
                .ok_or_else(|| corrupt("payment status", &row.status))?,
            external_id: row.external_id,
            redirect_url: row.redirect_url,
            last_error_code: row.last_error_code,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: Uuid,
    payment_id: Uuid,
    amount: i64,
    currency: String,
    external_refund_id: Option<String>,
    reason: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for PaymentRefund {
    type Error = DomainError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        Ok(PaymentRefund {
            id: RefundId::from_uuid(row.id),
            payment_id: PaymentId::from_uuid(row.payment_id),
            amount: money_from(row.amount, &row.currency)?,
            external_refund_id: row.external_refund_id,
            reason: row.reason,
            status: RefundStatus::parse(&row.status)
                .ok_or_else(|| corrupt("refund status", &row.status))?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, payer_id, subscription_id, amount, currency, description, status,
                external_id, redirect_url, last_error_code, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.payer_id.as_uuid())
        .bind(payment.subscription_id.map(|s| *s.as_uuid()))
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().as_str())
        .bind(&payment.description)
        .bind(payment.status.as_str())
        .bind(&payment.external_id)
        .bind(&payment.redirect_url)
        .bind(&payment.last_error_code)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("save payment"))?;

        Ok(())
    }

    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $2,
                external_id = $3,
                redirect_url = $4,
                last_error_code = $5,
                updated_at = $6
            WHERE id = $1 AND status = $7
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(&payment.external_id)
        .bind(&payment.redirect_url)
        .bind(&payment.last_error_code)
        .bind(payment.updated_at.as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("update payment"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_PAYMENT);
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_awaiting_settlement(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let sql = format!(
            "{} WHERE status IN ('pending', 'processing') AND created_at < $1 \
             ORDER BY created_at ASC LIMIT $2",
            SELECT_PAYMENT
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(created_before.as_datetime())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("find payments awaiting settlement"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn record_refund(&self, refund: &PaymentRefund) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_refunds (
                id, payment_id, amount, currency, external_refund_id, reason, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(refund.id.as_uuid())
        .bind(refund.payment_id.as_uuid())
        .bind(refund.amount.amount())
        .bind(refund.amount.currency().as_str())
        .bind(&refund.external_refund_id)
        .bind(&refund.reason)
        .bind(refund.status.as_str())
        .bind(refund.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return DomainError::new(
                        ErrorCode::PaymentNotFound,
                        format!("Payment {} not found", refund.payment_id),
                    );
                }
            }
            db_error("record refund")(e)
        })?;

        Ok(())
    }

    async fn settle_refund(&self, refund: &PaymentRefund) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_refunds
            SET external_refund_id = $2, status = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(refund.id.as_uuid())
        .bind(&refund.external_refund_id)
        .bind(refund.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("settle refund"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn refunds_for(&self, payment_id: &PaymentId) -> Result<Vec<PaymentRefund>, DomainError> {
        let rows: Vec<RefundRow> = sqlx::query_as(
            r#"
            SELECT id, payment_id, amount, currency, external_refund_id, reason, status, created_at
            FROM payment_refunds
            WHERE payment_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(payment_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list refunds"))?;

        rows.into_iter().map(PaymentRefund::try_from).collect()
    }
}
