//! Row/column conversions shared by the PostgreSQL repositories.

use crate::domain::foundation::{Currency, DomainError, ErrorCode, Money};
use crate::domain::subscription::Tariff;

/// Wraps a sqlx error with what we were trying to do.
pub(super) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", context, e))
}

/// True when `e` is a unique violation on `constraint`.
pub(super) fn violates(e: &sqlx::Error, constraint: &str) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

pub(super) fn corrupt(what: &str, value: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", what, value),
    )
}

pub(super) fn money_from(amount: i64, currency: &str) -> Result<Money, DomainError> {
    let currency = Currency::new(currency).map_err(|_| corrupt("currency", currency))?;
    Money::new(amount, currency).map_err(|_| corrupt("amount", amount))
}

/// Tariff as `(tariff_kind, lesson_count)`.
pub(super) fn tariff_columns(tariff: &Tariff) -> (&'static str, Option<i32>) {
    match tariff {
        Tariff::Lessons { count } => ("lessons", i32::try_from(*count).ok()),
        Tariff::Unlimited => ("unlimited", None),
    }
}

pub(super) fn tariff_from(kind: &str, lesson_count: Option<i32>) -> Result<Tariff, DomainError> {
    match (kind, lesson_count) {
        ("unlimited", _) => Ok(Tariff::Unlimited),
        ("lessons", Some(count)) => {
            let count = u32::try_from(count).map_err(|_| corrupt("lesson_count", count))?;
            Tariff::lessons(count).map_err(|_| corrupt("lesson_count", count))
        }
        _ => Err(corrupt("tariff_kind", kind)),
    }
}

pub(super) fn credits_column(credits: Option<u32>) -> Option<i32> {
    credits.and_then(|c| i32::try_from(c).ok())
}

pub(super) fn credits_from(column: &'static str, value: Option<i32>) -> Result<Option<u32>, DomainError> {
    value
        .map(|v| u32::try_from(v).map_err(|_| corrupt(column, v)))
        .transpose()
}
