//! Payment repository port.
//!
//! Status changes go through `update_if_status`, a compare-and-set on the
//! stored status. Two reconcilers racing on the same payment therefore agree
//! on a single winner.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId, Timestamp};
use crate::domain::payment::{Payment, PaymentRefund, PaymentStatus};

/// Repository port for Payment aggregates and their refunds.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a new payment.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Writes `payment` only if the stored status still equals `expected`.
    ///
    /// Returns `false` (and writes nothing) when another writer got there first.
    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Pending or processing payments created before `created_before`,
    /// oldest first, at most `limit`.
    async fn find_awaiting_settlement(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError>;

    /// Appends a refund record.
    async fn record_refund(&self, refund: &PaymentRefund) -> Result<(), DomainError>;

    /// Stores the gateway's outcome on a refund recorded as pending.
    ///
    /// Returns `false` if the refund is unknown or no longer pending.
    async fn settle_refund(&self, refund: &PaymentRefund) -> Result<bool, DomainError>;

    /// All refunds recorded against a payment, oldest first.
    async fn refunds_for(&self, payment_id: &PaymentId) -> Result<Vec<PaymentRefund>, DomainError>;
}
