//! In-memory payment repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{Payment, PaymentRefund, PaymentStatus, RefundStatus};
use crate::ports::PaymentRepository;

#[derive(Default)]
struct Store {
    payments: HashMap<PaymentId, Payment>,
    refunds: Vec<PaymentRefund>,
}

/// In-memory implementation of `PaymentRepository`.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    store: RwLock<Store>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored payments, in no particular order.
    pub async fn all(&self) -> Vec<Payment> {
        self.store.read().await.payments.values().cloned().collect()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if store.payments.contains_key(&payment.id) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Payment {} already exists", payment.id),
            ));
        }
        store.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut store = self.store.write().await;
        match store.payments.get_mut(&payment.id) {
            Some(stored) if stored.status == expected => {
                *stored = payment.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.store.read().await.payments.get(id).cloned())
    }

    async fn find_awaiting_settlement(
        &self,
        created_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let store = self.store.read().await;
        let mut awaiting: Vec<Payment> = store
            .payments
            .values()
            .filter(|p| p.status.is_awaiting_settlement() && p.created_at < created_before)
            .cloned()
            .collect();
        awaiting.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        awaiting.truncate(limit as usize);
        Ok(awaiting)
    }

    async fn record_refund(&self, refund: &PaymentRefund) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if !store.payments.contains_key(&refund.payment_id) {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", refund.payment_id),
            ));
        }
        store.refunds.push(refund.clone());
        Ok(())
    }

    async fn settle_refund(&self, refund: &PaymentRefund) -> Result<bool, DomainError> {
        let mut store = self.store.write().await;
        match store
            .refunds
            .iter_mut()
            .find(|r| r.id == refund.id && r.status == RefundStatus::Pending)
        {
            Some(stored) => {
                stored.external_refund_id = refund.external_refund_id.clone();
                stored.status = refund.status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn refunds_for(&self, payment_id: &PaymentId) -> Result<Vec<PaymentRefund>, DomainError> {
        Ok(self
            .store
            .read()
            .await
            .refunds
            .iter()
            .filter(|r| &r.payment_id == payment_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, PayerId};

    fn payment() -> Payment {
        Payment::new(
            PayerId::new(),
            Money::new(500, Currency::new("RUB").unwrap()).unwrap(),
            "pass",
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_if_status_rejects_stale_writer() {
        let repo = InMemoryPaymentRepository::new();
        let mut p = payment();
        repo.save(&p).await.unwrap();

        p.mark_pending("ext", "url").unwrap();
        assert!(repo.update_if_status(&p, PaymentStatus::New).await.unwrap());

        let mut stale = p.clone();
        stale.status = PaymentStatus::Failed;
        assert!(!repo.update_if_status(&stale, PaymentStatus::New).await.unwrap());
        assert_eq!(
            repo.find_by_id(&p.id).await.unwrap().unwrap().status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn awaiting_settlement_respects_age_order_and_limit() {
        let repo = InMemoryPaymentRepository::new();
        let now = Timestamp::now();

        let mut ids = Vec::new();
        for age in [300, 200, 100, 10] {
            let mut p = payment();
            p.mark_pending("ext", "url").unwrap();
            p.created_at = now.plus_secs(-age);
            ids.push(p.id);
            repo.save(&p).await.unwrap();
        }
        // Not awaiting settlement.
        let mut fresh_new = payment();
        fresh_new.created_at = now.plus_secs(-1000);
        repo.save(&fresh_new).await.unwrap();

        let found = repo
            .find_awaiting_settlement(now.plus_secs(-60), 2)
            .await
            .unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), ids[..2].to_vec());
    }

    #[tokio::test]
    async fn refund_requires_existing_payment() {
        let repo = InMemoryPaymentRepository::new();
        let p = payment();
        let refund = PaymentRefund::new(p.id, p.amount.clone(), None, None, RefundStatus::Succeeded);
        assert!(repo.record_refund(&refund).await.is_err());

        repo.save(&p).await.unwrap();
        repo.record_refund(&refund).await.unwrap();
        assert_eq!(repo.refunds_for(&p.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn settle_refund_only_touches_pending_refunds() {
        let repo = InMemoryPaymentRepository::new();
        let p = payment();
        repo.save(&p).await.unwrap();
        let mut refund = PaymentRefund::new(p.id, p.amount.clone(), None, None, RefundStatus::Pending);
        repo.record_refund(&refund).await.unwrap();

        refund.external_refund_id = Some("ret-1".to_string());
        refund.status = RefundStatus::Succeeded;
        assert!(repo.settle_refund(&refund).await.unwrap());

        let stored = repo.refunds_for(&p.id).await.unwrap();
        assert_eq!(stored[0].status, RefundStatus::Succeeded);
        assert_eq!(stored[0].external_refund_id.as_deref(), Some("ret-1"));

        refund.status = RefundStatus::Failed;
        assert!(!repo.settle_refund(&refund).await.unwrap());
    }
}
