//! CheckPaymentHandler - User-triggered "did my payment go through?".

use std::sync::Arc;

use super::reconcile_payment::{ReconcilePaymentCommand, ReconcilePaymentHandler};
use crate::domain::foundation::PaymentId;
use crate::domain::payment::{PaymentError, PaymentStatus};

#[derive(Debug, Clone)]
pub struct CheckPaymentQuery {
    pub payment_id: PaymentId,
}

pub struct CheckPaymentHandler {
    reconcile: Arc<ReconcilePaymentHandler>,
}

impl CheckPaymentHandler {
    pub fn new(reconcile: Arc<ReconcilePaymentHandler>) -> Self {
        Self { reconcile }
    }

    /// Reconciles, then reports the status as stored.
    pub async fn handle(&self, query: CheckPaymentQuery) -> Result<PaymentStatus, PaymentError> {
        let result = self
            .reconcile
            .handle(ReconcilePaymentCommand {
                payment_id: query.payment_id,
            })
            .await?;
        Ok(result.payment.status)
    }
}
