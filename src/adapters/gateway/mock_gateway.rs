//! Mock payment gateway for testing.
//!
//! Provides a configurable implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Programmable provider statuses
//! - Error injection (per method, or once for the next call)
//! - Call tracking
//! - Idempotent creation keyed by invoice id, like the real provider

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::payment::RefundStatus;
use crate::ports::{
    CreateGatewayPayment, GatewayError, GatewayPayment, GatewayPaymentStatus, GatewayRefund,
    GatewayStatusReport, PaymentGateway,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// let created = gateway.create_payment(request).await?;
///
/// // Payer completes payment out-of-band
/// gateway.set_status(&created.external_id, GatewayPaymentStatus::Success, None);
///
/// // Inject errors
/// gateway.set_method_error("get_status", GatewayError::transient("timeout"));
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Payments by external id.
    payments: HashMap<String, MockPayment>,

    /// External id by invoice id.
    invoices: HashMap<String, String>,

    /// Refund status to report; `Succeeded` when unset.
    refund_status: Option<RefundStatus>,

    /// Error to return on next call (consumed).
    next_error: Option<GatewayError>,

    /// Sticky errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Sticky errors for status and refund calls on one external id.
    payment_errors: HashMap<String, GatewayError>,

    call_log: Vec<MethodCall>,
}

#[derive(Debug, Clone)]
struct MockPayment {
    amount: i64,
    refunded: i64,
    status: GatewayPaymentStatus,
    error_code: Option<String>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Sets the provider status reported for a payment.
    pub fn set_status(
        &self,
        external_id: &str,
        status: GatewayPaymentStatus,
        error_code: Option<&str>,
    ) {
        let mut state = self.inner.lock().unwrap();
        if let Some(payment) = state.payments.get_mut(external_id) {
            payment.status = status;
            payment.error_code = error_code.map(str::to_string);
        }
    }

    /// Sets the provider status for the payment created with `invoice_id`.
    pub fn set_status_for_invoice(
        &self,
        invoice_id: &str,
        status: GatewayPaymentStatus,
        error_code: Option<&str>,
    ) {
        if let Some(external_id) = self.external_id_for(invoice_id) {
            self.set_status(&external_id, status, error_code);
        }
    }

    /// External id assigned to an invoice, if it was created.
    pub fn external_id_for(&self, invoice_id: &str) -> Option<String> {
        self.inner.lock().unwrap().invoices.get(invoice_id).cloned()
    }

    /// Status reported for subsequent refunds.
    pub fn set_refund_status(&self, status: RefundStatus) {
        self.inner.lock().unwrap().refund_status = Some(status);
    }

    /// Fails the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Fails every call to `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Fails status and refund calls for one external id until cleared.
    pub fn set_payment_error(&self, external_id: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .payment_errors
            .insert(external_id.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
        state.payment_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment(
        &self,
        request: CreateGatewayPayment,
    ) -> Result<GatewayPayment, GatewayError> {
        self.record_call(
            "create_payment",
            vec![
                request.invoice_id.clone(),
                request.amount.amount().to_string(),
                request.payer_ref.clone(),
            ],
        );
        self.check_error("create_payment")?;

        let mut state = self.inner.lock().unwrap();

        let external_id = match state.invoices.get(&request.invoice_id) {
            Some(existing) => existing.clone(),
            None => {
                let external_id = format!("mock_pay_{}", uuid::Uuid::new_v4().simple());
                state
                    .invoices
                    .insert(request.invoice_id.clone(), external_id.clone());
                state.payments.insert(
                    external_id.clone(),
                    MockPayment {
                        amount: request.amount.amount(),
                        refunded: 0,
                        status: GatewayPaymentStatus::New,
                        error_code: None,
                    },
                );
                external_id
            }
        };

        Ok(GatewayPayment {
            redirect_url: format!("https://pay.mock/{}", external_id),
            external_id,
        })
    }

    async fn get_status(&self, external_id: &str) -> Result<GatewayStatusReport, GatewayError> {
        self.record_call("get_status", vec![external_id.to_string()]);
        self.check_error("get_status")?;

        let state = self.inner.lock().unwrap();
        if let Some(error) = state.payment_errors.get(external_id) {
            return Err(error.clone());
        }
        let payment = state
            .payments
            .get(external_id)
            .ok_or_else(|| GatewayError::rejected("NOT_FOUND", "payment not found"))?;

        Ok(GatewayStatusReport {
            status: payment.status,
            error_code: payment.error_code.clone(),
            raw: format!("{{\"status\":\"{:?}\"}}", payment.status).to_lowercase(),
        })
    }

    async fn refund(
        &self,
        external_id: &str,
        amount: Option<i64>,
        reason: Option<String>,
    ) -> Result<GatewayRefund, GatewayError> {
        self.record_call(
            "refund",
            vec![
                external_id.to_string(),
                amount.map(|a| a.to_string()).unwrap_or_default(),
                reason.unwrap_or_default(),
            ],
        );
        self.check_error("refund")?;

        let mut state = self.inner.lock().unwrap();
        if let Some(error) = state.payment_errors.get(external_id) {
            return Err(error.clone());
        }
        let refund_status = state.refund_status.unwrap_or(RefundStatus::Succeeded);
        let payment = state
            .payments
            .get_mut(external_id)
            .ok_or_else(|| GatewayError::rejected("NOT_FOUND", "payment not found"))?;

        if payment.status != GatewayPaymentStatus::Success {
            return Err(GatewayError::rejected(
                "NOT_REFUNDABLE",
                "payment is not settled",
            ));
        }

        let remaining = payment.amount - payment.refunded;
        let amount = amount.unwrap_or(remaining);
        if amount > remaining {
            return Err(GatewayError::rejected(
                "AMOUNT_EXCEEDS",
                "refund exceeds remaining amount",
            ));
        }

        if refund_status.counts_against_balance() {
            payment.refunded += amount;
        }

        Ok(GatewayRefund {
            refund_id: format!("mock_ref_{}", uuid::Uuid::new_v4().simple()),
            status: refund_status,
        })
    }
}
