//! CreatePaymentHandler - Registers a payment with the gateway.
//!
//! The local payment is stored as NEW before the gateway is called, and its
//! id is the gateway's idempotency key. A gateway failure leaves a FAILED
//! payment carrying the provider's error code.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::{Money, PayerId, SubscriptionId};
use crate::domain::payment::{Payment, PaymentError, PaymentStatus};
use crate::ports::{
    CallbackUrls, CreateGatewayPayment, GatewayError, PaymentGateway, PaymentOptions,
    PaymentRepository,
};

/// Error code recorded when the gateway could not be reached.
const TRANSIENT_FAILURE_CODE: &str = "GATEWAY_TRANSIENT";

#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub payer_id: PayerId,
    pub amount: Money,
    pub description: String,
    pub subscription_id: Option<SubscriptionId>,
    pub callback_urls: CallbackUrls,
    pub options: PaymentOptions,
}

pub struct CreatePaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreatePaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { payments, gateway }
    }

    /// Returns the payment in PENDING with its redirect URL set.
    pub async fn handle(&self, cmd: CreatePaymentCommand) -> Result<Payment, PaymentError> {
        // 1. Persist locally first
        let mut payment = Payment::new(
            cmd.payer_id,
            cmd.amount,
            cmd.description,
            cmd.subscription_id,
        )?;
        self.payments.save(&payment).await?;

        // 2. Register with the gateway
        let request = CreateGatewayPayment {
            invoice_id: payment.invoice_id(),
            amount: payment.amount.clone(),
            payer_ref: payment.payer_id.to_string(),
            description: payment.description.clone(),
            callback_urls: cmd.callback_urls,
            options: cmd.options,
        };

        let accepted = match self.gateway.create_payment(request).await {
            Ok(accepted) => accepted,
            Err(err) => {
                self.record_failure(&mut payment, &err).await;
                return Err(err.into());
            }
        };

        // 3. Store the correlation id and redirect
        payment.mark_pending(accepted.external_id, accepted.redirect_url)?;
        if !self
            .payments
            .update_if_status(&payment, PaymentStatus::New)
            .await?
        {
            return Err(PaymentError::invalid_state(
                "changed concurrently",
                "mark pending",
            ));
        }

        info!(
            payment_id = %payment.id,
            amount = payment.amount.amount(),
            currency = payment.amount.currency().as_str(),
            "Payment registered with gateway"
        );
        Ok(payment)
    }

    async fn record_failure(&self, payment: &mut Payment, err: &GatewayError) {
        let code = err
            .provider_code()
            .unwrap_or(TRANSIENT_FAILURE_CODE)
            .to_string();
        warn!(
            payment_id = %payment.id,
            error_code = %code,
            retryable = err.is_retryable(),
            "Gateway refused payment creation"
        );

        if payment.mark_failed(Some(code)).is_err() {
            return;
        }
        if let Err(store_err) = self
            .payments
            .update_if_status(payment, PaymentStatus::New)
            .await
        {
            warn!(payment_id = %payment.id, error = %store_err, "Failed to record payment failure");
        }
    }
}
