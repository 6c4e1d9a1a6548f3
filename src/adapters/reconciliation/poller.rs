//! ReconciliationPoller - Drives stuck payments to a final status.
//!
//! Callbacks from the gateway can be lost and payers can close the tab
//! before returning, so payments may sit in PENDING or PROCESSING forever.
//! The poller periodically picks the oldest of them and reconciles each one
//! against the gateway.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 90s | Wait between cycles |
//! | `min_age` | 60s | Younger payments are left to the callback |
//! | `batch_size` | 50 | Max payments examined per cycle |
//! | `concurrency` | 4 | Reconciliations in flight at once |
//!
//! ## Graceful Shutdown
//!
//! The wait between cycles is cancelled as soon as shutdown is signalled;
//! a batch already in flight is finished first.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::handlers::payment::{
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
use crate::domain::foundation::DomainError;
use crate::domain::payment::{PaymentError, PaymentStatus};
use crate::ports::{Clock, PaymentRepository};

/// Configuration for the poller.
#[derive(Debug, Clone)]
pub struct ReconciliationPollerConfig {
    pub interval: Duration,
    pub min_age: Duration,
    pub batch_size: u32,
    pub concurrency: usize,
}

impl Default for ReconciliationPollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(90),
            min_age: Duration::from_secs(60),
            batch_size: 50,
            concurrency: 4,
        }
    }
}

impl ReconciliationPollerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.min_age = min_age;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Outcome counts of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub examined: usize,
    /// Moved to SUCCEEDED.
    pub settled: usize,
    /// Moved to FAILED.
    pub failed: usize,
    /// Still awaiting settlement, or moved by someone else meanwhile.
    pub unchanged: usize,
    /// Reconciliation returned an error; retried next cycle.
    pub errors: usize,
}

impl ReconciliationReport {
    fn record(&mut self, outcome: &Result<ReconcilePaymentResult, PaymentError>) {
        self.examined += 1;
        match outcome {
            Ok(result) if result.changed() => match result.payment.status {
                PaymentStatus::Succeeded => self.settled += 1,
                PaymentStatus::Failed => self.failed += 1,
                _ => self.unchanged += 1,
            },
            Ok(_) => self.unchanged += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// Background service reconciling payments stuck awaiting settlement.
pub struct ReconciliationPoller {
    payments: Arc<dyn PaymentRepository>,
    reconcile: Arc<ReconcilePaymentHandler>,
    clock: Arc<dyn Clock>,
    config: ReconciliationPollerConfig,
}

impl ReconciliationPoller {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        reconcile: Arc<ReconcilePaymentHandler>,
        clock: Arc<dyn Clock>,
        config: ReconciliationPollerConfig,
    ) -> Self {
        Self {
            payments,
            reconcile,
            clock,
            config,
        }
    }

    /// Run cycles until shutdown is signalled or the sender is dropped.
    ///
    /// Errors listing candidates are logged and the loop carries on.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "Reconciliation poller started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Reconciliation poller stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(report) if report.examined > 0 => info!(
                            examined = report.examined,
                            settled = report.settled,
                            failed = report.failed,
                            unchanged = report.unchanged,
                            errors = report.errors,
                            "Reconciliation cycle finished"
                        ),
                        Ok(_) => debug!("Reconciliation cycle found nothing to do"),
                        Err(e) => warn!(error = %e, "Reconciliation cycle failed"),
                    }
                }
            }
        }
    }

    /// Run exactly one cycle.
    pub async fn poll_once(&self) -> Result<ReconciliationReport, DomainError> {
        let min_age = chrono::Duration::from_std(self.config.min_age)
            .map_err(|e| DomainError::validation("min_age", e.to_string()))?;
        let cutoff = self.clock.now().minus(min_age);

        let candidates = self
            .payments
            .find_awaiting_settlement(cutoff, self.config.batch_size)
            .await?;

        let outcomes: Vec<_> = stream::iter(candidates)
            .map(|payment| {
                let reconcile = self.reconcile.clone();
                async move {
                    let outcome = reconcile
                        .handle(ReconcilePaymentCommand {
                            payment_id: payment.id,
                        })
                        .await;
                    if let Err(e) = &outcome {
                        warn!(
                            payment_id = %payment.id,
                            error = %e,
                            retryable = e.is_retryable(),
                            "Skipping payment this cycle"
                        );
                    }
                    outcome
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut report = ReconciliationReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }
        Ok(report)
    }
}
