//! Reconciliation poller configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Reconciliation poller configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Run the poller in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Payments younger than this are left to the provider callback
    #[serde(default = "default_min_age")]
    pub min_age_secs: u64,

    /// Max payments per cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Gateway status checks in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl ReconciliationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn min_age(&self) -> Duration {
        Duration::from_secs(self.min_age_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidReconciliation("interval_secs"));
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ValidationError::InvalidReconciliation("batch_size"));
        }
        if self.concurrency == 0 || self.concurrency > 64 {
            return Err(ValidationError::InvalidReconciliation("concurrency"));
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            min_age_secs: default_min_age(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    90
}

fn default_min_age() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    50
}

fn default_concurrency() -> usize {
    4
}
