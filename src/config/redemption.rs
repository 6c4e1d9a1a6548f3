//! Redemption configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::redemption::DuplicateWindow;

/// Redemption configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionConfig {
    /// A second scan at the same location within this many seconds is rejected
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_secs: i64,
}

impl RedemptionConfig {
    pub fn duplicate_window(&self) -> Result<DuplicateWindow, ValidationError> {
        DuplicateWindow::from_secs(self.duplicate_window_secs).map_err(|_| {
            ValidationError::InvalidDuplicateWindow {
                max: DuplicateWindow::MAX_SECS,
            }
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.duplicate_window().map(|_| ())
    }
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            duplicate_window_secs: default_duplicate_window(),
        }
    }
}

fn default_duplicate_window() -> i64 {
    300
}
