//! Redemption token - the opaque bearer credential encoded in a scannable code.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

/// Longest token accepted from a scanner.
const MAX_TOKEN_LEN: usize = 128;

/// Opaque, globally unique redemption token.
///
/// Consumers must treat the value as unstructured; only equality matters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionToken(String);

impl RedemptionToken {
    /// Generates a fresh token with v4 UUID entropy.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parses a scanned value.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("token"));
        }
        if raw.len() > MAX_TOKEN_LEN {
            return Err(ValidationError::out_of_range(
                "token",
                1,
                MAX_TOKEN_LEN as i64,
                raw.len() as i64,
            ));
        }
        if !raw.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::invalid_format(
                "token",
                "contains non-printable characters",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for RedemptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "RedemptionToken({}…)", prefix)
    }
}

impl fmt::Display for RedemptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
