//! Gateway callback signature verification.
//!
//! Callbacks only nudge reconciliation; their payload status is never
//! trusted. When a shared secret is configured the body must carry a valid
//! HMAC-SHA256 signature (hex) so that strangers cannot make us hammer the
//! gateway with status queries.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature check failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("missing callback signature")]
    MissingSignature,

    #[error("malformed callback signature")]
    MalformedSignature,

    #[error("invalid callback signature")]
    InvalidSignature,
}

/// Verifies callback bodies against an optional shared secret.
#[derive(Clone, Default)]
pub struct CallbackVerifier {
    secret: Option<SecretString>,
}

impl CallbackVerifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Accepts everything; for deployments without a shared secret.
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), CallbackError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let signature = signature.ok_or(CallbackError::MissingSignature)?;
        let provided = hex_decode(signature.trim()).ok_or(CallbackError::MalformedSignature)?;

        let expected = sign(secret.expose_secret().as_bytes(), payload);
        if expected.as_slice().ct_eq(&provided).unwrap_u8() != 1 {
            tracing::warn!("Invalid gateway callback signature");
            return Err(CallbackError::InvalidSignature);
        }

        Ok(())
    }
}

impl std::fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn sign(key: &[u8], payload: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Hex-encodes a signature. Used by tests and tooling that produce callbacks.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Computes the hex signature for `payload`.
pub fn signature_for(secret: &str, payload: &[u8]) -> String {
    hex_encode(&sign(secret.as_bytes(), payload))
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}
