//! Session token cache for the gateway's bearer auth.
//!
//! Readers share the cached token under a read lock. Refresh happens under
//! the write lock with a second check, so a burst of callers that all find
//! the token missing or stale triggers a single sign-in.

use std::future::Future;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use crate::ports::GatewayError;

/// Tokens are treated as expired this long before the provider says so.
const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// A freshly issued bearer token.
pub struct SessionToken {
    value: SecretString,
    lifetime: Option<Duration>,
}

impl SessionToken {
    pub fn new(value: impl Into<String>, lifetime: Option<Duration>) -> Self {
        Self {
            value: SecretString::new(value.into()),
            lifetime,
        }
    }
}

struct CachedToken {
    value: SecretString,
    obtained_at: Instant,
    lifetime: Option<Duration>,
}

impl CachedToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        match self.lifetime {
            Some(lifetime) => self.obtained_at.elapsed() + margin < lifetime,
            None => true,
        }
    }
}

/// Owned, lock-guarded cache of the gateway session token.
pub struct SessionTokenCache {
    token: RwLock<Option<CachedToken>>,
    refresh_margin: Duration,
}

impl SessionTokenCache {
    pub fn new() -> Self {
        Self::with_refresh_margin(DEFAULT_REFRESH_MARGIN)
    }

    pub fn with_refresh_margin(refresh_margin: Duration) -> Self {
        Self {
            token: RwLock::new(None),
            refresh_margin,
        }
    }

    /// Returns the cached token, signing in via `sign_in` if there is none or
    /// it is about to expire.
    pub async fn get_or_refresh_token<F, Fut>(&self, sign_in: F) -> Result<SecretString, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionToken, GatewayError>>,
    {
        {
            let cached = self.token.read().await;
            if let Some(ref token) = *cached {
                if token.is_fresh(self.refresh_margin) {
                    return Ok(token.value.clone());
                }
            }
        }

        let mut cached = self.token.write().await;

        // Another caller may have refreshed while we waited for the write lock.
        if let Some(ref token) = *cached {
            if token.is_fresh(self.refresh_margin) {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Signing in to payment gateway");
        let fresh = sign_in().await?;
        let value = fresh.value.clone();
        *cached = Some(CachedToken {
            value: fresh.value,
            obtained_at: Instant::now(),
            lifetime: fresh.lifetime,
        });

        Ok(value)
    }

    /// Drops the cached token if it is still `rejected`.
    ///
    /// A token already replaced by a concurrent refresh is left alone.
    pub async fn invalidate(&self, rejected: &SecretString) {
        let mut cached = self.token.write().await;
        let matches = cached
            .as_ref()
            .map(|t| t.value.expose_secret() == rejected.expose_secret())
            .unwrap_or(false);
        if matches {
            *cached = None;
        }
    }
}

impl Default for SessionTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCache")
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}
