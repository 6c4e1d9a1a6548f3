//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::ports::{CallbackUrls, PaymentOptions};

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Provider API root
    pub base_url: String,

    /// Service account used to sign in
    pub service_user: String,

    pub service_password: SecretString,

    pub terminal_id: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// HMAC secret for provider callbacks; callbacks are not verified when unset
    pub callback_secret: Option<SecretString>,

    /// Where the provider sends the payer after a successful payment
    pub success_url: Option<String>,

    /// Where the provider sends the payer after a failed payment
    pub failure_url: Option<String>,

    /// Server-to-server notification endpoint
    pub notify_url: Option<String>,

    /// Charge immediately instead of holding funds
    #[serde(default = "default_auto_charge")]
    pub auto_charge: bool,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn callback_urls(&self) -> CallbackUrls {
        CallbackUrls {
            success: self.success_url.clone(),
            failure: self.failure_url.clone(),
            notify: self.notify_url.clone(),
        }
    }

    pub fn payment_options(&self) -> PaymentOptions {
        PaymentOptions {
            auto_charge: self.auto_charge,
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.service_user.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__SERVICE_USER"));
        }
        if self.service_password.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__SERVICE_PASSWORD"));
        }
        if self.terminal_id.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__TERMINAL_ID"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }

        if *environment == Environment::Production {
            if !self.base_url.starts_with("https://") {
                return Err(ValidationError::GatewayMustBeHttps);
            }
            let has_secret = self
                .callback_secret
                .as_ref()
                .is_some_and(|s| !s.expose_secret().is_empty());
            if !has_secret {
                return Err(ValidationError::CallbackSecretRequired);
            }
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_user: String::new(),
            service_password: SecretString::new(String::new()),
            terminal_id: String::new(),
            timeout_secs: default_timeout(),
            callback_secret: None,
            success_url: None,
            failure_url: None,
            notify_url: None,
            auto_charge: default_auto_charge(),
        }
    }
}

fn default_timeout() -> u64 {
    15
}

fn default_auto_charge() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://pay.example.com/api".to_string(),
            service_user: "visits".to_string(),
            service_password: SecretString::new("hunter2".to_string()),
            terminal_id: "T-001".to_string(),
            callback_secret: Some(SecretString::new("cb-secret".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = GatewayConfig {
            service_password: SecretString::new(String::new()),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("GATEWAY__SERVICE_PASSWORD"))
        );
    }

    #[test]
    fn test_plain_http_only_outside_production() {
        let config = GatewayConfig {
            base_url: "http://localhost:9000".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::GatewayMustBeHttps)
        );
    }

    #[test]
    fn test_production_requires_callback_secret() {
        let config = GatewayConfig {
            callback_secret: None,
            ..valid()
        };
        assert!(config.validate(&Environment::Staging).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::CallbackSecretRequired)
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_callback_urls_and_options() {
        let config = GatewayConfig {
            success_url: Some("https://visits.example.com/paid".to_string()),
            auto_charge: false,
            ..valid()
        };
        assert_eq!(
            config.callback_urls().success.as_deref(),
            Some("https://visits.example.com/paid")
        );
        assert!(config.callback_urls().notify.is_none());
        assert!(!config.payment_options().auto_charge);
    }
}
