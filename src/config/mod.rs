//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `VISIT_PASS` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use visit_pass::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod gateway;
mod reconciliation;
mod redemption;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use reconciliation::ReconciliationConfig;
pub use redemption::RedemptionConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection pool
    pub database: DatabaseConfig,

    /// Payment gateway credentials and callback URLs
    pub gateway: GatewayConfig,

    /// Background reconciliation poller
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Redemption guard
    #[serde(default)]
    pub redemption: RedemptionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `VISIT_PASS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `VISIT_PASS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `VISIT_PASS__GATEWAY__SERVICE_PASSWORD=...` -> `gateway.service_password = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VISIT_PASS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate(&self.server.environment)?;
        self.reconciliation.validate()?;
        self.redemption.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("VISIT_PASS__DATABASE__URL", "postgresql://test@localhost/visits"),
        ("VISIT_PASS__GATEWAY__BASE_URL", "https://pay.example.com"),
        ("VISIT_PASS__GATEWAY__SERVICE_USER", "visits"),
        ("VISIT_PASS__GATEWAY__SERVICE_PASSWORD", "hunter2"),
        ("VISIT_PASS__GATEWAY__TERMINAL_ID", "T-001"),
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        env::remove_var("VISIT_PASS__SERVER__PORT");
        env::remove_var("VISIT_PASS__SERVER__ENVIRONMENT");
        env::remove_var("VISIT_PASS__RECONCILIATION__INTERVAL_SECS");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/visits");
        assert_eq!(config.gateway.service_password.expose_secret(), "hunter2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.reconciliation.interval_secs, 90);
        assert_eq!(config.redemption.duplicate_window_secs, 300);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VISIT_PASS__SERVER__PORT", "3000");
        env::set_var("VISIT_PASS__RECONCILIATION__INTERVAL_SECS", "30");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.reconciliation.interval_secs, 30);
    }

    #[test]
    fn test_production_requires_callback_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VISIT_PASS__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::CallbackSecretRequired));
    }

    #[test]
    fn test_missing_gateway_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("VISIT_PASS__DATABASE__URL", "postgresql://test@localhost/visits");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
