//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the payment manager (driver cache, health cache) and server configuration.

use pay_core::{PaymentManager, PaymentsConfig, StatusNormalizer};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment manager shared by every request
    pub manager: Arc<PaymentManager>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state from `config/payments.toml` and the environment, using the built-in drivers
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let payments = PaymentsConfig::load()
            .map_err(|e| anyhow::anyhow!("Failed to load payments config: {}", e))?;

        let normalizer = Arc::new(StatusNormalizer::new());
        pay_drivers::register_status_mappings(&normalizer);

        let manager = PaymentManager::new(payments, Arc::new(pay_drivers::default_factory()))
            .with_normalizer(normalizer);

        Ok(Self::with_manager(Arc::new(manager), config))
    }

    /// Build state around an existing manager
    pub fn with_manager(manager: Arc<PaymentManager>, config: AppConfig) -> Self {
        Self { manager, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..config
        };
        assert!(bad.socket_addr().is_err());
    }
}
