//! # Payments Configuration
//!
//! Provider configuration, loaded from `config/payments.toml` with secrets
//! optionally supplied through environment variables.
//!
//! ```toml
//! default = "paystack"
//!
//! [health_check]
//! enabled = true
//! ttl_secs = 60
//!
//! [providers.paystack]
//! driver = "paystack"
//! secret_key = "sk_test_..."
//! currencies = ["NGN", "GHS"]
//! ```

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Default TTL for cached provider health probes
pub const DEFAULT_HEALTH_TTL_SECS: u64 = 60;

/// Configuration for a single provider entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Driver key used for naming-convention lookup (defaults to the provider key)
    #[serde(default)]
    pub driver: Option<String>,

    /// Whether this provider is exposed (health report, selection)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Secret API key
    #[serde(default)]
    pub secret_key: String,

    /// Public/publishable key
    #[serde(default)]
    pub public_key: String,

    /// Currencies this entry accepts; empty means the driver's own list
    #[serde(default)]
    pub currencies: Vec<String>,

    /// Explicit driver type, overriding the naming convention
    #[serde(default)]
    pub driver_class: Option<String>,

    /// API base URL (for sandboxes and testing)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Outbound request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Driver-specific settings
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            driver: None,
            enabled: true,
            secret_key: String::new(),
            public_key: String::new(),
            currencies: Vec::new(),
            driver_class: None,
            base_url: None,
            timeout_secs: None,
            extra: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Builder: set the driver key
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// Builder: set an explicit driver type
    pub fn with_driver_class(mut self, class: impl Into<String>) -> Self {
        self.driver_class = Some(class.into());
        self
    }

    /// Builder: set the public key
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = key.into();
        self
    }

    /// Builder: restrict accepted currencies
    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set API base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builder: enable or disable
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder: set a driver-specific value
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Configured currencies, upper-cased, or `fallback` when none are configured
    pub fn currencies_or(&self, fallback: &[&str]) -> Vec<String> {
        if self.currencies.is_empty() {
            fallback.iter().map(|c| c.to_string()).collect()
        } else {
            self.currencies
                .iter()
                .map(|c| c.trim().to_uppercase())
                .collect()
        }
    }

    pub fn timeout(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(default_secs))
    }

    /// Secret key, or a configuration error naming the provider
    pub fn require_secret_key(&self, provider: &str) -> PaymentResult<&str> {
        if self.secret_key.trim().is_empty() {
            return Err(PaymentError::Configuration(format!(
                "secret_key is required for provider [{}]",
                provider
            )));
        }
        Ok(&self.secret_key)
    }
}

/// Health-check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds a probe result stays cached per provider (`ttl` or `ttl_secs`)
    #[serde(default, alias = "ttl")]
    pub ttl_secs: Option<u64>,
}

impl HealthCheckConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unwrap_or(DEFAULT_HEALTH_TTL_SECS))
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: None,
        }
    }
}

/// Top-level payments configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Default provider key
    #[serde(default = "default_provider")]
    pub default: String,

    /// Provider entries keyed by provider key
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(default)]
    pub health_check: HealthCheckConfig,
}

fn default_provider() -> String {
    "paystack".to_string()
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            providers: BTreeMap::new(),
            health_check: HealthCheckConfig::default(),
        }
    }
}

impl PaymentsConfig {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            ..Self::default()
        }
    }

    /// Builder: add a provider entry
    pub fn with_provider(mut self, key: impl Into<String>, config: ProviderConfig) -> Self {
        self.providers.insert(key.into(), config);
        self
    }

    /// Builder: replace health-check settings
    pub fn with_health_check(mut self, health_check: HealthCheckConfig) -> Self {
        self.health_check = health_check;
        self
    }

    /// Parse from TOML
    pub fn from_toml_str(content: &str) -> PaymentResult<Self> {
        toml::from_str(content)
            .map_err(|e| PaymentError::Configuration(format!("invalid payments config: {}", e)))
    }

    /// Load from the first config file found, then apply environment overrides.
    ///
    /// Search order: `$PAYMENTS_CONFIG`, `config/payments.toml`,
    /// `../config/payments.toml`, `../../config/payments.toml`.
    pub fn load() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let mut paths: Vec<String> = Vec::new();
        if let Ok(path) = std::env::var("PAYMENTS_CONFIG") {
            paths.push(path);
        }
        paths.extend(
            [
                "config/payments.toml",
                "../config/payments.toml",
                "../../config/payments.toml",
            ]
            .iter()
            .map(|p| p.to_string()),
        );

        let mut config = None;
        for path in &paths {
            if let Ok(content) = std::fs::read_to_string(path) {
                let parsed = Self::from_toml_str(&content).map_err(|e| {
                    PaymentError::Configuration(format!("failed to parse {}: {}", path, e))
                })?;
                tracing::info!(
                    "Loaded {} payment providers from {}",
                    parsed.providers.len(),
                    path
                );
                config = Some(parsed);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            tracing::warn!("No payments config found, using empty provider set");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `PAYMENTS_DEFAULT_PROVIDER` and `<KEY>_SECRET_KEY` / `<KEY>_PUBLIC_KEY`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(default) = std::env::var("PAYMENTS_DEFAULT_PROVIDER") {
            if !default.trim().is_empty() {
                self.default = default.trim().to_string();
            }
        }

        for (key, provider) in self.providers.iter_mut() {
            let prefix = key.to_uppercase().replace('-', "_");
            if let Ok(secret) = std::env::var(format!("{}_SECRET_KEY", prefix)) {
                provider.secret_key = secret;
            }
            if let Ok(public) = std::env::var(format!("{}_PUBLIC_KEY", prefix)) {
                provider.public_key = public;
            }
        }
    }

    pub fn provider(&self, key: &str) -> Option<&ProviderConfig> {
        self.providers.get(key)
    }

    /// Keys of providers with `enabled = true`, in key order
    pub fn enabled_providers(&self) -> Vec<&str> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default = "paystack"

[health_check]
enabled = true
ttl_secs = 30

[providers.paystack]
driver = "paystack"
secret_key = "sk_test_abc"
public_key = "pk_test_abc"
currencies = ["ngn", "GHS"]

[providers.stripe]
enabled = false
secret_key = "sk_test_xyz"

[providers.custom]
driver_class = "my_app::CustomDriver"
merchant_id = "m_123"
"#;

    #[test]
    fn test_parse_toml() {
        let config = PaymentsConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.default, "paystack");
        assert_eq!(config.health_check.ttl(), Duration::from_secs(30));
        assert_eq!(config.providers.len(), 3);

        let paystack = config.provider("paystack").unwrap();
        assert!(paystack.enabled);
        assert_eq!(paystack.driver.as_deref(), Some("paystack"));
        assert_eq!(paystack.currencies_or(&["USD"]), vec!["NGN", "GHS"]);

        let custom = config.provider("custom").unwrap();
        assert_eq!(custom.driver_class.as_deref(), Some("my_app::CustomDriver"));
        assert_eq!(
            custom.extra.get("merchant_id"),
            Some(&serde_json::json!("m_123"))
        );
    }

    #[test]
    fn test_health_ttl_short_key() {
        let config = PaymentsConfig::from_toml_str("[health_check]\nttl = 45\n").unwrap();
        assert_eq!(config.health_check.ttl(), Duration::from_secs(45));
        assert!(config.health_check.enabled);
    }

    #[test]
    fn test_enabled_providers() {
        let config = PaymentsConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.enabled_providers(), vec!["custom", "paystack"]);
    }

    #[test]
    fn test_defaults() {
        let config = PaymentsConfig::from_toml_str("").unwrap();
        assert_eq!(config.default, "paystack");
        assert!(config.providers.is_empty());
        assert!(config.health_check.enabled);
        assert_eq!(
            config.health_check.ttl(),
            Duration::from_secs(DEFAULT_HEALTH_TTL_SECS)
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = PaymentsConfig::from_toml_str("default = [").unwrap_err();
        assert!(matches!(err, PaymentError::Configuration(_)));
    }

    #[test]
    fn test_require_secret_key() {
        let config = ProviderConfig::default();
        assert!(config.require_secret_key("paystack").is_err());
        let config = ProviderConfig::new("sk_test_abc");
        assert_eq!(config.require_secret_key("paystack").unwrap(), "sk_test_abc");
    }

    #[test]
    fn test_currencies_fallback() {
        let config = ProviderConfig::new("sk");
        assert_eq!(config.currencies_or(&["NGN", "USD"]), vec!["NGN", "USD"]);
    }
}
