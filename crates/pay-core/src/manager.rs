//! # Payment Manager
//!
//! Entry point for callers. Owns the driver instance cache and the health
//! cache, picks the default provider, and delegates charge/verify/health to
//! the resolved driver.
//!
//! ```text
//! Payment builder ──▶ PaymentManager::driver(key)
//!                          │  cached? ──▶ BoxedDriver
//!                          └─ DriverFactory::create(key, config) ──▶ cache
//! ```
//!
//! The manager is shared behind an `Arc`. Concurrent first access to the same
//! key may construct the driver twice; the first instance stored wins.

use crate::charge::{ChargeRequest, ChargeResponse};
use crate::config::PaymentsConfig;
use crate::driver::BoxedDriver;
use crate::error::{PaymentError, PaymentResult};
use crate::factory::DriverFactory;
use crate::health::{HealthCache, HealthReport, ProviderHealth};
use crate::status::{CanonicalStatus, StatusNormalizer};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct PaymentManager {
    config: PaymentsConfig,
    factory: Arc<DriverFactory>,
    normalizer: Option<Arc<StatusNormalizer>>,
    drivers: DashMap<String, BoxedDriver>,
    health: HealthCache,
}

impl PaymentManager {
    pub fn new(config: PaymentsConfig, factory: Arc<DriverFactory>) -> Self {
        let health = HealthCache::new(config.health_check.ttl());
        Self {
            config,
            factory,
            normalizer: None,
            drivers: DashMap::new(),
            health,
        }
    }

    /// Builder: interpret statuses through a shared normalizer
    pub fn with_normalizer(mut self, normalizer: Arc<StatusNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn config(&self) -> &PaymentsConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<DriverFactory> {
        &self.factory
    }

    pub fn normalizer(&self) -> Option<&Arc<StatusNormalizer>> {
        self.normalizer.as_ref()
    }

    pub fn default_provider(&self) -> &str {
        &self.config.default
    }

    pub fn enabled_providers(&self) -> Vec<&str> {
        self.config.enabled_providers()
    }

    /// Driver for `name` (default provider when `None`), constructed on first use.
    ///
    /// Keys are used as given, without case folding.
    pub fn driver(&self, name: Option<&str>) -> PaymentResult<BoxedDriver> {
        let key = name.unwrap_or(&self.config.default);

        if let Some(driver) = self.drivers.get(key).map(|d| d.value().clone()) {
            return Ok(driver);
        }

        let config = self.config.provider(key).cloned().unwrap_or_else(|| {
            debug!("Provider [{}] not configured, using empty config", key);
            Default::default()
        });
        let driver = self.factory.create(key, &config)?;
        let driver = self
            .drivers
            .entry(key.to_string())
            .or_insert(driver)
            .value()
            .clone();

        info!("Driver ready: {}", key);
        Ok(driver)
    }

    /// Drop a cached driver so the next access reconstructs it
    pub fn forget_driver(&self, name: &str) {
        self.drivers.remove(name);
        self.health.invalidate(name);
    }

    pub fn clear_drivers(&self) {
        self.drivers.clear();
        self.health.clear();
    }

    pub fn cached_drivers(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.drivers.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Charge through the default provider
    pub async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
        self.charge_with(None, request).await
    }

    /// Charge through `provider` (default when `None`)
    #[instrument(skip(self, request), fields(reference = %request.reference, amount = request.amount, currency = %request.currency))]
    pub async fn charge_with(
        &self,
        provider: Option<&str>,
        request: &ChargeRequest,
    ) -> PaymentResult<ChargeResponse> {
        request.validate()?;

        let key = provider.unwrap_or(&self.config.default);
        let driver = self.driver(Some(key))?;

        if !driver.is_currency_supported(&request.currency) {
            return Err(PaymentError::CurrencyNotSupported {
                currency: request.currency.clone(),
                provider: key.to_string(),
            });
        }

        let response = driver.charge(request).await?;
        info!(
            "Charge initialized: provider={}, reference={}, status={}",
            key,
            response.reference(),
            response.status()
        );
        Ok(response)
    }

    /// Look up a transaction by reference
    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        reference: &str,
        provider: Option<&str>,
    ) -> PaymentResult<ChargeResponse> {
        if reference.trim().is_empty() {
            return Err(PaymentError::validation("reference is required", "reference"));
        }
        let driver = self.driver(provider)?;
        driver.verify(reference).await
    }

    /// Health of `name`, from cache when fresh. Never fails.
    pub async fn cached_health_check(&self, name: &str) -> bool {
        if let Some(healthy) = self.health.get(name) {
            debug!("Health cache hit: {} -> {}", name, healthy);
            return healthy;
        }

        let healthy = match self.driver(Some(name)) {
            Ok(driver) if self.config.health_check.enabled => {
                match driver.health_check().await {
                    Ok(healthy) => healthy,
                    Err(e) => {
                        warn!("Health probe failed for {}: {}", name, e);
                        false
                    }
                }
            }
            Ok(_) => true,
            Err(e) => {
                warn!("Driver unavailable for {}: {}", name, e);
                false
            }
        };

        self.health.insert(name, healthy);
        healthy
    }

    /// Health of every enabled provider. Never fails.
    #[instrument(skip(self))]
    pub async fn health_report(&self) -> HealthReport {
        let mut providers = BTreeMap::new();

        for key in self.config.enabled_providers() {
            let currencies = match self.driver(Some(key)) {
                Ok(driver) => driver.supported_currencies(),
                Err(_) => Vec::new(),
            };
            let healthy = self.cached_health_check(key).await;
            providers.insert(
                key.to_string(),
                ProviderHealth {
                    healthy,
                    currencies,
                },
            );
        }

        HealthReport::operational(providers)
    }

    /// Canonical outcome of a response, using the shared normalizer when present
    pub fn outcome(&self, response: &ChargeResponse) -> CanonicalStatus {
        response.outcome_with(self.normalizer.as_deref())
    }

    pub fn is_successful(&self, response: &ChargeResponse) -> bool {
        self.outcome(response) == CanonicalStatus::Success
    }

    pub fn health_cache(&self) -> &HealthCache {
        &self.health
    }
}
