//! # Provider Health
//!
//! Per-provider cache of health probe results plus the report shape served
//! by `GET /payments/health`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A cached probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthEntry {
    pub healthy: bool,
    pub checked_at: DateTime<Utc>,
}

impl HealthEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // A TTL too large for chrono never expires
        chrono::Duration::from_std(ttl)
            .map(|ttl| now.signed_duration_since(self.checked_at) < ttl)
            .unwrap_or(true)
    }
}

/// Probe results keyed by provider; each entry expires on its own
#[derive(Debug)]
pub struct HealthCache {
    entries: DashMap<String, HealthEntry>,
    ttl: Duration,
}

impl HealthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result for `provider`, if still inside the TTL
    pub fn get(&self, provider: &str) -> Option<bool> {
        self.get_at(provider, Utc::now())
    }

    fn get_at(&self, provider: &str, now: DateTime<Utc>) -> Option<bool> {
        let entry = *self.entries.get(provider)?;
        if entry.is_fresh(self.ttl, now) {
            Some(entry.healthy)
        } else {
            None
        }
    }

    pub fn insert(&self, provider: impl Into<String>, healthy: bool) {
        self.insert_at(provider, healthy, Utc::now());
    }

    fn insert_at(&self, provider: impl Into<String>, healthy: bool, checked_at: DateTime<Utc>) {
        self.entries.insert(
            provider.into(),
            HealthEntry {
                healthy,
                checked_at,
            },
        );
    }

    pub fn entry(&self, provider: &str) -> Option<HealthEntry> {
        self.entries.get(provider).map(|e| *e)
    }

    pub fn invalidate(&self, provider: &str) {
        self.entries.remove(provider);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Health of a single provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub healthy: bool,
    pub currencies: Vec<String>,
}

impl ProviderHealth {
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            currencies: Vec::new(),
        }
    }
}

/// Aggregate report over enabled providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub providers: BTreeMap<String, ProviderHealth>,
}

impl HealthReport {
    pub fn operational(providers: BTreeMap<String, ProviderHealth>) -> Self {
        Self {
            status: "operational".to_string(),
            providers,
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.providers.values().all(|p| p.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = HealthCache::new(Duration::from_secs(60));
        let then = Utc::now() - chrono::Duration::seconds(61);
        cache.insert_at("paystack", true, then);

        assert_eq!(cache.get("paystack"), None);
        assert_eq!(cache.get_at("paystack", then + chrono::Duration::seconds(30)), Some(true));
    }

    #[test]
    fn test_entries_expire_independently() {
        let cache = HealthCache::new(Duration::from_secs(60));
        cache.insert_at("stripe", false, Utc::now() - chrono::Duration::seconds(120));
        cache.insert("paystack", true);

        assert_eq!(cache.get("paystack"), Some(true));
        assert_eq!(cache.get("stripe"), None);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = HealthCache::new(Duration::from_secs(60));
        cache.insert("paystack", true);
        cache.insert("stripe", true);

        cache.invalidate("paystack");
        assert!(cache.entry("paystack").is_none());
        assert!(cache.entry("stripe").is_some());

        cache.clear();
        assert!(cache.get("stripe").is_none());
    }

    #[test]
    fn test_report_serialization() {
        let empty = HealthReport::operational(BTreeMap::new());
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({"status": "operational", "providers": {}})
        );

        let mut providers = BTreeMap::new();
        providers.insert("paystack".to_string(), ProviderHealth::unhealthy());
        let report = HealthReport::operational(providers);
        assert!(!report.all_healthy());
        assert_eq!(
            serde_json::to_value(&report).unwrap()["providers"]["paystack"],
            serde_json::json!({"healthy": false, "currencies": []})
        );
    }
}
