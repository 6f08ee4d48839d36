//! # Status Normalization
//!
//! Every provider speaks its own status vocabulary: Paystack says `success`,
//! Flutterwave says `successful`, Stripe sessions are `complete` and `paid`.
//! `StatusNormalizer` folds those raw strings into a `CanonicalStatus`.
//!
//! Lookup order for a raw token:
//!
//! 1. the provider-specific table (when a provider key is given and knows the token)
//! 2. the global table
//! 3. `CanonicalStatus::Unknown`
//!
//! Normalization never fails. Tokens are trimmed and compared case-insensitively.
//!
//! The normalizer works in two modes that agree on every default token:
//! - managed: a long-lived `StatusNormalizer` shared behind an `Arc`
//! - static: `CanonicalStatus::from_raw`, which reads `DEFAULT_STATUS_TABLE` directly

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Normalized outcome of a charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Success,
    Pending,
    Failed,
    Unknown,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Success => "success",
            CanonicalStatus::Pending => "pending",
            CanonicalStatus::Failed => "failed",
            CanonicalStatus::Unknown => "unknown",
        }
    }

    /// Normalize against the built-in table only (static mode)
    pub fn from_raw(raw: &str) -> Self {
        let token = fold(raw);
        DEFAULT_STATUS_TABLE
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| *t == token))
            .map(|(status, _)| *status)
            .unwrap_or(CanonicalStatus::Unknown)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CanonicalStatus::Success)
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Built-in vocabulary shared by static and managed normalization
pub const DEFAULT_STATUS_TABLE: &[(CanonicalStatus, &[&str])] = &[
    (
        CanonicalStatus::Success,
        &["success", "succeeded", "completed", "successful", "paid"],
    ),
    (
        CanonicalStatus::Pending,
        &["pending", "processing", "ongoing", "queued", "initiated", "open"],
    ),
    (
        CanonicalStatus::Failed,
        &[
            "failed",
            "failure",
            "declined",
            "cancelled",
            "canceled",
            "abandoned",
            "reversed",
            "expired",
            "error",
        ],
    ),
];

/// Canonical outcome -> raw tokens, as accepted by `register_*_mappings`
pub type StatusMappings = HashMap<CanonicalStatus, Vec<String>>;

fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One token table (global or per provider). Keeps each token bound to exactly one outcome.
#[derive(Debug, Clone, Default)]
struct StatusTable {
    tokens: HashMap<String, CanonicalStatus>,
}

impl StatusTable {
    fn defaults() -> Self {
        let mut table = Self::default();
        for (status, tokens) in DEFAULT_STATUS_TABLE {
            for token in *tokens {
                table.tokens.insert((*token).to_string(), *status);
            }
        }
        table
    }

    fn lookup(&self, token: &str) -> Option<CanonicalStatus> {
        self.tokens.get(token).copied()
    }

    fn merge(&mut self, scope: &str, status: CanonicalStatus, tokens: &[String]) {
        for raw in tokens {
            let token = fold(raw);
            if token.is_empty() {
                continue;
            }
            if let Some(previous) = self.tokens.insert(token.clone(), status) {
                if previous != status {
                    warn!(
                        scope = scope,
                        token = %token,
                        from = %previous,
                        to = %status,
                        "status token remapped"
                    );
                }
            }
        }
    }

    fn grouped(&self) -> StatusMappings {
        let mut grouped: StatusMappings = HashMap::new();
        for (token, status) in &self.tokens {
            grouped.entry(*status).or_default().push(token.clone());
        }
        for tokens in grouped.values_mut() {
            tokens.sort();
        }
        grouped
    }
}

/// Shared status normalizer with per-provider overrides
#[derive(Debug)]
pub struct StatusNormalizer {
    global: RwLock<StatusTable>,
    providers: RwLock<HashMap<String, StatusTable>>,
}

impl StatusNormalizer {
    /// Create a normalizer seeded with `DEFAULT_STATUS_TABLE`
    pub fn new() -> Self {
        Self {
            global: RwLock::new(StatusTable::defaults()),
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Normalize a raw status, checking `provider`'s overrides first
    pub fn normalize(&self, raw: &str, provider: Option<&str>) -> CanonicalStatus {
        let token = fold(raw);

        if let Some(provider) = provider {
            if let Some(status) = self
                .providers
                .read()
                .get(provider)
                .and_then(|table| table.lookup(&token))
            {
                return status;
            }
        }

        self.global
            .read()
            .lookup(&token)
            .unwrap_or(CanonicalStatus::Unknown)
    }

    /// Static-mode normalization for call sites without a shared instance
    pub fn normalize_default(raw: &str) -> CanonicalStatus {
        CanonicalStatus::from_raw(raw)
    }

    /// Normalize with an optional shared instance, falling back to the static table
    pub fn normalize_with(
        normalizer: Option<&StatusNormalizer>,
        raw: &str,
        provider: Option<&str>,
    ) -> CanonicalStatus {
        match normalizer {
            Some(n) => n.normalize(raw, provider),
            None => CanonicalStatus::from_raw(raw),
        }
    }

    /// Merge provider-specific tokens. Existing tokens for the same outcome are kept.
    pub fn register_provider_mappings(&self, provider: &str, mappings: StatusMappings) {
        let mut providers = self.providers.write();
        let table = providers.entry(provider.to_string()).or_default();
        for (status, tokens) in &mappings {
            table.merge(provider, *status, tokens);
        }
    }

    /// Merge tokens into the global table
    pub fn register_global_mappings(&self, mappings: StatusMappings) {
        let mut global = self.global.write();
        for (status, tokens) in &mappings {
            global.merge("global", *status, tokens);
        }
    }

    /// Snapshot of a provider's overrides, grouped by outcome
    pub fn provider_mappings(&self, provider: &str) -> StatusMappings {
        self.providers
            .read()
            .get(provider)
            .map(StatusTable::grouped)
            .unwrap_or_default()
    }

    /// Snapshot of the global table, grouped by outcome
    pub fn global_mappings(&self) -> StatusMappings {
        self.global.read().grouped()
    }

    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.read().contains_key(provider)
    }
}

impl Default for StatusNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a `StatusMappings` from static slices
pub fn mappings(entries: &[(CanonicalStatus, &[&str])]) -> StatusMappings {
    let mut out: StatusMappings = HashMap::new();
    for (status, tokens) in entries {
        out.entry(*status)
            .or_default()
            .extend(tokens.iter().map(|t| t.to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS_TOKENS: [&str; 5] = ["success", "succeeded", "completed", "successful", "paid"];

    #[test]
    fn test_default_success_tokens_any_case() {
        let normalizer = StatusNormalizer::new();
        for token in SUCCESS_TOKENS {
            for variant in [
                token.to_string(),
                token.to_uppercase(),
                format!("  {}  ", token),
            ] {
                assert_eq!(normalizer.normalize(&variant, None), CanonicalStatus::Success);
                assert_eq!(CanonicalStatus::from_raw(&variant), CanonicalStatus::Success);
            }
        }
    }

    #[test]
    fn test_static_and_managed_modes_agree() {
        let normalizer = StatusNormalizer::new();
        for (_, tokens) in DEFAULT_STATUS_TABLE {
            for token in *tokens {
                assert_eq!(
                    normalizer.normalize(token, None),
                    StatusNormalizer::normalize_default(token),
                    "modes disagree on {}",
                    token
                );
            }
        }
    }

    #[test]
    fn test_unknown_token_degrades() {
        let normalizer = StatusNormalizer::new();
        assert_eq!(normalizer.normalize("???", None), CanonicalStatus::Unknown);
        assert_eq!(normalizer.normalize("", Some("paystack")), CanonicalStatus::Unknown);
        assert_eq!(CanonicalStatus::from_raw("weird"), CanonicalStatus::Unknown);
    }

    #[test]
    fn test_provider_override_takes_precedence() {
        let normalizer = StatusNormalizer::new();
        normalizer.register_provider_mappings(
            "custom",
            mappings(&[(CanonicalStatus::Success, &["CUSTOM_SUCCESS"])]),
        );

        assert_eq!(
            normalizer.normalize("CUSTOM_SUCCESS", Some("custom")),
            CanonicalStatus::Success
        );
        assert_eq!(
            normalizer.normalize("custom_success", None),
            CanonicalStatus::Unknown
        );
        // Global table still applies for the provider
        assert_eq!(normalizer.normalize("paid", Some("custom")), CanonicalStatus::Success);
    }

    #[test]
    fn test_same_token_differs_across_providers() {
        let normalizer = StatusNormalizer::new();
        normalizer.register_provider_mappings(
            "stripe",
            mappings(&[(CanonicalStatus::Pending, &["open"])]),
        );
        normalizer.register_provider_mappings(
            "legacy",
            mappings(&[(CanonicalStatus::Failed, &["open"])]),
        );

        assert_eq!(normalizer.normalize("open", Some("stripe")), CanonicalStatus::Pending);
        assert_eq!(normalizer.normalize("open", Some("legacy")), CanonicalStatus::Failed);
    }

    #[test]
    fn test_registration_appends() {
        let normalizer = StatusNormalizer::new();
        normalizer.register_provider_mappings(
            "custom",
            mappings(&[(CanonicalStatus::Success, &["ok"])]),
        );
        normalizer.register_provider_mappings(
            "custom",
            mappings(&[(CanonicalStatus::Success, &["done"])]),
        );

        assert_eq!(normalizer.normalize("ok", Some("custom")), CanonicalStatus::Success);
        assert_eq!(normalizer.normalize("done", Some("custom")), CanonicalStatus::Success);

        let grouped = normalizer.provider_mappings("custom");
        assert_eq!(
            grouped.get(&CanonicalStatus::Success),
            Some(&vec!["done".to_string(), "ok".to_string()])
        );
    }

    #[test]
    fn test_token_resolves_to_single_outcome_per_provider() {
        let normalizer = StatusNormalizer::new();
        normalizer.register_provider_mappings(
            "custom",
            mappings(&[(CanonicalStatus::Pending, &["held"])]),
        );
        normalizer.register_provider_mappings(
            "custom",
            mappings(&[(CanonicalStatus::Failed, &["HELD"])]),
        );

        assert_eq!(normalizer.normalize("held", Some("custom")), CanonicalStatus::Failed);
        let grouped = normalizer.provider_mappings("custom");
        assert!(grouped.get(&CanonicalStatus::Pending).is_none());
    }

    #[test]
    fn test_normalize_with_falls_back_to_static() {
        assert_eq!(
            StatusNormalizer::normalize_with(None, "Completed", Some("custom")),
            CanonicalStatus::Success
        );
        let shared = StatusNormalizer::new();
        shared.register_global_mappings(mappings(&[(CanonicalStatus::Success, &["settled"])]));
        assert_eq!(
            StatusNormalizer::normalize_with(Some(&shared), "settled", None),
            CanonicalStatus::Success
        );
        assert_eq!(
            StatusNormalizer::normalize_with(None, "settled", None),
            CanonicalStatus::Unknown
        );
    }
}
