//! # Charge Types
//!
//! Request and response types for a single charge attempt.

use crate::error::{PaymentError, PaymentResult};
use crate::status::{CanonicalStatus, StatusNormalizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for a charge, as handed to a driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Amount in the currency's smallest unit (kobo, cents)
    pub amount: i64,

    /// ISO 4217 code, upper-cased
    pub currency: String,

    /// Customer email
    pub email: String,

    /// Where the provider sends the customer after checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    /// Merchant reference for the transaction
    pub reference: String,

    /// Custom metadata forwarded to the provider
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ChargeRequest {
    pub fn new(
        amount: i64,
        currency: impl Into<String>,
        email: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency: currency.into().trim().to_uppercase(),
            email: email.into(),
            callback_url: None,
            reference: reference.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reject malformed parameters before any provider is contacted
    pub fn validate(&self) -> PaymentResult<()> {
        if self.amount <= 0 {
            return Err(PaymentError::validation(
                "amount must be greater than zero",
                "amount",
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::validation(
                format!("invalid currency code: {}", self.currency),
                "currency",
            ));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(PaymentError::validation(
                format!("invalid customer email: {}", self.email),
                "email",
            ));
        }
        if self.reference.trim().is_empty() {
            return Err(PaymentError::validation("reference is required", "reference"));
        }
        if let Some(url) = &self.callback_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PaymentError::validation(
                    format!("callback URL must be absolute: {}", url),
                    "callback_url",
                ));
            }
        }
        Ok(())
    }
}

/// Result of a charge or verification, as reported by a provider.
///
/// Immutable once built; whether it succeeded is derived from the raw
/// status and provider key, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// Provider transaction reference
    reference: String,

    /// Hosted checkout URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_url: Option<String>,

    /// Provider access code (Paystack), when issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_code: Option<String>,

    /// Raw provider status
    status: String,

    /// Provider key that produced this response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,

    /// Arbitrary provider data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ChargeResponse {
    pub fn new(reference: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            authorization_url: None,
            access_code: None,
            status: status.into(),
            provider: None,
            metadata: None,
        }
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn with_access_code(mut self, code: impl Into<String>) -> Self {
        self.access_code = Some(code.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Build from a loosely keyed provider payload.
    ///
    /// Accepts snake_case and camelCase spellings of `authorization_url` and
    /// `access_code`; unknown keys are ignored. `reference` and `status` are required.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> PaymentResult<Self> {
        let reference = string_field(map, &["reference"])?
            .ok_or_else(|| PaymentError::validation("charge response is missing reference", "reference"))?;
        let status = string_field(map, &["status"])?
            .ok_or_else(|| PaymentError::validation("charge response is missing status", "status"))?;

        let metadata = match map.get("metadata") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Object(metadata)) => Some(metadata.clone()),
            Some(_) => {
                return Err(PaymentError::validation(
                    "charge response metadata must be an object",
                    "metadata",
                ))
            }
        };

        Ok(Self {
            reference,
            authorization_url: string_field(map, &["authorization_url", "authorizationUrl"])?,
            access_code: string_field(map, &["access_code", "accessCode"])?,
            status,
            provider: string_field(map, &["provider"])?,
            metadata,
        })
    }

    pub fn from_value(value: serde_json::Value) -> PaymentResult<Self> {
        match value {
            serde_json::Value::Object(map) => Self::from_map(&map),
            _ => Err(PaymentError::Validation {
                message: "charge response must be a JSON object".to_string(),
                field: None,
            }),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn authorization_url(&self) -> Option<&str> {
        self.authorization_url.as_deref()
    }

    pub fn access_code(&self) -> Option<&str> {
        self.access_code.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn metadata(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.metadata.as_ref()
    }

    /// Canonical outcome using a shared normalizer when available
    pub fn outcome_with(&self, normalizer: Option<&StatusNormalizer>) -> CanonicalStatus {
        StatusNormalizer::normalize_with(normalizer, &self.status, self.provider())
    }

    /// Canonical outcome using the built-in table
    pub fn outcome(&self) -> CanonicalStatus {
        self.outcome_with(None)
    }

    pub fn is_successful(&self) -> bool {
        self.outcome() == CanonicalStatus::Success
    }

    pub fn is_successful_with(&self, normalizer: &StatusNormalizer) -> bool {
        self.outcome_with(Some(normalizer)) == CanonicalStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.outcome() == CanonicalStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.outcome() == CanonicalStatus::Failed
    }
}

/// First non-null value among `keys`, which must be a string
fn string_field(
    map: &serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> PaymentResult<Option<String>> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
    else {
        return Ok(None);
    };
    value
        .as_str()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| PaymentError::validation(format!("charge response {} must be a string", key), key))
}
