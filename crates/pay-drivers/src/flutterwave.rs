//! # Flutterwave Driver
//!
//! Flutterwave Standard (v3) hosted payment links.
//!
//! Flutterwave takes amounts in major units, so the minor-unit amount from
//! `ChargeRequest` is divided by 100 on the way out. The merchant reference
//! travels as `tx_ref` and is what `verify` looks up.

use crate::http::{ProviderHttpClient, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use pay_core::{
    ChargeRequest, ChargeResponse, FromProviderConfig, PaymentDriver, PaymentError,
    PaymentResult, ProviderConfig,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

pub const FLUTTERWAVE_BASE_URL: &str = "https://api.flutterwave.com/v3";

pub const FLUTTERWAVE_CURRENCIES: &[&str] =
    &["NGN", "GHS", "KES", "UGX", "ZAR", "USD", "EUR", "GBP"];

pub struct FlutterwaveDriver {
    provider: String,
    currencies: Vec<String>,
    /// Title shown on the hosted payment page
    title: Option<String>,
    http: ProviderHttpClient,
}

impl FlutterwaveDriver {
    pub fn new(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        let secret_key = config.require_secret_key(provider)?;
        let base_url = config.base_url.as_deref().unwrap_or(FLUTTERWAVE_BASE_URL);
        let http = ProviderHttpClient::new(
            provider,
            base_url,
            secret_key,
            config.timeout(DEFAULT_TIMEOUT_SECS),
        )?;

        Ok(Self {
            provider: provider.to_string(),
            currencies: config.currencies_or(FLUTTERWAVE_CURRENCIES),
            title: config
                .extra
                .get("title")
                .and_then(|v| v.as_str())
                .map(String::from),
            http,
        })
    }

    fn ensure_success(&self, raw: &FlutterwaveEnvelope) -> PaymentResult<()> {
        if raw.status.eq_ignore_ascii_case("success") {
            Ok(())
        } else {
            Err(PaymentError::provider(self.provider.clone(), raw.message.clone()))
        }
    }
}

fn major_units(amount: i64) -> f64 {
    amount as f64 / 100.0
}

#[async_trait]
impl PaymentDriver for FlutterwaveDriver {
    #[instrument(skip(self, request), fields(tx_ref = %request.reference))]
    async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
        let mut payload = serde_json::json!({
            "tx_ref": request.reference,
            "amount": major_units(request.amount),
            "currency": request.currency,
            "redirect_url": request.callback_url,
            "customer": {
                "email": request.email,
            },
            "meta": request.metadata,
        });
        if let Some(title) = &self.title {
            payload["customizations"] = serde_json::json!({ "title": title });
        }

        let raw: FlutterwaveEnvelope = self.http.post_json("/payments", &payload).await?;
        self.ensure_success(&raw)?;

        let link = raw
            .data
            .as_ref()
            .and_then(|v| v.get("link"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PaymentError::provider(
                    self.provider.clone(),
                    "missing payment link in flutterwave response",
                )
            })?;

        info!(tx_ref = %request.reference, "flutterwave payment link created");

        Ok(ChargeResponse::new(request.reference.clone(), "pending")
            .with_authorization_url(link)
            .with_provider(self.provider.clone()))
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> PaymentResult<ChargeResponse> {
        let raw: FlutterwaveEnvelope = self
            .http
            .get_json("/transactions/verify_by_reference", &[("tx_ref", reference)])
            .await?;
        self.ensure_success(&raw)?;

        let data = raw.data.unwrap_or_else(|| serde_json::json!({}));
        let status = data
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let tx_ref = data
            .get("tx_ref")
            .and_then(|v| v.as_str())
            .unwrap_or(reference)
            .to_string();

        let mut metadata = serde_json::Map::new();
        for key in ["id", "flw_ref", "amount", "currency", "payment_type"] {
            if let Some(value) = data.get(key) {
                metadata.insert(key.to_string(), value.clone());
            }
        }

        Ok(ChargeResponse::new(tx_ref, status)
            .with_provider(self.provider.clone())
            .with_metadata(metadata))
    }

    fn supported_currencies(&self) -> Vec<String> {
        self.currencies.clone()
    }

    async fn health_check(&self) -> PaymentResult<bool> {
        let raw: FlutterwaveEnvelope = self.http.get_json("/balances", &[]).await?;
        Ok(raw.status.eq_ignore_ascii_case("success"))
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}

impl FromProviderConfig for FlutterwaveDriver {
    const TYPE_NAME: &'static str = "pay_drivers::FlutterwaveDriver";

    fn from_config(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        Self::new(provider, config)
    }
}

#[derive(Debug, Deserialize)]
struct FlutterwaveEnvelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<JsonValue>,
}
