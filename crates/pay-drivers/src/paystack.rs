//! # Paystack Driver
//!
//! Hosted checkout through Paystack's Transaction API.
//!
//! - charge: `POST /transaction/initialize` returns `authorization_url` and `access_code`
//! - verify: `GET /transaction/verify/{reference}`
//! - health: `GET /balance`
//!
//! Every Paystack response is wrapped in `{status, message, data}`.

use crate::http::{ProviderHttpClient, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use pay_core::{
    ChargeRequest, ChargeResponse, FromProviderConfig, PaymentDriver, PaymentError,
    PaymentResult, ProviderConfig,
};
use reqwest::Method;
use serde::Deserialize;
use tracing::{info, instrument};

pub const PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

/// Currencies accepted when the config does not restrict them
pub const PAYSTACK_CURRENCIES: &[&str] = &["NGN", "GHS", "ZAR", "KES", "USD"];

pub struct PaystackDriver {
    provider: String,
    currencies: Vec<String>,
    http: ProviderHttpClient,
}

impl PaystackDriver {
    pub fn new(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        let secret_key = config.require_secret_key(provider)?;
        let base_url = config.base_url.as_deref().unwrap_or(PAYSTACK_BASE_URL);
        let http = ProviderHttpClient::new(
            provider,
            base_url,
            secret_key,
            config.timeout(DEFAULT_TIMEOUT_SECS),
        )?;

        Ok(Self {
            provider: provider.to_string(),
            currencies: config.currencies_or(PAYSTACK_CURRENCIES),
            http,
        })
    }

    fn rejected(&self, message: String) -> PaymentError {
        PaymentError::provider(self.provider.clone(), message)
    }
}

#[async_trait]
impl PaymentDriver for PaystackDriver {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
        let payload = serde_json::json!({
            "email": request.email,
            "amount": request.amount,
            "currency": request.currency,
            "reference": request.reference,
            "callback_url": request.callback_url,
            "metadata": request.metadata,
        });

        let raw: PaystackEnvelope<PaystackInitializeData> = self
            .http
            .post_json("/transaction/initialize", &payload)
            .await?;
        if !raw.status {
            return Err(self.rejected(raw.message));
        }
        let data = raw
            .data
            .ok_or_else(|| self.rejected("initialize response has no data".to_string()))?;

        info!(reference = %data.reference, "paystack transaction initialized");

        Ok(ChargeResponse::new(data.reference, "pending")
            .with_authorization_url(data.authorization_url)
            .with_access_code(data.access_code)
            .with_provider(self.provider.clone()))
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> PaymentResult<ChargeResponse> {
        let url = self.http.segment_endpoint("/transaction/verify", reference)?;
        let raw: PaystackEnvelope<PaystackVerifyData> =
            self.http.send(self.http.request_url(Method::GET, url)).await?;
        if !raw.status {
            return Err(self.rejected(raw.message));
        }
        let data = raw
            .data
            .ok_or_else(|| self.rejected("verify response has no data".to_string()))?;

        let mut metadata = serde_json::Map::new();
        metadata.insert("amount".into(), data.amount.into());
        metadata.insert("currency".into(), data.currency.into());
        if let Some(channel) = data.channel {
            metadata.insert("channel".into(), channel.into());
        }
        if let Some(gateway_response) = data.gateway_response {
            metadata.insert("gateway_response".into(), gateway_response.into());
        }

        Ok(ChargeResponse::new(data.reference, data.status)
            .with_provider(self.provider.clone())
            .with_metadata(metadata))
    }

    fn supported_currencies(&self) -> Vec<String> {
        self.currencies.clone()
    }

    async fn health_check(&self) -> PaymentResult<bool> {
        let raw: PaystackEnvelope<serde_json::Value> = self.http.get_json("/balance", &[]).await?;
        Ok(raw.status)
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}

impl FromProviderConfig for PaystackDriver {
    const TYPE_NAME: &'static str = "pay_drivers::PaystackDriver";

    fn from_config(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        Self::new(provider, config)
    }
}

// =============================================================================
// Paystack API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaystackInitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct PaystackVerifyData {
    reference: String,
    status: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    gateway_response: Option<String>,
}
