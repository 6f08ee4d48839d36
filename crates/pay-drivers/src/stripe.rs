//! # Stripe Checkout Driver
//!
//! Charges through Stripe Checkout Sessions and sends the customer to the
//! hosted checkout page. Verification fetches the session back by id.
//!
//! The raw status reported for a session is its `status` (`open`,
//! `expired`) until it completes, after which it is the session's
//! `payment_status` (`paid`, `unpaid`, `no_payment_required`).

use crate::http::{ProviderHttpClient, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use pay_core::{
    ChargeRequest, ChargeResponse, FromProviderConfig, PaymentDriver, PaymentError,
    PaymentResult, ProviderConfig,
};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info, instrument};

pub const STRIPE_BASE_URL: &str = "https://api.stripe.com";
pub const STRIPE_API_VERSION: &str = "2024-12-18.acacia";

pub const STRIPE_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CAD", "AUD", "NGN"];

/// Stripe Checkout Session driver
///
/// Uses Stripe's hosted checkout page for secure payments.
pub struct StripeDriver {
    provider: String,
    currencies: Vec<String>,
    /// Where Stripe sends a customer who abandons checkout
    cancel_url: Option<String>,
    /// Line item name shown on the checkout page
    product_name: String,
    test_mode: bool,
    http: ProviderHttpClient,
}

impl StripeDriver {
    pub fn new(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        let secret_key = config.require_secret_key(provider)?;

        // Validate key format
        if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
            return Err(PaymentError::Configuration(format!(
                "secret_key for provider [{}] must start with sk_test_ or sk_live_",
                provider
            )));
        }

        let base_url = config.base_url.as_deref().unwrap_or(STRIPE_BASE_URL);
        let http = ProviderHttpClient::new(
            provider,
            base_url,
            secret_key,
            config.timeout(DEFAULT_TIMEOUT_SECS),
        )?;

        let extra_str = |key: &str| {
            config
                .extra
                .get(key)
                .and_then(|v| v.as_str())
                .map(String::from)
        };

        Ok(Self {
            provider: provider.to_string(),
            currencies: config.currencies_or(STRIPE_CURRENCIES),
            cancel_url: extra_str("cancel_url"),
            product_name: extra_str("product_name").unwrap_or_else(|| "Payment".to_string()),
            test_mode: secret_key.starts_with("sk_test_"),
            http,
        })
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Form body for `POST /v1/checkout/sessions`
    fn session_form(&self, request: &ChargeRequest) -> PaymentResult<Vec<(String, String)>> {
        let success_url = request.callback_url.clone().ok_or_else(|| {
            PaymentError::validation("callback_url is required for Stripe checkout", "callback_url")
        })?;
        let cancel_url = self.cancel_url.clone().unwrap_or_else(|| success_url.clone());

        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url),
            ("cancel_url".to_string(), cancel_url),
            ("customer_email".to_string(), request.email.clone()),
            ("client_reference_id".to_string(), request.reference.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                self.product_name.clone(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("metadata[reference]".to_string(), request.reference.clone()),
        ];

        let mut keys: Vec<&String> = request.metadata.keys().collect();
        keys.sort();
        for key in keys {
            form_params.push((format!("metadata[{}]", key), request.metadata[key].clone()));
        }

        Ok(form_params)
    }

    fn to_response(&self, session: StripeCheckoutSession) -> ChargeResponse {
        let status = match (session.status.as_deref(), session.payment_status.as_deref()) {
            (Some("complete"), Some(payment_status)) => payment_status.to_string(),
            (Some(status), _) => status.to_string(),
            (None, Some(payment_status)) => payment_status.to_string(),
            (None, None) => "unknown".to_string(),
        };

        let mut metadata = serde_json::Map::new();
        if let Some(client_reference_id) = session.client_reference_id {
            metadata.insert("client_reference_id".into(), client_reference_id.into());
        }
        if let Some(payment_intent) = session.payment_intent {
            metadata.insert("payment_intent".into(), payment_intent.into());
        }
        if let Some(amount_total) = session.amount_total {
            metadata.insert("amount_total".into(), amount_total.into());
        }

        let mut response = ChargeResponse::new(session.id, status)
            .with_provider(self.provider.clone())
            .with_metadata(metadata);
        if let Some(url) = session.url {
            response = response.with_authorization_url(url);
        }
        response
    }
}

#[async_trait]
impl PaymentDriver for StripeDriver {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
        let form_params = self.session_form(request)?;

        debug!(
            "Creating Stripe checkout session: amount={}, currency={}",
            request.amount, request.currency
        );

        let session: StripeCheckoutSession = self
            .http
            .send(
                self.http
                    .request(Method::POST, "/v1/checkout/sessions")
                    .header("Stripe-Version", STRIPE_API_VERSION)
                    .header("Idempotency-Key", &request.reference)
                    .form(&form_params),
            )
            .await?;

        info!(
            "Created Stripe checkout session: id={}, url={}",
            session.id,
            session.url.as_deref().unwrap_or("-")
        );

        if session.url.is_none() {
            return Err(PaymentError::provider(
                self.provider.clone(),
                format!("checkout session {} has no url", session.id),
            ));
        }
        Ok(self.to_response(session))
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> PaymentResult<ChargeResponse> {
        let url = self.http.segment_endpoint("/v1/checkout/sessions", reference)?;
        let session: StripeCheckoutSession = self
            .http
            .send(
                self.http
                    .request_url(Method::GET, url)
                    .header("Stripe-Version", STRIPE_API_VERSION),
            )
            .await?;
        Ok(self.to_response(session))
    }

    fn supported_currencies(&self) -> Vec<String> {
        self.currencies.clone()
    }

    async fn health_check(&self) -> PaymentResult<bool> {
        let balance: serde_json::Value = self.http.get_json("/v1/balance", &[]).await?;
        Ok(balance.get("object").and_then(|o| o.as_str()) == Some("balance"))
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}

impl FromProviderConfig for StripeDriver {
    const TYPE_NAME: &'static str = "pay_drivers::StripeDriver";

    fn from_config(provider: &str, config: &ProviderConfig) -> PaymentResult<Self> {
        Self::new(provider, config)
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
}
