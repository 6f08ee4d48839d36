//! Shared HTTP plumbing for provider drivers.
//!
//! One `reqwest::Client` per driver instance, bearer auth with the provider
//! secret, and uniform mapping of transport and API failures onto
//! `PaymentError`. Requests are sent once; retry policy belongs to callers.

use pay_core::{PaymentError, PaymentResult};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Default outbound timeout when the provider config sets none
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
    provider: String,
    base_url: String,
    secret_key: String,
}

impl ProviderHttpClient {
    pub fn new(
        provider: impl Into<String>,
        base_url: &str,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> PaymentResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PaymentError::Configuration(format!("failed to initialize HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            provider: provider.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` followed by `segment` escaped as exactly one path segment.
    ///
    /// Caller-supplied identifiers go through here so `/`, `?` or `#` in them
    /// cannot reach another endpoint with our credentials.
    pub fn segment_endpoint(&self, path: &str, segment: &str) -> PaymentResult<Url> {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(PaymentError::validation(
                format!("invalid reference [{}]", segment),
                "reference",
            ));
        }
        let mut url = Url::parse(&self.endpoint(path)).map_err(|e| {
            PaymentError::Configuration(format!("invalid {} endpoint: {}", self.provider, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Configuration(format!(
                    "{} base url cannot carry a path",
                    self.provider
                ))
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Start an authenticated request against `path`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, &self.endpoint(path))
    }

    pub fn request_url(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.secret_key)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> PaymentResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> PaymentResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Send and decode a JSON body; non-2xx becomes `ProviderError`
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PaymentResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(format!("{} request failed: {}", self.provider, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!(
                "{} API error: status={}, body={}",
                self.provider, status, body
            );
            let message = error_message(&body)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            return Err(PaymentError::ProviderError {
                provider: self.provider.clone(),
                message,
                status: Some(status.as_u16()),
            });
        }

        debug!("{} API response: status={}", self.provider, status);
        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!(
                "Failed to parse {} response: {}",
                self.provider, e
            ))
        })
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Stripe nests it under `error.message`; Paystack and Flutterwave use `message`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"No such checkout.session","type":"invalid_request_error"}}"#),
            Some("No such checkout.session".to_string())
        );
        assert_eq!(
            error_message(r#"{"status":false,"message":"Invalid key"}"#),
            Some("Invalid key".to_string())
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_segment_endpoint_escapes_reference() {
        let http = ProviderHttpClient::new(
            "paystack",
            "https://api.paystack.co",
            "sk_test",
            Duration::from_secs(5),
        )
        .unwrap();

        let url = http
            .segment_endpoint("/transaction/verify", "../../balance")
            .unwrap();
        assert_eq!(url.path(), "/transaction/verify/..%2F..%2Fbalance");

        let url = http.segment_endpoint("/transaction/verify", "ref?x=1#y").unwrap();
        assert_eq!(url.path(), "/transaction/verify/ref%3Fx=1%23y");
        assert_eq!(url.query(), None);

        for bad in ["", ".", ".."] {
            let err = http.segment_endpoint("/transaction/verify", bad).unwrap_err();
            assert!(matches!(err, PaymentError::Validation { .. }));
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let http = ProviderHttpClient::new(
            "paystack",
            "https://api.paystack.co/",
            "sk_test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            http.endpoint("/transaction/initialize"),
            "https://api.paystack.co/transaction/initialize"
        );
    }
}
