//! # Payment Builder
//!
//! Fluent front door for a single charge.
//!
//! ```rust,ignore
//! let redirect = Payment::new(manager.clone())
//!     .amount(10000)
//!     .currency("NGN")
//!     .email("test@example.com")
//!     .callback_url("https://shop.example/callback")
//!     .redirect()
//!     .await?;
//! ```

use crate::charge::{ChargeRequest, ChargeResponse};
use crate::error::{PaymentError, PaymentResult};
use crate::manager::PaymentManager;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Where to send the customer to complete payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Accumulates charge parameters, then charges through a `PaymentManager`
pub struct Payment {
    manager: Arc<PaymentManager>,
    amount: Option<i64>,
    currency: Option<String>,
    email: Option<String>,
    callback_url: Option<String>,
    provider: Option<String>,
    reference: Option<String>,
    metadata: HashMap<String, String>,
}

impl Payment {
    pub fn new(manager: Arc<PaymentManager>) -> Self {
        Self {
            manager,
            amount: None,
            currency: None,
            email: None,
            callback_url: None,
            provider: None,
            reference: None,
            metadata: HashMap::new(),
        }
    }

    /// Amount in the smallest currency unit
    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Provider key; the manager's default is used when unset
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Merchant reference; a UUID is generated when unset
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Assemble and validate the request without charging
    pub fn build_request(&self) -> PaymentResult<ChargeRequest> {
        let amount = self
            .amount
            .ok_or_else(|| PaymentError::validation("amount is required", "amount"))?;
        let currency = self
            .currency
            .as_deref()
            .ok_or_else(|| PaymentError::validation("currency is required", "currency"))?;
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| PaymentError::validation("email is required", "email"))?;
        let reference = self
            .reference
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut request = ChargeRequest::new(amount, currency, email, reference);
        request.callback_url = self.callback_url.clone();
        request.metadata = self.metadata.clone();
        request.validate()?;
        Ok(request)
    }

    /// Charge and return the provider response
    pub async fn charge(self) -> PaymentResult<ChargeResponse> {
        let request = self.build_request()?;
        self.manager
            .charge_with(self.provider.as_deref(), &request)
            .await
    }

    /// Charge and return a redirect to the provider's checkout page
    pub async fn redirect(self) -> PaymentResult<Redirect> {
        let response = self.charge().await?;
        let location = response.authorization_url().ok_or_else(|| {
            PaymentError::Validation {
                message: format!(
                    "provider returned no authorization URL for reference {}",
                    response.reference()
                ),
                field: Some("authorization_url".to_string()),
            }
        })?;
        debug!("Redirecting {} to {}", response.reference(), location);
        Ok(Redirect::to(location))
    }
}
