//! # Request Handlers
//!
//! Axum request handlers for the payment API.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use pay_core::{CanonicalStatus, HealthReport, Payment, PaymentError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Charge request body
#[derive(Debug, Deserialize)]
pub struct ChargeBody {
    /// Amount in the smallest currency unit
    pub amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Customer email
    pub email: String,
    /// Where the provider returns the customer
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Payment provider (optional, defaults to the configured default)
    #[serde(default)]
    pub provider: Option<String>,
    /// Merchant reference (optional, generated when absent)
    #[serde(default)]
    pub reference: Option<String>,
    /// Custom metadata passed through to the provider
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub provider: Option<String>,
}

/// Verification result
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub reference: String,
    /// Raw provider status
    pub status: String,
    pub outcome: CanonicalStatus,
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let PaymentError::Validation {
        field: Some(field), ..
    } = &err
    {
        response = response.with_field(field.clone());
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "paygate",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Provider health for every enabled provider. Always 200.
#[instrument(skip(state))]
pub async fn payments_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.manager.health_report().await)
}

/// Initialize a charge and redirect to the provider's checkout page
#[instrument(skip(state, body), fields(amount = body.amount, currency = %body.currency))]
pub async fn charge(
    State(state): State<AppState>,
    Json(body): Json<ChargeBody>,
) -> Result<Redirect, (StatusCode, Json<ErrorResponse>)> {
    let mut payment = Payment::new(state.manager.clone())
        .amount(body.amount)
        .currency(body.currency)
        .email(body.email);
    if let Some(url) = body.callback_url {
        payment = payment.callback_url(url);
    }
    if let Some(provider) = body.provider {
        payment = payment.provider(provider);
    }
    if let Some(reference) = body.reference {
        payment = payment.reference(reference);
    }
    for (key, value) in body.metadata {
        payment = payment.metadata(key, value);
    }

    let redirect = payment.redirect().await.map_err(|e| {
        error!("Failed to initialize charge: {}", e);
        payment_error_to_response(e)
    })?;

    info!("Redirecting to checkout: {}", redirect.location);
    Ok(Redirect::to(&redirect.location))
}

/// Look up a transaction by reference
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<ErrorResponse>)> {
    let response = state
        .manager
        .verify(&reference, query.provider.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to verify {}: {}", reference, e);
            payment_error_to_response(e)
        })?;

    let outcome = state.manager.outcome(&response);
    Ok(Json(VerifyResponse {
        reference: response.reference().to_string(),
        status: response.status().to_string(),
        outcome,
        successful: outcome.is_success(),
        provider: response.provider().map(String::from),
    }))
}
