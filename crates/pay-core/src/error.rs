//! # Payment Error Types
//!
//! Typed error handling for the paygate payment layer.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, unreadable config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Driver could not be resolved, loaded, or does not satisfy the driver contract
    #[error("{message}")]
    DriverNotFound { name: String, message: String },

    /// Requested currency is not in the provider's supported set
    #[error("Currency [{currency}] is not supported by provider [{provider}]")]
    CurrencyNotSupported { currency: String, provider: String },

    /// Malformed charge parameters or malformed provider payload
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Payment provider API error; `status` is the HTTP status when the API answered non-2xx
    #[error("Provider error [{provider}]: {message}")]
    ProviderError {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Driver class could not be found for a provider key
    pub fn driver_class_not_found(class: &str, provider: &str) -> Self {
        PaymentError::DriverNotFound {
            name: provider.to_string(),
            message: format!(
                "Driver class [{}] not found for provider [{}]",
                class, provider
            ),
        }
    }

    /// Shorthand for a validation error tied to a request field
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        PaymentError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Provider rejection carried in a successful HTTP exchange
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ProviderError {
            provider: provider.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Returns true if this error is retryable
    ///
    /// Only transport failures, throttling and provider 5xx qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::NetworkError(_) => true,
            PaymentError::ProviderError {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::DriverNotFound { .. } => 500,
            PaymentError::CurrencyNotSupported { .. } => 400,
            PaymentError::Validation { .. } => 400,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::Serialization(_) => 500,
            PaymentError::Internal(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
