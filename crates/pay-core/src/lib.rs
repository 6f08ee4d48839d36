//! # pay-core
//!
//! Core types and traits for the paygate multi-provider payment layer.
//!
//! This crate provides:
//! - `PaymentDriver` trait implemented by every payment provider
//! - `DriverFactory` and `DriverCatalog` for resolving provider keys to drivers
//! - `PaymentManager` for driver caching, charging and health reporting
//! - `Payment` fluent builder with checkout redirect
//! - `StatusNormalizer` for mapping raw provider statuses to a canonical outcome
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{DriverFactory, Payment, PaymentManager, PaymentsConfig};
//! use std::sync::Arc;
//!
//! let config = PaymentsConfig::load()?;
//! let factory = Arc::new(DriverFactory::new(catalog));
//! let manager = Arc::new(PaymentManager::new(config, factory));
//!
//! let redirect = Payment::new(manager)
//!     .amount(10000)
//!     .currency("NGN")
//!     .email("customer@example.com")
//!     .redirect()
//!     .await?;
//!
//! // Send the customer to redirect.location
//! ```

pub mod charge;
pub mod config;
pub mod driver;
pub mod error;
pub mod factory;
pub mod health;
pub mod manager;
pub mod payment;
pub mod status;

// Re-exports for convenience
pub use charge::{ChargeRequest, ChargeResponse};
pub use config::{HealthCheckConfig, PaymentsConfig, ProviderConfig, DEFAULT_HEALTH_TTL_SECS};
pub use driver::{BoxedDriver, Capability, FromProviderConfig, PaymentDriver};
pub use error::{PaymentError, PaymentResult};
pub use factory::{
    convention_class_name, ConventionResolver, DriverCatalog, DriverFactory, DriverRegistry,
    DriverResolver, DriverType,
};
pub use health::{HealthCache, HealthReport, ProviderHealth};
pub use manager::PaymentManager;
pub use payment::{Payment, Redirect};
pub use status::{mappings, CanonicalStatus, StatusMappings, StatusNormalizer, DEFAULT_STATUS_TABLE};
