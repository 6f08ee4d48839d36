//! # Payment Driver Trait
//!
//! Uniform contract every payment provider implements.
//! Implementations: Paystack, Stripe, Flutterwave, or any custom driver.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentDriver (trait)                    │
//! │  ├── charge()                                               │
//! │  ├── verify()                                               │
//! │  ├── supported_currencies() / is_currency_supported()       │
//! │  └── health_check()                                         │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┼─────────────────┐
//!          │                 │                 │
//!  ┌───────┴───────┐ ┌───────┴───────┐ ┌───────┴───────┐
//!  │PaystackDriver │ │ StripeDriver  │ │FlutterwaveDrv │
//!  └───────────────┘ └───────────────┘ └───────────────┘
//! ```
//!
//! Drivers declare which operations they actually provide through
//! `capabilities()`. The factory refuses any driver whose declared set is
//! short of `Capability::ALL`.

use crate::charge::{ChargeRequest, ChargeResponse};
use crate::config::ProviderConfig;
use crate::error::PaymentResult;
use async_trait::async_trait;
use std::sync::Arc;

/// One operation of the driver contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Charge,
    Verify,
    SupportedCurrencies,
    HealthCheck,
}

impl Capability {
    /// The full capability set every driver must provide
    pub const ALL: &'static [Capability] = &[
        Capability::Charge,
        Capability::Verify,
        Capability::SupportedCurrencies,
        Capability::HealthCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Charge => "charge",
            Capability::Verify => "verify",
            Capability::SupportedCurrencies => "supported_currencies",
            Capability::HealthCheck => "health_check",
        }
    }

    /// Capabilities from `ALL` that `declared` lacks
    pub fn missing_from(declared: &[Capability]) -> Vec<Capability> {
        Self::ALL
            .iter()
            .filter(|c| !declared.contains(c))
            .copied()
            .collect()
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentDriver: Send + Sync {
    /// Initialize a charge and return the hosted checkout details.
    async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse>;

    /// Fetch the current state of a transaction by provider reference.
    async fn verify(&self, reference: &str) -> PaymentResult<ChargeResponse>;

    /// Currencies this driver instance accepts (ISO 4217, upper-case).
    fn supported_currencies(&self) -> Vec<String>;

    /// Case-insensitive membership check against `supported_currencies`.
    fn is_currency_supported(&self, code: &str) -> bool {
        let code = code.trim();
        self.supported_currencies()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(code))
    }

    /// Probe the provider API. `Ok(false)` and `Err` both mean unhealthy.
    async fn health_check(&self) -> PaymentResult<bool>;

    /// Provider key this instance was built for (for logging and responses).
    fn provider_name(&self) -> &str;

    /// Operations this driver provides.
    fn capabilities(&self) -> &'static [Capability] {
        Capability::ALL
    }
}

/// Shared driver handle (dynamic dispatch)
pub type BoxedDriver = Arc<dyn PaymentDriver>;

/// Drivers buildable from a provider configuration entry.
///
/// Implemented by every type placed in a `DriverCatalog` through `DriverType::of`.
pub trait FromProviderConfig: PaymentDriver + Sized + 'static {
    /// Fully-qualified type name, e.g. `pay_drivers::PaystackDriver`
    const TYPE_NAME: &'static str;

    /// Capabilities the type declares before any instance exists
    const CAPABILITIES: &'static [Capability] = Capability::ALL;

    fn from_config(provider: &str, config: &ProviderConfig) -> PaymentResult<Self>;
}
