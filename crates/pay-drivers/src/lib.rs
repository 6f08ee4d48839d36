//! # pay-drivers
//!
//! Built-in payment provider drivers for paygate-rs.
//!
//! | Provider key  | Type                            | Checkout                     |
//! |---------------|---------------------------------|------------------------------|
//! | `paystack`    | `pay_drivers::PaystackDriver`   | Transaction initialize       |
//! | `stripe`      | `pay_drivers::StripeDriver`     | Checkout Sessions            |
//! | `flutterwave` | `pay_drivers::FlutterwaveDriver`| Standard hosted payment link |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_core::{PaymentManager, PaymentsConfig, StatusNormalizer};
//! use std::sync::Arc;
//!
//! let config = PaymentsConfig::load()?;
//! let normalizer = Arc::new(StatusNormalizer::new());
//! pay_drivers::register_status_mappings(&normalizer);
//!
//! let manager = PaymentManager::new(config, Arc::new(pay_drivers::default_factory()))
//!     .with_normalizer(normalizer);
//! ```

pub mod flutterwave;
pub mod http;
pub mod paystack;
pub mod stripe;

// Re-exports
pub use flutterwave::FlutterwaveDriver;
pub use http::ProviderHttpClient;
pub use paystack::PaystackDriver;
pub use stripe::StripeDriver;

use pay_core::{mappings, CanonicalStatus, DriverCatalog, DriverFactory, DriverType, StatusNormalizer};

/// Catalog of every driver type shipped with this crate
pub fn builtin_catalog() -> DriverCatalog {
    DriverCatalog::new()
        .with_type(DriverType::of::<PaystackDriver>())
        .with_type(DriverType::of::<StripeDriver>())
        .with_type(DriverType::of::<FlutterwaveDriver>())
}

/// Factory over the built-in catalog with convention-based resolution
pub fn default_factory() -> DriverFactory {
    DriverFactory::new(builtin_catalog())
}

/// Provider-specific status vocabulary not covered by the global table
pub fn register_status_mappings(normalizer: &StatusNormalizer) {
    normalizer.register_provider_mappings(
        "stripe",
        mappings(&[
            (CanonicalStatus::Success, &["complete", "no_payment_required"]),
            (CanonicalStatus::Pending, &["open", "unpaid"]),
            (CanonicalStatus::Failed, &["expired"]),
        ]),
    );
    normalizer.register_provider_mappings(
        "flutterwave",
        mappings(&[(CanonicalStatus::Pending, &["success-pending-validation"])]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::{Capability, PaymentError, ProviderConfig};

    #[test]
    fn test_builtin_catalog() {
        let catalog = builtin_catalog();
        assert_eq!(
            catalog.names(),
            vec![
                "pay_drivers::FlutterwaveDriver",
                "pay_drivers::PaystackDriver",
                "pay_drivers::StripeDriver",
            ]
        );
    }

    #[test]
    fn test_create_paystack_by_convention() {
        let factory = default_factory();
        let driver = factory
            .create("paystack", &ProviderConfig::new("sk_test_abc"))
            .unwrap();

        assert_eq!(driver.provider_name(), "paystack");
        assert!(Capability::missing_from(driver.capabilities()).is_empty());
        assert!(driver.is_currency_supported("NGN"));
    }

    #[test]
    fn test_create_nonexistent_names_class() {
        let err = default_factory()
            .create("nonexistent", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PaymentError::DriverNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Driver class [NonexistentDriver] not found for provider [nonexistent]"
        );
    }

    #[test]
    fn test_driver_class_override() {
        let config = ProviderConfig::new("FLWSECK_TEST-abc")
            .with_driver_class("pay_drivers::FlutterwaveDriver");
        let driver = default_factory().create("paystack", &config).unwrap();

        // Flutterwave accepts EUR, Paystack does not
        assert!(driver.is_currency_supported("EUR"));
    }

    #[test]
    fn test_register_alias() {
        let factory = default_factory();
        factory.register("card", "pay_drivers::StripeDriver").unwrap();
        let driver = factory
            .create("card", &ProviderConfig::new("sk_test_abc"))
            .unwrap();
        assert_eq!(driver.provider_name(), "card");

        let err = factory.register("mpesa", "pay_drivers::MpesaDriver").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(factory.registered_drivers().len(), 1);
    }

    #[test]
    fn test_stripe_status_mappings() {
        let normalizer = StatusNormalizer::new();
        register_status_mappings(&normalizer);

        assert_eq!(
            normalizer.normalize("complete", Some("stripe")),
            CanonicalStatus::Success
        );
        assert_eq!(
            normalizer.normalize("unpaid", Some("stripe")),
            CanonicalStatus::Pending
        );
        assert_eq!(
            normalizer.normalize("unpaid", Some("paystack")),
            CanonicalStatus::Unknown
        );
        assert_eq!(
            normalizer.normalize("expired", Some("stripe")),
            CanonicalStatus::Failed
        );
    }
}
