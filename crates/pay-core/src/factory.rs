//! # Driver Factory
//!
//! Resolves a provider key (or a driver type name) to a constructed driver.
//!
//! Driver types are not looked up at runtime by reflection. Every loadable
//! type is listed in a `DriverCatalog`: a type name, the capabilities the
//! type declares, and a constructor closure. The factory keeps that catalog
//! together with the runtime registrations (provider key -> type name).
//!
//! Resolution order used by `ConventionResolver`:
//!
//! 1. a runtime registration for the key
//! 2. the provider's `driver_class` override
//! 3. the name itself, when it names a catalog type
//! 4. naming convention: `paystack` -> `PaystackDriver`
//!
//! Whatever the resolver returns, the factory checks the type against the
//! full capability set before and after construction.

use crate::config::ProviderConfig;
use crate::driver::{BoxedDriver, Capability, FromProviderConfig};
use crate::error::{PaymentError, PaymentResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Constructor stored for a driver type
pub type DriverConstructor =
    Arc<dyn Fn(&str, &ProviderConfig) -> PaymentResult<BoxedDriver> + Send + Sync>;

/// A loadable driver type
#[derive(Clone)]
pub struct DriverType {
    name: String,
    capabilities: Vec<Capability>,
    constructor: DriverConstructor,
}

impl DriverType {
    /// Describe a concrete driver type
    pub fn of<D: FromProviderConfig>() -> Self {
        Self {
            name: D::TYPE_NAME.to_string(),
            capabilities: D::CAPABILITIES.to_vec(),
            constructor: Arc::new(|provider: &str, config: &ProviderConfig| {
                let driver = D::from_config(provider, config)?;
                Ok(Arc::new(driver) as BoxedDriver)
            }),
        }
    }

    /// Describe a driver type backed by an arbitrary constructor
    pub fn new<F>(name: impl Into<String>, capabilities: &[Capability], constructor: F) -> Self
    where
        F: Fn(&str, &ProviderConfig) -> PaymentResult<BoxedDriver> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.to_vec(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn build(&self, provider: &str, config: &ProviderConfig) -> PaymentResult<BoxedDriver> {
        (self.constructor)(provider, config)
    }
}

impl std::fmt::Debug for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverType")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Set of loadable driver types, keyed by fully-qualified name
#[derive(Debug, Clone, Default)]
pub struct DriverCatalog {
    types: BTreeMap<String, DriverType>,
}

impl DriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a type
    pub fn insert(&mut self, driver_type: DriverType) {
        self.types.insert(driver_type.name().to_string(), driver_type);
    }

    /// Register with builder pattern
    pub fn with_type(mut self, driver_type: DriverType) -> Self {
        self.insert(driver_type);
        self
    }

    /// Look up by fully-qualified name, or by short name for unqualified input
    pub fn get(&self, name: &str) -> Option<&DriverType> {
        if let Some(found) = self.types.get(name) {
            return Some(found);
        }
        if name.contains("::") {
            return None;
        }
        self.types.values().find(|t| t.short_name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Catalog plus runtime registrations; what a resolver sees
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    catalog: DriverCatalog,
    registered: BTreeMap<String, String>,
}

impl DriverRegistry {
    pub fn catalog(&self) -> &DriverCatalog {
        &self.catalog
    }

    /// Type name registered for a provider key
    pub fn registered_type(&self, name: &str) -> Option<&str> {
        self.registered.get(name).map(|s| s.as_str())
    }
}

/// Strategy for mapping a provider key to a driver type name
pub trait DriverResolver: Send + Sync {
    /// Type name that should back `name`, or `None` when nothing matches
    fn resolve(&self, name: &str, config: &ProviderConfig, registry: &DriverRegistry)
        -> Option<String>;
}

/// Default resolution: registration, config override, direct type, convention
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionResolver;

impl DriverResolver for ConventionResolver {
    fn resolve(
        &self,
        name: &str,
        config: &ProviderConfig,
        registry: &DriverRegistry,
    ) -> Option<String> {
        if let Some(registered) = registry.registered_type(name) {
            return Some(registered.to_string());
        }
        if let Some(class) = config.driver_class.as_deref().filter(|c| !c.trim().is_empty()) {
            return Some(class.trim().to_string());
        }
        if registry.catalog().contains(name) {
            return Some(name.to_string());
        }
        let key = config.driver.as_deref().unwrap_or(name);
        Some(convention_class_name(key))
    }
}

/// `paystack` -> `PaystackDriver`, `mobile_money` -> `MobileMoneyDriver`.
///
/// Paths such as `my_app::CustomDriver` are already type names and pass through unchanged.
pub fn convention_class_name(key: &str) -> String {
    if key.contains("::") {
        return key.trim().to_string();
    }
    let mut out = String::with_capacity(key.len() + 6);
    for part in key
        .split(|c: char| c == '_' || c == '-' || c == ' ' || c == '.')
        .filter(|p| !p.is_empty())
    {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str("Driver");
    out
}

fn ensure_contract(type_name: &str, provider: &str, declared: &[Capability]) -> PaymentResult<()> {
    let missing = Capability::missing_from(declared);
    if missing.is_empty() {
        return Ok(());
    }
    let missing: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
    Err(PaymentError::DriverNotFound {
        name: provider.to_string(),
        message: format!(
            "Driver class [{}] must implement PaymentDriver (missing: {})",
            type_name,
            missing.join(", ")
        ),
    })
}

/// Builds drivers from provider configuration
pub struct DriverFactory {
    registry: RwLock<DriverRegistry>,
    resolver: Box<dyn DriverResolver>,
}

impl DriverFactory {
    /// Create a factory over a catalog of loadable types
    pub fn new(catalog: DriverCatalog) -> Self {
        Self {
            registry: RwLock::new(DriverRegistry {
                catalog,
                registered: BTreeMap::new(),
            }),
            resolver: Box::new(ConventionResolver),
        }
    }

    /// Builder: replace the resolution strategy
    pub fn with_resolver(mut self, resolver: impl DriverResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Resolve and construct a driver for `name` with `config`
    #[instrument(skip(self, config))]
    pub fn create(&self, name: &str, config: &ProviderConfig) -> PaymentResult<BoxedDriver> {
        let driver_type = {
            let registry = self.registry.read();
            let type_name = self
                .resolver
                .resolve(name, config, &registry)
                .unwrap_or_else(|| convention_class_name(name));
            registry
                .catalog()
                .get(&type_name)
                .cloned()
                .ok_or_else(|| PaymentError::driver_class_not_found(&type_name, name))?
        };

        ensure_contract(driver_type.name(), name, driver_type.capabilities())?;
        let driver = driver_type.build(name, config)?;
        ensure_contract(driver_type.name(), name, driver.capabilities())?;

        debug!(
            "Created driver: provider={}, type={}",
            name,
            driver_type.name()
        );
        Ok(driver)
    }

    /// Bind a provider key to a catalog type. Validated eagerly.
    pub fn register(&self, name: impl Into<String>, type_name: &str) -> PaymentResult<()> {
        let name = name.into();
        let mut registry = self.registry.write();

        let driver_type = registry.catalog.get(type_name).ok_or_else(|| {
            PaymentError::DriverNotFound {
                name: name.clone(),
                message: format!("Driver class [{}] does not exist", type_name),
            }
        })?;
        ensure_contract(driver_type.name(), &name, driver_type.capabilities())?;

        let resolved = driver_type.name().to_string();
        info!("Registered driver: {} -> {}", name, resolved);
        registry.registered.insert(name, resolved);
        Ok(())
    }

    /// Make a type loadable
    pub fn register_type(&self, driver_type: DriverType) {
        self.registry.write().catalog.insert(driver_type);
    }

    /// Make a type loadable and bind `name` to it
    pub fn register_driver(
        &self,
        name: impl Into<String>,
        driver_type: DriverType,
    ) -> PaymentResult<()> {
        let name = name.into();
        ensure_contract(driver_type.name(), &name, driver_type.capabilities())?;
        let type_name = driver_type.name().to_string();
        self.register_type(driver_type);
        self.register(name, &type_name)
    }

    /// Keys registered at runtime (built-in catalog entries are not included)
    pub fn registered_drivers(&self) -> BTreeSet<String> {
        self.registry.read().registered.keys().cloned().collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.read().registered.contains_key(name)
    }

    /// Snapshot of the loadable types
    pub fn catalog(&self) -> DriverCatalog {
        self.registry.read().catalog.clone()
    }
}

impl Default for DriverFactory {
    fn default() -> Self {
        Self::new(DriverCatalog::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::{ChargeRequest, ChargeResponse};
    use crate::driver::PaymentDriver;
    use async_trait::async_trait;

    struct EchoDriver {
        provider: String,
    }

    #[async_trait]
    impl PaymentDriver for EchoDriver {
        async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
            Ok(ChargeResponse::new(request.reference.clone(), "pending"))
        }

        async fn verify(&self, reference: &str) -> PaymentResult<ChargeResponse> {
            Ok(ChargeResponse::new(reference, "success"))
        }

        fn supported_currencies(&self) -> Vec<String> {
            vec!["NGN".to_string()]
        }

        async fn health_check(&self) -> PaymentResult<bool> {
            Ok(true)
        }

        fn provider_name(&self) -> &str {
            &self.provider
        }
    }

    impl FromProviderConfig for EchoDriver {
        const TYPE_NAME: &'static str = "tests::EchoDriver";

        fn from_config(provider: &str, _config: &ProviderConfig) -> PaymentResult<Self> {
            Ok(Self {
                provider: provider.to_string(),
            })
        }
    }

    /// Charges but cannot verify or report health
    struct ChargeOnlyDriver;

    #[async_trait]
    impl PaymentDriver for ChargeOnlyDriver {
        async fn charge(&self, request: &ChargeRequest) -> PaymentResult<ChargeResponse> {
            Ok(ChargeResponse::new(request.reference.clone(), "pending"))
        }

        async fn verify(&self, _reference: &str) -> PaymentResult<ChargeResponse> {
            Err(PaymentError::Internal("verify not supported".into()))
        }

        fn supported_currencies(&self) -> Vec<String> {
            vec!["NGN".to_string()]
        }

        async fn health_check(&self) -> PaymentResult<bool> {
            Err(PaymentError::Internal("health check not supported".into()))
        }

        fn provider_name(&self) -> &str {
            "charge-only"
        }

        fn capabilities(&self) -> &'static [Capability] {
            &[Capability::Charge, Capability::SupportedCurrencies]
        }
    }

    impl FromProviderConfig for ChargeOnlyDriver {
        const TYPE_NAME: &'static str = "tests::ChargeOnlyDriver";
        const CAPABILITIES: &'static [Capability] =
            &[Capability::Charge, Capability::SupportedCurrencies];

        fn from_config(_provider: &str, _config: &ProviderConfig) -> PaymentResult<Self> {
            Ok(Self)
        }
    }

    fn factory() -> DriverFactory {
        DriverFactory::new(
            DriverCatalog::new()
                .with_type(DriverType::of::<EchoDriver>())
                .with_type(DriverType::of::<ChargeOnlyDriver>()),
        )
    }

    #[test]
    fn test_convention_class_name() {
        assert_eq!(convention_class_name("paystack"), "PaystackDriver");
        assert_eq!(convention_class_name("mobile_money"), "MobileMoneyDriver");
        assert_eq!(convention_class_name("flutter-wave"), "FlutterWaveDriver");
        assert_eq!(
            convention_class_name("my_app::CustomDriver"),
            "my_app::CustomDriver"
        );
    }

    #[test]
    fn test_create_missing_type_path_reported_as_given() {
        let err = factory()
            .create("my_app::CustomDriver", &ProviderConfig::default())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Driver class [my_app::CustomDriver] not found for provider [my_app::CustomDriver]"
        );

        let config = ProviderConfig::default().with_driver("my_app::CustomDriver");
        let err = factory().create("custom", &config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Driver class [my_app::CustomDriver] not found for provider [custom]"
        );
    }

    #[test]
    fn test_catalog_lookup_by_short_name() {
        let catalog = DriverCatalog::new().with_type(DriverType::of::<EchoDriver>());
        assert!(catalog.contains("tests::EchoDriver"));
        assert!(catalog.contains("EchoDriver"));
        assert!(!catalog.contains("other::EchoDriver"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_create_by_convention() {
        let driver = factory().create("echo", &ProviderConfig::default()).unwrap();
        assert_eq!(driver.provider_name(), "echo");
        assert!(Capability::missing_from(driver.capabilities()).is_empty());
    }

    #[test]
    fn test_create_by_type_name() {
        let driver = factory()
            .create("tests::EchoDriver", &ProviderConfig::default())
            .unwrap();
        assert_eq!(driver.provider_name(), "tests::EchoDriver");
    }

    #[test]
    fn test_create_uses_config_driver_key() {
        let config = ProviderConfig::default().with_driver("echo");
        let driver = factory().create("echo_eu", &config).unwrap();
        assert_eq!(driver.provider_name(), "echo_eu");
    }

    #[test]
    fn test_create_nonexistent() {
        let err = factory()
            .create("nonexistent", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PaymentError::DriverNotFound { .. }));
        assert!(err.to_string().contains("NonexistentDriver"));
    }

    #[test]
    fn test_driver_class_override() {
        let config = ProviderConfig::default().with_driver_class("tests::EchoDriver");
        let driver = factory().create("custom", &config).unwrap();
        assert_eq!(driver.provider_name(), "custom");

        let missing = ProviderConfig::default().with_driver_class("tests::MissingDriver");
        let err = factory().create("custom", &missing).err().unwrap();
        assert!(err.to_string().contains("tests::MissingDriver"));
    }

    #[test]
    fn test_registration_takes_precedence() {
        let factory = factory();
        factory.register("acme", "EchoDriver").unwrap();
        let config = ProviderConfig::default().with_driver_class("tests::MissingDriver");
        assert!(factory.create("acme", &config).is_ok());
        assert!(factory.is_registered("acme"));
        assert_eq!(
            factory.registered_drivers().into_iter().collect::<Vec<_>>(),
            vec!["acme".to_string()]
        );
    }

    #[test]
    fn test_register_unknown_type() {
        let factory = factory();
        let err = factory.register("ghost", "tests::GhostDriver").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!factory.is_registered("ghost"));
        assert!(factory.registered_drivers().is_empty());
    }

    #[test]
    fn test_register_incomplete_type() {
        let factory = factory();
        let err = factory.register("partial", "tests::ChargeOnlyDriver").unwrap_err();
        assert!(err.to_string().contains("must implement PaymentDriver"));
        assert!(err.to_string().contains("verify"));
        assert!(!factory.is_registered("partial"));
    }

    #[test]
    fn test_create_rejects_incomplete_type() {
        let err = factory()
            .create("charge_only", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("must implement PaymentDriver"));
    }

    #[test]
    fn test_instance_capabilities_checked_after_construction() {
        // Type claims the full set, instance does not
        let lying = DriverType::new("tests::LyingDriver", Capability::ALL, |_, _| {
            Ok(Arc::new(ChargeOnlyDriver) as BoxedDriver)
        });
        let factory = factory();
        factory.register_type(lying);
        let err = factory
            .create("lying", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("must implement PaymentDriver"));
    }

    #[test]
    fn test_custom_resolver_still_validated() {
        struct AlwaysChargeOnly;
        impl DriverResolver for AlwaysChargeOnly {
            fn resolve(&self, _: &str, _: &ProviderConfig, _: &DriverRegistry) -> Option<String> {
                Some("tests::ChargeOnlyDriver".to_string())
            }
        }

        let factory = factory().with_resolver(AlwaysChargeOnly);
        let err = factory
            .create("anything", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PaymentError::DriverNotFound { .. }));
    }

    #[test]
    fn test_register_driver_adds_type() {
        let factory = DriverFactory::default();
        factory
            .register_driver("echo_custom", DriverType::of::<EchoDriver>())
            .unwrap();
        assert!(factory.catalog().contains("tests::EchoDriver"));
        assert!(factory
            .create("echo_custom", &ProviderConfig::default())
            .is_ok());

        let err = factory
            .register_driver("partial", DriverType::of::<ChargeOnlyDriver>())
            .unwrap_err();
        assert!(err.to_string().contains("must implement"));
        assert!(!factory.catalog().contains("tests::ChargeOnlyDriver"));
    }

    #[test]
    fn test_constructor_errors_propagate() {
        let failing = DriverType::new("tests::BrokenDriver", Capability::ALL, |provider, _| {
            Err(PaymentError::Configuration(format!(
                "secret_key is required for provider [{}]",
                provider
            )))
        });
        let factory = factory();
        factory.register_type(failing);
        let err = factory
            .create("broken", &ProviderConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PaymentError::Configuration(_)));
    }
}
