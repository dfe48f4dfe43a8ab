//! Lookup of [`IdentityProvider`]s by type name.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, LazyLock},
};

use nested_enum_utils::common_fields;
use parking_lot::RwLock;
use snafu::{Backtrace, OptionExt, Snafu};
use tracing::debug;

use crate::{provider::IdentityProvider, providers::PublicKeyProvider};

/// Maps provider type names to providers.
///
/// Every type name can be registered once and is never removed or replaced. The registry is
/// meant to be built at startup and then shared, usually behind an [`Arc`], with every
/// [`Identities`](crate::Identities) manager and with entry verification.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn IdentityProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry containing the built in [`PublicKeyProvider`].
    pub fn with_defaults() -> Self {
        let provider: Arc<dyn IdentityProvider> = Arc::new(PublicKeyProvider::new());
        let providers = HashMap::from([(PublicKeyProvider::TYPE.to_string(), provider)]);
        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Register `provider` under its [`IdentityProvider::provider_type`].
    pub fn register(&self, provider: impl IdentityProvider) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(provider))
    }

    /// Register an already shared provider.
    ///
    /// Fails if a provider with the same type is already registered.
    pub fn register_shared(&self, provider: Arc<dyn IdentityProvider>) -> Result<(), RegistryError> {
        let provider_type = provider.provider_type().to_string();
        let mut providers = self.providers.write();
        match providers.entry(provider_type) {
            Entry::Occupied(entry) => AlreadyRegisteredSnafu {
                provider_type: entry.key().clone(),
            }
            .fail(),
            Entry::Vacant(entry) => {
                debug!(provider_type = %entry.key(), "registered identity provider");
                entry.insert(provider);
                Ok(())
            }
        }
    }

    /// Get the provider registered for `provider_type`.
    pub fn get(&self, provider_type: &str) -> Result<Arc<dyn IdentityProvider>, RegistryError> {
        self.providers
            .read()
            .get(provider_type)
            .cloned()
            .context(NotFoundSnafu { provider_type })
    }

    /// Returns true if a provider is registered for `provider_type`.
    pub fn contains(&self, provider_type: &str) -> bool {
        self.providers.read().contains_key(provider_type)
    }

    /// The registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<_> = self.providers.read().keys().cloned().collect();
        types.sort();
        types
    }
}

/// A process wide registry with the built in providers.
///
/// This is a convenience for simple callers; everything in orbitlog takes the registry as an
/// argument and works the same with a registry built by hand.
pub fn default_registry() -> &'static ProviderRegistry {
    static DEFAULT: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::with_defaults);
    &DEFAULT
}

/// Errors from a [`ProviderRegistry`].
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum RegistryError {
    #[snafu(display("identity provider {provider_type} not found"))]
    NotFound { provider_type: String },
    #[snafu(display("identity provider {provider_type} is already registered"))]
    AlreadyRegistered { provider_type: String },
}
