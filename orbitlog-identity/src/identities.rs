//! The [`Identities`] manager.

use std::{collections::HashMap, sync::Arc};

use nested_enum_utils::common_fields;
use parking_lot::RwLock;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, warn};

use crate::{
    config::IdentitiesConfig,
    identity::Identity,
    provider::{IdentityProvider, ProviderError},
    registry::{ProviderRegistry, RegistryError},
};

/// Creates, caches and verifies identities with a single provider.
///
/// Identities created through the manager are kept in memory by their hash. The cache lock
/// is never held while the provider signs or verifies.
#[derive(Debug)]
pub struct Identities {
    provider: Arc<dyn IdentityProvider>,
    storage: RwLock<HashMap<String, Identity>>,
}

impl Identities {
    /// Create a manager for the provider registered as `provider_type`.
    pub fn new(registry: &ProviderRegistry, provider_type: &str) -> Result<Self, IdentitiesError> {
        let provider = registry.get(provider_type).context(ProviderNotFoundSnafu)?;
        Ok(Self::with_provider(provider))
    }

    /// Create a manager for the provider selected in `config`.
    pub fn from_config(
        registry: &ProviderRegistry,
        config: &IdentitiesConfig,
    ) -> Result<Self, IdentitiesError> {
        Self::new(registry, &config.provider)
    }

    /// Create a manager around an explicit provider.
    pub fn with_provider(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            storage: Default::default(),
        }
    }

    /// The provider this manager is bound to.
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Create a new identity for `id` and remember it.
    pub fn create_identity(&self, id: &str) -> Result<Identity, IdentitiesError> {
        let identity = self.provider.create_identity(id).context(ProviderSnafu)?;
        ensure!(identity.is_identity(), InvalidIdentitySnafu);

        self.storage
            .write()
            .insert(identity.hash().to_string(), identity.clone());
        debug!(%id, hash = %identity.hash(), "stored identity");
        Ok(identity)
    }

    /// Get an identity created by this manager.
    pub fn get_identity(&self, hash: &str) -> Result<Identity, IdentitiesError> {
        self.storage
            .read()
            .get(hash)
            .cloned()
            .context(UnknownIdentitySnafu { hash })
    }

    /// Returns true if `identity` is complete and its self-signatures verify.
    ///
    /// Provider errors are logged and reported as `false`.
    pub fn verify_identity(&self, identity: &Identity) -> bool {
        match self.provider.verify_identity(identity) {
            Ok(valid) => valid,
            Err(err) => {
                debug!(id = %identity.id(), "identity verification failed: {err:#}");
                false
            }
        }
    }

    /// Sign `data` with the private key of `identity`.
    pub fn sign(&self, identity: &Identity, data: &[u8]) -> Result<String, IdentitiesError> {
        ensure!(identity.private_key().is_some(), MissingPrivateKeySnafu);
        self.ensure_provider(identity)?;
        self.provider.sign(data, identity).context(ProviderSnafu)
    }

    /// Returns true if `signature` over `data` was made by `identity`.
    pub fn verify(&self, signature: &str, identity: &Identity, data: &[u8]) -> bool {
        if let Err(err) = self.ensure_provider(identity) {
            warn!("{err:#}");
            return false;
        }
        self.provider.verify(identity, signature, data)
    }

    fn ensure_provider(&self, identity: &Identity) -> Result<(), IdentitiesError> {
        let expected = self.provider.provider_type();
        ensure!(
            identity.provider_type() == expected,
            ProviderMismatchSnafu {
                expected,
                actual: identity.provider_type(),
            }
        );
        Ok(())
    }
}

/// Errors from [`Identities`].
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum IdentitiesError {
    #[snafu(display("no identity provider"))]
    ProviderNotFound { source: RegistryError },
    #[snafu(display("identity provider failed"))]
    Provider { source: ProviderError },
    #[snafu(display("invalid identity created"))]
    InvalidIdentity {},
    #[snafu(display("private signing key not found for identity"))]
    MissingPrivateKey {},
    #[snafu(display("identity of type {actual} can not be used with the {expected} provider"))]
    ProviderMismatch { expected: String, actual: String },
    #[snafu(display("unknown identity {hash}"))]
    UnknownIdentity { hash: String },
}
