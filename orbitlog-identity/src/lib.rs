//! Identities for orbitlog.
//!
//! An [`Identity`] binds a public key to an id through two self-signatures. How keys are
//! obtained and how signatures are produced is up to an [`IdentityProvider`]; providers are
//! looked up by their type name in a [`ProviderRegistry`], and an [`Identities`] manager
//! creates and caches identities for one provider.
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]
#![cfg_attr(orbitlog_docsrs, feature(doc_cfg))]

pub mod config;
pub mod identities;
pub mod identity;
pub mod keys;
pub mod provider;
pub mod providers;
pub mod registry;

pub use self::{
    config::{ConfigError, IdentitiesConfig},
    identities::{Identities, IdentitiesError},
    identity::{Identity, Signatures},
    keys::{FixedKey, GenerateKeys, KeyError, KeySource},
    provider::{IdentityProvider, ProviderError},
    providers::PublicKeyProvider,
    registry::{ProviderRegistry, RegistryError, default_registry},
};
