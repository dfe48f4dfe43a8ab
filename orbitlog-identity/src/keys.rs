//! Key provisioning for identity providers.
//!
//! A provider never hardcodes key material. It asks its [`KeySource`] for the signing key
//! of an id, which either generates a fresh key or hands out one that already exists.

use std::fmt::Debug;

use orbitlog_base::SecretKey;
use snafu::{Backtrace, Snafu};

/// Supplies the signing key for a new identity.
///
/// Implementations are shared between threads and must not rely on being called in any
/// particular order.
pub trait KeySource: Debug + Send + Sync + 'static {
    /// Return the secret key to bind to `id`.
    fn provision(&self, id: &str) -> Result<SecretKey, KeyError>;
}

/// Generates a fresh key from the operating system's RNG on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateKeys;

impl KeySource for GenerateKeys {
    fn provision(&self, _id: &str) -> Result<SecretKey, KeyError> {
        Ok(SecretKey::generate(&mut rand_core::OsRng))
    }
}

/// Always returns the same, already existing key.
#[derive(Debug, Clone)]
pub struct FixedKey(SecretKey);

impl FixedKey {
    /// Use `key` for every identity.
    pub fn new(key: SecretKey) -> Self {
        Self(key)
    }
}

impl KeySource for FixedKey {
    fn provision(&self, _id: &str) -> Result<SecretKey, KeyError> {
        Ok(self.0.clone())
    }
}

/// A [`KeySource`] failed to provide a key.
#[derive(Debug, Snafu)]
#[snafu(display("failed to provision a key for {id}"))]
#[snafu(visibility(pub(crate)))]
pub struct KeyError {
    id: String,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
    backtrace: Option<Backtrace>,
}

impl KeyError {
    /// Wrap the error of an external key store.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        use snafu::IntoError;
        KeySnafu { id: id.into() }.into_error(source.into())
    }

    /// The id a key was requested for.
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = GenerateKeys.provision("alice").unwrap();
        let b = GenerateKeys.provision("alice").unwrap();
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn fixed_key_is_reused() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let key = SecretKey::generate(&mut rng);
        let source = FixedKey::new(key.clone());
        assert_eq!(source.provision("alice").unwrap().public(), key.public());
        assert_eq!(source.provision("bob").unwrap().public(), key.public());
    }

    #[test]
    fn key_error_keeps_source() {
        let err = KeyError::new("alice", "keystore locked");
        assert_eq!(err.id(), "alice");
        assert_eq!(err.to_string(), "failed to provision a key for alice");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "keystore locked");
    }
}
