use std::sync::Arc;

use orbitlog_base::{PublicKey, Signature};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, trace};

use crate::{
    identity::{Identity, Signatures},
    keys::{GenerateKeys, KeySource},
    provider::{
        EncodeSnafu, IdentityProvider, InvalidPublicKeySnafu, InvalidSignatureSnafu,
        KeyProvisioningSnafu, MissingFieldsSnafu, MissingPrivateKeySnafu, MissingSignatureSnafu,
        ProviderError, SigningSnafu,
    },
};

/// Identities backed by an ECDSA P-256 key pair.
///
/// The identity's public key is the hex encoded curve point, and it signs both its id and
/// that hex string.
#[derive(Debug, Clone)]
pub struct PublicKeyProvider {
    keys: Arc<dyn KeySource>,
}

impl Default for PublicKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicKeyProvider {
    /// The provider type tag.
    pub const TYPE: &'static str = "publickey";

    /// A provider that generates a new key for every identity.
    pub fn new() -> Self {
        Self::with_key_source(GenerateKeys)
    }

    /// A provider that takes its keys from `keys`.
    pub fn with_key_source(keys: impl KeySource) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    fn public_key(identity: &Identity) -> Result<PublicKey, ProviderError> {
        identity
            .public_key()
            .parse()
            .context(InvalidPublicKeySnafu)
    }
}

impl IdentityProvider for PublicKeyProvider {
    fn provider_type(&self) -> &str {
        Self::TYPE
    }

    fn create_identity(&self, id: &str) -> Result<Identity, ProviderError> {
        let secret_key = self.keys.provision(id).context(KeyProvisioningSnafu)?;
        let public_key = secret_key.public().to_hex();

        let id_signature = secret_key.sign(id.as_bytes()).context(SigningSnafu)?;
        let public_key_signature = secret_key
            .sign(public_key.as_bytes())
            .context(SigningSnafu)?;

        let identity = Identity::new(
            id,
            public_key,
            Signatures::new(id_signature.to_hex(), public_key_signature.to_hex()),
            Self::TYPE,
            Some(secret_key),
        )
        .context(EncodeSnafu)?;
        debug!(%id, hash = %identity.hash(), "created identity");
        Ok(identity)
    }

    fn verify_identity(&self, identity: &Identity) -> Result<bool, ProviderError> {
        ensure!(identity.is_identity(), MissingFieldsSnafu);
        let public_key = Self::public_key(identity)?;

        let signed = [
            (Signatures::ID, identity.id()),
            (Signatures::PUBLIC_KEY, identity.public_key()),
        ];
        for (purpose, data) in signed {
            let signature: Signature = identity
                .signatures()
                .get(purpose)
                .context(MissingSignatureSnafu { purpose })?
                .parse()
                .context(InvalidSignatureSnafu)?;
            if public_key.verify(data.as_bytes(), &signature).is_err() {
                debug!(id = %identity.id(), %purpose, "invalid identity signature");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn verify_identity_with_entry(
        &self,
        identity: &Identity,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, ProviderError> {
        let public_key = Self::public_key(identity)?;
        let signature: Signature = signature.parse().context(InvalidSignatureSnafu)?;
        let valid = public_key.verify(message, &signature).is_ok();
        trace!(id = %identity.id(), valid, "verified signature");
        Ok(valid)
    }

    fn sign(&self, data: &[u8], identity: &Identity) -> Result<String, ProviderError> {
        let secret_key = identity.private_key().context(MissingPrivateKeySnafu)?;
        let signature = secret_key.sign(data).context(SigningSnafu)?;
        Ok(signature.to_hex())
    }

    fn get_id(&self, id: &str) -> Result<String, ProviderError> {
        let secret_key = self.keys.provision(id).context(KeyProvisioningSnafu)?;
        Ok(secret_key.public().to_hex())
    }
}
