//! The [`IdentityProvider`] capability.

use std::fmt::Debug;

use nested_enum_utils::common_fields;
use orbitlog_base::{CodecError, KeyParsingError, SignatureError};
use snafu::{Backtrace, Snafu};

use crate::{identity::Identity, keys::KeyError};

/// One cryptographic scheme for creating identities and signing data.
///
/// Providers are registered under [`IdentityProvider::provider_type`] and that name is stored in
/// every [`Identity`] they create. A provider is shared by all callers of a
/// [`ProviderRegistry`](crate::ProviderRegistry) and must not keep mutable state between calls.
pub trait IdentityProvider: Debug + Send + Sync + 'static {
    /// The type tag used as registry key and stored in identities.
    fn provider_type(&self) -> &str;

    /// Create a new identity for `id`, signed by a freshly provisioned key.
    fn create_identity(&self, id: &str) -> Result<Identity, ProviderError>;

    /// Check both self-signatures of `identity`.
    ///
    /// Returns `Ok(false)` if a signature does not verify, and an error if the identity is
    /// incomplete or its fields are malformed.
    fn verify_identity(&self, identity: &Identity) -> Result<bool, ProviderError>;

    /// Verify `signature` over `message` with the public key of `identity`.
    ///
    /// A well formed but wrong signature gives `Ok(false)`; only malformed input is an error.
    fn verify_identity_with_entry(
        &self,
        identity: &Identity,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, ProviderError>;

    /// Sign `data` with the private key of `identity`.
    fn sign(&self, data: &[u8], identity: &Identity) -> Result<String, ProviderError>;

    /// Verify `signature` over `data`, treating malformed input as invalid.
    fn verify(&self, identity: &Identity, signature: &str, data: &[u8]) -> bool {
        self.verify_identity_with_entry(identity, data, signature)
            .unwrap_or(false)
    }

    /// The public key this provider would bind to `id`.
    fn get_id(&self, id: &str) -> Result<String, ProviderError>;
}

/// Errors from an [`IdentityProvider`].
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("identity is missing required fields"))]
    MissingFields {},
    #[snafu(display("missing {purpose} signature"))]
    MissingSignature { purpose: &'static str },
    #[snafu(display("private signing key not found for identity"))]
    MissingPrivateKey {},
    #[snafu(display("invalid public key"))]
    InvalidPublicKey { source: KeyParsingError },
    #[snafu(display("invalid signature format"))]
    InvalidSignature { source: KeyParsingError },
    #[snafu(display("failed to provision key"))]
    KeyProvisioning { source: KeyError },
    #[snafu(display("failed to sign"))]
    Signing { source: SignatureError },
    #[snafu(display("failed to encode identity"))]
    Encode { source: CodecError },
}
