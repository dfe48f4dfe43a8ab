//! Log entries: construction, canonical encoding and signature verification.
//!
//! An [`Entry`] is signed over its canonical encoding with an empty `Signature` field. The
//! signature is then attached and the entry encoded once more; the content identifier of an
//! [`EncodedEntry`] always covers the signed encoding.

use std::ops::Deref;

use nested_enum_utils::common_fields;
use orbitlog_base::{Cid, CodecError, codec};
use orbitlog_identity::{Identity, ProviderError, ProviderRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, ResultExt, Snafu, ensure};
use tracing::{debug, trace};

use crate::clock::Clock;

/// Version of the entry wire schema.
pub const ENTRY_VERSION: u64 = 2;

/// A single record of the operation log.
///
/// Field names in the canonical encoding are fixed: `ID`, `Payload`, `Next`, `Refs`,
/// `Clock{id,time}`, `V`, `Key`, `Identity` and `Signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Id of the log this entry belongs to.
    #[serde(rename = "ID")]
    pub id: String,
    /// The operation payload.
    #[serde(rename = "Payload")]
    pub payload: String,
    /// Content identifiers of the direct predecessors.
    #[serde(rename = "Next")]
    pub next: Vec<String>,
    /// Content identifiers of additional ancestors.
    #[serde(rename = "Refs")]
    pub refs: Vec<String>,
    /// Logical time of the writer.
    #[serde(rename = "Clock")]
    pub clock: Clock,
    /// Wire schema version, see [`ENTRY_VERSION`].
    #[serde(rename = "V")]
    pub version: u64,
    /// Hex encoded public key of the signing identity.
    #[serde(rename = "Key")]
    pub key: String,
    /// Hash of the signing identity.
    #[serde(rename = "Identity")]
    pub identity: String,
    /// Hex encoded signature over the entry with this field empty.
    #[serde(rename = "Signature")]
    pub signature: String,
}

impl Entry {
    /// The canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let unsigned = Entry {
            signature: String::new(),
            ..self.clone()
        };
        codec::encode(&unsigned)
    }

    /// Returns true if the entry has every field a signed entry needs.
    pub fn is_entry(&self) -> bool {
        !self.id.is_empty()
            && !self.key.is_empty()
            && !self.identity.is_empty()
            && !self.signature.is_empty()
            && self.version > 0
    }
}

/// An [`Entry`] together with its canonical bytes and content identifier.
///
/// The three parts are derived together and can not be changed independently. Changing an
/// entry means building a new `EncodedEntry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEntry {
    entry: Entry,
    bytes: Vec<u8>,
    cid: Cid,
}

impl EncodedEntry {
    /// Encode `entry` and derive its content identifier.
    pub fn encode(entry: Entry) -> Result<Self, EntryError> {
        let (bytes, cid) = codec::encode_with_id(&entry).context(EncodeSnafu)?;
        Ok(Self { entry, bytes, cid })
    }

    /// Decode an entry received from a peer.
    ///
    /// The bytes must be the canonical encoding, otherwise the content identifier would not
    /// match what the author published.
    pub fn decode(bytes: &[u8]) -> Result<Self, EntryError> {
        let entry: Entry = codec::decode(bytes).context(DecodeSnafu)?;
        let encoded = Self::encode(entry)?;
        ensure!(encoded.bytes == bytes, NonCanonicalSnafu);
        Ok(encoded)
    }

    /// The entry.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Consume and return the entry.
    pub fn into_entry(self) -> Entry {
        self.entry
    }

    /// The canonical bytes of the signed entry.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The content identifier of [`Self::bytes`].
    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// String form of [`Self::cid`], as used in `Next` and `Refs`.
    pub fn hash(&self) -> String {
        self.cid.to_string()
    }
}

impl Deref for EncodedEntry {
    type Target = Entry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// Create a signed entry without links to other entries.
pub fn new_entry(
    registry: &ProviderRegistry,
    identity: &Identity,
    id: impl Into<String>,
    payload: impl Into<String>,
    clock: Clock,
) -> Result<EncodedEntry, EntryError> {
    new_entry_with_links(
        registry,
        identity,
        id,
        payload,
        clock,
        Vec::new(),
        Vec::new(),
    )
}

/// Create a signed entry pointing to `next` and `refs`.
///
/// The links are part of the signed bytes, so they have to be known before signing.
pub fn new_entry_with_links(
    registry: &ProviderRegistry,
    identity: &Identity,
    id: impl Into<String>,
    payload: impl Into<String>,
    clock: Clock,
    next: Vec<String>,
    refs: Vec<String>,
) -> Result<EncodedEntry, EntryError> {
    let provider = registry
        .get(identity.provider_type())
        .context(ProviderNotFoundSnafu)?;

    let mut entry = Entry {
        id: id.into(),
        payload: payload.into(),
        next,
        refs,
        clock,
        version: ENTRY_VERSION,
        key: identity.public_key().to_string(),
        identity: identity.hash().to_string(),
        signature: String::new(),
    };
    let unsigned = codec::encode(&entry).context(EncodeSnafu)?;
    entry.signature = provider.sign(&unsigned, identity).context(SignSnafu)?;

    let encoded = EncodedEntry::encode(entry)?;
    debug!(
        log = %encoded.id,
        clock = %encoded.clock,
        hash = %encoded.cid,
        "created entry"
    );
    Ok(encoded)
}

/// Returns true if `entry` carries a valid signature by `identity`.
///
/// Every failure, including an unregistered provider type, results in `false`. Use
/// [`try_verify_entry_signature`] to find out why an entry was rejected.
pub fn verify_entry_signature(
    registry: &ProviderRegistry,
    identity: &Identity,
    entry: &EncodedEntry,
) -> bool {
    match try_verify_entry_signature(registry, identity, entry) {
        Ok(valid) => valid,
        Err(err) => {
            debug!(hash = %entry.cid, "entry verification failed: {err}");
            false
        }
    }
}

/// Verify the signature of `entry` against `identity`.
///
/// Returns `Ok(false)` if the entry was not signed by `identity` or the signature is wrong,
/// and an error if the provider is unknown or the signature is malformed.
pub fn try_verify_entry_signature(
    registry: &ProviderRegistry,
    identity: &Identity,
    entry: &EncodedEntry,
) -> Result<bool, EntryError> {
    let provider = registry
        .get(identity.provider_type())
        .context(ProviderNotFoundSnafu)?;

    if entry.key != identity.public_key() || entry.identity != identity.hash() {
        trace!(hash = %entry.cid, identity = %identity.hash(), "entry signed by another identity");
        return Ok(false);
    }

    let bytes = entry.signing_bytes().context(EncodeSnafu)?;
    provider
        .verify_identity_with_entry(identity, &bytes, &entry.signature)
        .context(VerifySnafu)
}

/// Errors creating, decoding or verifying entries.
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum EntryError {
    #[snafu(display("no provider for the identity type"))]
    ProviderNotFound { source: RegistryError },
    #[snafu(display("failed to encode entry"))]
    Encode { source: CodecError },
    #[snafu(display("failed to decode entry"))]
    Decode { source: CodecError },
    #[snafu(display("entry bytes are not canonical"))]
    NonCanonical {},
    #[snafu(display("failed to sign entry"))]
    Sign { source: ProviderError },
    #[snafu(display("failed to verify entry"))]
    Verify { source: ProviderError },
}

#[cfg(test)]
mod tests {
    use orbitlog_base::{SecretKey, verify_content_id};
    use orbitlog_identity::{FixedKey, Identities, PublicKeyProvider};
    use rand::SeedableRng;
    use tracing_test::traced_test;

    use super::*;

    fn setup() -> (ProviderRegistry, Identity) {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
        let key = SecretKey::generate(&mut rng);
        let registry = ProviderRegistry::new();
        registry
            .register(PublicKeyProvider::with_key_source(FixedKey::new(key)))
            .unwrap();
        let identity = Identities::new(&registry, PublicKeyProvider::TYPE)
            .unwrap()
            .create_identity("alice")
            .unwrap();
        (registry, identity)
    }

    #[test]
    #[traced_test]
    fn new_entry_fills_identity_fields() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();

        assert_eq!(entry.id, "log");
        assert_eq!(entry.payload, "hello");
        assert_eq!(entry.version, ENTRY_VERSION);
        assert_eq!(entry.key, identity.public_key());
        assert_eq!(entry.identity, identity.hash());
        assert!(entry.next.is_empty());
        assert!(entry.refs.is_empty());
        assert!(entry.is_entry());
        assert!(verify_entry_signature(&registry, &identity, &entry));
        assert!(logs_contain("created entry"));
    }

    #[test]
    fn cid_covers_the_signature() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();

        assert!(verify_content_id(entry.cid(), entry.bytes()));
        assert_ne!(entry.bytes(), entry.signing_bytes().unwrap());
        assert_ne!(*entry.cid(), orbitlog_base::content_id(&entry.signing_bytes().unwrap()));
    }

    #[test]
    fn signing_bytes_ignore_the_signature() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();
        let resigned = Entry {
            signature: "something else".to_string(),
            ..entry.entry().clone()
        };
        assert_eq!(
            resigned.signing_bytes().unwrap(),
            entry.signing_bytes().unwrap()
        );
    }

    #[test]
    fn links_are_signed() {
        let (registry, identity) = setup();
        let first = new_entry(&registry, &identity, "log", "one", Clock::new("alice", 1)).unwrap();
        let second = new_entry_with_links(
            &registry,
            &identity,
            "log",
            "two",
            Clock::new("alice", 2),
            vec![first.hash()],
            vec![],
        )
        .unwrap();
        assert_eq!(second.next, [first.hash()]);
        assert!(verify_entry_signature(&registry, &identity, &second));

        let unlinked = Entry {
            next: vec![],
            ..second.entry().clone()
        };
        let unlinked = EncodedEntry::encode(unlinked).unwrap();
        assert!(!verify_entry_signature(&registry, &identity, &unlinked));
    }

    #[test]
    fn decode_rejects_non_canonical_bytes() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();
        let decoded = EncodedEntry::decode(entry.bytes()).unwrap();
        assert_eq!(decoded, entry);

        assert!(matches!(
            EncodedEntry::decode(&[0x80]),
            Err(EntryError::Decode { .. })
        ));
    }

    #[test]
    fn unknown_provider_type() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();

        let empty = ProviderRegistry::new();
        assert!(matches!(
            new_entry(&empty, &identity, "log", "hello", Clock::new("alice", 1)),
            Err(EntryError::ProviderNotFound { .. })
        ));
        assert!(!verify_entry_signature(&empty, &identity, &entry));
        assert!(matches!(
            try_verify_entry_signature(&empty, &identity, &entry),
            Err(EntryError::ProviderNotFound { .. })
        ));
    }

    #[test]
    fn public_identity_can_not_sign() {
        let (registry, identity) = setup();
        let public = Identity::decode(identity.bytes()).unwrap();
        assert!(matches!(
            new_entry(&registry, &public, "log", "hello", Clock::new("alice", 1)),
            Err(EntryError::Sign {
                source: ProviderError::MissingPrivateKey { .. },
                ..
            })
        ));
    }

    #[test]
    fn malformed_signature_is_an_error() {
        let (registry, identity) = setup();
        let entry = new_entry(&registry, &identity, "log", "hello", Clock::new("alice", 1)).unwrap();
        let garbled = EncodedEntry::encode(Entry {
            signature: "xyz".to_string(),
            ..entry.into_entry()
        })
        .unwrap();
        assert!(matches!(
            try_verify_entry_signature(&registry, &identity, &garbled),
            Err(EntryError::Verify { .. })
        ));
        assert!(!verify_entry_signature(&registry, &identity, &garbled));
    }
}
