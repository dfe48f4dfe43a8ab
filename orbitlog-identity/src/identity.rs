//! The [`Identity`] record and its canonical encoding.

use std::{collections::BTreeMap, fmt};

use orbitlog_base::{Cid, CodecError, SecretKey, codec};
use serde::{Deserialize, Serialize};

/// Map from the purpose of a self-signature to the hex encoded signature.
///
/// Every identity carries the purposes [`Signatures::ID`] and [`Signatures::PUBLIC_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signatures(BTreeMap<String, String>);

impl Signatures {
    /// Purpose of the signature over the raw id string.
    pub const ID: &'static str = "id";
    /// Purpose of the signature over the hex encoded public key.
    pub const PUBLIC_KEY: &'static str = "publicKey";

    /// Create the two self-signatures of an identity.
    pub fn new(id_signature: impl Into<String>, public_key_signature: impl Into<String>) -> Self {
        Self(BTreeMap::from([
            (Self::ID.to_string(), id_signature.into()),
            (Self::PUBLIC_KEY.to_string(), public_key_signature.into()),
        ]))
    }

    /// Get the signature for `purpose`.
    pub fn get(&self, purpose: &str) -> Option<&str> {
        self.0.get(purpose).map(String::as_str)
    }

    /// Signature over the id.
    pub fn id(&self) -> Option<&str> {
        self.get(Self::ID)
    }

    /// Signature over the public key.
    pub fn public_key(&self) -> Option<&str> {
        self.get(Self::PUBLIC_KEY)
    }

    /// Iterate over all `(purpose, signature)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn is_complete(&self) -> bool {
        [Self::ID, Self::PUBLIC_KEY]
            .iter()
            .all(|purpose| self.get(purpose).is_some_and(|s| !s.is_empty()))
    }
}

/// The canonical map form of an [`Identity`].
#[derive(Serialize, Deserialize)]
struct IdentityRecord {
    id: String,
    #[serde(rename = "publicKey")]
    public_key: String,
    signatures: Signatures,
    #[serde(rename = "type")]
    provider_type: String,
}

/// A cryptographic actor: a public key bound to an id by self-signatures.
///
/// An identity is immutable. Its canonical bytes and hash are computed once at
/// construction from every field except the private key; re-keying means building a new
/// identity.
#[derive(Clone)]
pub struct Identity {
    id: String,
    public_key: String,
    signatures: Signatures,
    provider_type: String,
    private_key: Option<SecretKey>,
    cid: Cid,
    hash: String,
    bytes: Vec<u8>,
}

impl Identity {
    /// Assemble an identity and compute its canonical bytes and hash.
    ///
    /// `private_key` is only set for identities owned by this process.
    pub fn new(
        id: impl Into<String>,
        public_key: impl Into<String>,
        signatures: Signatures,
        provider_type: impl Into<String>,
        private_key: Option<SecretKey>,
    ) -> Result<Self, CodecError> {
        let record = IdentityRecord {
            id: id.into(),
            public_key: public_key.into(),
            signatures,
            provider_type: provider_type.into(),
        };
        let (bytes, cid) = codec::encode_with_id(&record)?;
        Ok(Self {
            id: record.id,
            public_key: record.public_key,
            signatures: record.signatures,
            provider_type: record.provider_type,
            private_key,
            hash: cid.to_string(),
            cid,
            bytes,
        })
    }

    /// Decode an identity from its canonical bytes.
    ///
    /// The decoded identity never carries a private key.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let record: IdentityRecord = codec::decode(bytes)?;
        Self::new(
            record.id,
            record.public_key,
            record.signatures,
            record.provider_type,
            None,
        )
    }

    /// The id this identity was created for.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The public key, in the wire form of the identity's provider.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The self-signatures.
    pub fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    /// Type name of the provider responsible for this identity.
    pub fn provider_type(&self) -> &str {
        &self.provider_type
    }

    /// The private key, if this identity is owned by the local process.
    pub fn private_key(&self) -> Option<&SecretKey> {
        self.private_key.as_ref()
    }

    /// The content identifier of [`Self::bytes`].
    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// String form of [`Self::cid`], used as the identity reference in entries.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The canonical encoding.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns true if every required field is populated.
    pub fn is_identity(&self) -> bool {
        !self.id.is_empty()
            && !self.public_key.is_empty()
            && !self.provider_type.is_empty()
            && self.signatures.is_complete()
            && !self.hash.is_empty()
            && !self.bytes.is_empty()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.public_key == other.public_key
            && self.signatures == other.signatures
            && self.provider_type == other.provider_type
            && self.hash == other.hash
    }
}

impl Eq for Identity {}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("type", &self.provider_type)
            .field("hash", &self.hash)
            .field("public_key", &self.public_key)
            .field("owned", &self.private_key.is_some())
            .finish()
    }
}
