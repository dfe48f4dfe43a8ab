//! Cryptographic key handling for orbitlog.
//!
//! Identities sign with ECDSA over NIST P-256. Messages are digested with SHA-256 before
//! signing, and keys and signatures travel as lowercase hex strings of fixed width.

use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use data_encoding::HEXLOWER;
use nested_enum_utils::common_fields;
use p256::{
    FieldBytes,
    ecdsa::{
        SigningKey, VerifyingKey,
        signature::hazmat::{PrehashSigner, PrehashVerifier},
    },
};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize, de};
use sha2::{Digest, Sha256};
use snafu::{Backtrace, ResultExt, Snafu, ensure};

/// Byte width of a P-256 field element, and so of each signature scalar and point coordinate.
pub const FIELD_LENGTH: usize = 32;

/// A public key.
///
/// The wire form is the hex encoding of the uncompressed point coordinates `X ‖ Y`, each
/// padded to [`FIELD_LENGTH`] bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// The length of an encoded `PublicKey`, in bytes.
    pub const LENGTH: usize = 2 * FIELD_LENGTH;

    /// Get the `X ‖ Y` coordinates of this public key.
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; Self::LENGTH];
        // skip the SEC1 tag byte
        out.copy_from_slice(&point.as_bytes()[1..]);
        out
    }

    /// Construct a `PublicKey` from its `X ‖ Y` coordinates.
    ///
    /// Fails if the coordinates are not a point on the curve.
    pub fn from_bytes(bytes: &[u8; Self::LENGTH]) -> Result<Self, KeyParsingError> {
        let mut sec1 = [0u8; Self::LENGTH + 1];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(bytes);
        let key = VerifyingKey::from_sec1_bytes(&sec1).context(InvalidKeySnafu)?;
        Ok(Self(key))
    }

    /// Hex encoding of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.to_bytes())
    }

    /// Verify a signature on a message with this public key.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if the signature is valid, and `Err` otherwise.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let digest = Sha256::digest(message);
        self.0
            .verify_prehash(&digest, &signature.0)
            .map_err(|_| SignatureSnafu.build())
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = KeyParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex::<{ PublicKey::LENGTH }>(s)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A secret key.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

impl SecretKey {
    /// The public key of this [`SecretKey`].
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().clone())
    }

    /// Generate a new [`SecretKey`] with a randomness generator.
    pub fn generate<R: CryptoRngCore>(csprng: &mut R) -> Self {
        Self(SigningKey::random(csprng))
    }

    /// Sign the SHA-256 digest of the given message.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, SignatureError> {
        let digest = Sha256::digest(message);
        let signature = self
            .0
            .sign_prehash(&digest)
            .map_err(|_| SignatureSnafu.build())?;
        Ok(Signature(signature))
    }

    /// Convert this to the bytes representing the secret scalar.
    pub fn to_bytes(&self) -> [u8; FIELD_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Create a secret key from its byte representation.
    ///
    /// Fails if the bytes are not a valid non-zero scalar.
    pub fn from_bytes(bytes: &[u8; FIELD_LENGTH]) -> Result<Self, KeyParsingError> {
        let key = SigningKey::from_slice(bytes).context(InvalidKeySnafu)?;
        Ok(Self(key))
    }
}

impl FromStr for SecretKey {
    type Err = KeyParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex::<FIELD_LENGTH>(s)?;
        Self::from_bytes(&bytes)
    }
}

/// ECDSA P-256 signature.
///
/// The wire form is `hex(r) ‖ hex(s)` where both scalars are left padded to
/// [`FIELD_LENGTH`] bytes, so the encoded string is always 128 characters long.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(p256::ecdsa::Signature);

impl Signature {
    /// The length of an encoded `Signature`, in bytes.
    pub const LENGTH: usize = 2 * FIELD_LENGTH;

    /// Return `r ‖ s`, each scalar [`FIELD_LENGTH`] bytes wide.
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut out = [0u8; Self::LENGTH];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    /// Parse a signature from `r ‖ s`.
    ///
    /// The scalars are split at [`FIELD_LENGTH`], never by halving the input.
    pub fn from_bytes(bytes: &[u8; Self::LENGTH]) -> Result<Self, KeyParsingError> {
        let mut r = [0u8; FIELD_LENGTH];
        let mut s = [0u8; FIELD_LENGTH];
        r.copy_from_slice(&bytes[..FIELD_LENGTH]);
        s.copy_from_slice(&bytes[FIELD_LENGTH..]);
        let signature =
            p256::ecdsa::Signature::from_scalars(FieldBytes::from(r), FieldBytes::from(s))
                .context(InvalidKeySnafu)?;
        Ok(Self(signature))
    }

    /// Hex encoding of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.to_bytes())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = KeyParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex::<{ Signature::LENGTH }>(s)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Error when parsing a [`PublicKey`], [`SecretKey`] or [`Signature`].
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum KeyParsingError {
    /// The input was not lowercase or uppercase hex.
    #[snafu(display("invalid hex encoding"))]
    Decode { source: data_encoding::DecodeError },
    /// The encoded information had the wrong length.
    #[snafu(display("invalid length, expected {expected} bytes, got {actual}"))]
    InvalidLength { expected: usize, actual: usize },
    /// The bytes do not describe a valid key or signature.
    #[snafu(display("invalid key material"))]
    InvalidKey { source: p256::ecdsa::Error },
}

/// Verification of a signature failed.
#[derive(Debug, Snafu)]
#[snafu(display("invalid signature"))]
#[snafu(visibility(pub(crate)))]
pub struct SignatureError {
    backtrace: Option<Backtrace>,
}

fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], KeyParsingError> {
    // accept both cases, as some peers emit uppercase hex
    let input = s.to_ascii_lowercase();
    let bytes = HEXLOWER.decode(input.as_bytes()).context(DecodeSnafu)?;
    ensure!(
        bytes.len() == N,
        InvalidLengthSnafu {
            expected: N,
            actual: bytes.len(),
        }
    );
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
