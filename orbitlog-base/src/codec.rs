//! Canonical DAG-CBOR encoding and content identifiers.
//!
//! Every value that peers address by hash goes through [`encode`]. The encoder emits map
//! keys in the DAG-CBOR canonical order (shorter keys first, then bytewise), so two values
//! that are equal field by field encode to the same bytes no matter how the Rust struct
//! declares its fields.

use cid::{Cid, multihash::Multihash};
use nested_enum_utils::common_fields;
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use snafu::{Backtrace, ResultExt, Snafu};

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Error encoding or decoding canonical bytes.
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    #[snafu(display("failed to encode dag-cbor"))]
    Encode {
        source: serde_ipld_dagcbor::EncodeError<std::collections::TryReserveError>,
    },
    #[snafu(display("failed to decode dag-cbor"))]
    Decode {
        source: serde_ipld_dagcbor::DecodeError<std::convert::Infallible>,
    },
}

/// Encode a value into its canonical DAG-CBOR bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_ipld_dagcbor::to_vec(value).context(EncodeSnafu)
}

/// Decode a value from DAG-CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_ipld_dagcbor::from_slice(bytes).context(DecodeSnafu)
}

/// Derive the content identifier of canonical bytes.
///
/// This is a CIDv1 with the `dag-cbor` codec tag over a `sha2-256` multihash.
pub fn content_id(bytes: &[u8]) -> Cid {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .expect("a sha2-256 digest always fits into a 64 byte multihash");
    Cid::new_v1(DAG_CBOR, hash)
}

/// Encode a value and derive the content identifier of the resulting bytes.
pub fn encode_with_id<T: Serialize + ?Sized>(value: &T) -> Result<(Vec<u8>, Cid), CodecError> {
    let bytes = encode(value)?;
    let cid = content_id(&bytes);
    Ok((bytes, cid))
}

/// Verifies that the provided bytes hash to the given content identifier.
///
/// Identifiers that do not use the `dag-cbor` codec or the `sha2-256` hash are rejected.
pub fn verify_content_id(cid: &Cid, bytes: &[u8]) -> bool {
    cid.codec() == DAG_CBOR && cid.hash().code() == SHA2_256 && content_id(bytes) == *cid
}
