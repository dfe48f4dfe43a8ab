//! Base types and utilities for orbitlog
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]
#![cfg_attr(orbitlog_docsrs, feature(doc_cfg))]

pub mod codec;
pub mod key;

pub use cid::Cid;

pub use self::{
    codec::{CodecError, content_id, decode, encode, verify_content_id},
    key::{KeyParsingError, PublicKey, SecretKey, Signature, SignatureError},
};
