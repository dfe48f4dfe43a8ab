//! Signed, content addressed entries for an append-only operation log.
//!
//! Every [`Entry`] names the log it belongs to, carries a payload and a logical [`Clock`], and
//! links to earlier entries by their content identifiers. Entries are signed by an
//! [`Identity`] through the [`IdentityProvider`] registered for the identity's type, and
//! anyone holding the identity can check the signature with [`verify_entry_signature`].
//!
//! ```
//! use orbitlog::{Clock, Identities, ProviderRegistry, new_entry, verify_entry_signature};
//!
//! let registry = ProviderRegistry::with_defaults();
//! let identities = Identities::new(&registry, "publickey")?;
//! let alice = identities.create_identity("alice")?;
//!
//! let entry = new_entry(&registry, &alice, "log", "hello", Clock::new("alice", 1))?;
//! assert!(verify_entry_signature(&registry, &alice, &entry));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]
#![cfg_attr(orbitlog_docsrs, feature(doc_cfg))]

pub mod clock;
pub mod entry;

pub use orbitlog_base::{Cid, PublicKey, SecretKey, Signature};
pub use orbitlog_identity::{
    Identities, IdentitiesConfig, Identity, IdentityProvider, ProviderRegistry, PublicKeyProvider,
    default_registry,
};

pub use self::{
    clock::Clock,
    entry::{
        ENTRY_VERSION, EncodedEntry, Entry, EntryError, new_entry, new_entry_with_links,
        try_verify_entry_signature, verify_entry_signature,
    },
};
