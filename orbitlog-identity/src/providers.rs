//! Built in identity providers.

mod publickey;

pub use self::publickey::PublicKeyProvider;
