//! Configuration for [`Identities`](crate::Identities)

use std::path::{Path, PathBuf};

use nested_enum_utils::common_fields;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, ResultExt, Snafu};

use crate::providers::PublicKeyProvider;

/// Identities configuration
///
/// The config is usually loaded from a TOML file with [`Self::load`]. The [`Default`]
/// selects the built in `publickey` provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitiesConfig {
    /// Type name of the identity provider used to create identities.
    pub provider: String,
}

impl Default for IdentitiesConfig {
    fn default() -> Self {
        Self {
            provider: PublicKeyProvider::TYPE.to_string(),
        }
    }
}

impl IdentitiesConfig {
    /// Load the config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        Self::from_toml_str(&s)
    }

    /// Parse the config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).context(ParseSnafu)
    }
}

/// Errors loading an [`IdentitiesConfig`].
#[common_fields({
    backtrace: Option<Backtrace>,
})]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read {}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("invalid config"))]
    Parse { source: toml::de::Error },
}
