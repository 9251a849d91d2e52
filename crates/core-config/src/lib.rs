//! Configuration: XDG path resolution, the `clifmrc` line grammar, the
//! session option set, and the color scheme table.
//!
//! Everything here is loaded once at startup and again on `reload`. Parsing
//! is tolerant: a corrupt value is logged and replaced by its default; only a
//! missing writable home is fatal (handled by the binary).

use std::path::PathBuf;

pub mod colors;
pub mod options;
pub mod paths;
pub mod rcfile;

pub use colors::{ColorKey, ColorScheme};
pub use options::{
    ListingMode, Options, OptionsSnapshot, PartialOptions, PermsStyle, SortKey,
};
pub use paths::ConfigPaths;
pub use rcfile::{AutocmdSpec, RcData};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no home directory could be resolved")]
    NoHome,
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("profile name {0:?} is not valid")]
    BadProfile(String),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
