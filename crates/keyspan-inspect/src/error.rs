//! Errors surfaced by the inspection tool.
//!
//! Key-level problems (missing material, unknown algorithm) are not errors
//! here: they disqualify the key during resolution. These variants cover
//! inputs the tool cannot work with at all.

use std::{io, path::PathBuf};

use keyspan_core::ConfigError;
use thiserror::Error;

/// Errors from loading inputs or rendering a report.
#[derive(Error, Debug)]
pub enum InspectError {
    /// A file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Keyring file is not valid JSON for a keyring
    #[error("malformed keyring {}: {source}", .path.display())]
    Keyring {
        /// Keyring file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Settings file is not valid TOML for resolver settings
    #[error("malformed settings {}: {source}", .path.display())]
    Settings {
        /// Settings file
        path: PathBuf,
        /// Parse error
        #[source]
        source: toml::de::Error,
    },

    /// Two keys share an id
    #[error("duplicate key id in keyring: {id}")]
    DuplicateKeyId {
        /// The repeated id
        id: String,
    },

    /// Resolver settings were rejected
    #[error("invalid resolver settings: {0}")]
    Config(#[from] ConfigError),

    /// `--now` was not an RFC 3339 timestamp
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// Supplied value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Report could not be serialized
    #[error("cannot render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl InspectError {
    /// Returns true if the error stems from the inputs' contents rather than
    /// from reading them.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::Keyring { .. } => true,
            Self::Settings { .. } => true,
            Self::DuplicateKeyId { .. } => true,
            Self::Config(_) => true,
            Self::InvalidTimestamp { .. } => true,

            Self::Io { .. } => false,
            Self::Render(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_is_invalid_input() {
        let err = InspectError::DuplicateKeyId { id: "k1".to_string() };
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "duplicate key id in keyring: k1");
    }

    #[test]
    fn io_error_is_not_invalid_input() {
        let err = InspectError::Io {
            path: PathBuf::from("/missing/keys.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(!err.is_invalid_input());
        assert_eq!(err.to_string(), "cannot read /missing/keys.json: not found");
    }
}
