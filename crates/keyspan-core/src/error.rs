//! Error types for key resolution.
//!
//! Resolution itself never fails. These errors describe why a single key
//! could not produce an encryptor (a disqualification, not a fault) and why a
//! resolver configuration was rejected.

use chrono::TimeDelta;
use thiserror::Error;

/// Reasons a key could not produce a working encryptor.
///
/// Returned by [`Key::create_encryptor`](crate::Key::create_encryptor)
/// implementations. The resolver converts every variant into a
/// disqualification of the key for the current call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptorError {
    /// The key record carries no key material
    #[error("key material is missing")]
    MissingKeyMaterial,

    /// The key material is present but unusable
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial {
        /// Why the material was rejected
        reason: String,
    },

    /// The key names an algorithm this process cannot build
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// Algorithm name as recorded on the key
        algorithm: String,
    },

    /// The cryptographic backend refused to build the encryptor
    #[error("encryptor backend failure: {reason}")]
    Backend {
        /// Backend-provided description
        reason: String,
    },

    /// Encryptor construction panicked
    #[error("encryptor construction panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string
        message: String,
    },
}

impl EncryptorError {
    /// Returns true if the key's stored data is at fault.
    ///
    /// Material errors will fail on every server holding the same key.
    /// Backend errors and panics may be local to this process.
    pub fn is_key_defect(&self) -> bool {
        match self {
            Self::MissingKeyMaterial => true,
            Self::InvalidKeyMaterial { .. } => true,
            Self::UnsupportedAlgorithm { .. } => true,

            Self::Backend { .. } => false,
            Self::Panicked { .. } => false,
        }
    }
}

/// Errors from building a [`ResolverConfig`](crate::ResolverConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration setting was negative
    #[error("{field} must not be negative, got {value}")]
    NegativeDuration {
        /// Name of the offending setting
        field: &'static str,
        /// Value that was supplied
        value: TimeDelta,
    },

    /// A duration setting does not fit the timestamp arithmetic
    #[error("{field} is out of range")]
    OutOfRange {
        /// Name of the offending setting
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_errors_are_key_defects() {
        assert!(EncryptorError::MissingKeyMaterial.is_key_defect());
        let err = EncryptorError::InvalidKeyMaterial { reason: "bad hex".to_string() };
        assert!(err.is_key_defect());
    }

    #[test]
    fn panics_are_not_key_defects() {
        let err = EncryptorError::Panicked { message: "boom".to_string() };
        assert!(!err.is_key_defect());
    }

    #[test]
    fn error_display() {
        let err = EncryptorError::UnsupportedAlgorithm { algorithm: "rot13".to_string() };
        assert_eq!(err.to_string(), "unsupported algorithm: rot13");

        let err = ConfigError::OutOfRange { field: "max_clock_skew" };
        assert_eq!(err.to_string(), "max_clock_skew is out of range");
    }
}
