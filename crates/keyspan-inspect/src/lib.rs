//! Operator tool for keyspan default-key resolution.
//!
//! Loads a keyring snapshot from JSON, applies resolver settings from TOML
//! and command-line overrides, and reports which key would protect new data
//! at a given instant.
//!
//! Settings are layered: built-in defaults, then the settings file, then
//! flags. The evaluation instant comes from a [`Clock`]; pass a
//! [`FixedClock`](keyspan_core::FixedClock) to evaluate the keyring at any
//! instant.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod record;
pub mod report;
pub mod settings;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use keyspan_core::{Clock, DefaultKeyResolver};

pub use error::InspectError;
pub use record::{KeyDescriptor, KeyRecord, RecordEncryptor, load_keyring, parse_keyring};
pub use report::Report;
pub use settings::ResolverSettings;

/// Inputs of one inspection.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    /// Keyring JSON file
    pub keys_path: PathBuf,
    /// Optional settings TOML file
    pub settings_path: Option<PathBuf>,
    /// Overrides applied on top of the settings file
    pub overrides: ResolverSettings,
}

/// Resolve the keyring named by `options` at `clock.now()`.
///
/// # Errors
///
/// - `Io`, `Keyring`, `DuplicateKeyId` from loading the keyring
/// - `Io`, `Settings` from loading the settings file
/// - `Config` if the merged settings are invalid
pub fn inspect<C: Clock>(options: &InspectOptions, clock: &C) -> Result<Report, InspectError> {
    let file_settings = match &options.settings_path {
        Some(path) => ResolverSettings::load(path)?,
        None => ResolverSettings::default(),
    };
    let config = file_settings.overlay(options.overrides).to_config()?;
    let keys = load_keyring(&options.keys_path)?;

    let now = clock.now();
    let resolver = DefaultKeyResolver::new(config);
    let resolution = resolver.resolve(now, &keys);
    let report = Report::new(now, *resolver.config(), &keys, &resolution);

    tracing::info!(
        default_key = ?report.default_key,
        fallback_key = ?report.fallback_key,
        should_generate_new_key = report.should_generate_new_key,
        "Resolved keyring"
    );

    Ok(report)
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// - `InvalidTimestamp` if `value` is not RFC 3339
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, InspectError> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| InspectError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamp_offsets_normalize_to_utc() {
        let parsed = parse_timestamp("2025-06-01T14:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, InspectError::InvalidTimestamp { ref value, .. } if value == "yesterday"));
        assert!(err.is_invalid_input());
    }
}
