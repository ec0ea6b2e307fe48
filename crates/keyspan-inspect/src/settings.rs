//! Resolver settings from a TOML file and command-line overrides.
//!
//! ```toml
//! [resolver]
//! key_propagation_window_secs = 172800
//! max_clock_skew_secs = 300
//! ```
//!
//! Every field is optional. Layers are merged with [`ResolverSettings::overlay`]
//! and unset fields keep the built-in defaults.

use std::path::Path;

use chrono::TimeDelta;
use keyspan_core::{ConfigError, ResolverConfig};
use serde::{Deserialize, Serialize};

use crate::InspectError;

/// One layer of resolver settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSettings {
    /// Propagation window in seconds
    pub key_propagation_window_secs: Option<i64>,
    /// Maximum clock skew in seconds
    pub max_clock_skew_secs: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    resolver: ResolverSettings,
}

impl ResolverSettings {
    /// Parse the `[resolver]` table of a settings document.
    ///
    /// # Errors
    ///
    /// - `Settings` if the text is not valid settings TOML
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, InspectError> {
        let file: SettingsFile = toml::from_str(text)
            .map_err(|source| InspectError::Settings { path: origin.to_path_buf(), source })?;
        Ok(file.resolver)
    }

    /// Read and parse a settings file.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Settings` if it is not valid settings TOML
    pub fn load(path: &Path) -> Result<Self, InspectError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| InspectError::Io { path: path.to_path_buf(), source })?;
        let settings = Self::from_toml_str(&text, path)?;

        tracing::debug!(path = %path.display(), ?settings, "Loaded resolver settings");
        Ok(settings)
    }

    /// Merge `upper` over `self`; fields set in `upper` win.
    #[must_use]
    pub fn overlay(self, upper: Self) -> Self {
        Self {
            key_propagation_window_secs: upper
                .key_propagation_window_secs
                .or(self.key_propagation_window_secs),
            max_clock_skew_secs: upper.max_clock_skew_secs.or(self.max_clock_skew_secs),
        }
    }

    /// Apply these settings to the built-in defaults.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if a value is negative or does not fit a duration
    pub fn to_config(self) -> Result<ResolverConfig, ConfigError> {
        let mut config = ResolverConfig::default();

        if let Some(secs) = self.key_propagation_window_secs {
            let window = TimeDelta::try_seconds(secs)
                .ok_or(ConfigError::OutOfRange { field: "key_propagation_window" })?;
            config = config.with_key_propagation_window(window)?;
        }
        if let Some(secs) = self.max_clock_skew_secs {
            let skew = TimeDelta::try_seconds(secs)
                .ok_or(ConfigError::OutOfRange { field: "max_clock_skew" })?;
            config = config.with_max_clock_skew(skew)?;
        }

        Ok(config)
    }
}
