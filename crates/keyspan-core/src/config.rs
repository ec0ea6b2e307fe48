//! Resolver configuration.
//!
//! Both settings are fixed for the lifetime of a resolver. Defaults follow
//! common deployment practice: two days for a new key to reach every server,
//! five minutes of tolerated clock disagreement.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default lead time a successor key needs before it may be relied upon.
pub const DEFAULT_KEY_PROPAGATION_WINDOW: TimeDelta = TimeDelta::days(2);

/// Default tolerated timestamp disagreement between servers.
pub const DEFAULT_MAX_CLOCK_SKEW: TimeDelta = TimeDelta::minutes(5);

/// Temporal tolerances used by [`DefaultKeyResolver`](crate::DefaultKeyResolver).
///
/// Construct with [`ResolverConfig::new`] or [`ResolverConfig::from_std`];
/// both reject negative durations, so the resolver can assume
/// `key_propagation_window >= 0` and `max_clock_skew >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResolverConfig", into = "RawResolverConfig")]
pub struct ResolverConfig {
    key_propagation_window: TimeDelta,
    max_clock_skew: TimeDelta,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            key_propagation_window: DEFAULT_KEY_PROPAGATION_WINDOW,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration from chrono durations.
    ///
    /// # Errors
    ///
    /// - `NegativeDuration`: either setting is below zero
    pub fn new(
        key_propagation_window: TimeDelta,
        max_clock_skew: TimeDelta,
    ) -> Result<Self, ConfigError> {
        check_non_negative("key_propagation_window", key_propagation_window)?;
        check_non_negative("max_clock_skew", max_clock_skew)?;
        Ok(Self { key_propagation_window, max_clock_skew })
    }

    /// Create a configuration from standard library durations.
    ///
    /// # Errors
    ///
    /// - `OutOfRange`: a duration exceeds what chrono can represent
    pub fn from_std(
        key_propagation_window: Duration,
        max_clock_skew: Duration,
    ) -> Result<Self, ConfigError> {
        let key_propagation_window = TimeDelta::from_std(key_propagation_window)
            .map_err(|_| ConfigError::OutOfRange { field: "key_propagation_window" })?;
        let max_clock_skew = TimeDelta::from_std(max_clock_skew)
            .map_err(|_| ConfigError::OutOfRange { field: "max_clock_skew" })?;
        Self::new(key_propagation_window, max_clock_skew)
    }

    /// Returns a copy with a different propagation window.
    ///
    /// # Errors
    ///
    /// - `NegativeDuration`: `window` is below zero
    pub fn with_key_propagation_window(self, window: TimeDelta) -> Result<Self, ConfigError> {
        Self::new(window, self.max_clock_skew)
    }

    /// Returns a copy with a different clock skew tolerance.
    ///
    /// # Errors
    ///
    /// - `NegativeDuration`: `skew` is below zero
    pub fn with_max_clock_skew(self, skew: TimeDelta) -> Result<Self, ConfigError> {
        Self::new(self.key_propagation_window, skew)
    }

    /// Lead time before a default key's expiration at which a successor must
    /// already be valid.
    pub fn key_propagation_window(&self) -> TimeDelta {
        self.key_propagation_window
    }

    /// Maximum tolerated clock disagreement between servers.
    pub fn max_clock_skew(&self) -> TimeDelta {
        self.max_clock_skew
    }
}

fn check_non_negative(field: &'static str, value: TimeDelta) -> Result<(), ConfigError> {
    if value < TimeDelta::zero() {
        return Err(ConfigError::NegativeDuration { field, value });
    }
    Ok(())
}

/// Serialized form: whole seconds, so config files stay readable.
#[derive(Serialize, Deserialize)]
struct RawResolverConfig {
    key_propagation_window_secs: i64,
    max_clock_skew_secs: i64,
}

impl TryFrom<RawResolverConfig> for ResolverConfig {
    type Error = ConfigError;

    fn try_from(raw: RawResolverConfig) -> Result<Self, Self::Error> {
        let key_propagation_window = TimeDelta::try_seconds(raw.key_propagation_window_secs)
            .ok_or(ConfigError::OutOfRange { field: "key_propagation_window" })?;
        let max_clock_skew = TimeDelta::try_seconds(raw.max_clock_skew_secs)
            .ok_or(ConfigError::OutOfRange { field: "max_clock_skew" })?;
        Self::new(key_propagation_window, max_clock_skew)
    }
}

impl From<ResolverConfig> for RawResolverConfig {
    fn from(config: ResolverConfig) -> Self {
        Self {
            key_propagation_window_secs: config.key_propagation_window.num_seconds(),
            max_clock_skew_secs: config.max_clock_skew.num_seconds(),
        }
    }
}
