//! Rendering of a resolution for operators.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use keyspan_core::{Key, Resolution, ResolverConfig};
use serde::Serialize;

use crate::{InspectError, record::KeyRecord};

/// Outcome of inspecting a keyring at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Evaluation instant, RFC 3339 with second precision
    pub now: String,
    /// Effective resolver settings
    pub config: ResolverConfig,
    /// Number of keys in the keyring
    pub key_count: usize,
    /// Id of the default key
    pub default_key: Option<String>,
    /// Id of the fallback key
    pub fallback_key: Option<String>,
    /// Whether a new key should be generated
    pub should_generate_new_key: bool,
}

impl Report {
    /// Summarize `resolution` of `keys` at `now`.
    pub fn new(
        now: DateTime<Utc>,
        config: ResolverConfig,
        keys: &[KeyRecord],
        resolution: &Resolution<'_, KeyRecord>,
    ) -> Self {
        Self {
            now: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            config,
            key_count: keys.len(),
            default_key: resolution.default_key().map(|key| key.id().clone()),
            fallback_key: resolution.fallback_key().map(|key| key.id().clone()),
            should_generate_new_key: resolution.should_generate_new_key(),
        }
    }

    /// Human-readable summary, one field per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rows = [
            ("now", self.now.clone()),
            ("propagation window", seconds(self.config.key_propagation_window())),
            ("max clock skew", seconds(self.config.max_clock_skew())),
            ("keys", self.key_count.to_string()),
            ("default key", self.default_key.clone().unwrap_or_else(|| "-".to_string())),
            ("fallback key", self.fallback_key.clone().unwrap_or_else(|| "-".to_string())),
            ("generate new key", if self.should_generate_new_key { "yes" } else { "no" }.to_string()),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "{:<20}{value}", format!("{label}:"));
        }
        out
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// - `Render` if serialization fails
    pub fn render_json(&self) -> Result<String, InspectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn seconds(delta: TimeDelta) -> String {
    format!("{}s", delta.num_seconds())
}
