//! Scenario construction.
//!
//! Tests describe keyrings relative to a base instant instead of spelling out
//! absolute timestamps:
//!
//! ```ignore
//! let scenario = Scenario::at(base)
//!     .key(1, days(-30), days(60))
//!     .key_created(2, days(-1), days(59), days(150))
//!     .revoke(1);
//! let keys = scenario.keys();
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use keyspan_core::{EncryptorError, Key};

use crate::test_key::{ProbeBehavior, TestKey, TestKeyId};

/// Shorthand for `TimeDelta::days`.
pub fn days(n: i64) -> TimeDelta {
    TimeDelta::days(n)
}

/// Shorthand for `TimeDelta::minutes`.
pub fn minutes(n: i64) -> TimeDelta {
    TimeDelta::minutes(n)
}

/// A keyring described relative to `now`.
#[derive(Debug, Clone)]
pub struct Scenario {
    now: DateTime<Utc>,
    keys: Vec<TestKey>,
}

impl Scenario {
    /// Start an empty keyring evaluated at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, keys: Vec::new() }
    }

    /// Evaluation instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Add a key created at its activation time.
    #[must_use]
    pub fn key(self, id: TestKeyId, activation: TimeDelta, expiration: TimeDelta) -> Self {
        self.key_created(id, activation, activation, expiration)
    }

    /// Add a key with an explicit creation offset.
    #[must_use]
    pub fn key_created(
        mut self,
        id: TestKeyId,
        creation: TimeDelta,
        activation: TimeDelta,
        expiration: TimeDelta,
    ) -> Self {
        self.keys.push(TestKey::new(
            id,
            self.now + creation,
            self.now + activation,
            self.now + expiration,
        ));
        self
    }

    /// Revoke key `id`. No-op if absent.
    #[must_use]
    pub fn revoke(self, id: TestKeyId) -> Self {
        self.map_key(id, TestKey::revoked)
    }

    /// Make key `id` fail its encryptor probe.
    #[must_use]
    pub fn broken(self, id: TestKeyId) -> Self {
        self.probe(id, ProbeBehavior::Fails(EncryptorError::InvalidKeyMaterial {
            reason: "scripted".to_string(),
        }))
    }

    /// Script the probe outcome of key `id`.
    #[must_use]
    pub fn probe(self, id: TestKeyId, behavior: ProbeBehavior) -> Self {
        self.map_key(id, |key| key.with_probe(behavior.clone()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[TestKey] {
        &self.keys
    }

    /// Consume the scenario, returning its keys.
    pub fn into_keys(self) -> Vec<TestKey> {
        self.keys
    }

    fn map_key(mut self, id: TestKeyId, f: impl Fn(TestKey) -> TestKey) -> Self {
        self.keys = self
            .keys
            .into_iter()
            .map(|key| if *key.id() == id { f(key) } else { key })
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn offsets_are_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let scenario = Scenario::at(now).key_created(1, days(-3), days(-2), days(5));
        let key = &scenario.keys()[0];

        assert_eq!(key.creation_date(), now - days(3));
        assert_eq!(key.activation_date(), now - days(2));
        assert_eq!(key.expiration_date(), now + days(5));
    }

    #[test]
    fn modifiers_target_one_key() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let scenario = Scenario::at(now)
            .key(1, days(0), days(1))
            .key(2, days(0), days(1))
            .revoke(2)
            .broken(1);

        assert!(!scenario.keys()[0].is_revoked());
        assert!(!scenario.keys()[0].probe_behavior().is_usable());
        assert!(scenario.keys()[1].is_revoked());
        assert!(scenario.keys()[1].probe_behavior().is_usable());
    }
}
