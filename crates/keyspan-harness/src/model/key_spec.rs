//! Generated key descriptions.
//!
//! A [`KeySpec`] is a compact, fuzzer-friendly description of one key. Offsets
//! are in minutes relative to the evaluation instant and kept within a few
//! months so generated keyrings cluster around the interesting boundaries
//! (skew, propagation window, expiration).

use arbitrary::Arbitrary;
use chrono::{DateTime, TimeDelta, Utc};
use keyspan_core::EncryptorError;

use crate::test_key::{ProbeBehavior, TestKey, TestKeyId};

/// Largest offset magnitude, in minutes (about 90 days).
pub const MAX_OFFSET_MINUTES: i32 = 90 * 24 * 60;

/// Probe outcome of a generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum SpecProbe {
    /// Encryptor is built
    Usable,
    /// Construction returns an error
    Fails,
    /// Construction panics
    Panics,
}

/// Compact description of one key.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub struct KeySpec {
    /// Key identifier (small, so ids collide with each other's tie-breaks)
    pub id: u8,
    /// Creation offset from `now`, minutes
    pub creation_offset: i32,
    /// Activation offset from `now`, minutes
    pub activation_offset: i32,
    /// Lifetime after activation, minutes (made non-negative)
    pub lifetime: i32,
    /// Whether the key is revoked
    pub revoked: bool,
    /// Probe outcome
    pub probe: SpecProbe,
}

impl KeySpec {
    /// Build the corresponding [`TestKey`] relative to `now`.
    ///
    /// Offsets are folded into `±MAX_OFFSET_MINUTES`; expiration is never
    /// before activation.
    pub fn to_test_key(&self, now: DateTime<Utc>) -> TestKey {
        let creation = now + minutes(self.creation_offset);
        let activation = now + minutes(self.activation_offset);
        let expiration = activation + minutes(self.lifetime).abs();

        let probe = match self.probe {
            SpecProbe::Usable => ProbeBehavior::Usable,
            SpecProbe::Fails => ProbeBehavior::Fails(EncryptorError::Backend {
                reason: "generated failure".to_string(),
            }),
            SpecProbe::Panics => ProbeBehavior::Panics,
        };

        let key = TestKey::new(TestKeyId::from(self.id), creation, activation, expiration)
            .with_probe(probe);
        if self.revoked { key.revoked() } else { key }
    }
}

/// Build test keys from specs, dropping later duplicates of an id.
///
/// Ids must be unique within a keyring.
pub fn keyring_from_specs(specs: &[KeySpec], now: DateTime<Utc>) -> Vec<TestKey> {
    let mut seen = std::collections::BTreeSet::new();
    specs
        .iter()
        .filter(|spec| seen.insert(spec.id))
        .map(|spec| spec.to_test_key(now))
        .collect()
}

fn minutes(offset: i32) -> TimeDelta {
    TimeDelta::minutes(i64::from(offset % (MAX_OFFSET_MINUTES + 1)))
}
