//! Observable resolution snapshots for invariant checking.
//!
//! A snapshot captures the inputs and outputs of one resolution as plain
//! data. Invariants and the reference model operate on snapshots rather than
//! live keys, so checks never trigger extra encryptor probes.

use chrono::{DateTime, Utc};
use keyspan_core::{Key, Resolution, ResolverConfig};

use crate::test_key::{TestKey, TestKeyId};

/// Plain-data view of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySnapshot {
    /// Key identifier.
    pub id: TestKeyId,
    /// Creation timestamp.
    pub creation_date: DateTime<Utc>,
    /// Activation timestamp.
    pub activation_date: DateTime<Utc>,
    /// Expiration timestamp.
    pub expiration_date: DateTime<Utc>,
    /// Revocation flag.
    pub revoked: bool,
    /// Whether the scripted probe succeeds.
    pub usable: bool,
}

impl KeySnapshot {
    /// Capture a test key without probing it.
    pub fn of(key: &TestKey) -> Self {
        Self {
            id: *key.id(),
            creation_date: key.creation_date(),
            activation_date: key.activation_date(),
            expiration_date: key.expiration_date(),
            revoked: key.is_revoked(),
            usable: key.probe_behavior().is_usable(),
        }
    }

    /// Expired as of `as_of` (inclusive, like [`Key::is_expired`]).
    pub fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.expiration_date
    }
}

/// Inputs and outputs of one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionSnapshot {
    /// Evaluation instant.
    pub now: DateTime<Utc>,
    /// Resolver configuration.
    pub config: ResolverConfig,
    /// Keyring, in the order it was passed to the resolver.
    pub keys: Vec<KeySnapshot>,
    /// Selected default key.
    pub default_key: Option<TestKeyId>,
    /// Selected fallback key.
    pub fallback_key: Option<TestKeyId>,
    /// Generation signal.
    pub should_generate_new_key: bool,
}

impl ResolutionSnapshot {
    /// Capture a finished resolution.
    pub fn capture(
        now: DateTime<Utc>,
        config: ResolverConfig,
        keys: &[TestKey],
        resolution: &Resolution<'_, TestKey>,
    ) -> Self {
        Self {
            now,
            config,
            keys: keys.iter().map(KeySnapshot::of).collect(),
            default_key: resolution.default_key().map(|key| *key.id()),
            fallback_key: resolution.fallback_key().map(|key| *key.id()),
            should_generate_new_key: resolution.should_generate_new_key(),
        }
    }

    /// Look up a key by id.
    pub fn key(&self, id: TestKeyId) -> Option<&KeySnapshot> {
        self.keys.iter().find(|key| key.id == id)
    }

    /// Snapshot of an empty keyring resolution.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            now,
            config: ResolverConfig::default(),
            keys: Vec::new(),
            default_key: None,
            fallback_key: None,
            should_generate_new_key: true,
        }
    }
}
