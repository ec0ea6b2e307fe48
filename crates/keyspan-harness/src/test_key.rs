//! Scripted keys for tests.
//!
//! [`TestKey`] implements [`Key`] with fixed timestamps and a scripted
//! encryptor outcome, and counts how often the resolver probed it.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use keyspan_core::{EncryptorError, Key};

/// Identifier used by test keys.
pub type TestKeyId = u32;

/// What happens when the resolver asks a [`TestKey`] for an encryptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProbeBehavior {
    /// Encryptor is built
    #[default]
    Usable,
    /// Construction returns an error
    Fails(EncryptorError),
    /// Construction panics
    Panics,
}

impl ProbeBehavior {
    /// Whether a probe against this behavior succeeds.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }
}

/// Encryptor handed out by a usable [`TestKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestEncryptor {
    /// Key that built it
    pub key_id: TestKeyId,
}

/// A key with scripted timestamps and probe outcome.
#[derive(Debug)]
pub struct TestKey {
    id: TestKeyId,
    creation_date: DateTime<Utc>,
    activation_date: DateTime<Utc>,
    expiration_date: DateTime<Utc>,
    revoked: bool,
    probe: ProbeBehavior,
    probe_count: AtomicU32,
}

impl Clone for TestKey {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            creation_date: self.creation_date,
            activation_date: self.activation_date,
            expiration_date: self.expiration_date,
            revoked: self.revoked,
            probe: self.probe.clone(),
            probe_count: AtomicU32::new(0),
        }
    }
}

impl TestKey {
    /// Create a usable, non-revoked key.
    pub fn new(
        id: TestKeyId,
        creation_date: DateTime<Utc>,
        activation_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            creation_date,
            activation_date,
            expiration_date,
            revoked: false,
            probe: ProbeBehavior::Usable,
            probe_count: AtomicU32::new(0),
        }
    }

    /// Mark the key revoked.
    #[must_use]
    pub fn revoked(mut self) -> Self {
        self.revoked = true;
        self
    }

    /// Script the probe outcome.
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeBehavior) -> Self {
        self.probe = probe;
        self
    }

    /// Scripted probe outcome.
    pub fn probe_behavior(&self) -> &ProbeBehavior {
        &self.probe
    }

    /// Number of times `create_encryptor` was called.
    pub fn probe_count(&self) -> u32 {
        self.probe_count.load(Ordering::Relaxed)
    }
}

impl Key for TestKey {
    type Id = TestKeyId;
    type Encryptor = TestEncryptor;

    fn id(&self) -> &TestKeyId {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    fn activation_date(&self) -> DateTime<Utc> {
        self.activation_date
    }

    fn expiration_date(&self) -> DateTime<Utc> {
        self.expiration_date
    }

    fn is_revoked(&self) -> bool {
        self.revoked
    }

    #[allow(clippy::panic)]
    fn create_encryptor(&self) -> Result<TestEncryptor, EncryptorError> {
        self.probe_count.fetch_add(1, Ordering::Relaxed);
        match &self.probe {
            ProbeBehavior::Usable => Ok(TestEncryptor { key_id: self.id }),
            ProbeBehavior::Fails(err) => Err(err.clone()),
            ProbeBehavior::Panics => panic!("scripted encryptor panic for key {}", self.id),
        }
    }
}
