//! Clock abstraction for deterministic testing.
//!
//! The resolver takes `now` as an argument and never reads a clock itself.
//! Callers that do not already hold a timestamp obtain one from a [`Clock`]:
//! [`SystemClock`] in production, [`FixedClock`] in tests and tooling.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};

/// Source of wall-clock time.
///
/// Key timestamps are persisted and compared across servers, so this is
/// wall-clock (UTC) time rather than a monotonic instant.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually controlled clock.
///
/// Clones share the same underlying instant, so a test can hand a clone to
/// the code under test and keep advancing the original.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock frozen at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant: Arc::new(RwLock::new(instant)) }
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.instant.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = instant;
    }

    /// Move the clock forward by `delta`.
    ///
    /// Saturates at the largest representable instant.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.instant.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = guard.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
