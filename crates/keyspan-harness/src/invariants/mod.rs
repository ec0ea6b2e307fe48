//! Invariant checking for resolution results.
//!
//! Invariants are properties that must hold for every resolution, whatever
//! the keyring. Unlike example-based tests that check specific scenarios,
//! they are run against generated keyrings in property tests and fuzzing.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = ResolutionSnapshot::capture(now, config, &keys, &resolution);
//! registry.assert_all(&snapshot, "after resolve");
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    DefaultIsActiveAndUnexpired, DefaultIsNewestActivated, FallbackExcludesDefault,
    NoDefaultImpliesGeneration, RevokedNeverSelected, UnusableNeverSelected,
};
pub use snapshot::{KeySnapshot, ResolutionSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Identifies an invariant in violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// See [`FallbackExcludesDefault`]
    FallbackExcludesDefault,
    /// See [`RevokedNeverSelected`]
    RevokedNeverSelected,
    /// See [`UnusableNeverSelected`]
    UnusableNeverSelected,
    /// See [`DefaultIsActiveAndUnexpired`]
    DefaultIsActiveAndUnexpired,
    /// See [`DefaultIsNewestActivated`]
    DefaultIsNewestActivated,
    /// See [`NoDefaultImpliesGeneration`]
    NoDefaultImpliesGeneration,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which invariant was violated.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property that must hold for every resolution.
pub trait Invariant: Send + Sync {
    /// Invariant identity for error reporting.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with every standard resolution invariant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(FallbackExcludesDefault);
        registry.add(RevokedNeverSelected);
        registry.add(UnusableNeverSelected);
        registry.add(DefaultIsActiveAndUnexpired);
        registry.add(DefaultIsNewestActivated);
        registry.add(NoDefaultImpliesGeneration);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, state: &ResolutionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        for violation in &violations {
            tracing::error!(
                invariant = %violation.invariant,
                message = %violation.message,
                "Invariant violated"
            );
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &ResolutionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}\n{state:#?}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
