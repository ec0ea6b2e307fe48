//! Deterministic test harness for keyspan default-key resolution.
//!
//! Scripted keys, scenario builders, invariant checks and a reference model.
//! Nothing here reads the system clock: every scenario is evaluated at an
//! explicit instant.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the policy.
//! Generated keyrings ([`KeySpec`]) are resolved by both the model and the
//! real resolver, and their outcomes are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties every resolution must have.
//! Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod scenario;
pub mod test_key;

pub use invariants::{
    DefaultIsActiveAndUnexpired, DefaultIsNewestActivated, FallbackExcludesDefault, Invariant,
    InvariantKind, InvariantRegistry, InvariantResult, KeySnapshot, NoDefaultImpliesGeneration,
    ResolutionSnapshot, RevokedNeverSelected, UnusableNeverSelected, Violation,
};
pub use model::{
    KeySpec, MAX_OFFSET_MINUTES, ModelOutcome, ReferenceModel, SpecProbe, keyring_from_specs,
};
pub use scenario::{Scenario, days, minutes};
pub use test_key::{ProbeBehavior, TestEncryptor, TestKey, TestKeyId};
