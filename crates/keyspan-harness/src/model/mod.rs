//! Model-based testing support.
//!
//! [`KeySpec`] describes generated keys (proptest strategies and fuzz inputs
//! both produce them); [`ReferenceModel`] computes the expected outcome for a
//! keyring independently of the real resolver.

mod key_spec;
mod reference;

pub use key_spec::{KeySpec, MAX_OFFSET_MINUTES, SpecProbe, keyring_from_specs};
pub use reference::{ModelOutcome, ReferenceModel};
