//! Key abstraction consumed by the resolver.
//!
//! Keys are owned by the caller's storage layer. The resolver only reads
//! their timestamps and revocation flag and asks each candidate once whether
//! it can build an encryptor.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::EncryptorError;

/// A key in a rotating keyring.
///
/// # Invariants
///
/// Implementations are expected (but not required) to uphold:
///
/// - `activation_date() <= expiration_date()`
/// - `is_revoked()` never flips back to `false` during one resolution
/// - Timestamps do not change while a resolution is running
pub trait Key {
    /// Identifier type. Must be totally ordered: ties between keys are broken
    /// by id and the result has to be the same on every server.
    type Id: Ord + Clone + fmt::Debug + fmt::Display;

    /// Encryptor produced by this key. Only its construction matters to the
    /// resolver; the instance is dropped right after the probe.
    type Encryptor;

    /// Unique identifier.
    fn id(&self) -> &Self::Id;

    /// When the key was created (and started propagating to other servers).
    fn creation_date(&self) -> DateTime<Utc>;

    /// When the key may start protecting new data.
    fn activation_date(&self) -> DateTime<Utc>;

    /// When the key stops protecting new data.
    fn expiration_date(&self) -> DateTime<Utc>;

    /// Whether the key was revoked.
    fn is_revoked(&self) -> bool;

    /// Whether the key has expired as of `as_of`.
    ///
    /// Expiration is inclusive: a key is expired at its exact expiration
    /// instant.
    fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.expiration_date()
    }

    /// Attempt to build an encryptor from this key.
    ///
    /// Any error disqualifies the key for the current resolution.
    fn create_encryptor(&self) -> Result<Self::Encryptor, EncryptorError>;
}
