//! Keyspan Default-Key Resolution
//!
//! Decides which key of a rotating keyring protects new data. Pure policy:
//! the caller supplies the current time and a snapshot of the keyring, the
//! resolver returns a [`Resolution`]. Storage, key generation and the actual
//! encryption all live outside this crate.
//!
//! # Key Timeline
//!
//! Every key carries three timestamps. A key becomes the default once its
//! activation date has passed (allowing for clock skew between servers), and
//! stops being usable for new data at its expiration date. Before that
//! happens, a successor has to exist long enough to reach every server.
//!
//! ```text
//!   created        activated                       expires
//!      │               │                              │
//!      ▼               ▼                              ▼
//! ─────●───────────────●──────────────────────────────●──────────▶ time
//!                  ◀──skew──▶              ◀──propagation window──▶
//!                                                 successor must be
//!                                                 in place by here
//! ```
//!
//! # Resolution
//!
//! - Default: the most recently activated key, provided it is not revoked,
//!   not expired, and can actually build an encryptor. If it fails any of
//!   those checks there is no default; an older active key is never promoted
//! - Fallback: only when no default exists. A key old enough to have
//!   propagated, else the oldest usable key
//! - Generation signal: raised when no successor covers the default's
//!   expiration, or when there is no default at all
//!
//! # Security
//!
//! - Revoked keys are never selected, whatever their timestamps
//! - A key whose encryptor cannot be built (error or panic) is treated as
//!   unusable for the rest of the call, never retried
//! - Tie-breaks are total: equal activation dates resolve to the smallest id

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod key;
pub mod resolver;
pub mod validity;

pub use config::ResolverConfig;
pub use env::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, EncryptorError};
pub use key::Key;
pub use resolver::{DefaultKeyResolver, Resolution};
pub use validity::{Validity, ValidityCache, probe};
