//! Encryptor validity probing.
//!
//! A key is only worth selecting if it can actually build an encryptor:
//! material may be missing, corrupted, or name an algorithm this process does
//! not support. The probe runs [`Key::create_encryptor`] once, discards the
//! encryptor, and reports usability. Errors and panics both become
//! [`Validity::Unusable`]; nothing escapes to the resolver's caller.

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use crate::{error::EncryptorError, key::Key};

/// Outcome of probing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    /// The key built an encryptor
    Usable,
    /// The key could not build an encryptor
    Unusable(EncryptorError),
}

impl Validity {
    /// Whether the key may be selected.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }
}

/// Probe a key by building (and dropping) its encryptor.
///
/// Panics inside `create_encryptor` are caught and reported as
/// [`EncryptorError::Panicked`]. The process panic hook is left alone, so a
/// panicking encryptor still prints the usual panic message to stderr before
/// the probe reports it.
pub fn probe<K: Key + ?Sized>(key: &K) -> Validity {
    match panic::catch_unwind(AssertUnwindSafe(|| key.create_encryptor())) {
        Ok(Ok(_encryptor)) => Validity::Usable,
        Ok(Err(err)) => Validity::Unusable(err),
        Err(payload) => {
            Validity::Unusable(EncryptorError::Panicked { message: panic_message(&*payload) })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Probe results for one resolution call.
///
/// Each key is probed at most once. A failing key stays disqualified for the
/// rest of the call even if a later probe would have succeeded.
#[derive(Debug)]
pub struct ValidityCache<Id> {
    results: BTreeMap<Id, bool>,
}

impl<Id: Ord + Clone + fmt::Display> Default for ValidityCache<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Ord + Clone + fmt::Display> ValidityCache<Id> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self { results: BTreeMap::new() }
    }

    /// Whether `key` can build an encryptor, probing it on first use.
    ///
    /// Failures are logged at warn level with the key id and whether the
    /// key's stored material is at fault.
    pub fn is_usable<K>(&mut self, key: &K) -> bool
    where
        K: Key<Id = Id> + ?Sized,
    {
        if let Some(&usable) = self.results.get(key.id()) {
            return usable;
        }

        let usable = match probe(key) {
            Validity::Usable => true,
            Validity::Unusable(error) => {
                tracing::warn!(
                    key_id = %key.id(),
                    %error,
                    key_defect = error.is_key_defect(),
                    "Key is ineligible: failed to create an encryptor"
                );
                false
            }
        };

        self.results.insert(key.id().clone(), usable);
        usable
    }

    /// Number of keys probed so far.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no key has been probed yet.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
