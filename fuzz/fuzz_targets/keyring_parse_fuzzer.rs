//! Fuzz target for keyring file parsing
//!
//! # Strategy
//!
//! - Random bytes: arbitrary (possibly non-UTF-8) keyring documents
//!
//! # Invariants
//!
//! - Parsing never panics
//! - Parsed keyrings have unique ids and resolve without panicking
//! - Building an encryptor from any parsed record never panics

#![no_main]

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use keyspan_core::{DefaultKeyResolver, Key};
use keyspan_inspect::parse_keyring;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(keys) = parse_keyring(text, Path::new("fuzz.json")) else {
        return;
    };

    let ids: BTreeSet<&String> = keys.iter().map(|key| key.id()).collect();
    assert_eq!(ids.len(), keys.len(), "duplicate ids accepted");

    for key in &keys {
        let _ = key.create_encryptor();
    }

    let _ = DefaultKeyResolver::default().resolve(DateTime::<Utc>::UNIX_EPOCH, &keys);
});
