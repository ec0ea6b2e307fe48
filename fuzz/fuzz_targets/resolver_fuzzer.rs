//! Fuzz target for default-key resolution
//!
//! # Strategy
//!
//! - Arbitrary keyrings: ids, offsets and lifetimes around the evaluation
//!   instant, revocations and failing encryptors
//! - Arbitrary tolerances: propagation window up to a few months, skew up to
//!   a few hours
//! - Shuffled input: the same keyring is resolved forward and reversed
//!
//! # Invariants
//!
//! - Every standard invariant holds
//! - The resolver agrees with the reference model
//! - Input order never changes the outcome
//! - Each key's encryptor is built at most once per resolution
//!
//! Panicking encryptors are exercised by the property tests instead; the
//! libFuzzer panic hook aborts before the resolver can catch the unwind.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use keyspan_core::{DefaultKeyResolver, Key, ResolverConfig};
use keyspan_harness::{
    InvariantRegistry, KeySnapshot, KeySpec, ModelOutcome, ReferenceModel, ResolutionSnapshot,
    SpecProbe, keyring_from_specs,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct ResolverInput {
    window_minutes: u16,
    skew_minutes: u8,
    keys: Vec<KeySpec>,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fuzz_target!(|input: ResolverInput| {
    let specs: Vec<KeySpec> = input
        .keys
        .into_iter()
        .take(32)
        .map(|mut spec| {
            if spec.probe == SpecProbe::Panics {
                spec.probe = SpecProbe::Fails;
            }
            spec
        })
        .collect();

    let Ok(config) = ResolverConfig::new(
        TimeDelta::minutes(i64::from(input.window_minutes) * 4),
        TimeDelta::minutes(i64::from(input.skew_minutes)),
    ) else {
        return;
    };

    let keys = keyring_from_specs(&specs, now());
    let resolver = DefaultKeyResolver::new(config);
    let resolution = resolver.resolve(now(), &keys);

    let snapshot = ResolutionSnapshot::capture(now(), config, &keys, &resolution);
    InvariantRegistry::standard().assert_all(&snapshot, "after fuzzed resolve");

    for key in &keys {
        assert!(key.probe_count() <= 1, "key {} probed {} times", key.id(), key.probe_count());
    }

    let snapshots: Vec<KeySnapshot> = keys.iter().map(KeySnapshot::of).collect();
    let expected = ReferenceModel::new(config).resolve(now(), &snapshots);
    let actual = ModelOutcome::of(&snapshot);
    assert_eq!(actual, expected, "resolver diverged from reference model");

    let reversed = resolver.resolve(now(), keys.iter().rev());
    let reversed = ResolutionSnapshot::capture(now(), config, &keys, &reversed);
    assert_eq!(ModelOutcome::of(&reversed), actual, "input order changed the outcome");
});
