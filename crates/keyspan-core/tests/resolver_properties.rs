//! Property-based tests for default-key resolution.
//!
//! These tests verify the fundamental properties of the resolver over
//! generated keyrings:
//!
//! 1. **Invariants**: every standard invariant holds for every resolution
//! 2. **Model equivalence**: the resolver agrees with the reference model
//! 3. **Order independence**: the input order of keys never matters
//! 4. **Single probe**: each key's encryptor is built at most once per call
//! 5. **Skew tolerance**: activation within skew is eligible, beyond is not

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use keyspan_core::{DefaultKeyResolver, Key, Resolution, ResolverConfig};
use keyspan_harness::{
    InvariantRegistry, KeySnapshot, KeySpec, MAX_OFFSET_MINUTES, ModelOutcome, ReferenceModel,
    ResolutionSnapshot, SpecProbe, TestKey, keyring_from_specs,
};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn arb_probe() -> impl Strategy<Value = SpecProbe> {
    prop_oneof![
        8 => Just(SpecProbe::Usable),
        1 => Just(SpecProbe::Fails),
        1 => Just(SpecProbe::Panics),
    ]
}

fn arb_key_spec() -> impl Strategy<Value = KeySpec> {
    (
        0u8..16,
        -MAX_OFFSET_MINUTES..MAX_OFFSET_MINUTES,
        -MAX_OFFSET_MINUTES..MAX_OFFSET_MINUTES,
        0..MAX_OFFSET_MINUTES,
        prop::bool::weighted(0.2),
        arb_probe(),
    )
        .prop_map(|(id, creation_offset, activation_offset, lifetime, revoked, probe)| KeySpec {
            id,
            creation_offset,
            activation_offset,
            lifetime,
            revoked,
            probe,
        })
}

fn arb_keyring() -> impl Strategy<Value = Vec<KeySpec>> {
    prop::collection::vec(arb_key_spec(), 0..12)
}

fn arb_config() -> impl Strategy<Value = ResolverConfig> {
    (0i64..5 * 24 * 60, 0i64..30).prop_map(|(window, skew)| {
        ResolverConfig::new(TimeDelta::minutes(window), TimeDelta::minutes(skew))
            .unwrap_or_default()
    })
}

fn summary(resolution: &Resolution<'_, TestKey>) -> (Option<u32>, Option<u32>, bool) {
    (
        resolution.default_key().map(|key| *key.id()),
        resolution.fallback_key().map(|key| *key.id()),
        resolution.should_generate_new_key(),
    )
}

fn outcome(keys: &[TestKey], config: ResolverConfig) -> ModelOutcome {
    let resolution = DefaultKeyResolver::new(config).resolve(now(), keys);
    ModelOutcome::of(&ResolutionSnapshot::capture(now(), config, keys, &resolution))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold(specs in arb_keyring(), config in arb_config()) {
        let keys = keyring_from_specs(&specs, now());
        let resolution = DefaultKeyResolver::new(config).resolve(now(), &keys);
        let snapshot = ResolutionSnapshot::capture(now(), config, &keys, &resolution);

        let result = InvariantRegistry::standard().check_all(&snapshot);
        prop_assert!(result.is_ok(), "violations: {:?}", result.err());
    }

    #[test]
    fn prop_matches_reference_model(specs in arb_keyring(), config in arb_config()) {
        let keys = keyring_from_specs(&specs, now());
        let snapshots: Vec<KeySnapshot> = keys.iter().map(KeySnapshot::of).collect();

        let expected = ReferenceModel::new(config).resolve(now(), &snapshots);
        let actual = outcome(&keys, config);

        prop_assert_eq!(actual, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_order_independent(
        specs in arb_keyring(),
        config in arb_config(),
        rotation in 0usize..12,
    ) {
        let keys = keyring_from_specs(&specs, now());
        let resolver = DefaultKeyResolver::new(config);

        let forward = resolver.resolve(now(), &keys);
        let reversed = resolver.resolve(now(), keys.iter().rev());

        let mut rotated: Vec<&TestKey> = keys.iter().collect();
        if !rotated.is_empty() {
            let by = rotation % rotated.len();
            rotated.rotate_left(by);
        }
        let rotated = resolver.resolve(now(), rotated);

        prop_assert_eq!(summary(&forward), summary(&reversed));
        prop_assert_eq!(summary(&forward), summary(&rotated));
    }

    #[test]
    fn prop_each_key_probed_at_most_once(specs in arb_keyring(), config in arb_config()) {
        let keys = keyring_from_specs(&specs, now());
        let _ = DefaultKeyResolver::new(config).resolve(now(), &keys);

        for key in &keys {
            prop_assert!(
                key.probe_count() <= 1,
                "key {} probed {} times",
                key.id(),
                key.probe_count()
            );
        }
    }

    #[test]
    fn prop_revoked_keys_are_never_probed(specs in arb_keyring(), config in arb_config()) {
        let keys = keyring_from_specs(&specs, now());
        let _ = DefaultKeyResolver::new(config).resolve(now(), &keys);

        for key in keys.iter().filter(|key| key.is_revoked()) {
            prop_assert_eq!(key.probe_count(), 0);
        }
    }

    #[test]
    fn prop_skew_tolerance(skew_secs in 0i64..3600, offset_secs in 0i64..7200) {
        let skew = TimeDelta::seconds(skew_secs);
        let config = ResolverConfig::default().with_max_clock_skew(skew).unwrap();
        let activation = now() + TimeDelta::seconds(offset_secs);
        let keys = vec![TestKey::new(1, activation, activation, activation + TimeDelta::days(90))];

        let resolution = DefaultKeyResolver::new(config).resolve(now(), &keys);
        prop_assert_eq!(resolution.default_key().is_some(), offset_secs <= skew_secs);
    }

    #[test]
    fn prop_generation_required_without_default(specs in arb_keyring(), config in arb_config()) {
        let keys = keyring_from_specs(&specs, now());
        let resolution = DefaultKeyResolver::new(config).resolve(now(), &keys);

        if resolution.default_key().is_none() {
            prop_assert!(resolution.should_generate_new_key());
        } else {
            prop_assert!(resolution.fallback_key().is_none());
        }
    }
}
