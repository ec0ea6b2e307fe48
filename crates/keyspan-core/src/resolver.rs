//! Default key resolution.
//!
//! Given `now` and a keyring snapshot, [`DefaultKeyResolver::resolve`] picks
//! the key that protects new data, a fallback when there is none, and
//! whether the caller must generate a new key right away.
//!
//! # Algorithm
//!
//! ```text
//! keys ──▶ activated by now + skew? ──▶ latest activation, smallest id
//!                                               │
//!                          revoked / expired / no encryptor?
//!                             │ no                     │ yes
//!                             ▼                        ▼
//!                       default key             fallback search:
//!                  generate = no successor      1. created <= now - window,
//!                  covers expiration + skew        newest first
//!                                               2. any key, oldest first
//!                                               generate = true
//! ```
//!
//! The resolver is stateless. Every call probes candidate keys afresh, but
//! each key at most once per call.

use std::cmp::Ordering;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::Level;

use crate::{config::ResolverConfig, env::Clock, key::Key, validity::ValidityCache};

/// Result of resolving a keyring.
///
/// A fallback key is only ever present when there is no default key; the
/// constructors make the other combination unrepresentable.
#[derive(Debug)]
pub struct Resolution<'a, K> {
    default_key: Option<&'a K>,
    fallback_key: Option<&'a K>,
    should_generate_new_key: bool,
}

impl<K> Clone for Resolution<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Resolution<'_, K> {}

impl<'a, K> Resolution<'a, K> {
    /// Resolution with a usable default key.
    pub fn with_default(default_key: &'a K, should_generate_new_key: bool) -> Self {
        Self { default_key: Some(default_key), fallback_key: None, should_generate_new_key }
    }

    /// Resolution without a default key. Generation is always required.
    pub fn without_default(fallback_key: Option<&'a K>) -> Self {
        Self { default_key: None, fallback_key, should_generate_new_key: true }
    }

    /// Key to use for new protect operations, if any.
    pub fn default_key(&self) -> Option<&'a K> {
        self.default_key
    }

    /// Best-effort key when no default exists.
    pub fn fallback_key(&self) -> Option<&'a K> {
        self.fallback_key
    }

    /// Whether the caller must create and persist a new key now.
    pub fn should_generate_new_key(&self) -> bool {
        self.should_generate_new_key
    }

    /// The default key, or the fallback key when there is no default.
    pub fn key_for_protect(&self) -> Option<&'a K> {
        self.default_key.or(self.fallback_key)
    }
}

/// Why a preferred default key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disqualification {
    Revoked,
    Expired,
    NoEncryptor,
}

impl Disqualification {
    fn as_str(self) -> &'static str {
        match self {
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::NoEncryptor => "cannot create an encryptor",
        }
    }
}

/// Default-key resolution policy.
///
/// Holds only its [`ResolverConfig`]; `resolve` borrows `self` immutably and
/// calls with different snapshots are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyResolver {
    config: ResolverConfig,
}

impl DefaultKeyResolver {
    /// Create a resolver with the given tolerances.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the default key as of `now`.
    ///
    /// `keys` may be in any order. Never fails: an empty or fully unusable
    /// keyring yields no default, no fallback, and a generation request.
    pub fn resolve<'a, K, I>(&self, now: DateTime<Utc>, keys: I) -> Resolution<'a, K>
    where
        K: Key + 'a,
        I: IntoIterator<Item = &'a K>,
    {
        let keys: Vec<&'a K> = keys.into_iter().collect();
        let mut validity = ValidityCache::new();

        if tracing::enabled!(Level::TRACE) {
            let ids: Vec<String> = keys.iter().map(|key| key.id().to_string()).collect();
            tracing::trace!(%now, key_count = keys.len(), ?ids, "Resolving default key");
        }

        if let Some(preferred) = self.find_preferred_default(now, &keys) {
            tracing::debug!(
                key_id = %preferred.id(),
                expiration = %preferred.expiration_date(),
                "Considering key as default key"
            );

            match disqualify(preferred, now, &mut validity) {
                Some(reason) => {
                    tracing::debug!(
                        key_id = %preferred.id(),
                        reason = reason.as_str(),
                        "Key is no longer under consideration as default key"
                    );
                }
                None => {
                    let should_generate_new_key = !self.has_successor(now, preferred, &keys);
                    if should_generate_new_key {
                        tracing::debug!(
                            key_id = %preferred.id(),
                            expiration = %preferred.expiration_date(),
                            "Default key expiration imminent and keyring contains no viable successor"
                        );
                    }
                    return Resolution::with_default(preferred, should_generate_new_key);
                }
            }
        }

        let fallback_key = self.find_fallback(now, &keys, &mut validity);
        match fallback_key {
            Some(key) => tracing::debug!(
                fallback_key_id = %key.id(),
                "Keyring contains no viable default key; using fallback"
            ),
            None => tracing::debug!("Keyring contains no viable default key and no usable fallback"),
        }

        Resolution::without_default(fallback_key)
    }

    /// Resolve the default key as of `clock.now()`.
    pub fn resolve_at<'a, K, I, C>(&self, clock: &C, keys: I) -> Resolution<'a, K>
    where
        K: Key + 'a,
        I: IntoIterator<Item = &'a K>,
        C: Clock,
    {
        self.resolve(clock.now(), keys)
    }

    /// Most recently activated key, allowing for clock skew. Ties go to the
    /// smallest id.
    fn find_preferred_default<'a, K: Key>(
        &self,
        now: DateTime<Utc>,
        keys: &[&'a K],
    ) -> Option<&'a K> {
        let activation_limit = saturating_add(now, self.config.max_clock_skew());

        let mut candidates: Vec<&'a K> =
            keys.iter().copied().filter(|key| key.activation_date() <= activation_limit).collect();
        candidates.sort_by(|a, b| by_activation_desc_then_id(*a, *b));
        candidates.first().copied()
    }

    /// Whether some non-revoked key can take over when `preferred` expires and
    /// is still valid after the propagation window.
    ///
    /// Scans the whole keyring, `preferred` included.
    fn has_successor<K: Key>(&self, now: DateTime<Utc>, preferred: &K, keys: &[&K]) -> bool {
        let takeover_deadline =
            saturating_add(preferred.expiration_date(), self.config.max_clock_skew());
        let propagated_at = saturating_add(now, self.config.key_propagation_window());

        keys.iter().any(|key| {
            key.activation_date() <= takeover_deadline
                && !key.is_expired(propagated_at)
                && !key.is_revoked()
        })
    }

    /// Fallback search: newest key old enough to have propagated, else the
    /// oldest usable key. Expired keys are acceptable; revoked or unusable
    /// keys are not.
    fn find_fallback<'a, K: Key>(
        &self,
        now: DateTime<Utc>,
        keys: &[&'a K],
        validity: &mut ValidityCache<K::Id>,
    ) -> Option<&'a K> {
        let propagation_cutoff = saturating_sub(now, self.config.key_propagation_window());

        let mut propagated: Vec<&'a K> =
            keys.iter().copied().filter(|key| key.creation_date() <= propagation_cutoff).collect();
        propagated.sort_by(|a, b| by_creation_desc_then_id(*a, *b));

        let mut oldest_first: Vec<&'a K> = keys.to_vec();
        oldest_first.sort_by(|a, b| by_creation_asc_then_id(*a, *b));

        propagated
            .into_iter()
            .chain(oldest_first)
            .find(|key| !key.is_revoked() && validity.is_usable(*key))
    }
}

/// Checks run on the preferred default, cheapest first. The encryptor is only
/// probed for keys that pass the timestamp checks.
fn disqualify<K: Key>(
    key: &K,
    now: DateTime<Utc>,
    validity: &mut ValidityCache<K::Id>,
) -> Option<Disqualification> {
    if key.is_revoked() {
        Some(Disqualification::Revoked)
    } else if key.is_expired(now) {
        Some(Disqualification::Expired)
    } else if !validity.is_usable(key) {
        Some(Disqualification::NoEncryptor)
    } else {
        None
    }
}

fn by_activation_desc_then_id<K: Key>(a: &K, b: &K) -> Ordering {
    b.activation_date().cmp(&a.activation_date()).then_with(|| a.id().cmp(b.id()))
}

fn by_creation_desc_then_id<K: Key>(a: &K, b: &K) -> Ordering {
    b.creation_date().cmp(&a.creation_date()).then_with(|| a.id().cmp(b.id()))
}

fn by_creation_asc_then_id<K: Key>(a: &K, b: &K) -> Ordering {
    a.creation_date().cmp(&b.creation_date()).then_with(|| a.id().cmp(b.id()))
}

fn saturating_add(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn saturating_sub(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::EncryptorError;

    #[derive(Debug)]
    struct Plain {
        id: u32,
        created: DateTime<Utc>,
        activates: DateTime<Utc>,
        expires: DateTime<Utc>,
        revoked: bool,
        usable: bool,
    }

    impl Key for Plain {
        type Id = u32;
        type Encryptor = ();

        fn id(&self) -> &u32 {
            &self.id
        }

        fn creation_date(&self) -> DateTime<Utc> {
            self.created
        }

        fn activation_date(&self) -> DateTime<Utc> {
            self.activates
        }

        fn expiration_date(&self) -> DateTime<Utc> {
            self.expires
        }

        fn is_revoked(&self) -> bool {
            self.revoked
        }

        fn create_encryptor(&self) -> Result<(), EncryptorError> {
            if self.usable { Ok(()) } else { Err(EncryptorError::MissingKeyMaterial) }
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn key(id: u32, activates_in_days: i64, expires_in_days: i64) -> Plain {
        let activates = base() + TimeDelta::days(activates_in_days);
        Plain {
            id,
            created: activates,
            activates,
            expires: base() + TimeDelta::days(expires_in_days),
            revoked: false,
            usable: true,
        }
    }

    fn resolver() -> DefaultKeyResolver {
        DefaultKeyResolver::default()
    }

    #[test]
    fn empty_keyring() {
        let keys: Vec<Plain> = Vec::new();
        let resolution = resolver().resolve(base(), &keys);

        assert!(resolution.default_key().is_none());
        assert!(resolution.fallback_key().is_none());
        assert!(resolution.should_generate_new_key());
    }

    #[test]
    fn active_key_with_distant_expiration_needs_no_successor() {
        let keys = vec![key(1, -10, 80)];
        let resolution = resolver().resolve(base(), &keys);

        assert_eq!(resolution.default_key().map(|k| k.id), Some(1));
        assert!(resolution.fallback_key().is_none());
        assert!(!resolution.should_generate_new_key());
    }

    #[test]
    fn active_key_expiring_within_window_requests_generation() {
        let keys = vec![key(1, -80, 1)];
        let resolution = resolver().resolve(base(), &keys);

        assert_eq!(resolution.default_key().map(|k| k.id), Some(1));
        assert!(resolution.should_generate_new_key());
    }

    #[test]
    fn saturates_near_max_instant() {
        let mut far = key(1, -1, 0);
        far.expires = DateTime::<Utc>::MAX_UTC;
        let keys = vec![far];

        let resolution = resolver().resolve(DateTime::<Utc>::MAX_UTC, &keys);
        assert!(resolution.default_key().is_none());
        assert_eq!(resolution.fallback_key().map(|k| k.id), Some(1));
    }

    #[test]
    fn saturates_near_min_instant() {
        let mut early = key(1, 0, 10);
        early.created = DateTime::<Utc>::MIN_UTC;
        early.activates = DateTime::<Utc>::MIN_UTC;
        let keys = vec![early];

        let resolution = resolver().resolve(DateTime::<Utc>::MIN_UTC, &keys);
        assert_eq!(resolution.default_key().map(|k| k.id), Some(1));
    }

    #[test]
    fn key_for_protect_prefers_default() {
        let default = key(1, 0, 10);
        let resolution = Resolution::with_default(&default, false);
        assert_eq!(resolution.key_for_protect().map(|k| k.id), Some(1));

        let fallback = key(2, 0, 10);
        let resolution = Resolution::without_default(Some(&fallback));
        assert_eq!(resolution.key_for_protect().map(|k| k.id), Some(2));
        assert!(resolution.should_generate_new_key());
    }

    #[test]
    fn disqualification_order() {
        let mut revoked = key(1, -1, 10);
        revoked.revoked = true;
        revoked.usable = false;
        let mut validity = ValidityCache::new();

        assert_eq!(disqualify(&revoked, base(), &mut validity), Some(Disqualification::Revoked));
        assert!(validity.is_empty(), "revoked keys are not probed");

        let expired = key(2, -10, -1);
        assert_eq!(disqualify(&expired, base(), &mut validity), Some(Disqualification::Expired));
        assert!(validity.is_empty(), "expired keys are not probed");

        let mut broken = key(3, -1, 10);
        broken.usable = false;
        assert_eq!(disqualify(&broken, base(), &mut validity), Some(Disqualification::NoEncryptor));
        assert_eq!(validity.len(), 1);
    }
}
