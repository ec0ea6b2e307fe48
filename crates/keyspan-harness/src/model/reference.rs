//! Reference model of the default-key policy.
//!
//! Deliberately naive: single linear scans with explicit comparisons, no
//! sorting, no caching. It exists to be obviously correct, so model-based
//! tests can compare the real resolver against it on arbitrary keyrings.

use chrono::{DateTime, TimeDelta, Utc};
use keyspan_core::ResolverConfig;

use crate::{
    invariants::{KeySnapshot, ResolutionSnapshot},
    test_key::TestKeyId,
};

/// Observable outcome of a resolution, as ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOutcome {
    /// Default key id.
    pub default_key: Option<TestKeyId>,
    /// Fallback key id.
    pub fallback_key: Option<TestKeyId>,
    /// Generation signal.
    pub should_generate_new_key: bool,
}

impl ModelOutcome {
    /// Outcome recorded in a snapshot.
    pub fn of(snapshot: &ResolutionSnapshot) -> Self {
        Self {
            default_key: snapshot.default_key,
            fallback_key: snapshot.fallback_key,
            should_generate_new_key: snapshot.should_generate_new_key,
        }
    }
}

/// Naive restatement of the resolution policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceModel {
    config: ResolverConfig,
}

impl ReferenceModel {
    /// Create a model with the given tolerances.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Expected outcome for `keys` at `now`.
    pub fn resolve(&self, now: DateTime<Utc>, keys: &[KeySnapshot]) -> ModelOutcome {
        let skew = self.config.max_clock_skew();
        let window = self.config.key_propagation_window();

        let mut preferred: Option<&KeySnapshot> = None;
        for key in keys {
            if key.activation_date > plus(now, skew) {
                continue;
            }
            preferred = match preferred {
                None => Some(key),
                Some(best) if key.activation_date > best.activation_date => Some(key),
                Some(best) if key.activation_date == best.activation_date && key.id < best.id => {
                    Some(key)
                }
                Some(best) => Some(best),
            };
        }

        if let Some(default) = preferred {
            let usable = !default.revoked && !default.is_expired(now) && default.usable;
            if usable {
                let mut successor = false;
                for key in keys {
                    if key.activation_date <= plus(default.expiration_date, skew)
                        && !key.is_expired(plus(now, window))
                        && !key.revoked
                    {
                        successor = true;
                    }
                }
                return ModelOutcome {
                    default_key: Some(default.id),
                    fallback_key: None,
                    should_generate_new_key: !successor,
                };
            }
        }

        let mut newest_propagated: Option<&KeySnapshot> = None;
        for key in keys {
            if key.revoked || !key.usable || key.creation_date > minus(now, window) {
                continue;
            }
            newest_propagated = match newest_propagated {
                None => Some(key),
                Some(best) if key.creation_date > best.creation_date => Some(key),
                Some(best) if key.creation_date == best.creation_date && key.id < best.id => {
                    Some(key)
                }
                Some(best) => Some(best),
            };
        }

        let mut oldest: Option<&KeySnapshot> = None;
        for key in keys {
            if key.revoked || !key.usable {
                continue;
            }
            oldest = match oldest {
                None => Some(key),
                Some(best) if key.creation_date < best.creation_date => Some(key),
                Some(best) if key.creation_date == best.creation_date && key.id < best.id => {
                    Some(key)
                }
                Some(best) => Some(best),
            };
        }

        ModelOutcome {
            default_key: None,
            fallback_key: newest_propagated.or(oldest).map(|key| key.id),
            should_generate_new_key: true,
        }
    }
}

fn plus(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn minus(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
