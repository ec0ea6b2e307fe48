//! Standard invariant checks.
//!
//! These invariants capture properties every resolution must have. They
//! verify WHAT must be true, not specific scenarios.

use super::{Invariant, InvariantKind, InvariantResult, KeySnapshot, ResolutionSnapshot, Violation};

fn selected(state: &ResolutionSnapshot) -> impl Iterator<Item = (&'static str, &KeySnapshot)> {
    let default = state.default_key.and_then(|id| state.key(id)).map(|key| ("default", key));
    let fallback = state.fallback_key.and_then(|id| state.key(id)).map(|key| ("fallback", key));
    default.into_iter().chain(fallback)
}

/// A fallback key is only reported when there is no default key.
pub struct FallbackExcludesDefault;

impl Invariant for FallbackExcludesDefault {
    fn kind(&self) -> InvariantKind {
        InvariantKind::FallbackExcludesDefault
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        if let (Some(default), Some(fallback)) = (state.default_key, state.fallback_key) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("default {default} and fallback {fallback} both set"),
            });
        }
        Ok(())
    }
}

/// Revoked keys are never selected, as default or as fallback.
pub struct RevokedNeverSelected;

impl Invariant for RevokedNeverSelected {
    fn kind(&self) -> InvariantKind {
        InvariantKind::RevokedNeverSelected
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        for (role, key) in selected(state) {
            if key.revoked {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("revoked key {} selected as {role}", key.id),
                });
            }
        }
        Ok(())
    }
}

/// Keys that cannot build an encryptor are never selected.
pub struct UnusableNeverSelected;

impl Invariant for UnusableNeverSelected {
    fn kind(&self) -> InvariantKind {
        InvariantKind::UnusableNeverSelected
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        for (role, key) in selected(state) {
            if !key.usable {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("unusable key {} selected as {role}", key.id),
                });
            }
        }
        Ok(())
    }
}

/// The default key is activated (within skew) and not expired.
///
/// Fallback keys are exempt: they may be expired or not yet active.
pub struct DefaultIsActiveAndUnexpired;

impl Invariant for DefaultIsActiveAndUnexpired {
    fn kind(&self) -> InvariantKind {
        InvariantKind::DefaultIsActiveAndUnexpired
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        let Some(id) = state.default_key else {
            return Ok(());
        };
        let Some(key) = state.key(id) else {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("default key {id} is not in the keyring"),
            });
        };

        let activation_limit = state
            .now
            .checked_add_signed(state.config.max_clock_skew())
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);

        if key.activation_date > activation_limit {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "default key {id} activates at {}, after {activation_limit}",
                    key.activation_date
                ),
            });
        }
        if key.is_expired(state.now) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "default key {id} expired at {}, now is {}",
                    key.expiration_date, state.now
                ),
            });
        }
        Ok(())
    }
}

/// No eligible key activated later than the default (ties: smaller id).
///
/// If the newest activated key is disqualified there is no default at all;
/// the resolver never falls back to an older active key as default.
pub struct DefaultIsNewestActivated;

impl Invariant for DefaultIsNewestActivated {
    fn kind(&self) -> InvariantKind {
        InvariantKind::DefaultIsNewestActivated
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        let Some(default) = state.default_key.and_then(|id| state.key(id)) else {
            return Ok(());
        };
        let activation_limit = state
            .now
            .checked_add_signed(state.config.max_clock_skew())
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);

        for key in &state.keys {
            if key.activation_date > activation_limit || key.id == default.id {
                continue;
            }
            let newer = key.activation_date > default.activation_date
                || (key.activation_date == default.activation_date && key.id < default.id);
            if newer {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "key {} (activation {}) outranks default {} (activation {})",
                        key.id, key.activation_date, default.id, default.activation_date
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Without a default key the caller is always told to generate one.
pub struct NoDefaultImpliesGeneration;

impl Invariant for NoDefaultImpliesGeneration {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NoDefaultImpliesGeneration
    }

    fn check(&self, state: &ResolutionSnapshot) -> InvariantResult {
        if state.default_key.is_none() && !state.should_generate_new_key {
            return Err(Violation {
                invariant: self.kind(),
                message: "no default key but generation not requested".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn key(id: u32, activation_days: i64) -> KeySnapshot {
        KeySnapshot {
            id,
            creation_date: now() + TimeDelta::days(activation_days),
            activation_date: now() + TimeDelta::days(activation_days),
            expiration_date: now() + TimeDelta::days(90),
            revoked: false,
            usable: true,
        }
    }

    fn snapshot(keys: Vec<KeySnapshot>, default: Option<u32>, fallback: Option<u32>) -> ResolutionSnapshot {
        let mut state = ResolutionSnapshot::empty(now());
        state.keys = keys;
        state.default_key = default;
        state.fallback_key = fallback;
        state
    }

    #[test]
    fn both_default_and_fallback_is_violation() {
        let state = snapshot(vec![key(1, -1), key(2, -2)], Some(1), Some(2));
        assert!(FallbackExcludesDefault.check(&state).is_err());
    }

    #[test]
    fn revoked_fallback_is_violation() {
        let mut revoked = key(1, -1);
        revoked.revoked = true;
        let state = snapshot(vec![revoked], None, Some(1));
        assert!(RevokedNeverSelected.check(&state).is_err());
    }

    #[test]
    fn unusable_default_is_violation() {
        let mut broken = key(1, -1);
        broken.usable = false;
        let state = snapshot(vec![broken], Some(1), None);
        assert!(UnusableNeverSelected.check(&state).is_err());
    }

    #[test]
    fn future_default_is_violation() {
        let state = snapshot(vec![key(1, 1)], Some(1), None);
        assert!(DefaultIsActiveAndUnexpired.check(&state).is_err());
    }

    #[test]
    fn older_default_is_violation() {
        let state = snapshot(vec![key(1, -10), key(2, -1)], Some(1), None);
        assert!(DefaultIsNewestActivated.check(&state).is_err());

        let state = snapshot(vec![key(1, -10), key(2, -1)], Some(2), None);
        assert!(DefaultIsNewestActivated.check(&state).is_ok());
    }

    #[test]
    fn expired_fallback_is_fine() {
        let mut expired = key(1, -100);
        expired.expiration_date = now() - TimeDelta::days(1);
        let state = snapshot(vec![expired], None, Some(1));
        assert!(DefaultIsActiveAndUnexpired.check(&state).is_ok());
    }
}
