//! Escalation rules for repeated sign-in failures.
//!
//! An account is locked once `max_failed_attempts` consecutive failures are
//! counted. Each lockout episode bumps the account's lockout count, and the
//! duration of the next window is
//! `min(base * multiplier^(lockout_count - 1), max)` minutes.

use serde::Deserialize;
use std::time::Duration;

/// Longest lockout the service will ever apply, about a century. Keeps every
/// lockout end representable as a timestamp.
pub const LOCKOUT_MINUTES_LIMIT: u64 = 100 * 366 * 24 * 60;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub base_lockout_minutes: u64,
    pub lockout_multiplier: u64,
    pub max_lockout_minutes: u64,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum LockoutPolicyError {
    #[error("max_failed_attempts must be at least 1")]
    NoAttemptsAllowed,
    #[error("base_lockout_minutes must be greater than 0")]
    ZeroBaseLockout,
    #[error("lockout_multiplier must be at least 1")]
    ZeroMultiplier,
    #[error("max_lockout_minutes ({max}) must exceed base_lockout_minutes ({base})")]
    CeilingBelowBase { base: u64, max: u64 },
    #[error("max_lockout_minutes ({max}) exceeds the supported limit of {limit}")]
    CeilingTooLarge { max: u64, limit: u64 },
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        LockoutPolicy {
            max_failed_attempts: 5,
            base_lockout_minutes: 5,
            lockout_multiplier: 2,
            max_lockout_minutes: 60,
        }
    }
}

impl LockoutPolicy {
    pub fn validate(&self) -> Result<(), LockoutPolicyError> {
        if self.max_failed_attempts < 1 {
            return Err(LockoutPolicyError::NoAttemptsAllowed);
        }
        if self.base_lockout_minutes == 0 {
            return Err(LockoutPolicyError::ZeroBaseLockout);
        }
        if self.lockout_multiplier < 1 {
            return Err(LockoutPolicyError::ZeroMultiplier);
        }
        if self.max_lockout_minutes <= self.base_lockout_minutes {
            return Err(LockoutPolicyError::CeilingBelowBase {
                base: self.base_lockout_minutes,
                max: self.max_lockout_minutes,
            });
        }
        if self.max_lockout_minutes > LOCKOUT_MINUTES_LIMIT {
            return Err(LockoutPolicyError::CeilingTooLarge {
                max: self.max_lockout_minutes,
                limit: LOCKOUT_MINUTES_LIMIT,
            });
        }
        Ok(())
    }

    /// Lifetime of the failed-attempt counter.
    pub fn counter_ttl(&self) -> Duration {
        Duration::from_secs(self.base_lockout_minutes.saturating_mul(60))
    }

    /// Lockout length in minutes for the given (already incremented) lockout
    /// count. The lockout count is never capped; the configured ceiling and
    /// [`LOCKOUT_MINUTES_LIMIT`] are the only bounds.
    pub fn lockout_minutes(&self, lockout_count: u32) -> u64 {
        let exponent = lockout_count.saturating_sub(1);
        let factor = self
            .lockout_multiplier
            .checked_pow(exponent)
            .unwrap_or(u64::MAX);
        self.base_lockout_minutes
            .saturating_mul(factor)
            .min(self.max_lockout_minutes)
            .min(LOCKOUT_MINUTES_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_doubles_until_ceiling() {
        let policy = LockoutPolicy {
            max_failed_attempts: 3,
            base_lockout_minutes: 5,
            lockout_multiplier: 2,
            max_lockout_minutes: 60,
        };
        let minutes: Vec<u64> = (1..=6).map(|n| policy.lockout_minutes(n)).collect();
        assert_eq!(minutes, vec![5, 10, 20, 40, 60, 60]);
    }

    #[test]
    fn huge_lockout_counts_stay_at_ceiling() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.lockout_minutes(64), 60);
        assert_eq!(policy.lockout_minutes(u32::MAX), 60);
    }

    #[test]
    fn multiplier_of_one_keeps_base() {
        let policy = LockoutPolicy {
            lockout_multiplier: 1,
            ..LockoutPolicy::default()
        };
        assert_eq!(policy.lockout_minutes(1), 5);
        assert_eq!(policy.lockout_minutes(10), 5);
    }

    #[test]
    fn oversized_ceiling_is_clamped_and_rejected() {
        let policy = LockoutPolicy {
            max_failed_attempts: 1,
            base_lockout_minutes: 5,
            lockout_multiplier: u64::MAX / 2,
            max_lockout_minutes: u64::MAX,
        };
        assert_eq!(policy.lockout_minutes(1), 5);
        assert_eq!(policy.lockout_minutes(2), LOCKOUT_MINUTES_LIMIT);
        assert_eq!(policy.lockout_minutes(u32::MAX), LOCKOUT_MINUTES_LIMIT);
        assert_eq!(
            policy.validate(),
            Err(LockoutPolicyError::CeilingTooLarge {
                max: u64::MAX,
                limit: LOCKOUT_MINUTES_LIMIT,
            })
        );

        let at_limit = LockoutPolicy {
            max_lockout_minutes: LOCKOUT_MINUTES_LIMIT,
            ..policy
        };
        assert_eq!(at_limit.validate(), Ok(()));
    }

    #[test]
    fn zero_lockout_count_is_treated_as_first_episode() {
        assert_eq!(LockoutPolicy::default().lockout_minutes(0), 5);
    }

    #[test]
    fn counter_ttl_matches_base_window() {
        assert_eq!(LockoutPolicy::default().counter_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn validate_rejects_bad_configuration() {
        let ok = LockoutPolicy::default();
        assert_eq!(ok.validate(), Ok(()));

        let bad = LockoutPolicy {
            max_failed_attempts: 0,
            ..ok
        };
        assert_eq!(bad.validate(), Err(LockoutPolicyError::NoAttemptsAllowed));

        let bad = LockoutPolicy {
            base_lockout_minutes: 0,
            ..ok
        };
        assert_eq!(bad.validate(), Err(LockoutPolicyError::ZeroBaseLockout));

        let bad = LockoutPolicy {
            lockout_multiplier: 0,
            ..ok
        };
        assert_eq!(bad.validate(), Err(LockoutPolicyError::ZeroMultiplier));

        let bad = LockoutPolicy {
            max_lockout_minutes: 5,
            ..ok
        };
        assert_eq!(
            bad.validate(),
            Err(LockoutPolicyError::CeilingBelowBase { base: 5, max: 5 })
        );
    }
}
