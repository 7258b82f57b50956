#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Free-tier cap applied when the subscription store does not report a
/// premium account.
pub const DEFAULT_FREE_LIMIT_SECONDS: f64 = 60.0;

/// Subscription facts supplied once at session construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessPolicy {
    pub is_premium: bool,
    pub free_limit_seconds: f64,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::free_tier(DEFAULT_FREE_LIMIT_SECONDS)
    }
}

impl AccessPolicy {
    pub fn premium() -> Self {
        Self {
            is_premium: true,
            free_limit_seconds: DEFAULT_FREE_LIMIT_SECONDS,
        }
    }

    pub fn free_tier(free_limit_seconds: f64) -> Self {
        Self {
            is_premium: false,
            free_limit_seconds,
        }
    }
}

/// Per-session access state. `locked` is a one-way latch: it can only be
/// set, and only a fresh state (new session) starts unlocked.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AccessState {
    pub is_premium: bool,
    pub free_limit_seconds: f64,
    locked: bool,
}

impl AccessState {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            is_premium: policy.is_premium,
            free_limit_seconds: policy.free_limit_seconds,
            locked: false,
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Whether `seconds` is past the cap for this account tier.
    pub fn exceeds_cap(&self, seconds: f64) -> bool {
        !self.is_premium && seconds > self.free_limit_seconds
    }

    /// Set the latch. Returns `true` only on the false -> true transition.
    pub fn latch(&mut self) -> bool {
        let newly_locked = !self.locked;
        self.locked = true;
        newly_locked
    }
}
