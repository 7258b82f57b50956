use reelsync_model::{AccessPolicy, AccessState, PlaybackPosition};
use serde::Serialize;
use tracing::info;

/// Result of evaluating the gate against one position reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    Open,
    /// This reading crossed the cap; pause and show the lock overlay
    Tripped,
    /// Already locked earlier in the session
    Locked,
}

/// Free-tier watch-time cap. Once tripped it stays locked for the lifetime
/// of the gate.
#[derive(Debug, Clone)]
pub struct AccessGate {
    state: AccessState,
}

impl AccessGate {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            state: AccessState::new(policy),
        }
    }

    pub fn evaluate(&mut self, position: &PlaybackPosition) -> GateVerdict {
        if self.state.locked() {
            return GateVerdict::Locked;
        }
        if !self.state.exceeds_cap(position.seconds) {
            return GateVerdict::Open;
        }

        self.state.latch();
        info!(
            position = position.seconds,
            limit = self.state.free_limit_seconds,
            "free preview limit reached; locking playback"
        );
        GateVerdict::Tripped
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked()
    }

    pub fn allows_play(&self) -> bool {
        !self.state.locked()
    }

    pub fn state(&self) -> &AccessState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_once_past_limit() {
        let mut gate = AccessGate::new(AccessPolicy::free_tier(60.0));
        assert_eq!(gate.evaluate(&PlaybackPosition::playing_at(60.0)), GateVerdict::Open);
        assert_eq!(
            gate.evaluate(&PlaybackPosition::playing_at(61.0)),
            GateVerdict::Tripped
        );
        assert_eq!(gate.evaluate(&PlaybackPosition::paused_at(0.0)), GateVerdict::Locked);
        assert!(!gate.allows_play());
    }

    #[test]
    fn premium_is_never_gated() {
        let mut gate = AccessGate::new(AccessPolicy::premium());
        assert_eq!(
            gate.evaluate(&PlaybackPosition::playing_at(7_200.0)),
            GateVerdict::Open
        );
        assert!(gate.allows_play());
    }
}
