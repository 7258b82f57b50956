//! Engine tuning knobs.
//!
//! `reelsync-config` produces these from files and the environment; the
//! engine only consumes the resolved values.

use std::time::Duration;

/// Corrections closer together than this make the periodic tick and the
/// `seeked`-driven resync fight each other.
pub const MIN_CORRECTION_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_DRIFT_TOLERANCE_SECS: f64 = 0.3;
pub const DEFAULT_FRAME_EQUIVALENT_SECS: f64 = 0.04;
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(2);

/// Resolved settings consumed by the playback engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Maximum tolerated |secondary - primary| before a hard resync
    pub drift_tolerance_secs: f64,
    /// Minimum spacing between periodic drift corrections
    pub correction_interval: Duration,
    /// Distance from end-of-stream used when a resume position overshoots
    /// a shorter candidate
    pub frame_equivalent_secs: f64,
    /// How long transient notices stay visible
    pub notice_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            drift_tolerance_secs: DEFAULT_DRIFT_TOLERANCE_SECS,
            correction_interval: MIN_CORRECTION_INTERVAL,
            frame_equivalent_secs: DEFAULT_FRAME_EQUIVALENT_SECS,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

impl EngineSettings {
    /// Copy of these settings with the correction interval raised to the
    /// engine minimum.
    pub fn normalized(&self) -> Self {
        let mut settings = self.clone();
        if settings.correction_interval < MIN_CORRECTION_INTERVAL {
            tracing::warn!(
                requested_ms = settings.correction_interval.as_millis() as u64,
                "drift correction interval below minimum; clamping to 500ms"
            );
            settings.correction_interval = MIN_CORRECTION_INTERVAL;
        }
        settings
    }
}
