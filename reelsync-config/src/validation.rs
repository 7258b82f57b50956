use std::time::Duration;

use reelsync_core::settings::MIN_CORRECTION_INTERVAL;
use thiserror::Error;

use crate::constants::DRIFT_TOLERANCE_WARN_SECS;
use crate::models::PlayerConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("sync.correction_interval {requested:?} is below the 500ms minimum")]
    CorrectionIntervalTooShort { requested: Duration },
    #[error("sync.drift_tolerance_secs must be a positive number of seconds (got {0})")]
    InvalidDriftTolerance(f64),
    #[error("access.free_limit_secs must not be negative (got {0})")]
    NegativeFreeLimit(f64),
    #[error("fallback.frame_equivalent_secs must be a positive number of seconds (got {0})")]
    InvalidFrameEquivalent(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &PlayerConfig) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.sync.correction_interval < MIN_CORRECTION_INTERVAL {
        return Err(ConfigGuardRailError::CorrectionIntervalTooShort {
            requested: config.sync.correction_interval,
        });
    }

    let tolerance = config.sync.drift_tolerance_secs;
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(ConfigGuardRailError::InvalidDriftTolerance(tolerance));
    }

    let limit = config.access.free_limit_secs;
    if !limit.is_finite() || limit < 0.0 {
        return Err(ConfigGuardRailError::NegativeFreeLimit(limit));
    }

    let frame = config.fallback.frame_equivalent_secs;
    if !frame.is_finite() || frame <= 0.0 {
        return Err(ConfigGuardRailError::InvalidFrameEquivalent(frame));
    }

    if tolerance > DRIFT_TOLERANCE_WARN_SECS {
        warnings.push_with_hint(
            format!(
                "sync.drift_tolerance_secs is {tolerance}s, above the {DRIFT_TOLERANCE_WARN_SECS}s lip-sync bound"
            ),
            "Values between 0.1 and 0.3 keep lip sync without constant seeking",
        );
    }

    if limit == 0.0 {
        warnings.push(
            "access.free_limit_secs is 0; free-tier sessions lock as soon as playback starts",
        );
    }

    if config.notices.ttl.is_zero() {
        warnings.push("notices.ttl is 0; transient notices will never be shown");
    }

    if config.logging.filter.trim().is_empty() {
        warnings.push_with_hint(
            "logging.filter is empty; nothing will be logged unless RUST_LOG is set",
            "Use a tracing filter such as \"info\" or \"reelsync_core=debug\"",
        );
    }

    Ok(warnings)
}
