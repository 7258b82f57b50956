use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reelsync_core::EngineSettings;
use reelsync_core::settings::{
    DEFAULT_DRIFT_TOLERANCE_SECS, DEFAULT_FRAME_EQUIVALENT_SECS, DEFAULT_NOTICE_TTL,
    MIN_CORRECTION_INTERVAL,
};
use reelsync_model::AccessPolicy;
use reelsync_model::access::DEFAULT_FREE_LIMIT_SECONDS;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_FILTER;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// Path handed to the loader directly (`--path`)
    Explicit(PathBuf),
    /// `$REELSYNC_CONFIG_PATH`
    EnvPath(PathBuf),
    /// `$REELSYNC_CONFIG_JSON`
    EnvInline,
    /// One of the default file candidates
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("built-in defaults"),
            ConfigSource::Explicit(path) => write!(f, "{}", path.display()),
            ConfigSource::EnvPath(path) => {
                write!(f, "{} (REELSYNC_CONFIG_PATH)", path.display())
            }
            ConfigSource::EnvInline => f.write_str("REELSYNC_CONFIG_JSON"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Top-level player settings. Every section is optional in the file; absent
/// sections take the engine defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub sync: SyncConfig,
    pub access: AccessConfig,
    pub fallback: FallbackConfig,
    pub notices: NoticeConfig,
    pub logging: LoggingConfig,
}

impl PlayerConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            drift_tolerance_secs: self.sync.drift_tolerance_secs,
            correction_interval: self.sync.correction_interval,
            frame_equivalent_secs: self.fallback.frame_equivalent_secs,
            notice_ttl: self.notices.ttl,
        }
    }

    /// Policy applied to accounts the subscription store does not report as
    /// premium.
    pub fn free_tier_policy(&self) -> AccessPolicy {
        AccessPolicy::free_tier(self.access.free_limit_secs)
    }
}

/// Secondary audio synchronization.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum tolerated distance between dub and primary before the dub is
    /// seeked back into place. Lower values correct more often and can cause
    /// audible skips on slow decoders.
    pub drift_tolerance_secs: f64,
    /// Spacing between periodic drift checks. Must be at least 500ms.
    #[serde(with = "crate::util::humantime_duration")]
    pub correction_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_tolerance_secs: DEFAULT_DRIFT_TOLERANCE_SECS,
            correction_interval: MIN_CORRECTION_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Preview length in seconds for non-premium accounts
    pub free_limit_secs: f64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            free_limit_secs: DEFAULT_FREE_LIMIT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// How far before the end a resume position is parked when it overshoots
    /// a shorter candidate.
    pub frame_equivalent_secs: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            frame_equivalent_secs: DEFAULT_FRAME_EQUIVALENT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoticeConfig {
    #[serde(with = "crate::util::humantime_duration")]
    pub ttl: Duration,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
