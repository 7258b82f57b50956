//! Environment keys and file locations consulted by the loader.

/// Path to a TOML or JSON config file
pub const CONFIG_PATH_VAR: &str = "REELSYNC_CONFIG_PATH";
/// Inline JSON config
pub const CONFIG_JSON_VAR: &str = "REELSYNC_CONFIG_JSON";
pub const FREE_LIMIT_VAR: &str = "REELSYNC_FREE_LIMIT_SECS";
pub const DRIFT_TOLERANCE_VAR: &str = "REELSYNC_DRIFT_TOLERANCE_SECS";
pub const LOG_FILTER_VAR: &str = "REELSYNC_LOG";

/// Searched in order, relative to the loader's base directory.
pub const DEFAULT_CONFIG_CANDIDATES: &[&str] = &[
    "reelsync.toml",
    "reelsync.json",
    "config/reelsync.toml",
    "config/reelsync.json",
];

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Hard-resync bound the engine is specified against. Looser tolerances
/// still work but let the dub drift audibly.
pub const DRIFT_TOLERANCE_WARN_SECS: f64 = 0.3;
