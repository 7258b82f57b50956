//! Configuration loading for reelsync.
//!
//! Resolves a [`PlayerConfig`] from an optional `.env` file, a TOML or JSON
//! config file, inline JSON and individual environment overrides, then runs
//! the guard rails in [`validation`]. The engine itself only ever sees the
//! resolved [`reelsync_core::EngineSettings`] and
//! [`reelsync_model::AccessPolicy`].
#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{
    AccessConfig, ConfigSource, FallbackConfig, LoggingConfig, NoticeConfig, PlayerConfig,
    SyncConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
