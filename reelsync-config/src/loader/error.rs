use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ConfigGuardRailError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {origin}")]
    ParseToml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse configuration {origin}")]
    ParseJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration {origin} is neither TOML ({toml_error}) nor JSON ({json_error})")]
    UnknownFormat {
        origin: String,
        toml_error: String,
        json_error: String,
    },
    #[error("invalid value '{value}' for {name}")]
    InvalidEnvValue {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
