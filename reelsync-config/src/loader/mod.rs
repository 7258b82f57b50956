pub mod error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::constants::{
    CONFIG_JSON_VAR, CONFIG_PATH_VAR, DEFAULT_CONFIG_CANDIDATES, DRIFT_TOLERANCE_VAR,
    FREE_LIMIT_VAR, LOG_FILTER_VAR,
};
use crate::models::{ConfigSource, PlayerConfig};
use crate::util::parse_f64;
use crate::validation::{self, ConfigWarnings};

use error::ConfigLoadError;

#[derive(Debug, Clone)]
pub struct ConfigLoaderOptions {
    /// Config file that must exist; bypasses env and default lookups
    pub config_path: Option<PathBuf>,
    /// `.env` file to read instead of `<base_dir>/.env`
    pub env_file: Option<PathBuf>,
    pub read_env_file: bool,
    /// Directory that relative paths and default candidates resolve against
    pub base_dir: PathBuf,
    /// Replaces the process environment when set
    pub vars: Option<HashMap<String, String>>,
}

impl Default for ConfigLoaderOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_file: None,
            read_env_file: true,
            base_dir: PathBuf::from("."),
            vars: None,
        }
    }
}

/// Resolves [`PlayerConfig`]. Evaluation order:
/// 1) an explicit path from [`ConfigLoader::with_config_path`],
/// 2) `$REELSYNC_CONFIG_PATH` (TOML or JSON file),
/// 3) `$REELSYNC_CONFIG_JSON` (inline JSON),
/// 4) the first existing default candidate (`reelsync.toml`,
///    `config/reelsync.toml`, ...),
/// 5) defaults.
///
/// Individual overrides (`REELSYNC_FREE_LIMIT_SECS`,
/// `REELSYNC_DRIFT_TOLERANCE_SECS`, `REELSYNC_LOG`) are applied on top of
/// whichever source won, then the guard rails run. Values from `.env` only
/// fill in keys missing from the environment.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: PlayerConfig,
    pub source: ConfigSource,
    pub warnings: ConfigWarnings,
    pub env_file_loaded: bool,
    /// Environment keys that overrode file values
    pub overrides: Vec<&'static str>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self.options.read_env_file = true;
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.read_env_file = false;
        self
    }

    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.options.base_dir = dir.into();
        self
    }

    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (dotenv, env_file_loaded) = self.read_env_file()?;
        let env = EnvLookup {
            vars: self.options.vars.as_ref(),
            dotenv,
        };

        let (mut config, source) = self.load_base(&env)?;
        let overrides = apply_env_overrides(&mut config, &env)?;

        let mut warnings = ConfigWarnings::default();
        if source == ConfigSource::Default {
            warnings.push_with_hint(
                "No reelsync.toml detected; using built-in defaults",
                "Set REELSYNC_CONFIG_PATH or create config/reelsync.toml",
            );
        }
        warnings.extend(validation::apply_guard_rails(&config)?);

        info!(
            source = %source,
            env_file_loaded,
            overrides = overrides.len(),
            warnings = warnings.len(),
            "player configuration loaded"
        );

        Ok(ConfigLoad {
            config,
            source,
            warnings,
            env_file_loaded,
            overrides,
        })
    }

    /// Read and parse a single config file. JSON and TOML are picked by
    /// extension; anything else is tried as TOML, then JSON.
    pub fn load_file(path: &Path) -> Result<PlayerConfig, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents, &origin),
            Some("toml") | Some("tml") => toml::from_str(&contents)
                .map_err(|source| ConfigLoadError::ParseToml { origin, source }),
            _ => Self::parse_from_str(&contents, &origin),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> Result<PlayerConfig, ConfigLoadError> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| ConfigLoadError::UnknownFormat {
                origin: origin.to_string(),
                toml_error: toml_err.to_string(),
                json_error: json_err.to_string(),
            })
        })
    }

    pub fn parse_json(raw: &str, origin: &str) -> Result<PlayerConfig, ConfigLoadError> {
        serde_json::from_str(raw).map_err(|source| ConfigLoadError::ParseJson {
            origin: origin.to_string(),
            source,
        })
    }

    fn load_base(&self, env: &EnvLookup<'_>) -> Result<(PlayerConfig, ConfigSource), ConfigLoadError> {
        if let Some(path) = &self.options.config_path {
            let resolved = self.resolve(path);
            let config = Self::load_file(&resolved)?;
            return Ok((config, ConfigSource::Explicit(resolved)));
        }

        if let Some(raw) = env.get(CONFIG_PATH_VAR) {
            let resolved = self.resolve(Path::new(&raw));
            let config = Self::load_file(&resolved)?;
            return Ok((config, ConfigSource::EnvPath(resolved)));
        }

        if let Some(raw) = env.get(CONFIG_JSON_VAR) {
            let config = Self::parse_json(&raw, CONFIG_JSON_VAR)?;
            return Ok((config, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let config = Self::load_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((PlayerConfig::default(), ConfigSource::Default))
    }

    fn read_env_file(&self) -> Result<(HashMap<String, String>, bool), ConfigLoadError> {
        if !self.options.read_env_file {
            return Ok((HashMap::new(), false));
        }
        let path = match &self.options.env_file {
            Some(path) => self.resolve(path),
            None => self.options.base_dir.join(".env"),
        };

        let entries = match dotenvy::from_path_iter(&path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(_)) => {
                debug!(path = %path.display(), "no .env file");
                return Ok((HashMap::new(), false));
            }
            Err(err) => return Err(err.into()),
        };

        let mut values = HashMap::new();
        for entry in entries {
            let (key, value) = entry?;
            values.insert(key, value);
        }
        debug!(path = %path.display(), keys = values.len(), ".env file read");
        Ok((values, true))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_CONFIG_CANDIDATES
            .iter()
            .map(|candidate| self.options.base_dir.join(candidate))
            .find(|path| path.exists())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.options.base_dir.join(path)
        }
    }
}

struct EnvLookup<'a> {
    vars: Option<&'a HashMap<String, String>>,
    dotenv: HashMap<String, String>,
}

impl EnvLookup<'_> {
    /// Non-blank value for `name`; the real (or injected) environment wins
    /// over `.env`.
    fn get(&self, name: &str) -> Option<String> {
        let primary = match self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        primary
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                self.dotenv
                    .get(name)
                    .filter(|value| !value.trim().is_empty())
                    .cloned()
            })
    }

    fn get_f64(&self, name: &'static str) -> Result<Option<f64>, ConfigLoadError> {
        let Some(raw) = self.get(name) else {
            return Ok(None);
        };
        match parse_f64(&raw) {
            None => Ok(None),
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(source)) => Err(ConfigLoadError::InvalidEnvValue {
                name,
                value: raw,
                source,
            }),
        }
    }
}

fn apply_env_overrides(
    config: &mut PlayerConfig,
    env: &EnvLookup<'_>,
) -> Result<Vec<&'static str>, ConfigLoadError> {
    let mut applied = Vec::new();

    if let Some(limit) = env.get_f64(FREE_LIMIT_VAR)? {
        config.access.free_limit_secs = limit;
        applied.push(FREE_LIMIT_VAR);
    }

    if let Some(tolerance) = env.get_f64(DRIFT_TOLERANCE_VAR)? {
        config.sync.drift_tolerance_secs = tolerance;
        applied.push(DRIFT_TOLERANCE_VAR);
    }

    if let Some(filter) = env.get(LOG_FILTER_VAR) {
        config.logging.filter = filter.trim().to_string();
        applied.push(LOG_FILTER_VAR);
    }

    Ok(applied)
}
