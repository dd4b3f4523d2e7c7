use crate::config::config_serializer::serialize_config;
use crate::overlay::OverlayOptions;
use crate::paths;
use log::{trace, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_RESIZE_DEBOUNCE_MS: f64 = 250.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine default config directory")]
    NoConfigDir,
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The path the config file was loaded from
    #[serde(skip)]
    #[schemars(skip)]
    pub config_path: Option<PathBuf>,

    /// Loading overlay options
    pub overlay: OverlayOptions,
    /// Quiet period in milliseconds before a burst of resize events is handled
    pub resize_debounce_ms: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            overlay: OverlayOptions::defaults(),
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Loads the config at `config_path`, or at the default location when `None`. A missing file
    /// is created with the defaults first.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => paths::default_config_path().ok_or(ConfigError::NoConfigDir)?,
        };

        if !path.exists() {
            Config::default().save_to_file(&path)?;
            trace!("Created default config file at: {}", path.display());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let mut config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.config_path = Some(path);

        Ok(config)
    }

    /// Parses YAML config. Missing fields take their defaults, and a non-finite debounce delay is
    /// replaced by the default one.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document is null in YAML, which should mean "all defaults".
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Config = serde_yaml::from_str(contents)?;
        if !config.resize_debounce_ms.is_finite() {
            warn!(
                "Invalid resize_debounce_ms {}, using {}",
                config.resize_debounce_ms, DEFAULT_RESIZE_DEBOUNCE_MS
            );
            config.resize_debounce_ms = DEFAULT_RESIZE_DEBOUNCE_MS;
        }
        Ok(config)
    }

    /// Save the config to a file, with every field documented
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        paths::ensure_parent_dir(path).map_err(io_error)?;

        let contents = serialize_config(self)?;
        fs::write(path, contents).map_err(io_error)?;
        Ok(())
    }
}
