//! Server configuration.
//!
//! Values are resolved in this order, later sources overriding earlier ones:
//! built-in defaults, a YAML file, environment variables (a `.env` file is
//! loaded by the binary), then command-line flags.
//!
//! # Example YAML
//! ```yaml
//! host: "127.0.0.1"
//! port: 5050
//! model_dir: "models/kokoro"
//! preload_on_startup: true
//! cors_allowed_origins: "*"
//! max_body_bytes: 67108864
//! segmenter:
//!   min_paragraph_chars: 10
//!   sentence_fallback_chars: 500
//!   target_chunk_chars: 300
//! kokoro:            # only with the `kokoro` feature
//!   num_threads: 4
//!   speed: 1.0
//!   voice_aliases:
//!     alba: "bf_alice"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::text::SegmenterConfig;

#[cfg(feature = "kokoro")]
use crate::engines::kokoro::KokoroModelParams;

/// Whole books pasted into `/paragraphs` fit comfortably.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub const ENV_HOST: &str = "POCKET_READER_HOST";
pub const ENV_PORT: &str = "POCKET_READER_PORT";
pub const ENV_MODEL_DIR: &str = "POCKET_READER_MODEL_DIR";
pub const ENV_PRELOAD: &str = "POCKET_READER_PRELOAD";
pub const ENV_CORS_ORIGINS: &str = "POCKET_READER_CORS_ORIGINS";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Everything needed to run the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the TTS model files.
    pub model_dir: PathBuf,
    /// Load the model and the default voice before accepting requests.
    pub preload_on_startup: bool,
    /// `"*"` or a comma-separated list of allowed origins.
    pub cors_allowed_origins: String,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    pub segmenter: SegmenterConfig,
    #[cfg(feature = "kokoro")]
    pub kokoro: KokoroModelParams,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5050,
            model_dir: PathBuf::from("models/kokoro"),
            preload_on_startup: true,
            cors_allowed_origins: "*".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            segmenter: SegmenterConfig::default(),
            #[cfg(feature = "kokoro")]
            kokoro: KokoroModelParams::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_with(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load a YAML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_with(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(preload) = lookup(ENV_PRELOAD) {
            self.preload_on_startup = parse_bool(&preload).ok_or(ConfigError::InvalidEnv {
                name: ENV_PRELOAD,
                value: preload.clone(),
            })?;
        }
        if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
            self.cors_allowed_origins = origins;
        }
        Ok(())
    }

    /// Socket address string, e.g. `0.0.0.0:5050`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
