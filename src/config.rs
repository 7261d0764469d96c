//! Configuration module for the retrieval core.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCSIM_` and use double
//! underscores to separate nested levels:
//! - `DOCSIM_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`
//! - `DOCSIM_INDEX__NORMALIZATION=auto` sets `index.normalization`
//! - `DOCSIM_SEARCH__DEFAULT_TOP_K=10` sets `search.default_top_k`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vector::{DEFAULT_BATCH_SIZE, DEFAULT_NORM_TOLERANCE, NormalizationMode};

/// Directory searched for in the current directory and its ancestors.
pub const CONFIG_DIR: &str = ".docsim";

const ENV_PREFIX: &str = "DOCSIM_";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded model files are cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Texts per encoder forward pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show a progress bar while the model downloads
    #[serde(default)]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexConfig {
    /// "strict" rejects non-unit vectors, "auto" normalizes them
    #[serde(default)]
    pub normalization: NormalizationMode,

    /// Allowed deviation from unit norm in strict mode
    #[serde(default = "default_norm_tolerance")]
    pub norm_tolerance: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Number of results when the caller does not ask for a count
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Minimum similarity for a result to be returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Maximum level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_norm_tolerance() -> f32 {
    DEFAULT_NORM_TOLERANCE
}
fn default_top_k() -> usize {
    5
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            batch_size: default_batch_size(),
            show_download_progress: false,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationMode::default(),
            norm_tolerance: default_norm_tolerance(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            threshold: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Default cache directory for downloaded embedding models.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("docsim").join("models"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a `.docsim` directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
