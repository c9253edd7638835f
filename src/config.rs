//! Configuration module for the question generator.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.qgen/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `QG_` and use double underscores
//! to separate nested levels:
//! - `QG_INDEX__DEFAULT_K=10` sets `index.default_k`
//! - `QG_GENERATOR__MAX_ROUNDS=5` sets `generator.max_rounds`
//! - `QG_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".qgen";

/// File name of the settings file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "QG_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Workspace root directory (where .qgen is located). Relative paths in
    /// this file are resolved against it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// CSV imported by `qgen import` when no path is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_csv: Option<PathBuf>,

    /// Global debug mode
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Directory of the question database
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// Path of the similarity index artifact
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    /// Texts embedded per model call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Results returned by `qgen query` when `-k` is not given
    #[serde(default = "default_k")]
    pub default_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded model files are kept
    #[serde(default = "default_model_cache")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Chat model used for all three pipeline stages
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Generate/validate attempts before giving up
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// HTTP timeout per model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".qgen/store")
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".qgen/questions.qvec")
}
fn default_batch_size() -> usize {
    crate::index::DEFAULT_BATCH_SIZE
}
fn default_k() -> usize {
    5
}
fn default_embedding_model() -> String {
    crate::embedding::DEFAULT_MODEL.to_string()
}
fn default_model_cache() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("qgen").join("models"))
        .unwrap_or_else(|| PathBuf::from(".qgen/models"))
}
fn default_true() -> bool {
    true
}
fn default_chat_model() -> String {
    "gpt-4".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_rounds() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_root: None,
            source_csv: None,
            debug: false,
            store: StoreConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            batch_size: default_batch_size(),
            default_k: default_k(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: default_model_cache(),
            show_download_progress: true,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_rounds: default_max_rounds(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Self::figment(path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // A settings file inside .qgen/ belongs to the directory above it.
                if settings.workspace_root.is_none() {
                    settings.workspace_root = path
                        .parent()
                        .filter(|dir| dir.ends_with(CONFIG_DIR))
                        .and_then(Path::parent)
                        .map(Path::to_path_buf);
                }
                settings
            })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for a .qgen directory,
    /// searching from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .qgen is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        find_root_from(&current)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index.path)
    }

    pub fn model_cache_dir(&self) -> PathBuf {
        self.resolve(&self.embedding.cache_dir)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Create a default settings file with helpful comments under `root`
    pub fn init_config_file(root: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let defaults = Settings::default();
        let template = format!(
            r#"# qgen Configuration File

# Global debug mode (RUST_LOG takes precedence)
debug = false

# CSV imported by `qgen import` when no path is given
# source_csv = "data/questions.csv"

[store]
# Question database directory (relative to the workspace root)
path = "{store}"

[index]
# Similarity index artifact
path = "{index}"
# Texts embedded per model call
batch_size = {batch_size}
# Results returned by `qgen query` without -k
default_k = {default_k}

[embedding]
# Available: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15,
# MultilingualE5Small, ParaphraseMLMiniLML12V2
# Changing the model requires `qgen build` to recreate the index
model = "{model}"
# cache_dir = "{cache}"
show_download_progress = true

[generator]
model = "{chat_model}"
base_url = "{base_url}"
# Environment variable holding the API key
api_key_env = "{api_key_env}"
temperature = {temperature}
# Generate/validate attempts before giving up
max_rounds = {max_rounds}
timeout_secs = {timeout_secs}
"#,
            store = defaults.store.path.display(),
            index = defaults.index.path.display(),
            batch_size = defaults.index.batch_size,
            default_k = defaults.index.default_k,
            model = defaults.embedding.model,
            cache = defaults.embedding.cache_dir.display(),
            chat_model = defaults.generator.model,
            base_url = defaults.generator.base_url,
            api_key_env = defaults.generator.api_key_env,
            temperature = defaults.generator.temperature,
            max_rounds = defaults.generator.max_rounds,
            timeout_secs = defaults.generator.timeout_secs,
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}
