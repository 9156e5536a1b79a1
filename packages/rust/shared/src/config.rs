//! Application configuration for Vendorwatch.
//!
//! User config lives at `~/.vendorwatch/vendorwatch.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file; only the names of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VendorWatchError};
use crate::types::SynthesisDepth;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vendorwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vendorwatch";

/// Database file name inside the data directory.
const DB_FILE_NAME: &str = "vendorwatch.db";

// ---------------------------------------------------------------------------
// Config structs (matching vendorwatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings for the synthesis/delta model.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Video transcript source settings.
    #[serde(default)]
    pub transcripts: TranscriptsConfig,

    /// Report upload settings.
    #[serde(default)]
    pub upload: UploadConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Data directory holding the registry/report database.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Scrapbook directory with per-vendor note files and screenshots.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,

    /// How many recent videos to pull transcripts for per vendor.
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,

    /// Synthesis depth: standard (4 sections) or deep (8 sections).
    #[serde(default)]
    pub depth: SynthesisDepth,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            notes_dir: default_notes_dir(),
            max_videos: default_max_videos(),
            depth: SynthesisDepth::default(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.vendorwatch".into()
}
fn default_notes_dir() -> String {
    "~/vendorwatch-scrapbook".into()
}
fn default_max_videos() -> usize {
    5
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default model for synthesis and delta computation.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o".into()
}

/// `[transcripts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptsConfig {
    /// Name of the env var holding the YouTube Data API key.
    #[serde(default = "default_transcript_key_env")]
    pub api_key_env: String,
}

impl Default for TranscriptsConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_transcript_key_env(),
        }
    }
}

fn default_transcript_key_env() -> String {
    "YOUTUBE_API_KEY".into()
}

/// `[upload]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Base URL reports are PUT to. Unset disables upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the env var holding an optional bearer token.
    #[serde(default = "default_upload_token_env")]
    pub token_env: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_env: default_upload_token_env(),
        }
    }
}

fn default_upload_token_env() -> String {
    "VENDORWATCH_UPLOAD_TOKEN".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vendorwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VendorWatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vendorwatch/vendorwatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VendorWatchError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| VendorWatchError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VendorWatchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VendorWatchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VendorWatchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the OpenRouter API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(VendorWatchError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Path to the registry/report database derived from config.
pub fn db_path(config: &AppConfig) -> PathBuf {
    expand_home(&config.defaults.data_dir).join(DB_FILE_NAME)
}
