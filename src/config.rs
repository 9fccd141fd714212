//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.stagedoor/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StagedoorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_BASE_URL: &str = "https://api.stagedoor.app/v1";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub search_debounce: Duration,
    /// Override for where favorites/session files live. `None` means the
    /// default `~/.stagedoor/`.
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.stagedoor/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".stagedoor").join("config.toml"))
}

/// Load config from `~/.stagedoor/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `StagedoorConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<StagedoorConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(StagedoorConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(StagedoorConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: StagedoorConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Stagedoor Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults, then this file, then env vars, then CLI flags.

# [api]
# base_url = "https://api.stagedoor.app/v1"
# api_key = "sd-..."                 # Or set STAGEDOOR_API_KEY env var

# [search]
# debounce_ms = 300                  # Pause before a typed query hits the network

# [storage]
# data_dir = "/path/to/data"         # Where favorites/session files live
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` is from the CLI flag (None = not specified).
pub fn resolve(config: &StagedoorConfig, cli_base_url: Option<&str>) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let api_base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("STAGEDOOR_API_BASE_URL").ok())
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    // API key: env → config
    let api_key = std::env::var("STAGEDOOR_API_KEY")
        .ok()
        .or_else(|| config.api.api_key.clone());

    let search_debounce = Duration::from_millis(
        config
            .search
            .debounce_ms
            .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS),
    );

    ResolvedConfig {
        api_base_url,
        api_key,
        search_debounce,
        data_dir: config.storage.data_dir.clone().map(PathBuf::from),
    }
}
