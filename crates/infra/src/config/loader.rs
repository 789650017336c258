//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `OSH_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `OSH_URL`: API base URL (required for environment loading)
//! - `OSH_TOKEN`: API token
//! - `OSH_REQUEST_TIMEOUT`: Per-request timeout in seconds
//! - `OSH_THROTTLE_BUDGET`: Seconds an operation may wait out HTTP 429s
//! - `OSH_PUBLIC`: Upload flag `public` (true/false)
//! - `OSH_TEXT_ONLY_FALLBACK`: Upload flag `textonlyfallback` (true/false)
//! - `OSH_CREDENTIALS_FILE`: YAML credentials file path or URL
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./oshub.json` or `./oshub.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../oshub.json` or `../oshub.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use oshub_domain::constants::{ENV_TOKEN_KEY, ENV_URL_KEY};
use oshub_domain::{ClientConfig, Credentials, OshError, Result};

const ENV_REQUEST_TIMEOUT: &str = "OSH_REQUEST_TIMEOUT";
const ENV_THROTTLE_BUDGET: &str = "OSH_THROTTLE_BUDGET";
const ENV_PUBLIC: &str = "OSH_PUBLIC";
const ENV_TEXT_ONLY_FALLBACK: &str = "OSH_TEXT_ONLY_FALLBACK";
const ENV_CREDENTIALS_FILE: &str = "OSH_CREDENTIALS_FILE";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If `OSH_URL` is
/// missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `OshError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `OSH_URL` is required; every other setting keeps its default when
/// its variable is unset.
///
/// # Errors
/// Returns `OshError::Config` if `OSH_URL` is missing or a numeric variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let url = env_var(ENV_URL_KEY)?;
    let token = std::env::var(ENV_TOKEN_KEY).unwrap_or_default();

    let mut config = ClientConfig { credentials: Credentials::new(url, token), ..ClientConfig::default() };

    if let Ok(value) = std::env::var(ENV_REQUEST_TIMEOUT) {
        config.request_timeout_secs = value
            .trim()
            .parse::<u64>()
            .map_err(|e| OshError::Config(format!("Invalid request timeout: {}", e)))?;
    }
    if let Ok(value) = std::env::var(ENV_THROTTLE_BUDGET) {
        let budget = value
            .trim()
            .parse::<f64>()
            .map_err(|e| OshError::Config(format!("Invalid throttle budget: {}", e)))?;
        config.throttle_budget_secs = check_throttle_budget(budget)?;
    }
    config.public = env_bool(ENV_PUBLIC, config.public);
    config.text_only_fallback = env_bool(ENV_TEXT_ONLY_FALLBACK, config.text_only_fallback);
    config.credentials_source = std::env::var(ENV_CREDENTIALS_FILE).ok().filter(|s| !s.trim().is_empty());

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension). Missing
/// settings keep their defaults.
///
/// # Errors
/// Returns `OshError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OshError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            OshError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OshError::Config(format!("Failed to read config file: {}", e)))?;

    let mut config = parse_config(&contents, &config_path)?;
    config.credentials = Credentials::new(config.credentials.base_url, config.credentials.token);
    check_throttle_budget(config.throttle_budget_secs)?;
    Ok(config)
}

fn check_throttle_budget(budget: f64) -> Result<f64> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(OshError::Config(format!("Invalid throttle budget: {}", budget)));
    }
    Ok(budget)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => {
            toml::from_str(contents).map_err(|e| OshError::Config(format!("Invalid TOML format: {}", e)))
        }
        "json" => serde_json::from_str(contents)
            .map_err(|e| OshError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(OshError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
        candidates.push(cwd.join("../oshub.json"));
        candidates.push(cwd.join("../oshub.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    ["oshub.json", "oshub.toml", "config.json", "config.toml"]
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| OshError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
