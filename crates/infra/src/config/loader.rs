//! Configuration loader
//!
//! Loads deployment configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SEGLENS_GD_BASE_URL`: Base URL of the reporting API
//! - `SEGLENS_GD_USERNAME`: Login for credential-based authentication
//! - `SEGLENS_GD_PASSWORD`: Password for credential-based authentication
//! - `SEGLENS_GD_WORKSPACE_ID`: Workspace (project) identifier
//! - `SEGLENS_GD_REPORT_ID`: Object id of the fixed report definition
//! - `SEGLENS_GD_DISPLAY_FORM`: Object id of the external-ID display form
//! - `SEGLENS_POLL_MAX_ATTEMPTS`: Result poll attempt ceiling (optional)
//! - `SEGLENS_POLL_INTERVAL_MS`: Delay between poll attempts (optional)
//! - `SEGLENS_TOKEN_SAFETY_MARGIN_MS`: Early-expiry margin for cached
//!   tokens (optional)

use std::path::{Path, PathBuf};

use seglens_domain::{Config, GoodDataConfig, LookupConfig, Result, SegLensError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables (a `.env` file is
/// honored if present). If any required variables are missing, falls back
/// to loading from a config file.
///
/// # Errors
/// Returns `SegLensError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

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
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `SegLensError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let gooddata = GoodDataConfig {
        base_url: env_var("SEGLENS_GD_BASE_URL")?,
        username: env_var("SEGLENS_GD_USERNAME")?,
        password: env_var("SEGLENS_GD_PASSWORD")?,
        workspace_id: env_var("SEGLENS_GD_WORKSPACE_ID")?,
        report_id: env_var("SEGLENS_GD_REPORT_ID")?,
        external_id_display_form: env_var("SEGLENS_GD_DISPLAY_FORM")?,
    };

    let defaults = LookupConfig::default();
    let lookup = LookupConfig {
        poll_max_attempts: env_parse("SEGLENS_POLL_MAX_ATTEMPTS", defaults.poll_max_attempts)?,
        poll_interval_ms: env_parse("SEGLENS_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
        token_safety_margin_ms: env_parse(
            "SEGLENS_TOKEN_SAFETY_MARGIN_MS",
            defaults.token_safety_margin_ms,
        )?,
    };

    Ok(Config { gooddata, lookup })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SegLensError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SegLensError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SegLensError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SegLensError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SegLensError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SegLensError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SegLensError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parents (up to 2 levels)
/// and the executable's directory for `config.{json,toml}` and
/// `seglens.{json,toml}`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("seglens.json"),
            cwd.join("seglens.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("seglens.json"),
                exe_dir.join("seglens.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|candidate| candidate.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SegLensError::Config(format!("Missing required environment variable: {name}")))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| SegLensError::Config(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
