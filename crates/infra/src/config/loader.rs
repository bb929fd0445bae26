//! Configuration loader
//!
//! Loads configuration from a file and applies environment overrides.
//!
//! ## Loading Strategy
//! 1. Use the explicit path when one is given
//! 2. Otherwise probe the standard locations; defaults apply if none exists
//! 3. Apply `REWARDPILOT_*` environment overrides
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `REWARDPILOT_BASE_URL`: API base URL
//! - `REWARDPILOT_REF_CODE`: Referral code sent at login
//! - `REWARDPILOT_USE_PROXY`: Route accounts through proxies (true/false)
//! - `REWARDPILOT_MAX_CONCURRENCY`: Accounts per wave for the active mode
//! - `REWARDPILOT_AUTO_TASK`: Complete one-time tasks (true/false)
//! - `REWARDPILOT_AUTO_MINING`: Send heartbeats (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./rewardpilot.toml` or `./rewardpilot.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rewardpilot_domain::{Config, Result, RewardPilotError};
use url::Url;

const CONFIG_FILE_NAMES: &[&str] =
    &["rewardpilot.toml", "rewardpilot.json", "config.toml", "config.json"];

/// Load, override and validate the configuration.
///
/// # Errors
/// Returns `RewardPilotError::Config` if:
/// - The explicit file does not exist or cannot be parsed
/// - An environment override has an invalid value
/// - The resulting configuration is invalid (see [`validate`])
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(&path)?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(&found)?,
            None => {
                tracing::info!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RewardPilotError::Config` if the file does not exist, cannot be
/// read or its format is invalid.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(RewardPilotError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| RewardPilotError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RewardPilotError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RewardPilotError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(RewardPilotError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Apply `REWARDPILOT_*` environment overrides
///
/// `REWARDPILOT_MAX_CONCURRENCY` sets the wave size of whichever connection
/// mode is active after `REWARDPILOT_USE_PROXY` is applied.
///
/// # Errors
/// Returns `RewardPilotError::Config` if a numeric override does not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(base_url) = env_string("REWARDPILOT_BASE_URL") {
        config.api.base_url = base_url;
    }
    if let Some(code) = env_string("REWARDPILOT_REF_CODE") {
        config.api.referral_code = code;
    }

    config.runner.use_proxy = env_bool("REWARDPILOT_USE_PROXY", config.runner.use_proxy);
    config.runner.auto_task = env_bool("REWARDPILOT_AUTO_TASK", config.runner.auto_task);
    config.runner.auto_mining = env_bool("REWARDPILOT_AUTO_MINING", config.runner.auto_mining);

    if let Some(limit) = env_parse::<usize>("REWARDPILOT_MAX_CONCURRENCY")? {
        if config.runner.use_proxy {
            config.runner.max_concurrency = limit;
        } else {
            config.runner.max_concurrency_no_proxy = limit;
        }
    }
    Ok(())
}

/// Check the values every run depends on
///
/// # Errors
/// Returns `RewardPilotError::Config` if the base URL is missing or not an
/// absolute http(s) URL, or the start delay range is inverted.
pub fn validate(config: &Config) -> Result<()> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(RewardPilotError::Config(
            "api.base_url is required (or set REWARDPILOT_BASE_URL)".to_string(),
        ));
    }

    let parsed = Url::parse(base_url)
        .map_err(|e| RewardPilotError::Config(format!("Invalid api.base_url '{base_url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RewardPilotError::Config(format!(
            "api.base_url must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    let [min, max] = config.runner.start_delay_secs;
    if min > max {
        return Err(RewardPilotError::Config(format!(
            "runner.start_delay_secs must be [min, max], got [{min}, {max}]"
        )));
    }
    Ok(())
}

/// Non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `RewardPilotError::Config` if the variable is set but invalid.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| RewardPilotError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
