//! Configuration structures
//!
//! Every section has serde defaults so a config file only needs to name what
//! it overrides. `api.base_url` is the one value without a usable default.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RETRY_BUDGET;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub runner: RunnerConfig,
    pub files: FilesConfig,
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/api`
    pub base_url: String,
    pub referral_code: String,
    /// Endpoint returning `{"ip": "..."}`, used to verify proxies
    pub proxy_probe_url: String,
    pub timeout_secs: u64,
    /// `Origin` header sent on every request
    pub origin: String,
    /// `Origin` header for heartbeat and balance calls
    pub extension_origin: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            referral_code: String::new(),
            proxy_probe_url: "https://api.ipify.org?format=json".to_string(),
            timeout_secs: 120,
            origin: "https://dashboard.flow3.tech".to_string(),
            extension_origin: "chrome-extension://lhmminnoafalclkgcbokfcngkocoffcp".to_string(),
        }
    }
}

/// Session runner behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub use_proxy: bool,
    /// Accounts per wave when running through proxies
    pub max_concurrency: usize,
    /// Accounts per wave on a direct connection
    pub max_concurrency_no_proxy: usize,
    pub retry_budget: u32,
    /// Random delay range `[min, max]` (seconds) after a proxy is verified
    pub start_delay_secs: [u64; 2],
    pub auto_task: bool,
    pub auto_mining: bool,
    /// Task ids never attempted
    pub skip_tasks: Vec<String>,
}

impl RunnerConfig {
    /// Wave size for the configured connection mode, never zero.
    #[must_use]
    pub fn wave_size(&self) -> usize {
        let size = if self.use_proxy { self.max_concurrency } else { self.max_concurrency_no_proxy };
        size.max(1)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            use_proxy: false,
            max_concurrency: 10,
            max_concurrency_no_proxy: 10,
            retry_budget: DEFAULT_RETRY_BUDGET,
            start_delay_secs: [1, 5],
            auto_task: true,
            auto_mining: true,
            skip_tasks: Vec::new(),
        }
    }
}

/// Input and state file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub private_keys: String,
    pub proxies: String,
    pub session_store: String,
    pub fingerprint_store: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            private_keys: "privateKeys.txt".to_string(),
            proxies: "proxy.txt".to_string(),
            session_store: "localStorage.json".to_string(),
            fingerprint_store: "session_user_agents.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_size_follows_connection_mode() {
        let mut runner =
            RunnerConfig { max_concurrency: 4, max_concurrency_no_proxy: 2, ..Default::default() };
        assert_eq!(runner.wave_size(), 2);

        runner.use_proxy = true;
        assert_eq!(runner.wave_size(), 4);

        runner.max_concurrency = 0;
        assert_eq!(runner.wave_size(), 1);
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api": {"base_url": "http://localhost"}}"#).unwrap();

        assert_eq!(config.api.base_url, "http://localhost");
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.runner.retry_budget, DEFAULT_RETRY_BUDGET);
        assert_eq!(config.files.session_store, "localStorage.json");
    }
}
