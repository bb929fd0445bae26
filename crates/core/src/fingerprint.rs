//! Stable per-account browser fingerprint
//!
//! Each address gets one user agent, picked at random the first time it is
//! seen and cached in the fingerprint store for every later run.

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::ports::KeyValueStore;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.6533.103 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.6478.122 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/127.0.6533.107 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/126.0.6478.153 Mobile/15E148 Safari/604.1",
];

/// Headers that identify one account's client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint {
    user_agent: String,
    platform: &'static str,
    origin: String,
}

impl ClientFingerprint {
    pub fn new(user_agent: impl Into<String>, origin: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let platform = platform_of(&user_agent);
        Self { user_agent, platform, origin: origin.into() }
    }

    /// Load the cached user agent for `address`, choosing and caching a new
    /// one on first sight. Store failures only cost stability across runs.
    pub async fn resolve(store: &dyn KeyValueStore, address: &str, origin: &str) -> Self {
        if let Some(user_agent) = store.get(address).await.filter(|ua| !ua.trim().is_empty()) {
            return Self::new(user_agent, origin);
        }

        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string();
        debug!(account = %address, "Created user agent");
        if let Err(e) = store.put(address, &user_agent).await {
            warn!(account = %address, error = %e, "Failed to cache user agent");
        }
        Self::new(user_agent, origin)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn platform(&self) -> &'static str {
        self.platform
    }

    /// Base headers sent with every request of the account.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "*/*".to_string()),
            ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
            ("Sec-Fetch-Dest".to_string(), "empty".to_string()),
            ("Sec-Fetch-Mode".to_string(), "cors".to_string()),
            ("Sec-Fetch-Site".to_string(), "none".to_string()),
            ("Origin".to_string(), self.origin.clone()),
            ("User-Agent".to_string(), self.user_agent.clone()),
            (
                "sec-ch-ua".to_string(),
                format!(
                    "\"Not)A;Brand\";v=\"99\", \"{} WebView\";v=\"127\", \"Chromium\";v=\"127\"",
                    self.platform
                ),
            ),
            ("sec-ch-ua-platform".to_string(), self.platform.to_string()),
        ]
    }
}

fn platform_of(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("iphone") || ua.contains("ipad") {
        "ios"
    } else if ua.contains("android") {
        "android"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detection() {
        assert_eq!(platform_of(USER_AGENTS[3]), "android");
        assert_eq!(platform_of(USER_AGENTS[5]), "ios");
        assert_eq!(platform_of(USER_AGENTS[6]), "ios");
        assert_eq!(platform_of(USER_AGENTS[0]), "Unknown");
    }

    #[test]
    fn headers_carry_user_agent_and_platform() {
        let fp = ClientFingerprint::new(USER_AGENTS[3], "https://dash.test");
        let headers = fp.headers();

        let get = |name: &str| {
            headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()).unwrap_or_default()
        };
        assert_eq!(get("User-Agent"), USER_AGENTS[3]);
        assert_eq!(get("sec-ch-ua-platform"), "android");
        assert_eq!(get("Origin"), "https://dash.test");
        assert!(get("sec-ch-ua").contains("android WebView"));
    }
}
