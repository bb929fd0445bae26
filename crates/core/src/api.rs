//! Request builders for the remote rewards API

use rewardpilot_domain::{ApiConfig, LoginRequest, RefreshRequest, RequestAuth, RequestSpec};
use serde_json::json;

/// Endpoint catalogue rooted at the configured base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    referral_code: String,
    extension_origin: String,
}

impl Endpoints {
    /// Build the catalogue; a trailing slash on the base URL is dropped.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referral_code: config.referral_code.clone(),
            extension_origin: config.extension_origin.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Referral code sent with every login.
    #[must_use]
    pub fn referral_code(&self) -> &str {
        &self.referral_code
    }

    /// Unauthenticated wallet login with a signed message.
    #[must_use]
    pub fn login(&self, request: &LoginRequest) -> RequestSpec {
        RequestSpec::post("login", self.url("/v1/user/login"), Some(json!(request)))
            .with_auth(RequestAuth::None)
    }

    /// Refresh is authenticated with the refresh token itself.
    #[must_use]
    pub fn refresh(&self, refresh_token: &str) -> RequestSpec {
        let body = RefreshRequest { refresh_token: refresh_token.to_string() };
        RequestSpec::post("refresh", self.url("/v1/user/refresh"), Some(json!(body)))
            .with_auth(RequestAuth::Bearer(refresh_token.to_string()))
    }

    /// Liveness ping sent with the extension origin.
    #[must_use]
    pub fn heartbeat(&self) -> RequestSpec {
        RequestSpec::post("heartbeat", self.url("/v1/bandwidth"), None)
            .with_header("Origin", self.extension_origin.clone())
    }

    /// Point balance, queried with the extension origin.
    #[must_use]
    pub fn balance(&self) -> RequestSpec {
        RequestSpec::get("balance", self.url("/v1/point/info"))
            .with_header("Origin", self.extension_origin.clone())
    }

    /// Account profile, including the own referral code.
    #[must_use]
    pub fn profile(&self) -> RequestSpec {
        RequestSpec::get("profile", self.url("/v1/user/profile"))
    }

    /// Referral counters for the account.
    #[must_use]
    pub fn referral_stats(&self) -> RequestSpec {
        RequestSpec::get("referral_stats", self.url("/v1/ref/stats"))
    }

    /// Daily checkin calendar.
    #[must_use]
    pub fn daily_tasks(&self) -> RequestSpec {
        RequestSpec::get("daily_tasks", self.url("/v1/tasks/daily"))
    }

    /// Claim today's checkin reward.
    #[must_use]
    pub fn checkin(&self) -> RequestSpec {
        RequestSpec::post("checkin", self.url("/v1/tasks/complete-daily"), None)
    }

    /// One-time task list.
    #[must_use]
    pub fn tasks(&self) -> RequestSpec {
        RequestSpec::get("tasks", self.url("/v1/tasks/"))
    }

    /// Mark a one-time task as completed.
    #[must_use]
    pub fn complete_task(&self, task_id: &str) -> RequestSpec {
        RequestSpec::post("complete_task", self.url(&format!("/v1/tasks/{task_id}/complete")), None)
    }
}

#[cfg(test)]
mod tests {
    use rewardpilot_domain::HttpMethod;

    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(&ApiConfig {
            base_url: "https://api.test/api/".to_string(),
            referral_code: "REF".to_string(),
            ..ApiConfig::default()
        })
    }

    #[test]
    fn urls_are_rooted_at_base() {
        let api = endpoints();
        assert_eq!(api.balance().url, "https://api.test/api/v1/point/info");
        assert_eq!(api.complete_task("42").url, "https://api.test/api/v1/tasks/42/complete");
        assert_eq!(api.complete_task("42").method, HttpMethod::Post);
        assert_eq!(api.referral_stats().url, "https://api.test/api/v1/ref/stats");
        assert_eq!(api.referral_stats().method, HttpMethod::Get);
    }

    #[test]
    fn task_endpoints() {
        let api = endpoints();
        assert_eq!(api.referral_code(), "REF");
        assert_eq!(api.daily_tasks().url, "https://api.test/api/v1/tasks/daily");
        assert_eq!(api.checkin().url, "https://api.test/api/v1/tasks/complete-daily");
        assert_eq!(api.checkin().method, HttpMethod::Post);
        assert_eq!(api.tasks().url, "https://api.test/api/v1/tasks/");
        assert_eq!(api.tasks().method, HttpMethod::Get);
    }

    #[test]
    fn auth_modes_per_endpoint() {
        let api = endpoints();
        let login = api.login(&LoginRequest {
            message: "m".into(),
            wallet_address: "a".into(),
            signature: "s".into(),
            referral_code: api.referral_code().to_string(),
        });

        assert_eq!(login.auth, RequestAuth::None);
        assert_eq!(api.refresh("rt").auth, RequestAuth::Bearer("rt".to_string()));
        assert_eq!(api.profile().auth, RequestAuth::Session);
        assert_eq!(api.refresh("rt").body, Some(json!({"refreshToken": "rt"})));
    }

    #[test]
    fn extension_calls_carry_extension_origin() {
        let api = endpoints();
        let origin = ApiConfig::default().extension_origin;
        assert_eq!(api.heartbeat().header("origin"), Some(origin.as_str()));
        assert_eq!(api.balance().header("origin"), Some(origin.as_str()));
        assert_eq!(api.profile().header("origin"), None);
    }
}
