//! Remote API wire types
//!
//! Field names follow the API's camelCase JSON. Numeric fields the API is
//! known to send as either strings or numbers are kept as `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the login call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub message: String,
    pub wallet_address: String,
    pub signature: String,
    pub referral_code: String,
}

/// Body of the refresh call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens returned by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Point balance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Balance {
    pub referral_earning_point: Value,
    pub total_earning_point: Value,
    pub today_earning_point: Value,
}

/// User profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub referral_code: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Entry of the daily task list; `status == 0` means not completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub reward: Value,
}

/// Entry of the one-time task list; `status == 1` means completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: Value,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub reward: Value,
}

impl Task {
    /// Task id rendered for URLs and skip-list matching.
    #[must_use]
    pub fn id_label(&self) -> String {
        match &self.task_id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }
}

/// Acknowledgement returned by checkin and task completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusAck {
    pub status_code: Option<i64>,
}

/// Egress IP reported by the proxy probe endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressIp {
    pub ip: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn login_request_uses_wire_names() {
        let body = serde_json::to_value(LoginRequest {
            message: "m".into(),
            wallet_address: "addr".into(),
            signature: "sig".into(),
            referral_code: "ref".into(),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"message": "m", "walletAddress": "addr", "signature": "sig", "referralCode": "ref"})
        );
    }

    #[test]
    fn task_id_label_handles_numbers_and_strings() {
        let numeric: Task = serde_json::from_value(json!({"taskId": 7, "title": "x"})).unwrap();
        let textual: Task = serde_json::from_value(json!({"taskId": "abc"})).unwrap();

        assert_eq!(numeric.id_label(), "7");
        assert_eq!(textual.id_label(), "abc");
        assert_eq!(numeric.status, 0);
    }

    #[test]
    fn refresh_response_may_omit_refresh_token() {
        let pair: TokenPair = serde_json::from_value(json!({"accessToken": "a"})).unwrap();
        assert_eq!(pair.refresh_token, None);
    }
}
