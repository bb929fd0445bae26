//! Per-account session state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CHECKIN_WINDOW_HOURS;

/// Authenticated state for one account.
///
/// Exactly one live record exists per account; it is owned by that account's
/// session manager and persisted as a JSON snapshot keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_checkin: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Parse a persisted snapshot. Corrupt snapshots count as no prior state.
    #[must_use]
    pub fn from_snapshot(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Serialize for persistence.
    #[must_use]
    pub fn to_snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// A checkin is due when none was recorded or the last one is more than
    /// 24 hours old.
    #[must_use]
    pub fn checkin_due(&self, now: DateTime<Utc>) -> bool {
        match self.latest_checkin {
            Some(last) => now - last > Duration::hours(CHECKIN_WINDOW_HOURS),
            None => true,
        }
    }
}
