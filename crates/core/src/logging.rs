//! Account-scoped operator log lines
//!
//! Severity is a closed set; `emit` is the only place that turns it into a
//! tracing event, so every account message carries the same prefix and
//! fields.

use rewardpilot_domain::constants::{LOG_MESSAGE_MAX_LENGTH, LOG_TRUNCATE_SUFFIX};
use rewardpilot_domain::impl_domain_label_conversions;
use tracing::{error, info, warn};

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    /// Periodic summaries (balances, checkpoints)
    Custom,
}

impl_domain_label_conversions!(LogLevel {
    Info => "info",
    Success => "success",
    Warning => "warning",
    Error => "error",
    Custom => "custom",
});

/// Identity printed in front of every message for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTag {
    pub ordinal: usize,
    pub address: String,
    /// `None` for direct connections, `Some(None)` while a proxy is unverified
    pub egress: Option<Option<String>>,
}

impl AccountTag {
    pub fn new(ordinal: usize, address: impl Into<String>, proxied: bool) -> Self {
        Self { ordinal, address: address.into(), egress: proxied.then_some(None) }
    }

    pub fn set_egress_ip(&mut self, ip: impl Into<String>) {
        self.egress = Some(Some(ip.into()));
    }

    #[must_use]
    pub fn prefix(&self) -> String {
        let ip = match &self.egress {
            None => "Local IP",
            Some(None) => "Unknown IP",
            Some(Some(ip)) => ip.as_str(),
        };
        format!("[Account {}][{}][{}]", self.ordinal, self.address, ip)
    }
}

/// Format and emit one account message.
pub fn emit(tag: &AccountTag, level: LogLevel, message: &str) {
    let line = format!("{} {}", tag.prefix(), message);
    match level {
        LogLevel::Info | LogLevel::Success | LogLevel::Custom => {
            info!(account = %tag.address, severity = %level, "{line}");
        }
        LogLevel::Warning => warn!(account = %tag.address, severity = %level, "{line}"),
        LogLevel::Error => error!(account = %tag.address, severity = %level, "{line}"),
    }
}

/// Shorten server messages so a verbose error body cannot flood the log.
#[must_use]
pub fn truncate(message: &str) -> String {
    if message.chars().count() <= LOG_MESSAGE_MAX_LENGTH {
        return message.to_string();
    }
    let kept: String = message.chars().take(LOG_MESSAGE_MAX_LENGTH).collect();
    format!("{kept}{LOG_TRUNCATE_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_reflects_connection_mode() {
        let direct = AccountTag::new(1, "addr", false);
        assert_eq!(direct.prefix(), "[Account 1][addr][Local IP]");

        let mut proxied = AccountTag::new(2, "addr", true);
        assert_eq!(proxied.prefix(), "[Account 2][addr][Unknown IP]");

        proxied.set_egress_ip("10.0.0.1");
        assert_eq!(proxied.prefix(), "[Account 2][addr][10.0.0.1]");
    }

    #[test]
    fn truncate_keeps_short_messages() {
        assert_eq!(truncate("short"), "short");

        let long = "x".repeat(LOG_MESSAGE_MAX_LENGTH + 10);
        let cut = truncate(&long);
        assert_eq!(cut.len(), LOG_MESSAGE_MAX_LENGTH + LOG_TRUNCATE_SUFFIX.len());
        assert!(cut.ends_with(LOG_TRUNCATE_SUFFIX));
    }
}
