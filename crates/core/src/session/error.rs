//! Session error types

use rewardpilot_domain::RewardPilotError;
use thiserror::Error;

/// Session-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Neither a stored token, a refresh nor a fresh login produced a usable
    /// access token
    #[error("no credentials available: {reason}")]
    NoCredentials { reason: String },
}

impl SessionError {
    pub fn no_credentials(reason: impl Into<String>) -> Self {
        Self::NoCredentials { reason: reason.into() }
    }
}

impl From<SessionError> for RewardPilotError {
    fn from(err: SessionError) -> Self {
        RewardPilotError::Auth(err.to_string())
    }
}
