//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use reqwest::Error as HttpError;
use rewardpilot_domain::{FailureClass, RewardPilotError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RewardPilotError);

impl From<InfraError> for RewardPilotError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RewardPilotError> for InfraError {
    fn from(value: RewardPilotError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRewardPilotError {
    fn into_rewardpilot(self) -> RewardPilotError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RewardPilotError */
/* -------------------------------------------------------------------------- */

impl IntoRewardPilotError for HttpError {
    fn into_rewardpilot(self) -> RewardPilotError {
        if self.is_timeout() {
            return RewardPilotError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RewardPilotError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => RewardPilotError::Auth(message),
                400..=499 if code != 408 && code != 429 => RewardPilotError::InvalidInput(message),
                _ => RewardPilotError::Network(message),
            };
        }

        if self.is_builder() {
            return RewardPilotError::Config(format!("invalid HTTP request: {self}"));
        }

        RewardPilotError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_rewardpilot())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → RewardPilotError */
/* -------------------------------------------------------------------------- */

impl IntoRewardPilotError for IoError {
    fn into_rewardpilot(self) -> RewardPilotError {
        RewardPilotError::Storage(format!("{:?}: {}", self.kind(), self))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_rewardpilot())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FailureClass */
/* -------------------------------------------------------------------------- */

/// Classify a transport error that produced no usable response.
///
/// Timeouts, connection and body errors can succeed on a later attempt;
/// anything else (a malformed URL or proxy) cannot.
#[must_use]
pub fn classify_transport(err: &HttpError) -> FailureClass {
    if let Some(status) = err.status() {
        return FailureClass::from_status(status.as_u16());
    }
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        return FailureClass::Transient;
    }
    FailureClass::Fatal
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
