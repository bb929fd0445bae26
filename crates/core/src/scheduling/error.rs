//! Scheduler error types

use rewardpilot_domain::RewardPilotError;
use thiserror::Error;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Registration attempted after shutdown began
    #[error("Job registry is shutting down")]
    ShuttingDown,

    /// Outstanding jobs did not stop in time
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for RewardPilotError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::ShuttingDown => RewardPilotError::InvalidInput(err.to_string()),
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                RewardPilotError::Internal(err.to_string())
            }
        }
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
