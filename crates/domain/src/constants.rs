//! Application constants
//!
//! Centralized location for the remote API's session semantics. Intervals
//! and pauses are fixed by the API's behaviour, not by operator config.

/// Message signed during login to prove key ownership.
pub const CHALLENGE_MESSAGE: &str =
    "Please sign this message to connect your wallet to Flow 3 and verifying your ownership only.";

// Periodic jobs
pub const HEARTBEAT_INTERVAL_SECS: u64 = 60;
pub const CHECKPOINT_INTERVAL_SECS: u64 = 5 * 60;

// Retry policy
pub const RATE_LIMIT_COOLDOWN_SECS: u64 = 60;
pub const TRANSIENT_BACKOFF_SECS: u64 = 5;
pub const DEFAULT_RETRY_BUDGET: u32 = 2;

// Workflow pacing
pub const CHECKIN_WINDOW_HOURS: i64 = 24;
pub const INTER_TASK_PAUSE_SECS: u64 = 1;
pub const STEP_PAUSE_SECS: u64 = 1;

// Task status codes reported by the API
pub const DAILY_TASK_PENDING: i64 = 0;
pub const TASK_COMPLETED: i64 = 1;
pub const TASK_ACK_OK: i64 = 200;

// Logging
pub const LOG_MESSAGE_MAX_LENGTH: usize = 200;
pub const LOG_TRUNCATE_SUFFIX: &str = "...";

// Job shutdown
pub const JOB_JOIN_TIMEOUT_SECS: u64 = 5;
