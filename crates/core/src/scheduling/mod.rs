//! Periodic job scheduling
//!
//! A single [`JobRegistry`] is created by the binary and handed to every
//! account workflow. It owns the cancellation token and the join handles of
//! all periodic jobs, so one `shutdown` stops everything.

pub mod error;
pub mod jobs;

pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{JobAction, JobRegistry, PeriodicJob};
