//! # RewardPilot Core
//!
//! Account session runner logic with no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (traits) for HTTP, signing, storage, proxy probing and
//!   time
//! - The session manager and the resilient request pipeline
//! - The per-account supervisor, batch scheduler and periodic job registry
//!
//! ## Architecture Principles
//! - Only depends on `rewardpilot-domain`
//! - No HTTP, filesystem or crypto code
//! - All external dependencies via traits

pub mod api;
pub mod batch;
pub mod fingerprint;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod runner;
pub mod scheduling;
pub mod session;
pub mod supervisor;
pub mod token;

pub use api::Endpoints;
pub use batch::{AccountRunner, BatchScheduler};
pub use fingerprint::ClientFingerprint;
pub use logging::{AccountTag, LogLevel};
pub use pipeline::{RequestPipeline, RetryPolicy, TokenSource};
pub use ports::{Clock, KeyValueStore, ProxyProbe, RequestExecutor, Signer, SystemClock};
pub use runner::SessionRunner;
pub use scheduling::{JobRegistry, PeriodicJob, SchedulerError, SchedulerResult};
pub use session::{SessionDeps, SessionError, SessionManager, SharedSession};
pub use supervisor::{
    AccountRunReport, SupervisorDeps, SupervisorState, TaskSupervisor, TaskTally, Termination,
};
