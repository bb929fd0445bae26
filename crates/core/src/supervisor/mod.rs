//! Per-account workflow supervision
//!
//! The supervisor drives one account from an unverified proxy to a steady
//! state with its periodic jobs registered:
//!
//! ```text
//! Init -> ProxyResolved -> Authenticated -> Synced -> CheckedIn -> Steady
//! ```
//!
//! Any terminal failure stops only that account and is captured in its
//! [`AccountRunReport`].

mod periodic;
pub mod workflow;

use rewardpilot_domain::{impl_domain_label_conversions, FailureClass, RequestOutcome};
use thiserror::Error;

use crate::logging::truncate;

pub use workflow::{SupervisorDeps, TaskSupervisor};

/// Furthest workflow stage an account reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupervisorState {
    Init,
    ProxyResolved,
    Authenticated,
    Synced,
    CheckedIn,
    Steady,
}

impl_domain_label_conversions!(SupervisorState {
    Init => "init",
    ProxyResolved => "proxy_resolved",
    Authenticated => "authenticated",
    Synced => "synced",
    CheckedIn => "checked_in",
    Steady => "steady",
});

/// Why an account's workflow stopped early
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Termination {
    #[error("Proxy unavailable: {reason}")]
    ProxyUnavailable { reason: String },

    #[error("Authentication failed: {reason}")]
    NoCredentials { reason: String },

    #[error("{endpoint} failed with status {status} ({class}): {message}")]
    RequestFailed { endpoint: &'static str, status: u16, class: FailureClass, message: String },

    #[error("Account task crashed: {reason}")]
    Panicked { reason: String },
}

impl Termination {
    /// Termination for a request that failed or answered with an unusable
    /// payload.
    #[must_use]
    pub fn from_outcome(endpoint: &'static str, outcome: &RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::Failure { status, message, class } => Self::RequestFailed {
                endpoint,
                status: *status,
                class: *class,
                message: truncate(message),
            },
            RequestOutcome::Success { status, .. } => Self::RequestFailed {
                endpoint,
                status: *status,
                class: FailureClass::Fatal,
                message: "unexpected response body".to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::RequestFailed { class: FailureClass::BadRequest, .. })
    }
}

/// One-time task results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTally {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of one account's initial workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRunReport {
    pub address: String,
    pub reached: SupervisorState,
    pub termination: Option<Termination>,
    pub tasks: TaskTally,
}

impl AccountRunReport {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            reached: SupervisorState::Init,
            termination: None,
            tasks: TaskTally::default(),
        }
    }

    /// Report for an account whose task panicked or was aborted.
    pub fn panicked(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(address).terminated(Termination::Panicked { reason: reason.into() })
    }

    pub fn advance(&mut self, state: SupervisorState) {
        self.reached = state;
    }

    #[must_use]
    pub fn terminated(mut self, termination: Termination) -> Self {
        self.termination = Some(termination);
        self
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.termination.is_none()
    }
}
