//! # RewardPilot Domain
//!
//! Business domain types and models for RewardPilot.
//!
//! This crate contains:
//! - Account identity, proxy bindings and session records
//! - Request/outcome contracts shared by the pipeline and executors
//! - Remote API wire types
//! - Domain error types and Result definitions
//! - Configuration structures and domain constants
//!
//! ## Architecture
//! - No dependencies on other RewardPilot crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
