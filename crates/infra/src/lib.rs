//! # RewardPilot Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-based request executor and proxy probe
//! - The JSON file key-value store
//! - Ed25519 signing and address derivation
//! - Configuration, key and proxy file loading
//!
//! ## Architecture
//! - Implements traits defined in `rewardpilot-core`
//! - Contains all "impure" code (network, filesystem, crypto)

pub mod accounts;
pub mod config;
pub mod errors;
pub mod http;
pub mod signing;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpExecutor, HttpExecutorBuilder, IpifyProbe};
pub use signing::{derive_address, Ed25519Signer};
pub use storage::JsonFileStore;
