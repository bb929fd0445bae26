//! Token lifecycle for a single account

pub mod error;
pub mod manager;

pub use error::SessionError;
pub use manager::{SessionDeps, SessionManager, SharedSession};
