//! HTTP adapters: the request executor and the proxy probe

pub mod client;
pub mod probe;

pub use client::{HttpExecutor, HttpExecutorBuilder};
pub use probe::IpifyProbe;
