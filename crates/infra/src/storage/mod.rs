//! File-backed key-value storage

pub mod json_store;

pub use json_store::JsonFileStore;
