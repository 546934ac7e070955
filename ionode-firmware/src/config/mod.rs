//! Persisted pin configuration
//!
//! The whole key/value store is kept in flash as one postcard blob.

pub mod loader;

pub use loader::{ConfigPersistence, NodeStore};
