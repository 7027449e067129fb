//! Shared plumbing for the catalog backend services

// Re-export common dependencies
pub use thiserror;
pub use tracing;

pub mod database;
pub mod observability;
