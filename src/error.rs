//! Error types for the TTL store
//!
//! Provides unified error handling using thiserror. Absence, capacity
//! rejection and absent values are soft outcomes and never show up here.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the TTL store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The tokio timer service was requested outside of a runtime
    #[error("No tokio runtime available for expiration timers: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the TTL store.
pub type Result<T> = std::result::Result<T, StoreError>;
