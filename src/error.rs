//! Error types for the expiring store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Expected failure outcomes of store operations.
///
/// A miss is an ordinary result that callers branch on, never a fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key is absent or its TTL has elapsed
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

impl StoreError {
    /// Returns the key the failed operation was looking up.
    pub fn key(&self) -> &str {
        match self {
            StoreError::KeyNotFound(key) => key,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
