//! Error types for batch ingress
//!
//! - [`ParseError`]: the batch as a whole cannot be decoded
//! - [`ValidationError`]: one entry was rejected; the rest of the batch proceeds

use serde::{Deserialize, Serialize};

/// Batch-level decode failure
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Request body has no `updates` member
    #[error("missing updates")]
    MissingUpdates,

    /// `updates` was a string that is not valid JSON
    #[error("updates is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// `updates` decoded to something other than an array
    #[error("updates must be an array, found {found}")]
    NotAnArray {
        /// JSON kind found instead
        found: &'static str,
    },

    /// Batch exceeds the configured limit
    #[error("batch too large: {len} updates (max: {max})")]
    TooLarge {
        /// Entries received
        len: usize,
        /// Configured limit
        max: usize,
    },
}

/// Rejected batch entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("update {index}: {reason}")]
pub struct ValidationError {
    /// Position in the submitted batch
    pub index: usize,
    /// Human-readable rejection reason
    pub reason: String,
}

impl ValidationError {
    /// Create validation error
    #[inline]
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}
