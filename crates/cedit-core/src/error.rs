//! Error types for the core services
//!
//! - Storage failures ([`StoreError`]) fail a request outright
//! - Reconciliation failures ([`ReconciliationError`]) are isolated per report
//! - Configuration failures ([`ConfigError`])

use cedit_ingress::ParseError;
use cedit_schema::SchemaError;
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage backend failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Batch could not be decoded
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Schema definitions are invalid
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reconciliation could not start
    #[error("reconciliation error: {0}")]
    Reconciliation(#[from] ReconciliationError),
}

/// Storage backend errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend-specific failure
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create backend error
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Failure reconciling one report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconciliationError {
    /// Report listed but not readable
    #[error("report not found: {0}")]
    ReportNotFound(String),

    /// Report belongs to someone else
    #[error("report {report_id} is not owned by {owner}")]
    NotOwner {
        /// Requested report
        report_id: String,
        /// Caller
        owner: String,
    },

    /// Storage failed while reading or writing the report
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML is malformed or mistyped
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts() {
        let e: EngineError = StoreError::backend("disk full").into();
        assert_eq!(e.to_string(), "store error: backend failure: disk full");
    }

    #[test]
    fn reconciliation_error_is_transparent_over_store() {
        let e: ReconciliationError = StoreError::NotFound("r1".to_string()).into();
        assert_eq!(e.to_string(), "not found: r1");
    }

    #[test]
    fn io_error_mentions_path() {
        let e = ConfigError::io("/tmp/x.toml", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(e.to_string().starts_with("io error reading /tmp/x.toml"));
    }
}
