//! Engine configuration
//!
//! Loaded from TOML; every section is optional and falls back to defaults.
//!
//! ```toml
//! strict_schema = false
//!
//! [append]
//! separator = " "
//! policy = "between_non_empty"
//!
//! [provenance]
//! max_entries = 10
//!
//! [ingress]
//! max_batch_size = 500
//! ```

use crate::error::ConfigError;
use cedit_ingress::IngressConfig;
use cedit_merge::{AppendConfig, ProvenanceConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject updates to sections whose type has no registered schema
    pub strict_schema: bool,

    /// String append behaviour
    pub append: AppendConfig,

    /// Provenance retention
    pub provenance: ProvenanceConfig,

    /// Batch limits
    pub ingress: IngressConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or has wrong types
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// With strict schema handling
    #[inline]
    #[must_use]
    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// With string append behaviour
    #[inline]
    #[must_use]
    pub fn with_append(mut self, append: AppendConfig) -> Self {
        self.append = append;
        self
    }

    /// With provenance cap per field
    #[inline]
    #[must_use]
    pub fn with_max_provenance(mut self, max_entries: usize) -> Self {
        self.provenance.max_entries = max_entries;
        self
    }

    /// With batch size limit
    #[inline]
    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.ingress.max_batch_size = max_batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cedit_merge::SeparatorPolicy;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            strict_schema = true

            [append]
            policy = "never"

            [provenance]
            max_entries = 3
            "#,
        )
        .unwrap();
        assert!(config.strict_schema);
        assert_eq!(config.append.policy, SeparatorPolicy::Never);
        assert_eq!(config.append.separator, " ");
        assert_eq!(config.provenance.max_entries, 3);
        assert_eq!(config.ingress, IngressConfig::default());
    }

    #[test]
    fn bad_toml_fails() {
        assert!(matches!(
            EngineConfig::from_toml_str("strict_schema = \"yes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn builders() {
        let config = EngineConfig::new()
            .with_strict_schema(true)
            .with_max_provenance(2)
            .with_max_batch_size(5);
        assert!(config.strict_schema);
        assert_eq!(config.provenance.max_entries, 2);
        assert_eq!(config.ingress.max_batch_size, 5);
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cedit.toml");
        tokio::fs::write(&path, "[ingress]\nmax_batch_size = 7\n").await.unwrap();

        let config = EngineConfig::load(&path).await.unwrap();
        assert_eq!(config.ingress.max_batch_size, 7);

        let missing = EngineConfig::load(dir.path().join("nope.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
