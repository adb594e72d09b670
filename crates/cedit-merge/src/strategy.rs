//! Merge strategies and their error type
//!
//! Provides [`MergeStrategy`] (how one proposal combines with the value
//! already at its path) and the string-append configuration.

use cedit_document::{DocumentError, DocumentKind};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How a proposed value combines with the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Overwrite the target, creating the path if absent
    Replace,

    /// Grow an array (one level of flattening) or a string
    Append,

    /// Shallow-combine objects, proposed keys win
    Merge,
}

impl MergeStrategy {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
            Self::Merge => "merge",
        }
    }
}

impl Display for MergeStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "merge" => Ok(Self::Merge),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Unrecognized strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge_strategy: {0}")]
pub struct UnknownStrategy(pub String);

/// When to insert the separator on string append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorPolicy {
    /// Whenever the existing string is non-empty
    Always,

    /// Only when both the existing and the appended text are non-empty
    #[default]
    BetweenNonEmpty,

    /// Plain concatenation
    Never,
}

/// String append behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendConfig {
    /// Text inserted between existing and appended text
    pub separator: String,

    /// When the separator applies
    pub policy: SeparatorPolicy,
}

impl AppendConfig {
    /// With separator text
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// With policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: SeparatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Join existing and appended text per policy
    #[must_use]
    pub fn join(&self, current: &str, appended: &str) -> String {
        let separate = match self.policy {
            SeparatorPolicy::Always => !current.is_empty(),
            SeparatorPolicy::BetweenNonEmpty => !current.is_empty() && !appended.is_empty(),
            SeparatorPolicy::Never => false,
        };
        let mut out = String::with_capacity(current.len() + self.separator.len() + appended.len());
        out.push_str(current);
        if separate {
            out.push_str(&self.separator);
        }
        out.push_str(appended);
        out
    }
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            policy: SeparatorPolicy::default(),
        }
    }
}

/// Errors applying one proposal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// Structural mismatch while writing the path
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Strategy incompatible with the current target or proposed value
    #[error("{strategy} not applicable at '{path}': {detail}")]
    MergeType {
        /// Strategy attempted
        strategy: MergeStrategy,
        /// Target path
        path: String,
        /// Kind found (target or value, see detail)
        found: DocumentKind,
        /// What went wrong
        detail: String,
    },
}

impl MergeError {
    /// Check if error is a strategy/type mismatch
    #[inline]
    #[must_use]
    pub fn is_merge_type_error(&self) -> bool {
        matches!(self, Self::MergeType { .. })
    }

    /// Check if error is a structural type conflict
    #[inline]
    #[must_use]
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, Self::Document(e) if e.is_type_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parse_and_display() {
        for name in ["replace", "append", "merge"] {
            let s: MergeStrategy = name.parse().unwrap();
            assert_eq!(s.to_string(), name);
        }
        assert_eq!(
            "upsert".parse::<MergeStrategy>(),
            Err(UnknownStrategy("upsert".to_string()))
        );
    }

    #[test]
    fn strategy_serde_lowercase() {
        let s: MergeStrategy = serde_json::from_str(r#""append""#).unwrap();
        assert_eq!(s, MergeStrategy::Append);
    }

    #[test]
    fn join_between_non_empty() {
        let cfg = AppendConfig::default();
        assert_eq!(cfg.join("a", "b"), "a b");
        assert_eq!(cfg.join("", "b"), "b");
        assert_eq!(cfg.join("a", ""), "a");
    }

    #[test]
    fn join_always() {
        let cfg = AppendConfig::default().with_policy(SeparatorPolicy::Always);
        assert_eq!(cfg.join("a", "b"), "a b");
        assert_eq!(cfg.join("a", ""), "a ");
        assert_eq!(cfg.join("", "b"), "b");
    }

    #[test]
    fn join_never() {
        let cfg = AppendConfig::default().with_policy(SeparatorPolicy::Never);
        assert_eq!(cfg.join("a", "b"), "ab");
    }

    #[test]
    fn join_custom_separator() {
        let cfg = AppendConfig::default().with_separator("\n");
        assert_eq!(cfg.join("line 1", "line 2"), "line 1\nline 2");
    }

    #[test]
    fn append_config_partial_toml_style_defaults() {
        let cfg: AppendConfig = serde_json::from_str(r#"{"policy": "never"}"#).unwrap();
        assert_eq!(cfg.separator, " ");
        assert_eq!(cfg.policy, SeparatorPolicy::Never);
    }
}
