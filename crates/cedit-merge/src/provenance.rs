//! Per-field provenance
//!
//! [`ProvenanceLog`] maps a field path to the source references that
//! supported its most recent values. [`ProvenanceAttacher`] records the
//! provenance of applied proposals, bounded per field.

use crate::proposal::{SourceRef, UpdateProposal};
use cedit_document::FieldPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of source references kept per field
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Source references by field path (dot form)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceLog(BTreeMap<String, Vec<SourceRef>>);

impl ProvenanceLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// References for a field, oldest first
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> &[SourceRef] {
        self.0.get(&path.to_string()).map_or(&[], Vec::as_slice)
    }

    /// Number of fields with provenance
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if log is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields and their references
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SourceRef])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Provenance retention settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// References kept per field; oldest are evicted first
    pub max_entries: usize,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Records proposal provenance into a [`ProvenanceLog`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceAttacher {
    config: ProvenanceConfig,
}

impl ProvenanceAttacher {
    /// Create attacher
    #[inline]
    #[must_use]
    pub fn new(config: ProvenanceConfig) -> Self {
        Self { config }
    }

    /// Append the proposal's source references to its field
    ///
    /// Returns the number of references recorded. Proposals without
    /// provenance leave the log untouched.
    pub fn attach(&self, log: &mut ProvenanceLog, update: &UpdateProposal) -> usize {
        if update.provenance.is_empty() {
            return 0;
        }

        let entries = log.0.entry(update.field_path.to_string()).or_default();
        entries.extend(update.provenance.iter().map(SourceRef::normalized));

        if entries.len() > self.config.max_entries {
            let excess = entries.len() - self.config.max_entries;
            entries.drain(..excess);
        }

        update.provenance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_with(sources: Vec<SourceRef>) -> UpdateProposal {
        let mut update = UpdateProposal::new("s1", "hpi".parse().unwrap(), "text");
        update.provenance = sources;
        update
    }

    #[test]
    fn attach_appends_normalized() {
        let attacher = ProvenanceAttacher::default();
        let mut log = ProvenanceLog::new();
        let n = attacher.attach(&mut log, &update_with(vec![SourceRef::new("a").with_confidence(3.0)]));
        assert_eq!(n, 1);
        let refs = log.get(&"hpi".parse().unwrap());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].confidence, Some(1.0));
    }

    #[test]
    fn attach_without_provenance_is_noop() {
        let attacher = ProvenanceAttacher::default();
        let mut log = ProvenanceLog::new();
        assert_eq!(attacher.attach(&mut log, &update_with(vec![])), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn attach_evicts_oldest() {
        let attacher = ProvenanceAttacher::new(ProvenanceConfig { max_entries: 3 });
        let mut log = ProvenanceLog::new();
        for i in 0..5 {
            attacher.attach(&mut log, &update_with(vec![SourceRef::new(format!("a{i}"))]));
        }
        let ids: Vec<_> = log
            .get(&"hpi".parse().unwrap())
            .iter()
            .map(|s| s.artifact_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a2", "a3", "a4"]);
    }

    #[test]
    fn log_serializes_as_map() {
        let attacher = ProvenanceAttacher::default();
        let mut log = ProvenanceLog::new();
        attacher.attach(&mut log, &update_with(vec![SourceRef::new("a").with_page(2)]));
        assert_eq!(
            serde_json::to_value(&log).unwrap(),
            json!({"hpi": [{"artifactId": "a", "page": 2}]})
        );
    }
}
