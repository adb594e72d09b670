//! Update proposals and source references

use crate::strategy::MergeStrategy;
use cedit_document::{Document, FieldPath};
use serde::{Deserialize, Serialize};

/// Pointer into source material backing a proposed value
///
/// Serialized in camelCase (`artifactId`, `startSec`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Source artifact identifier
    pub artifact_id: String,

    /// Page within a document artifact
    ///
    /// Integral numbers such as `2.0` are accepted; negative, fractional or
    /// non-numeric pages are dropped and the rest of the reference kept.
    #[serde(default, deserialize_with = "lenient_page", skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Start offset within a media artifact, seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_sec: Option<f64>,

    /// End offset within a media artifact, seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_sec: Option<f64>,

    /// Extractor confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SourceRef {
    /// Create reference to an artifact
    #[inline]
    #[must_use]
    pub fn new(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            page: None,
            start_sec: None,
            end_sec: None,
            confidence: None,
            note: None,
        }
    }

    /// With page number
    #[inline]
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// With media time span
    #[inline]
    #[must_use]
    pub fn with_span(mut self, start_sec: f64, end_sec: f64) -> Self {
        self.start_sec = Some(start_sec);
        self.end_sec = Some(end_sec);
        self
    }

    /// With confidence
    #[inline]
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// With note
    #[inline]
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Copy with confidence clamped to `[0, 1]`; non-finite confidence is dropped
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));
        out
    }
}

/// One sanitized field update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProposal {
    /// Target section
    pub section_id: String,

    /// Target path inside the section's structured data
    pub field_path: FieldPath,

    /// Proposed value
    pub value: Document,

    /// How the value combines with the current target
    pub merge_strategy: MergeStrategy,

    /// Evidence for the value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provenance: Vec<SourceRef>,
}

impl UpdateProposal {
    /// Create proposal with the `replace` strategy and no provenance
    #[must_use]
    pub fn new(section_id: impl Into<String>, field_path: FieldPath, value: impl Into<Document>) -> Self {
        Self {
            section_id: section_id.into(),
            field_path,
            value: value.into(),
            merge_strategy: MergeStrategy::Replace,
            provenance: Vec::new(),
        }
    }

    /// With merge strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    /// With one more source reference
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.provenance.push(source);
        self
    }
}

fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(page_number))
}

fn page_number(raw: &serde_json::Value) -> Option<u32> {
    if let Some(n) = raw.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = raw.as_f64()?;
    if f.fract() != 0.0 || f < 0.0 || f > f64::from(u32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let page = f as u32;
    Some(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_ref_camel_case() {
        let source = SourceRef::new("doc-1").with_page(3).with_confidence(0.9);
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value, json!({"artifactId": "doc-1", "page": 3, "confidence": 0.9}));
    }

    #[test]
    fn source_ref_span() {
        let source: SourceRef =
            serde_json::from_value(json!({"artifactId": "a", "startSec": 1.5, "endSec": 4.0})).unwrap();
        assert_eq!(source, SourceRef::new("a").with_span(1.5, 4.0));
    }

    #[test]
    fn page_is_read_leniently() {
        let page = |raw: serde_json::Value| {
            serde_json::from_value::<SourceRef>(json!({"artifactId": "a", "page": raw}))
                .unwrap()
                .page
        };
        assert_eq!(page(json!(2)), Some(2));
        assert_eq!(page(json!(2.0)), Some(2));
        assert_eq!(page(json!(2.5)), None);
        assert_eq!(page(json!(-1)), None);
        assert_eq!(page(json!("3")), None);
        assert_eq!(page(json!(null)), None);
    }

    #[test]
    fn normalized_clamps_confidence() {
        assert_eq!(SourceRef::new("a").with_confidence(1.7).normalized().confidence, Some(1.0));
        assert_eq!(SourceRef::new("a").with_confidence(-0.2).normalized().confidence, Some(0.0));
        assert_eq!(SourceRef::new("a").with_confidence(f64::NAN).normalized().confidence, None);
        assert_eq!(SourceRef::new("a").normalized().confidence, None);
    }

    #[test]
    fn proposal_wire_format() {
        let proposal = UpdateProposal::new("s1", "vitals.bp".parse().unwrap(), "120/80")
            .with_strategy(MergeStrategy::Replace);
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(
            value,
            json!({
                "section_id": "s1",
                "field_path": "vitals.bp",
                "value": "120/80",
                "merge_strategy": "replace"
            })
        );
    }
}
