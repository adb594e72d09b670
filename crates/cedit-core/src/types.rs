//! Core types
//!
//! Defines the persisted shapes and the request/response envelopes:
//! - Section rows and embedded section entries
//! - Reports
//! - Update batch and reconciliation envelopes

use cedit_document::{Document, DocumentHash};
use cedit_ingress::ValidationError;
use cedit_merge::{ChangeLogEntry, ProvenanceLog};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Normalized per-section row, keyed by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRow {
    /// Section identifier
    pub id: String,

    /// Owning report
    pub report_id: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Selects the field schema
    #[serde(default)]
    pub section_type: String,

    /// Section content; `null` is treated as `{}` on update
    #[serde(default)]
    pub structured_data: Document,

    /// Position within the report
    #[serde(default)]
    pub order: u32,

    /// Source references per field path
    #[serde(default, skip_serializing_if = "ProvenanceLog::is_empty")]
    pub field_provenance: ProvenanceLog,
}

impl SectionRow {
    /// Create empty row
    #[must_use]
    pub fn new(id: impl Into<String>, report_id: impl Into<String>, section_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            report_id: report_id.into(),
            title: String::new(),
            section_type: section_type.into(),
            structured_data: Document::empty_object(),
            order: 0,
            field_provenance: ProvenanceLog::new(),
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With structured data
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Document>) -> Self {
        self.structured_data = data.into();
        self
    }

    /// With order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Check if the reconciled columns match another row
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.title == other.title
            && self.section_type == other.section_type
            && self.structured_data == other.structured_data
            && self.order == other.order
    }
}

/// Section entry embedded in a report's `sections` array
///
/// Every field is optional because embedded data is not schema-checked.
/// Unknown members are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedSection {
    /// Section identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Selects the field schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,

    /// Section content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Document>,

    /// Explicit position, if the entry carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,

    /// Members this engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmbeddedSection {
    /// Create entry with an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// With section type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = Some(section_type.into());
        self
    }

    /// With structured data
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Document>) -> Self {
        self.structured_data = Some(data.into());
        self
    }

    /// Non-empty id, if any
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

impl From<&SectionRow> for EmbeddedSection {
    fn from(row: &SectionRow) -> Self {
        Self {
            id: Some(row.id.clone()),
            title: Some(row.title.clone()),
            section_type: Some(row.section_type.clone()),
            structured_data: Some(row.structured_data.clone()),
            order: Some(row.order),
            extra: Map::new(),
        }
    }
}

/// Report with its denormalized sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report identifier
    pub id: String,

    /// Owning user
    pub owner: String,

    /// Embedded sections; array position is the section order
    #[serde(default)]
    pub sections: Vec<EmbeddedSection>,
}

impl Report {
    /// Create report without sections
    #[must_use]
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            sections: Vec::new(),
        }
    }

    /// With sections
    #[inline]
    #[must_use]
    pub fn with_sections(mut self, sections: Vec<EmbeddedSection>) -> Self {
        self.sections = sections;
        self
    }
}

/// Result of an update batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatchResponse {
    /// Proposals applied
    pub applied_count: usize,

    /// Entries rejected (sanitization, schema or merge)
    pub skipped_count: usize,

    /// Rejections by batch index
    pub errors: Vec<ValidationError>,

    /// Sections written, in first-touch order
    pub updated_sections: Vec<String>,

    /// Content hash of each written section after the batch
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub section_versions: BTreeMap<String, DocumentHash>,

    /// Changelog, in application order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeLogEntry>,

    /// Batch-level failure; set only when nothing was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateBatchResponse {
    /// Response for a batch rejected as a whole
    #[must_use]
    pub fn rejected(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Check if the batch was rejected as a whole
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.error.is_some()
    }
}

/// Reconciliation scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    /// Single report; absent means every report of the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

impl ReconcileRequest {
    /// Every report of the caller
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// One report
    #[inline]
    #[must_use]
    pub fn report(report_id: impl Into<String>) -> Self {
        Self {
            report_id: Some(report_id.into()),
        }
    }
}

/// Per-report reconciliation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFailure {
    /// Report that failed
    pub report_id: String,
    /// What went wrong
    pub reason: String,
}

/// Totals of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Reports reconciled without error
    pub processed_reports: usize,

    /// Rows inserted or changed
    pub total_upserted: usize,

    /// Embedded entries overwritten from rows
    pub total_mirrored: usize,

    /// Embedded entries skipped for lack of an id
    #[serde(default)]
    pub skipped_entries: usize,

    /// Reports that failed
    pub per_report_errors: Vec<ReportFailure>,
}
