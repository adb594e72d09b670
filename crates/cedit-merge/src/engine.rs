//! Merge engine
//!
//! Sequential application of [`UpdateProposal`]s to one section document.
//! Later proposals see the results of earlier ones.

use crate::proposal::UpdateProposal;
use crate::strategy::{AppendConfig, MergeError, MergeStrategy};
use cedit_document::{Document, DocumentKind, FieldPath};
use cedit_schema::{FieldType, SectionSchema};
use serde::{Deserialize, Serialize};

/// Record of one applied proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Section written
    pub section_id: String,

    /// Path written
    pub field_path: FieldPath,

    /// Strategy used
    pub strategy: MergeStrategy,

    /// Value at the path before the write (absent if the path did not resolve)
    pub previous_value: Option<Document>,

    /// Value at the path after the write
    pub new_value: Document,
}

impl ChangeLogEntry {
    /// Check if the write left the value unchanged
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.previous_value.as_ref() == Some(&self.new_value)
    }
}

/// Result of applying one proposal
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    /// Document after the write
    pub document: Document,

    /// Changelog entry
    pub change: ChangeLogEntry,
}

/// Result of folding a batch over one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Final document
    pub document: Document,

    /// Changelog, in application order
    pub changes: Vec<ChangeLogEntry>,

    /// Failed proposals by batch index
    pub failures: Vec<(usize, MergeError)>,
}

impl BatchOutcome {
    /// Number of applied proposals
    #[inline]
    #[must_use]
    pub fn applied(&self) -> usize {
        self.changes.len()
    }
}

/// Applies proposals to section documents
///
/// # Characteristics
/// - Pure: input documents are never mutated
/// - Deterministic: identical inputs give identical outputs
/// - Atomic per proposal: a failed proposal leaves the document unchanged
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    append: AppendConfig,
}

impl MergeEngine {
    /// Create engine with default append behaviour
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With string-append configuration
    #[inline]
    #[must_use]
    pub fn with_append_config(mut self, append: AppendConfig) -> Self {
        self.append = append;
        self
    }

    /// String-append configuration
    #[inline]
    #[must_use]
    pub fn append_config(&self) -> &AppendConfig {
        &self.append
    }

    /// Apply one proposal
    ///
    /// `schema` only informs how an absent `append` target is initialized.
    ///
    /// # Errors
    /// - [`MergeError::Document`] on structural conflict along the path
    /// - [`MergeError::MergeType`] when the strategy does not fit the target or value
    pub fn apply(
        &self,
        doc: &Document,
        update: &UpdateProposal,
        schema: Option<&SectionSchema>,
    ) -> Result<AppliedChange, MergeError> {
        let path = &update.field_path;
        let previous = doc.lookup(path).cloned();

        let new_value = match update.merge_strategy {
            MergeStrategy::Replace => update.value.clone(),
            MergeStrategy::Append => {
                let leaf = schema.and_then(|s| s.leaf_type(path));
                self.append_value(path, previous.as_ref(), &update.value, leaf)?
            }
            MergeStrategy::Merge => merge_value(path, previous.as_ref(), &update.value)?,
        };

        let document = doc.set(path, new_value.clone())?;

        Ok(AppliedChange {
            document,
            change: ChangeLogEntry {
                section_id: update.section_id.clone(),
                field_path: path.clone(),
                strategy: update.merge_strategy,
                previous_value: previous,
                new_value,
            },
        })
    }

    /// Fold proposals over one document in order
    ///
    /// Failures are recorded by index and never abort the fold.
    pub fn apply_batch<'a, I>(&self, doc: &Document, updates: I, schema: Option<&SectionSchema>) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a UpdateProposal>,
    {
        updates.into_iter().enumerate().fold(
            BatchOutcome {
                document: doc.clone(),
                ..BatchOutcome::default()
            },
            |mut acc, (index, update)| {
                match self.apply(&acc.document, update, schema) {
                    Ok(applied) => {
                        acc.document = applied.document;
                        acc.changes.push(applied.change);
                    }
                    Err(e) => acc.failures.push((index, e)),
                }
                acc
            },
        )
    }

    fn append_value(
        &self,
        path: &FieldPath,
        current: Option<&Document>,
        value: &Document,
        leaf: Option<FieldType>,
    ) -> Result<Document, MergeError> {
        let initial;
        let current = match current {
            Some(c) if !c.is_null() => c,
            _ => {
                initial = initial_append_target(path, value, leaf)?;
                &initial
            }
        };

        match current {
            Document::Array(items) => {
                let mut items = items.clone();
                match value {
                    Document::Array(more) => items.append(more.clone()),
                    other => items.push_back(other.clone()),
                }
                Ok(Document::Array(items))
            }
            Document::String(text) => {
                let appended = match value {
                    Document::String(s) => s.clone(),
                    Document::Number(n) => n.to_string(),
                    Document::Bool(b) => b.to_string(),
                    other => {
                        return Err(MergeError::MergeType {
                            strategy: MergeStrategy::Append,
                            path: path.to_string(),
                            found: other.kind(),
                            detail: format!("cannot append {} to a string", other.kind()),
                        })
                    }
                };
                Ok(Document::String(self.append.join(text, &appended)))
            }
            other => Err(MergeError::MergeType {
                strategy: MergeStrategy::Append,
                path: path.to_string(),
                found: other.kind(),
                detail: format!("target is {}, expected array or string", other.kind()),
            }),
        }
    }
}

fn initial_append_target(path: &FieldPath, value: &Document, leaf: Option<FieldType>) -> Result<Document, MergeError> {
    match leaf {
        Some(FieldType::String) => Ok(Document::String(String::new())),
        Some(FieldType::Array) => Ok(Document::empty_array()),
        Some(other) => Err(MergeError::MergeType {
            strategy: MergeStrategy::Append,
            path: path.to_string(),
            found: DocumentKind::Null,
            detail: format!("field is declared {other}, expected array or string"),
        }),
        None if matches!(value, Document::String(_)) => Ok(Document::String(String::new())),
        None => Ok(Document::empty_array()),
    }
}

fn merge_value(path: &FieldPath, current: Option<&Document>, value: &Document) -> Result<Document, MergeError> {
    let Document::Object(incoming) = value else {
        return Err(MergeError::MergeType {
            strategy: MergeStrategy::Merge,
            path: path.to_string(),
            found: value.kind(),
            detail: format!("value is {}, expected object", value.kind()),
        });
    };

    match current {
        None | Some(Document::Null) => Ok(Document::Object(incoming.clone())),
        Some(Document::Object(existing)) => Ok(Document::Object(
            existing.clone().union_with(incoming.clone(), |_, new| new),
        )),
        Some(other) => Err(MergeError::MergeType {
            strategy: MergeStrategy::Merge,
            path: path.to_string(),
            found: other.kind(),
            detail: format!("target is {}, expected object", other.kind()),
        }),
    }
}
