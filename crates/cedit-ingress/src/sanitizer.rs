//! Proposal sanitizer
//!
//! Two explicit steps:
//! 1. [`ProposalSanitizer::decode`]: raw request body to a list of JSON entries
//! 2. [`ProposalSanitizer::sanitize`]: each entry independently to an
//!    [`UpdateProposal`] or a [`ValidationError`]

use crate::error::{ParseError, ValidationError};
use cedit_document::{Document, FieldPath};
use cedit_merge::{MergeStrategy, SourceRef, UpdateProposal};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default limit on entries per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Ingress limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Maximum entries per batch
    pub max_batch_size: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Outcome of sanitizing a decoded batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedBatch {
    /// Accepted proposals, in submission order
    pub valid_updates: Vec<UpdateProposal>,

    /// Rejected entries by index
    pub errors: Vec<ValidationError>,
}

impl SanitizedBatch {
    /// Number of entries seen
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.valid_updates.len() + self.errors.len()
    }

    /// Accepted proposals paired with their index in the submitted batch
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &UpdateProposal)> {
        let mut rejected = self.errors.iter().map(|e| e.index).peekable();
        (0..self.total())
            .filter(move |i| {
                if rejected.peek() == Some(i) {
                    rejected.next();
                    false
                } else {
                    true
                }
            })
            .zip(&self.valid_updates)
    }
}

/// Trusted boundary between untrusted update batches and the merge engine
///
/// Never panics on input shape; every problem becomes a [`ParseError`] for
/// the whole batch or a [`ValidationError`] for one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalSanitizer {
    config: IngressConfig,
}

impl ProposalSanitizer {
    /// Create sanitizer
    #[inline]
    #[must_use]
    pub fn new(config: IngressConfig) -> Self {
        Self { config }
    }

    /// Configured limits
    #[inline]
    #[must_use]
    pub fn config(&self) -> &IngressConfig {
        &self.config
    }

    /// Decode a request body `{ "updates": ... }`
    ///
    /// # Errors
    /// - `MissingUpdates` if the body is not an object with `updates`
    /// - see [`Self::decode_updates`]
    pub fn decode(&self, body: &Value) -> Result<Vec<Value>, ParseError> {
        let updates = body
            .as_object()
            .and_then(|o| o.get("updates"))
            .ok_or(ParseError::MissingUpdates)?;
        self.decode_updates(updates)
    }

    /// Decode the `updates` member: an array, or a string holding a JSON array
    ///
    /// # Errors
    /// - `InvalidJson` if a string member does not parse
    /// - `NotAnArray` if the decoded value is not an array
    /// - `TooLarge` if the array exceeds `max_batch_size`
    pub fn decode_updates(&self, updates: &Value) -> Result<Vec<Value>, ParseError> {
        let decoded = match updates {
            Value::String(text) => serde_json::from_str(text).map_err(ParseError::InvalidJson)?,
            other => other.clone(),
        };

        let Value::Array(entries) = decoded else {
            return Err(ParseError::NotAnArray {
                found: json_kind(&decoded),
            });
        };

        if entries.len() > self.config.max_batch_size {
            return Err(ParseError::TooLarge {
                len: entries.len(),
                max: self.config.max_batch_size,
            });
        }

        Ok(entries)
    }

    /// Check every entry independently
    #[must_use]
    pub fn sanitize(&self, entries: &[Value]) -> SanitizedBatch {
        let mut batch = SanitizedBatch::default();

        for (index, entry) in entries.iter().enumerate() {
            match sanitize_entry(index, entry) {
                Ok(update) => batch.valid_updates.push(update),
                Err(reason) => {
                    tracing::debug!(index, %reason, "rejected update");
                    batch.errors.push(ValidationError::new(index, reason));
                }
            }
        }

        batch
    }

    /// Decode then sanitize
    ///
    /// # Errors
    /// Batch-level [`ParseError`] from [`Self::decode`]
    pub fn process(&self, body: &Value) -> Result<SanitizedBatch, ParseError> {
        let entries = self.decode(body)?;
        Ok(self.sanitize(&entries))
    }
}

fn sanitize_entry(index: usize, entry: &Value) -> Result<UpdateProposal, String> {
    let Value::Object(obj) = entry else {
        return Err("update is not an object".to_string());
    };

    let section_id = required_string(obj, "section_id")?;
    let raw_path = required_string(obj, "field_path")?;
    let field_path: FieldPath = raw_path.parse().map_err(|e| format!("invalid field_path: {e}"))?;

    let merge_strategy = match obj.get("merge_strategy") {
        None | Some(Value::Null) => return Err("missing merge_strategy".to_string()),
        Some(Value::String(s)) => s.parse::<MergeStrategy>().map_err(|e| e.to_string())?,
        Some(_) => return Err("merge_strategy must be a string".to_string()),
    };

    // presence, not truthiness: `null`, `0`, `""` and `false` are all values
    let value = obj.get("value").ok_or_else(|| "missing value".to_string())?;

    Ok(UpdateProposal {
        section_id: section_id.to_string(),
        field_path,
        value: Document::from(value),
        merge_strategy,
        provenance: provenance(index, obj.get("provenance")),
    })
}

fn required_string<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(format!("missing {key}")),
        Some(Value::String(s)) if s.trim().is_empty() => Err(format!("empty {key}")),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("{key} must be a string")),
    }
}

fn provenance(index: usize, raw: Option<&Value>) -> Vec<SourceRef> {
    let items = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(index, found = json_kind(other), "provenance is not an array, dropped");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match SourceRef::deserialize(item) {
            Ok(source) if !source.artifact_id.trim().is_empty() => Some(source),
            Ok(_) => {
                tracing::warn!(index, entry = i, "provenance entry has empty artifactId, dropped");
                None
            }
            Err(e) => {
                tracing::warn!(index, entry = i, error = %e, "malformed provenance entry, dropped");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
