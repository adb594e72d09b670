//! Field schema trees
//!
//! A [`SectionSchema`] declares which field paths are legal for one section
//! type. Each [`FieldSchema`] node names a key, a display label and a
//! [`FieldType`]. Object nodes list their members in `children`; array nodes
//! list the shape of one item in `children` (or name a scalar `item_type`).

use cedit_document::DocumentKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    String,
    /// Numeric value
    Number,
    /// Yes/no flag
    Boolean,
    /// List of items
    Array,
    /// Nested group of fields
    Object,
}

impl FieldType {
    /// Check if a document kind satisfies this type
    ///
    /// `null` satisfies every type (an unset field).
    #[inline]
    #[must_use]
    pub fn accepts(self, kind: DocumentKind) -> bool {
        matches!(
            (self, kind),
            (_, DocumentKind::Null)
                | (Self::String, DocumentKind::String)
                | (Self::Number, DocumentKind::Number)
                | (Self::Boolean, DocumentKind::Bool)
                | (Self::Array, DocumentKind::Array)
                | (Self::Object, DocumentKind::Object)
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// One node of a field schema tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Path segment for this field
    pub key: String,

    /// Human-readable label
    pub label: String,

    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Members (object) or item shape (array)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldSchema>,

    /// Scalar item type for arrays without `children`
    #[serde(default, rename = "itemType", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<FieldType>,

    /// Field must be present for the section to be complete
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl FieldSchema {
    /// Create leaf node
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            children: Vec::new(),
            item_type: None,
            required: false,
        }
    }

    /// With child nodes
    #[must_use]
    pub fn with_children(mut self, children: Vec<FieldSchema>) -> Self {
        self.children = children;
        self
    }

    /// With scalar item type (arrays)
    #[must_use]
    pub fn with_item_type(mut self, item_type: FieldType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Find direct child by key
    #[inline]
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&FieldSchema> {
        self.children.iter().find(|c| c.key == key)
    }
}

/// Schema for one section type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSchema {
    /// Section type this schema applies to
    pub section_type: String,

    /// Top-level fields
    pub fields: Vec<FieldSchema>,
}

impl SectionSchema {
    /// Create schema
    #[must_use]
    pub fn new(section_type: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            section_type: section_type.into(),
            fields,
        }
    }

    /// Find top-level field by key
    #[inline]
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Check structural rules
    ///
    /// Keys must be non-empty, contain no `.`, not be all digits (they would
    /// parse as an index), and be unique among siblings.
    ///
    /// # Errors
    /// Returns the first offending key
    pub fn check(&self) -> Result<(), SchemaError> {
        check_level(&self.section_type, "", &self.fields)
    }
}

fn check_level(section_type: &str, prefix: &str, fields: &[FieldSchema]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        let at = if prefix.is_empty() {
            field.key.clone()
        } else {
            format!("{prefix}.{}", field.key)
        };
        if field.key.is_empty()
            || field.key.contains('.')
            || field.key.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(SchemaError::InvalidKey {
                section_type: section_type.to_string(),
                path: at,
            });
        }
        if !seen.insert(field.key.as_str()) {
            return Err(SchemaError::DuplicateKey {
                section_type: section_type.to_string(),
                path: at,
            });
        }
        check_level(section_type, &at, &field.children)?;
    }
    Ok(())
}

/// Schema definition errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Key cannot be addressed by a dot-path
    #[error("invalid key '{path}' in schema for '{section_type}'")]
    InvalidKey {
        /// Owning section type
        section_type: String,
        /// Offending path
        path: String,
    },

    /// Two siblings share a key
    #[error("duplicate key '{path}' in schema for '{section_type}'")]
    DuplicateKey {
        /// Owning section type
        section_type: String,
        /// Offending path
        path: String,
    },

    /// Schema document is not valid JSON / shape
    #[error("schema decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_accepts_matching_kind() {
        assert!(FieldType::String.accepts(DocumentKind::String));
        assert!(FieldType::Array.accepts(DocumentKind::Null));
        assert!(!FieldType::Number.accepts(DocumentKind::String));
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "section_type": "history",
            "fields": [
                {"key": "complaint", "label": "Chief complaint", "type": "string", "required": true},
                {"key": "meds", "label": "Medications", "type": "array", "itemType": "string"}
            ]
        }"#;
        let schema: SectionSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert!(schema.fields[0].required);
        assert_eq!(schema.fields[1].item_type, Some(FieldType::String));
        assert!(schema.check().is_ok());
    }

    #[test]
    fn check_rejects_duplicate_siblings() {
        let schema = SectionSchema::new(
            "exam",
            vec![FieldSchema::new("a", "A", FieldType::Object).with_children(vec![
                FieldSchema::new("x", "X", FieldType::String),
                FieldSchema::new("x", "X again", FieldType::Number),
            ])],
        );
        match schema.check() {
            Err(SchemaError::DuplicateKey { path, .. }) => assert_eq!(path, "a.x"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn check_rejects_unaddressable_keys() {
        for key in ["", "a.b", "12"] {
            let schema = SectionSchema::new("exam", vec![FieldSchema::new(key, "k", FieldType::String)]);
            assert!(matches!(schema.check(), Err(SchemaError::InvalidKey { .. })));
        }
    }

    #[test]
    fn same_key_in_different_branches_is_fine() {
        let schema = SectionSchema::new(
            "exam",
            vec![
                FieldSchema::new("left", "L", FieldType::Object)
                    .with_children(vec![FieldSchema::new("note", "N", FieldType::String)]),
                FieldSchema::new("right", "R", FieldType::Object)
                    .with_children(vec![FieldSchema::new("note", "N", FieldType::String)]),
            ],
        );
        assert!(schema.check().is_ok());
    }
}
