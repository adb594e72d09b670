//! Path declaration checks against a section schema
//!
//! Walks a [`SectionSchema`] one path step per level. Key steps must match a
//! child's `key`; index steps are consumed on array nodes without matching a
//! schema node and the walk continues into the item shape.

use crate::schema::{FieldSchema, FieldType, SectionSchema};
use cedit_document::{Document, FieldPath, PathStep};
use serde::Serialize;

/// Position reached while walking the schema
#[derive(Debug, Clone, Copy)]
enum Cursor<'a> {
    /// Top level of the section
    Root(&'a [FieldSchema]),
    /// At a declared field
    Field(&'a FieldSchema),
    /// Inside one item of an array field
    Item(&'a FieldSchema),
}

impl<'a> Cursor<'a> {
    fn step(self, step: &PathStep) -> Option<Cursor<'a>> {
        match (self, step) {
            (Cursor::Root(fields), PathStep::Key(k)) => {
                fields.iter().find(|f| &f.key == k).map(Cursor::Field)
            }
            (Cursor::Root(_), PathStep::Index(_)) => None,
            (Cursor::Field(node), PathStep::Key(k)) => match node.field_type {
                FieldType::Object => node.child(k).map(Cursor::Field),
                _ => None,
            },
            (Cursor::Field(node), PathStep::Index(_)) => match node.field_type {
                FieldType::Array => Some(Cursor::Item(node)),
                _ => None,
            },
            (Cursor::Item(node), PathStep::Key(k)) => node.child(k).map(Cursor::Field),
            (Cursor::Item(_), PathStep::Index(_)) => None,
        }
    }

    fn leaf_type(self) -> Option<FieldType> {
        match self {
            Cursor::Root(_) => None,
            Cursor::Field(node) => Some(node.field_type),
            Cursor::Item(node) if !node.children.is_empty() => Some(FieldType::Object),
            Cursor::Item(node) => node.item_type,
        }
    }
}

fn walk<'a>(schema: &'a SectionSchema, path: &FieldPath) -> Option<Cursor<'a>> {
    if path.is_empty() {
        return None;
    }
    path.iter()
        .try_fold(Cursor::Root(&schema.fields), |cursor, step| cursor.step(step))
}

impl SectionSchema {
    /// Check if a path is declared by this schema
    #[must_use]
    pub fn is_declared(&self, path: &FieldPath) -> bool {
        walk(self, path).is_some()
    }

    /// Declared type at path
    ///
    /// `None` when the path is undeclared, or when it indexes into an array
    /// whose item type is not declared.
    #[must_use]
    pub fn leaf_type(&self, path: &FieldPath) -> Option<FieldType> {
        walk(self, path).and_then(Cursor::leaf_type)
    }

    /// Every leaf path, depth-first in declaration order
    ///
    /// Fields without children are leaves. Arrays are leaves too: their items
    /// are addressed by index and cannot be enumerated from the schema.
    #[must_use]
    pub fn all_field_paths(&self) -> Vec<FieldPath> {
        self.requestable_fields()
            .into_iter()
            .map(|f| f.path)
            .collect()
    }

    /// Leaf fields with label and type, for an extraction request
    #[must_use]
    pub fn requestable_fields(&self) -> Vec<RequestableField> {
        let mut out = Vec::new();
        collect_leaves(&self.fields, &FieldPath::root(), &mut out);
        out
    }

    /// Required fields absent from a document
    ///
    /// Only fields reachable without an array index are checked.
    #[must_use]
    pub fn missing_required(&self, doc: &Document) -> Vec<FieldPath> {
        let mut out = Vec::new();
        collect_missing(&self.fields, &FieldPath::root(), doc, &mut out);
        out
    }
}

/// One leaf field offered to an extraction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestableField {
    /// Dot-path of the field
    pub path: FieldPath,
    /// Display label
    pub label: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Required for completeness
    pub required: bool,
}

fn collect_leaves(fields: &[FieldSchema], prefix: &FieldPath, out: &mut Vec<RequestableField>) {
    for field in fields {
        let path = prefix.child(PathStep::Key(field.key.clone()));
        if field.field_type == FieldType::Object && !field.children.is_empty() {
            collect_leaves(&field.children, &path, out);
        } else {
            out.push(RequestableField {
                path,
                label: field.label.clone(),
                field_type: field.field_type,
                required: field.required,
            });
        }
    }
}

fn collect_missing(fields: &[FieldSchema], prefix: &FieldPath, doc: &Document, out: &mut Vec<FieldPath>) {
    for field in fields {
        let path = prefix.child(PathStep::Key(field.key.clone()));
        let present = doc.lookup(&path).is_some_and(|v| !v.is_null());
        if field.required && !present {
            out.push(path.clone());
        }
        if present && field.field_type == FieldType::Object {
            collect_missing(&field.children, &path, doc, out);
        }
    }
}
