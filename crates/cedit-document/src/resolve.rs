//! Path resolution over documents
//!
//! Structural `get` / `set` addressed by [`FieldPath`].
//!
//! `set` never overwrites a value of the wrong container kind: descending
//! through a scalar, keying into an array or indexing into an object is a
//! [`DocumentError::TypeConflict`]. A `null` along the path holds no data
//! and is replaced by the container the next step needs.

use crate::document::{Document, DocumentKind};
use crate::path::{FieldPath, PathStep};

/// Errors raised by path resolution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    /// Nothing resolvable at path
    #[error("path not found: {path}")]
    PathNotFound {
        /// Requested path
        path: String,
    },

    /// Existing structure does not admit the requested write
    #[error("type conflict at '{at}' while writing '{path}': {detail}")]
    TypeConflict {
        /// Requested path
        path: String,
        /// Prefix where the conflict occurred (empty for the root)
        at: String,
        /// What went wrong
        detail: String,
    },
}

impl DocumentError {
    fn conflict(path: &FieldPath, depth: usize, detail: String) -> Self {
        Self::TypeConflict {
            path: path.to_string(),
            at: path.prefix(depth).to_string(),
            detail,
        }
    }

    /// Check if error is a type conflict
    #[inline]
    #[must_use]
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, Self::TypeConflict { .. })
    }
}

impl Document {
    /// Resolve value at path
    ///
    /// # Errors
    /// `PathNotFound` if a key/index is absent or a step does not match the
    /// container kind found there.
    pub fn get(&self, path: &FieldPath) -> Result<&Document, DocumentError> {
        let mut current = self;
        for step in path {
            let next = match (step, current) {
                (PathStep::Key(k), Document::Object(map)) => map.get(k),
                (PathStep::Index(i), Document::Array(items)) => items.get(*i),
                _ => None,
            };
            current = next.ok_or_else(|| DocumentError::PathNotFound {
                path: path.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Resolve value at path, mapping absence to `None`
    #[inline]
    #[must_use]
    pub fn lookup(&self, path: &FieldPath) -> Option<&Document> {
        self.get(path).ok()
    }

    /// Check if path resolves
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_ok()
    }

    /// Write value at path, returning the new document
    ///
    /// Missing intermediates are created (object for a key step, array for an
    /// index step). Writing at index `len` appends one element.
    ///
    /// # Errors
    /// `TypeConflict` if an existing value has the wrong container kind for the
    /// next step, or an index lies beyond the array's length.
    pub fn set(&self, path: &FieldPath, value: Document) -> Result<Document, DocumentError> {
        set_at(Some(self), path, 0, value)
    }
}

fn set_at(
    node: Option<&Document>,
    path: &FieldPath,
    depth: usize,
    value: Document,
) -> Result<Document, DocumentError> {
    let Some(step) = path.steps().get(depth) else {
        return Ok(value);
    };

    // null holds no data, so it is filled like a missing value
    match (step, node.filter(|n| !n.is_null())) {
        (PathStep::Key(k), None) => {
            let child = set_at(None, path, depth + 1, value)?;
            let mut map = im::OrdMap::new();
            map.insert(k.clone(), child);
            Ok(Document::Object(map))
        }
        (PathStep::Key(k), Some(Document::Object(map))) => {
            let child = set_at(map.get(k), path, depth + 1, value)?;
            Ok(Document::Object(map.update(k.clone(), child)))
        }
        (PathStep::Index(i), None) => {
            if *i != 0 {
                return Err(DocumentError::conflict(
                    path,
                    depth,
                    format!("index {i} is beyond array length 0"),
                ));
            }
            let child = set_at(None, path, depth + 1, value)?;
            Ok(Document::Array(im::vector![child]))
        }
        (PathStep::Index(i), Some(Document::Array(items))) => {
            let len = items.len();
            if *i < len {
                let child = set_at(items.get(*i), path, depth + 1, value)?;
                Ok(Document::Array(items.update(*i, child)))
            } else if *i == len {
                let child = set_at(None, path, depth + 1, value)?;
                let mut extended = items.clone();
                extended.push_back(child);
                Ok(Document::Array(extended))
            } else {
                Err(DocumentError::conflict(
                    path,
                    depth,
                    format!("index {i} is beyond array length {len}"),
                ))
            }
        }
        (step, Some(other)) => {
            let expected = if step.is_index() {
                DocumentKind::Array
            } else {
                DocumentKind::Object
            };
            Err(DocumentError::conflict(
                path,
                depth,
                format!("expected {expected} for step '{step}', found {}", other.kind()),
            ))
        }
    }
}
