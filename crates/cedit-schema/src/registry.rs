//! Schema registry keyed by section type
//!
//! Provides [`SchemaRegistry`] for looking up the [`SectionSchema`] of a
//! section. Section types without a registered schema resolve to `None`,
//! which callers treat as permissive.

use crate::schema::{SchemaError, SectionSchema};
use std::collections::HashMap;

/// Registry of section schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SectionSchema>,
}

impl SchemaRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON array of section schemas
    ///
    /// # Errors
    /// Returns error if JSON is malformed or any schema fails [`SectionSchema::check`]
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schemas: Vec<SectionSchema> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Register (or replace) a schema
    ///
    /// # Errors
    /// Returns error if the schema fails structural checks
    pub fn register(&mut self, schema: SectionSchema) -> Result<Option<SectionSchema>, SchemaError> {
        schema.check()?;
        Ok(self.schemas.insert(schema.section_type.clone(), schema))
    }

    /// Schema for a section type
    #[inline]
    #[must_use]
    pub fn get(&self, section_type: &str) -> Option<&SectionSchema> {
        self.schemas.get(section_type)
    }

    /// Check if a section type has a schema
    #[inline]
    #[must_use]
    pub fn contains(&self, section_type: &str) -> bool {
        self.schemas.contains_key(section_type)
    }

    /// Registered section types, sorted
    #[must_use]
    pub fn section_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.schemas.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered schemas
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType};

    #[test]
    fn register_and_lookup() {
        let mut registry = SchemaRegistry::new();
        let schema = SectionSchema::new("history", vec![FieldSchema::new("hpi", "HPI", FieldType::String)]);
        assert!(registry.register(schema).unwrap().is_none());
        assert!(registry.contains("history"));
        assert!(registry.get("history").is_some());
        assert!(registry.get("exam").is_none());
    }

    #[test]
    fn register_replaces() {
        let mut registry = SchemaRegistry::new();
        registry.register(SectionSchema::new("h", vec![])).unwrap();
        let previous = registry.register(SectionSchema::new("h", vec![])).unwrap();
        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_json_loads_all() {
        let json = r#"[
            {"section_type": "b", "fields": []},
            {"section_type": "a", "fields": [{"key": "x", "label": "X", "type": "number"}]}
        ]"#;
        let registry = SchemaRegistry::from_json(json).unwrap();
        assert_eq!(registry.section_types(), vec!["a", "b"]);
    }

    #[test]
    fn from_json_rejects_bad_schema() {
        let json = r#"[{"section_type": "a", "fields": [
            {"key": "x", "label": "X", "type": "number"},
            {"key": "x", "label": "X", "type": "string"}
        ]}]"#;
        assert!(matches!(
            SchemaRegistry::from_json(json),
            Err(SchemaError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn from_json_rejects_unknown_type() {
        let json = r#"[{"section_type": "a", "fields": [{"key": "x", "label": "X", "type": "date"}]}]"#;
        assert!(matches!(SchemaRegistry::from_json(json), Err(SchemaError::Decode(_))));
    }
}
