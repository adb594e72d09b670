//! Update service
//!
//! Runs one update batch against a report's section rows:
//!
//! ```text
//! body → sanitize → read rows → [resolve section → schema check → merge → provenance]* → write rows
//! ```
//!
//! Storage is touched exactly twice per request (one read, one write). Every
//! step between the two is synchronous.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::SectionRowStore;
use crate::types::{SectionRow, UpdateBatchResponse};
use cedit_document::{Document, DocumentHash};
use cedit_ingress::{ProposalSanitizer, SanitizedBatch, ValidationError};
use cedit_merge::{ChangeLogEntry, MergeEngine, MergeStrategy, ProvenanceAttacher, UpdateProposal};
use cedit_schema::SchemaRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Applies update batches to persisted section rows
pub struct UpdateService {
    rows: Arc<dyn SectionRowStore>,
    schemas: Arc<SchemaRegistry>,
    config: EngineConfig,
    sanitizer: ProposalSanitizer,
    engine: MergeEngine,
    attacher: ProvenanceAttacher,
}

impl std::fmt::Debug for UpdateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateService")
            .field("schemas", &self.schemas.section_types())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UpdateService {
    /// Create service
    #[must_use]
    pub fn new(rows: Arc<dyn SectionRowStore>, schemas: Arc<SchemaRegistry>, config: EngineConfig) -> Self {
        Self {
            rows,
            schemas,
            sanitizer: ProposalSanitizer::new(config.ingress),
            engine: MergeEngine::new().with_append_config(config.append.clone()),
            attacher: ProvenanceAttacher::new(config.provenance),
            config,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply a raw batch `{ "updates": ... }` to one report
    ///
    /// A batch that cannot be decoded returns a rejected response with
    /// `appliedCount: 0` and no storage access.
    ///
    /// # Errors
    /// Returns error only if reading or writing rows fails
    pub async fn apply_updates(&self, report_id: &str, body: &Value) -> Result<UpdateBatchResponse, EngineError> {
        let batch = match self.sanitizer.process(body) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(report_id, error = %e, "update batch rejected");
                return Ok(UpdateBatchResponse::rejected(e));
            }
        };
        tracing::info!(
            report_id,
            total = batch.total(),
            valid = batch.valid_updates.len(),
            "applying update batch"
        );

        if batch.valid_updates.is_empty() {
            return Ok(Pass::rejected_only(batch.errors).respond());
        }

        let rows = self.rows.list_by_report_id(report_id).await?;
        let mut pass = self.run(rows, &batch);
        let response = pass.respond();

        if !pass.touched.is_empty() {
            let written: Vec<SectionRow> = pass
                .touched
                .iter()
                .filter_map(|id| pass.sections.remove(id))
                .collect();
            self.rows.upsert_many(written).await?;
        }

        tracing::info!(
            report_id,
            applied = pass.changes.len(),
            skipped = pass.errors.len(),
            sections = pass.touched.len(),
            "update batch applied"
        );
        Ok(response)
    }

    /// Apply a raw batch to rows already in hand, without storage
    ///
    /// Returns the response and every row, changed or not, in input order.
    ///
    /// # Errors
    /// Returns error if the batch cannot be decoded
    pub fn apply_offline(
        &self,
        rows: Vec<SectionRow>,
        body: &Value,
    ) -> Result<(UpdateBatchResponse, Vec<SectionRow>), EngineError> {
        let batch = self.sanitizer.process(body)?;
        let order: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut pass = self.run(rows, &batch);
        let response = pass.respond();
        let rows = order.iter().filter_map(|id| pass.sections.remove(id)).collect();
        Ok((response, rows))
    }

    fn run(&self, rows: Vec<SectionRow>, batch: &SanitizedBatch) -> Pass {
        let mut pass = Pass {
            sections: rows.into_iter().map(|r| (r.id.clone(), r)).collect(),
            touched: Vec::new(),
            changes: Vec::new(),
            errors: batch.errors.clone(),
        };

        for (index, update) in batch.indexed() {
            match self.apply_one(&mut pass.sections, update) {
                Ok(change) => {
                    if !pass.touched.contains(&change.section_id) {
                        pass.touched.push(change.section_id.clone());
                    }
                    pass.changes.push(change);
                }
                Err(reason) => {
                    tracing::debug!(index, %reason, "update skipped");
                    pass.errors.push(ValidationError::new(index, reason));
                }
            }
        }

        pass.errors.sort_by_key(|e| e.index);
        pass
    }

    fn apply_one(&self, sections: &mut HashMap<String, SectionRow>, update: &UpdateProposal) -> Result<ChangeLogEntry, String> {
        let row = sections
            .get_mut(&update.section_id)
            .ok_or_else(|| format!("unknown section_id: {}", update.section_id))?;

        let schema = self.schemas.get(&row.section_type);
        match schema {
            Some(schema) if !schema.is_declared(&update.field_path) => {
                return Err(format!("undeclared field_path: {}", update.field_path));
            }
            None if self.config.strict_schema => {
                return Err(format!("no schema for section_type: {}", row.section_type));
            }
            _ => {}
        }

        if update.merge_strategy == MergeStrategy::Replace {
            if let Some(expected) = schema.and_then(|s| s.leaf_type(&update.field_path)) {
                if !expected.accepts(update.value.kind()) {
                    return Err(format!(
                        "field_path {} expects {expected}, got {}",
                        update.field_path,
                        update.value.kind()
                    ));
                }
            }
        }

        let current = if row.structured_data.is_null() {
            Document::empty_object()
        } else {
            row.structured_data.clone()
        };

        let applied = self
            .engine
            .apply(&current, update, schema)
            .map_err(|e| e.to_string())?;

        row.structured_data = applied.document;
        self.attacher.attach(&mut row.field_provenance, update);
        Ok(applied.change)
    }
}

struct Pass {
    sections: HashMap<String, SectionRow>,
    touched: Vec<String>,
    changes: Vec<ChangeLogEntry>,
    errors: Vec<ValidationError>,
}

impl Pass {
    fn rejected_only(errors: Vec<ValidationError>) -> Self {
        Self {
            sections: HashMap::new(),
            touched: Vec::new(),
            changes: Vec::new(),
            errors,
        }
    }

    fn respond(&self) -> UpdateBatchResponse {
        let section_versions = self
            .touched
            .iter()
            .filter_map(|id| {
                let row = self.sections.get(id)?;
                Some((id.clone(), DocumentHash::of(&row.structured_data)))
            })
            .collect();

        UpdateBatchResponse {
            applied_count: self.changes.len(),
            skipped_count: self.errors.len(),
            errors: self.errors.clone(),
            updated_sections: self.touched.clone(),
            section_versions,
            changes: self.changes.clone(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySectionRowStore;
    use cedit_schema::{FieldSchema, FieldType, SectionSchema};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry
            .register(SectionSchema::new(
                "vitals",
                vec![
                    FieldSchema::new("bp", "Blood pressure", FieldType::String),
                    FieldSchema::new("notes", "Notes", FieldType::Array),
                ],
            ))
            .unwrap();
        Arc::new(registry)
    }

    fn service(store: Arc<InMemorySectionRowStore>, config: EngineConfig) -> UpdateService {
        UpdateService::new(store, registry(), config)
    }

    #[tokio::test]
    async fn parse_error_touches_no_storage() {
        let store = Arc::new(InMemorySectionRowStore::new());
        let svc = service(store.clone(), EngineConfig::default());
        let response = svc.apply_updates("r1", &json!({"updates": "{oops"})).await.unwrap();
        assert!(response.is_rejected());
        assert_eq!(response.applied_count, 0);
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn one_read_one_write() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([
            SectionRow::new("s1", "r1", "free"),
            SectionRow::new("s2", "r1", "free"),
        ]));
        let svc = service(store.clone(), EngineConfig::default());
        let response = svc
            .apply_updates(
                "r1",
                &json!({"updates": [
                    {"section_id": "s1", "field_path": "a", "value": 1, "merge_strategy": "replace"},
                    {"section_id": "s2", "field_path": "b", "value": 2, "merge_strategy": "replace"}
                ]}),
            )
            .await
            .unwrap();
        assert_eq!(response.applied_count, 2);
        assert_eq!(response.updated_sections, vec!["s1", "s2"]);
        assert_eq!(
            response.section_versions.get("s1"),
            Some(&DocumentHash::of(&Document::from(json!({"a": 1}))))
        );
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn unknown_section_and_undeclared_path() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([SectionRow::new("v", "r1", "vitals")]));
        let svc = service(store.clone(), EngineConfig::default());
        let response = svc
            .apply_updates(
                "r1",
                &json!({"updates": [
                    {"section_id": "zz", "field_path": "bp", "value": "1", "merge_strategy": "replace"},
                    {"section_id": "v", "field_path": "temp", "value": 37, "merge_strategy": "replace"},
                    {"section_id": "v", "field_path": "bp", "value": "120/80", "merge_strategy": "replace"}
                ]}),
            )
            .await
            .unwrap();
        assert_eq!(response.applied_count, 1);
        assert_eq!(
            response.errors,
            vec![
                ValidationError::new(0, "unknown section_id: zz"),
                ValidationError::new(1, "undeclared field_path: temp"),
            ]
        );
        assert_eq!(
            store.row("v").unwrap().structured_data,
            Document::from(json!({"bp": "120/80"}))
        );
    }

    #[tokio::test]
    async fn replace_must_match_declared_type() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([SectionRow::new("v", "r1", "vitals")]));
        let svc = service(store.clone(), EngineConfig::default());
        let response = svc
            .apply_updates(
                "r1",
                &json!({"updates": [
                    {"section_id": "v", "field_path": "bp", "value": 120, "merge_strategy": "replace"},
                    {"section_id": "v", "field_path": "notes", "value": null, "merge_strategy": "replace"}
                ]}),
            )
            .await
            .unwrap();
        assert_eq!(response.applied_count, 1);
        assert_eq!(
            response.errors,
            vec![ValidationError::new(0, "field_path bp expects string, got number")]
        );
        assert_eq!(store.row("v").unwrap().structured_data, Document::from(json!({"notes": null})));
    }

    #[tokio::test]
    async fn strict_schema_rejects_unregistered_types() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([SectionRow::new("s", "r1", "free")]));
        let svc = service(store.clone(), EngineConfig::default().with_strict_schema(true));
        let response = svc
            .apply_updates(
                "r1",
                &json!({"updates": [{"section_id": "s", "field_path": "a", "value": 1, "merge_strategy": "replace"}]}),
            )
            .await
            .unwrap();
        assert_eq!(response.errors, vec![ValidationError::new(0, "no schema for section_type: free")]);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn null_structured_data_treated_as_empty_object() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([
            SectionRow::new("s", "r1", "free").with_data(Document::Null)
        ]));
        let svc = service(store.clone(), EngineConfig::default());
        let response = svc
            .apply_updates(
                "r1",
                &json!({"updates": [{"section_id": "s", "field_path": "a.b", "value": 1, "merge_strategy": "replace"}]}),
            )
            .await
            .unwrap();
        assert_eq!(response.applied_count, 1);
        assert_eq!(store.row("s").unwrap().structured_data, Document::from(json!({"a": {"b": 1}})));
    }

    #[tokio::test]
    async fn provenance_recorded_on_row() {
        let store = Arc::new(InMemorySectionRowStore::with_rows([SectionRow::new("v", "r1", "vitals")]));
        let svc = service(store.clone(), EngineConfig::default());
        svc.apply_updates(
            "r1",
            &json!({"updates": [{
                "section_id": "v", "field_path": "notes", "value": "pale", "merge_strategy": "append",
                "provenance": [{"artifactId": "audio-1", "startSec": 3.0, "endSec": 5.5}]
            }]}),
        )
        .await
        .unwrap();

        let row = store.row("v").unwrap();
        assert_eq!(row.structured_data, Document::from(json!({"notes": ["pale"]})));
        let refs = row.field_provenance.get(&"notes".parse().unwrap());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].artifact_id, "audio-1");
    }

    #[test]
    fn offline_returns_all_rows_in_order() {
        let svc = UpdateService::new(
            Arc::new(InMemorySectionRowStore::new()),
            registry(),
            EngineConfig::default(),
        );
        let rows = vec![SectionRow::new("b", "r", "free"), SectionRow::new("a", "r", "free")];
        let (response, rows) = svc
            .apply_offline(
                rows,
                &json!({"updates": [{"section_id": "a", "field_path": "x", "value": true, "merge_strategy": "replace"}]}),
            )
            .unwrap();
        assert_eq!(response.applied_count, 1);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(rows[1].structured_data, Document::from(json!({"x": true})));
    }

    #[test]
    fn offline_parse_error() {
        let svc = UpdateService::new(
            Arc::new(InMemorySectionRowStore::new()),
            registry(),
            EngineConfig::default(),
        );
        assert!(matches!(
            svc.apply_offline(vec![], &json!({})),
            Err(EngineError::Parse(_))
        ));
    }
}
