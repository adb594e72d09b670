//! Testing utilities for the cedit workspace
//!
//! Shared fixtures: a small schema registry, seeded in-memory stores and
//! update-entry builders.

#![allow(missing_docs)]

use cedit_core::{
    EmbeddedSection, EngineConfig, InMemoryReportStore, InMemorySectionRowStore, Report, SectionRow,
    SectionStoreReconciler, UpdateService,
};
use cedit_document::Document;
use cedit_schema::{FieldSchema, FieldType, SchemaRegistry, SectionSchema};
use serde_json::{json, Value};
use std::sync::Arc;

pub const OWNER: &str = "clinician-1";
pub const REPORT_ID: &str = "report-1";

/// Vital signs and a nested exam object
pub fn vitals_schema() -> SectionSchema {
    SectionSchema::new(
        "vitals",
        vec![
            FieldSchema::new("bp", "Blood pressure", FieldType::String).required(),
            FieldSchema::new("hr", "Heart rate", FieldType::Number),
            FieldSchema::new("notes", "Notes", FieldType::Array).with_item_type(FieldType::String),
            FieldSchema::new("exam", "Exam", FieldType::Object).with_children(vec![
                FieldSchema::new("skin", "Skin", FieldType::String),
                FieldSchema::new("chest", "Chest", FieldType::String),
            ]),
        ],
    )
}

pub fn history_schema() -> SectionSchema {
    SectionSchema::new(
        "history",
        vec![
            FieldSchema::new("hpi", "History of present illness", FieldType::String),
            FieldSchema::new("meds", "Medications", FieldType::Array).with_children(vec![
                FieldSchema::new("name", "Name", FieldType::String),
                FieldSchema::new("dose", "Dose", FieldType::String),
            ]),
        ],
    )
}

pub fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(vitals_schema()).unwrap();
    registry.register(history_schema()).unwrap();
    Arc::new(registry)
}

pub fn row(id: &str, section_type: &str, data: Value) -> SectionRow {
    SectionRow::new(id, REPORT_ID, section_type).with_data(data)
}

pub fn rows_store(rows: impl IntoIterator<Item = SectionRow>) -> Arc<InMemorySectionRowStore> {
    Arc::new(InMemorySectionRowStore::with_rows(rows))
}

pub fn update_service(rows: &Arc<InMemorySectionRowStore>) -> UpdateService {
    update_service_with(rows, EngineConfig::default())
}

pub fn update_service_with(rows: &Arc<InMemorySectionRowStore>, config: EngineConfig) -> UpdateService {
    UpdateService::new(rows.clone(), registry(), config)
}

pub fn embedded(id: &str, section_type: &str, data: Value) -> EmbeddedSection {
    EmbeddedSection::new(id).with_type(section_type).with_data(data)
}

pub fn report(sections: Vec<EmbeddedSection>) -> Report {
    Report::new(REPORT_ID, OWNER).with_sections(sections)
}

pub fn reconciler(
    reports: &Arc<InMemoryReportStore>,
    rows: &Arc<InMemorySectionRowStore>,
) -> SectionStoreReconciler {
    SectionStoreReconciler::new(reports.clone(), rows.clone())
}

/// One raw update entry
pub fn entry(section_id: &str, field_path: &str, value: Value, strategy: &str) -> Value {
    json!({
        "section_id": section_id,
        "field_path": field_path,
        "value": value,
        "merge_strategy": strategy,
    })
}

/// Request body wrapping raw entries
pub fn batch(entries: Vec<Value>) -> Value {
    json!({ "updates": entries })
}

pub fn doc(value: Value) -> Document {
    Document::from(value)
}
