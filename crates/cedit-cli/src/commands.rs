//! Command implementations
//!
//! Each command reads JSON inputs, drives the engine against in-memory
//! stores and returns a JSON document for stdout.

use anyhow::Context;
use cedit_core::{
    EngineConfig, InMemoryReportStore, InMemorySectionRowStore, ReconcileRequest, Report, SectionRow,
    SectionStoreReconciler, UpdateService,
};
use cedit_schema::SchemaRegistry;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs of `apply`
#[derive(Debug, Clone)]
pub struct ApplyArgs {
    /// Section rows file
    pub rows: PathBuf,
    /// Update batch file
    pub batch: PathBuf,
    /// Optional schemas file
    pub schemas: Option<PathBuf>,
    /// Rewrite the rows file
    pub write: bool,
}

/// Inputs of `reconcile`
#[derive(Debug, Clone)]
pub struct ReconcileArgs {
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Owner whose reports are reconciled
    pub owner: String,
    /// Single report instead of every owned report
    pub report: Option<String>,
    /// Rewrite the snapshot file
    pub write: bool,
}

/// Reports and rows persisted together for offline reconciliation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Reports with embedded sections
    #[serde(default)]
    pub reports: Vec<Report>,
    /// Normalized section rows
    #[serde(default)]
    pub rows: Vec<SectionRow>,
}

/// Engine configuration from `--config`, or defaults
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .await
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Apply a batch to the rows in a file
///
/// # Errors
/// Returns error if inputs cannot be read or the batch cannot be decoded
pub async fn apply(config: &EngineConfig, args: ApplyArgs) -> anyhow::Result<Value> {
    let rows: Vec<SectionRow> = read_json(&args.rows).await?;
    let body = match read_json::<Value>(&args.batch).await? {
        Value::Array(entries) => json!({ "updates": entries }),
        other => other,
    };
    let schemas = match &args.schemas {
        Some(path) => load_schemas(path).await?,
        None => SchemaRegistry::new(),
    };

    let service = UpdateService::new(
        Arc::new(InMemorySectionRowStore::new()),
        Arc::new(schemas),
        config.clone(),
    );
    let (response, rows) = service.apply_offline(rows, &body)?;
    tracing::info!(
        applied = response.applied_count,
        skipped = response.skipped_count,
        "batch applied"
    );

    if args.write && response.applied_count > 0 {
        write_json(&args.rows, &rows).await?;
    }

    Ok(json!({ "response": response, "rows": rows }))
}

/// Run one reconciliation cycle over a snapshot file
///
/// # Errors
/// Returns error if the snapshot cannot be read or written, or the owner's
/// reports cannot be listed
pub async fn reconcile(args: ReconcileArgs) -> anyhow::Result<Value> {
    let snapshot: Snapshot = read_json(&args.snapshot).await?;
    let reports = Arc::new(InMemoryReportStore::with_reports(snapshot.reports));
    let rows = Arc::new(InMemorySectionRowStore::with_rows(snapshot.rows));

    let request = match args.report {
        Some(id) => ReconcileRequest::report(id),
        None => ReconcileRequest::all(),
    };
    let summary = SectionStoreReconciler::new(reports.clone(), rows.clone())
        .reconcile(&args.owner, &request)
        .await?;

    if args.write {
        let repaired = Snapshot {
            reports: reports.snapshot(),
            rows: rows.snapshot(),
        };
        write_json(&args.snapshot, &repaired).await?;
    }

    Ok(serde_json::to_value(summary)?)
}

/// Requestable fields of one section type
///
/// # Errors
/// Returns error if the schemas cannot be loaded or the type is unknown
pub async fn fields(schemas: &Path, section_type: &str) -> anyhow::Result<Value> {
    let registry = load_schemas(schemas).await?;
    let schema = registry
        .get(section_type)
        .with_context(|| format!("no schema for section_type: {section_type}"))?;
    Ok(json!({
        "section_type": section_type,
        "fields": schema.requestable_fields(),
    }))
}

async fn load_schemas(path: &Path) -> anyhow::Result<SchemaRegistry> {
    let text = read_text(path).await?;
    SchemaRegistry::from_json(&text).with_context(|| format!("loading schemas {}", path.display()))
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).with_context(|| format!("decoding {}", path.display()))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
