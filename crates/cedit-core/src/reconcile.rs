//! Section store reconciliation
//!
//! A report keeps its sections twice: embedded in the report's `sections`
//! array and as normalized rows keyed by section id. One cycle per report:
//!
//! 1. **mirror**: embedded entries whose id matches a row with non-null
//!    `structured_data` take the row's data (the row is the source of truth)
//! 2. **upsert**: rows are derived from the embedded array (array position is
//!    `order`) and written when new or changed
//!
//! After one cycle both sides agree, so an immediate second cycle writes nothing.

use crate::error::ReconciliationError;
use crate::store::{ReportStore, SectionRowStore};
use crate::types::{EmbeddedSection, ReconcileRequest, ReconcileSummary, ReportFailure, SectionRow};
use cedit_document::{Document, DocumentHash};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of reconciling one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    /// Rows inserted or changed
    pub upserted: usize,
    /// Embedded entries overwritten from rows
    pub mirrored: usize,
    /// Embedded entries without an id
    pub skipped: usize,
}

/// Aligns embedded sections with normalized rows
pub struct SectionStoreReconciler {
    reports: Arc<dyn ReportStore>,
    rows: Arc<dyn SectionRowStore>,
}

impl std::fmt::Debug for SectionStoreReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionStoreReconciler").finish_non_exhaustive()
    }
}

impl SectionStoreReconciler {
    /// Create reconciler over two stores
    #[inline]
    #[must_use]
    pub fn new(reports: Arc<dyn ReportStore>, rows: Arc<dyn SectionRowStore>) -> Self {
        Self { reports, rows }
    }

    /// Reconcile one report, or every report owned by `owner`
    ///
    /// Reports are processed sequentially; a failing report is recorded in
    /// `per_report_errors` and the run continues.
    ///
    /// # Errors
    /// Returns error only if the owner's reports cannot be listed
    pub async fn reconcile(&self, owner: &str, request: &ReconcileRequest) -> Result<ReconcileSummary, ReconciliationError> {
        let report_ids = match &request.report_id {
            Some(id) => vec![id.clone()],
            None => self.reports.list_report_ids(owner).await?,
        };
        tracing::info!(owner, reports = report_ids.len(), "reconciling section stores");

        let mut summary = ReconcileSummary::default();
        for report_id in report_ids {
            match self.reconcile_report(owner, &report_id).await {
                Ok(outcome) => {
                    tracing::debug!(
                        report_id = %report_id,
                        upserted = outcome.upserted,
                        mirrored = outcome.mirrored,
                        "report reconciled"
                    );
                    summary.processed_reports += 1;
                    summary.total_upserted += outcome.upserted;
                    summary.total_mirrored += outcome.mirrored;
                    summary.skipped_entries += outcome.skipped;
                }
                Err(e) => {
                    tracing::error!(report_id = %report_id, error = %e, "report reconciliation failed");
                    summary.per_report_errors.push(ReportFailure {
                        report_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            processed = summary.processed_reports,
            upserted = summary.total_upserted,
            mirrored = summary.total_mirrored,
            failed = summary.per_report_errors.len(),
            "reconciliation finished"
        );
        Ok(summary)
    }

    /// Run one cycle for a single report owned by `owner`
    ///
    /// # Errors
    /// Returns error if the report is missing, owned by someone else, or a
    /// store call fails
    pub async fn reconcile_report(&self, owner: &str, report_id: &str) -> Result<ReportOutcome, ReconciliationError> {
        let report = self
            .reports
            .get_report(report_id)
            .await?
            .ok_or_else(|| ReconciliationError::ReportNotFound(report_id.to_string()))?;
        if report.owner != owner {
            return Err(ReconciliationError::NotOwner {
                report_id: report_id.to_string(),
                owner: owner.to_string(),
            });
        }
        let rows: HashMap<String, SectionRow> = self
            .rows
            .list_by_report_id(report_id)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let mut sections = report.sections;
        let mirrored = mirror_to_embedded(&mut sections, &rows);
        let (upserts, skipped) = upsert_from_embedded(report_id, &sections, &rows);

        let upserted = upserts.len();
        if !upserts.is_empty() {
            self.rows.upsert_many(upserts).await?;
        }
        if mirrored > 0 {
            self.reports.put_sections(report_id, sections).await?;
        }

        Ok(ReportOutcome {
            upserted,
            mirrored,
            skipped: skipped.len(),
        })
    }
}

/// Overwrite embedded data from rows; returns the number of entries changed
fn mirror_to_embedded(sections: &mut [EmbeddedSection], rows: &HashMap<String, SectionRow>) -> usize {
    let mut mirrored = 0;
    let mut seen = HashSet::new();
    for (position, entry) in sections.iter_mut().enumerate() {
        let mut changed = false;

        // repeated ids are left alone, matching the upsert side
        let first = entry.id().filter(|id| seen.insert(id.to_string()));
        if let Some(row) = first.and_then(|id| rows.get(id)) {
            if !row.structured_data.is_null() && entry.structured_data.as_ref() != Some(&row.structured_data) {
                tracing::debug!(
                    section_id = %row.id,
                    from = %entry.structured_data.as_ref().map_or_else(String::new, |d| DocumentHash::of(d).short()),
                    to = %DocumentHash::of(&row.structured_data).short(),
                    "mirroring row data"
                );
                entry.structured_data = Some(row.structured_data.clone());
                changed = true;
            }
        }

        let position = to_order(position);
        if entry.order.is_some_and(|o| o != position) {
            entry.order = Some(position);
            changed = true;
        }

        if changed {
            mirrored += 1;
        }
    }
    mirrored
}

/// Rows that differ from what the embedded array implies, plus indices of
/// skipped entries
///
/// Entries without an id are skipped. When an id repeats, the first entry
/// wins and later ones are skipped.
fn upsert_from_embedded(
    report_id: &str,
    sections: &[EmbeddedSection],
    rows: &HashMap<String, SectionRow>,
) -> (Vec<SectionRow>, Vec<usize>) {
    let mut upserts = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for (position, entry) in sections.iter().enumerate() {
        let Some(id) = entry.id() else {
            tracing::warn!(report_id, index = position, "embedded section without id skipped");
            skipped.push(position);
            continue;
        };
        if !seen.insert(id) {
            tracing::warn!(report_id, index = position, id, "duplicate embedded section id skipped");
            skipped.push(position);
            continue;
        }
        let existing = rows.get(id);

        let derived = SectionRow {
            id: id.to_string(),
            report_id: report_id.to_string(),
            title: entry
                .title
                .clone()
                .or_else(|| existing.map(|r| r.title.clone()))
                .unwrap_or_default(),
            section_type: entry
                .section_type
                .clone()
                .or_else(|| existing.map(|r| r.section_type.clone()))
                .unwrap_or_default(),
            structured_data: entry
                .structured_data
                .clone()
                .or_else(|| existing.map(|r| r.structured_data.clone()))
                .unwrap_or(Document::Null),
            order: to_order(position),
            field_provenance: existing.map(|r| r.field_provenance.clone()).unwrap_or_default(),
        };

        if existing.map_or(true, |r| !r.same_content(&derived)) {
            upserts.push(derived);
        }
    }

    (upserts, skipped)
}

/// Rebuild an embedded array purely from rows, ordered by `order` then id
#[must_use]
pub fn project_embedded(rows: &[SectionRow]) -> Vec<EmbeddedSection> {
    let mut sorted: Vec<&SectionRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    sorted.into_iter().map(EmbeddedSection::from).collect()
}

fn to_order(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryReportStore, InMemorySectionRowStore};
    use crate::types::Report;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup(
        reports: Vec<Report>,
        rows: Vec<SectionRow>,
    ) -> (Arc<InMemoryReportStore>, Arc<InMemorySectionRowStore>, SectionStoreReconciler) {
        let reports = Arc::new(InMemoryReportStore::with_reports(reports));
        let rows = Arc::new(InMemorySectionRowStore::with_rows(rows));
        let reconciler = SectionStoreReconciler::new(reports.clone(), rows.clone());
        (reports, rows, reconciler)
    }

    #[tokio::test]
    async fn row_wins_and_cycle_converges() {
        let (reports, rows, reconciler) = setup(
            vec![Report::new("r1", "u").with_sections(vec![EmbeddedSection::new("s1")
                .with_type("vitals")
                .with_data(json!({"x": 1}))])],
            vec![SectionRow::new("s1", "r1", "vitals").with_data(json!({"x": 2}))],
        );

        let first = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        assert_eq!(first.processed_reports, 1);
        assert_eq!(first.total_mirrored, 1);

        let embedded = reports.report("r1").unwrap().sections[0].structured_data.clone();
        assert_eq!(embedded, Some(Document::from(json!({"x": 2}))));
        assert_eq!(rows.row("s1").unwrap().structured_data, Document::from(json!({"x": 2})));

        let second = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        assert_eq!(second.total_mirrored, 0);
        assert_eq!(second.total_upserted, 0);
    }

    #[tokio::test]
    async fn missing_rows_are_created_with_position_order() {
        let (_reports, rows, reconciler) = setup(
            vec![Report::new("r1", "u").with_sections(vec![
                EmbeddedSection::new("a").with_type("t").with_data(json!({"k": 1})),
                EmbeddedSection::default(),
                EmbeddedSection::new("b").with_type("t"),
            ])],
            vec![],
        );

        let summary = reconciler.reconcile("u", &ReconcileRequest::report("r1")).await.unwrap();
        assert_eq!(summary.total_upserted, 2);
        assert_eq!(summary.skipped_entries, 1);
        assert_eq!(rows.row("a").unwrap().order, 0);
        assert_eq!(rows.row("b").unwrap().order, 2);
        assert_eq!(rows.row("b").unwrap().structured_data, Document::Null);
    }

    #[tokio::test]
    async fn null_row_data_does_not_mirror() {
        let (reports, rows, reconciler) = setup(
            vec![Report::new("r1", "u").with_sections(vec![EmbeddedSection::new("s").with_data(json!({"a": 1}))])],
            vec![SectionRow::new("s", "r1", "").with_data(Document::Null)],
        );

        let summary = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        assert_eq!(summary.total_mirrored, 0);
        assert_eq!(summary.total_upserted, 1);
        assert_eq!(reports.write_count(), 0);
        assert_eq!(rows.row("s").unwrap().structured_data, Document::from(json!({"a": 1})));
    }

    #[tokio::test]
    async fn failing_report_is_isolated() {
        let (_reports, rows, reconciler) = setup(
            vec![
                Report::new("r1", "u").with_sections(vec![EmbeddedSection::new("a")]),
                Report::new("r2", "u").with_sections(vec![EmbeddedSection::new("b")]),
            ],
            vec![],
        );
        rows.fail_on("r1");

        let summary = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        assert_eq!(summary.processed_reports, 1);
        assert_eq!(summary.per_report_errors.len(), 1);
        assert_eq!(summary.per_report_errors[0].report_id, "r1");
        assert!(rows.row("b").is_some());
    }

    #[tokio::test]
    async fn unknown_report_is_recorded() {
        let (_reports, _rows, reconciler) = setup(vec![], vec![]);
        let summary = reconciler.reconcile("u", &ReconcileRequest::report("ghost")).await.unwrap();
        assert_eq!(summary.processed_reports, 0);
        assert_eq!(summary.per_report_errors[0].reason, "report not found: ghost");
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_entry_and_converge() {
        let (_reports, rows, reconciler) = setup(
            vec![Report::new("r1", "u").with_sections(vec![
                EmbeddedSection::new("a").with_type("t").with_data(json!({"k": 1})),
                EmbeddedSection::new("a").with_type("t").with_data(json!({"k": 2})),
            ])],
            vec![],
        );

        let first = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        assert_eq!(first.total_upserted, 1);
        assert_eq!(first.skipped_entries, 1);
        assert_eq!(rows.row("a").unwrap().order, 0);
        assert_eq!(rows.row("a").unwrap().structured_data, Document::from(json!({"k": 1})));

        for _ in 0..3 {
            let again = reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
            assert_eq!(again.total_upserted, 0);
            assert_eq!(again.total_mirrored, 0);
        }
    }

    #[tokio::test]
    async fn report_of_another_owner_is_refused() {
        let (reports, rows, reconciler) = setup(
            vec![Report::new("r-bob", "bob").with_sections(vec![EmbeddedSection::new("s").with_data(json!({"a": 1}))])],
            vec![],
        );

        let summary = reconciler
            .reconcile("mallory", &ReconcileRequest::report("r-bob"))
            .await
            .unwrap();
        assert_eq!(summary.processed_reports, 0);
        assert_eq!(summary.per_report_errors[0].reason, "report r-bob is not owned by mallory");
        assert!(rows.row("s").is_none());
        assert_eq!(reports.write_count(), 0);
    }

    #[tokio::test]
    async fn provenance_survives_upsert() {
        let mut row = SectionRow::new("s", "r1", "t").with_data(json!({"a": 1}));
        row.title = "Old".to_string();
        row.field_provenance = serde_json::from_value(json!({"a": [{"artifactId": "doc"}]})).unwrap();
        let (_reports, rows, reconciler) = setup(
            vec![Report::new("r1", "u").with_sections(vec![EmbeddedSection {
                title: Some("New".to_string()),
                ..EmbeddedSection::new("s")
            }])],
            vec![row],
        );

        reconciler.reconcile("u", &ReconcileRequest::all()).await.unwrap();
        let row = rows.row("s").unwrap();
        assert_eq!(row.title, "New");
        assert_eq!(row.field_provenance.len(), 1);
    }

    #[test]
    fn projection_sorts_by_order() {
        let rows = vec![
            SectionRow::new("b", "r", "t").with_order(1),
            SectionRow::new("a", "r", "t").with_order(0),
        ];
        let ids: Vec<_> = project_embedded(&rows).into_iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn embedded_order_normalized_to_position() {
        let mut sections = vec![EmbeddedSection {
            order: Some(5),
            ..EmbeddedSection::new("a")
        }];
        assert_eq!(mirror_to_embedded(&mut sections, &HashMap::new()), 1);
        assert_eq!(sections[0].order, Some(0));
    }
}
