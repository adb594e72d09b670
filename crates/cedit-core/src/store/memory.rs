//! In-memory stores
//!
//! Thread-safe via `parking_lot` locks. Failures can be injected per
//! report id to exercise error isolation.

use super::{ReportStore, SectionRowStore};
use crate::error::StoreError;
use crate::types::{EmbeddedSection, Report, SectionRow};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reports held in memory, keyed by id
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<BTreeMap<String, Report>>,
    failing: RwLock<BTreeSet<String>>,
    writes: AtomicUsize,
}

impl InMemoryReportStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding `reports`
    #[must_use]
    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let store = Self::new();
        for report in reports {
            store.insert(report);
        }
        store
    }

    /// Insert or replace a report
    pub fn insert(&self, report: Report) {
        self.reports.write().insert(report.id.clone(), report);
    }

    /// Report by id (synchronous)
    #[must_use]
    pub fn report(&self, report_id: &str) -> Option<Report> {
        self.reports.read().get(report_id).cloned()
    }

    /// All reports, ordered by id
    #[must_use]
    pub fn snapshot(&self) -> Vec<Report> {
        self.reports.read().values().cloned().collect()
    }

    /// Make every access to `report_id` fail
    pub fn fail_on(&self, report_id: impl Into<String>) {
        self.failing.write().insert(report_id.into());
    }

    /// Number of successful `put_sections` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn check(&self, report_id: &str) -> Result<(), StoreError> {
        if self.failing.read().contains(report_id) {
            Err(StoreError::backend(format!("injected failure for report {report_id}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn list_report_ids(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .reports
            .read()
            .values()
            .filter(|r| r.owner == owner)
            .map(|r| r.id.clone())
            .collect())
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, StoreError> {
        self.check(report_id)?;
        Ok(self.report(report_id))
    }

    async fn put_sections(&self, report_id: &str, sections: Vec<EmbeddedSection>) -> Result<(), StoreError> {
        self.check(report_id)?;
        let mut reports = self.reports.write();
        let report = reports
            .get_mut(report_id)
            .ok_or_else(|| StoreError::NotFound(report_id.to_string()))?;
        report.sections = sections;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Section rows held in memory, keyed by id
#[derive(Debug, Default)]
pub struct InMemorySectionRowStore {
    rows: RwLock<BTreeMap<String, SectionRow>>,
    failing: RwLock<BTreeSet<String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemorySectionRowStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding `rows`
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = SectionRow>) -> Self {
        let store = Self::new();
        for row in rows {
            store.insert(row);
        }
        store
    }

    /// Insert or replace a row
    pub fn insert(&self, row: SectionRow) {
        self.rows.write().insert(row.id.clone(), row);
    }

    /// Row by id (synchronous)
    #[must_use]
    pub fn row(&self, id: &str) -> Option<SectionRow> {
        self.rows.read().get(id).cloned()
    }

    /// All rows, ordered by id
    #[must_use]
    pub fn snapshot(&self) -> Vec<SectionRow> {
        self.rows.read().values().cloned().collect()
    }

    /// Make every access for `report_id` fail
    pub fn fail_on(&self, report_id: impl Into<String>) {
        self.failing.write().insert(report_id.into());
    }

    /// Number of successful `list_by_report_id` calls
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of successful `upsert_many` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn check(&self, report_id: &str) -> Result<(), StoreError> {
        if self.failing.read().contains(report_id) {
            Err(StoreError::backend(format!("injected failure for report {report_id}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SectionRowStore for InMemorySectionRowStore {
    async fn list_by_report_id(&self, report_id: &str) -> Result<Vec<SectionRow>, StoreError> {
        self.check(report_id)?;
        let mut rows: Vec<_> = self
            .rows
            .read()
            .values()
            .filter(|r| r.report_id == report_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(rows)
    }

    async fn upsert_many(&self, rows: Vec<SectionRow>) -> Result<usize, StoreError> {
        for row in &rows {
            self.check(&row.report_id)?;
        }
        let count = rows.len();
        let mut stored = self.rows.write();
        for row in rows {
            stored.insert(row.id.clone(), row);
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(count)
    }
}
