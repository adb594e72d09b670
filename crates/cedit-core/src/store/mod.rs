//! Storage seams
//!
//! The engine reaches persisted state only through these traits. Real
//! backends do I/O, so the traits are async; the in-memory implementations
//! in [`memory`] back tests and the offline CLI.

pub mod memory;

use crate::error::StoreError;
use crate::types::{EmbeddedSection, Report, SectionRow};
use async_trait::async_trait;

pub use memory::{InMemoryReportStore, InMemorySectionRowStore};

/// Reports with their embedded sections
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Ids of every report owned by `owner`, in stable order
    async fn list_report_ids(&self, owner: &str) -> Result<Vec<String>, StoreError>;

    /// Report by id
    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, StoreError>;

    /// Replace a report's embedded sections
    async fn put_sections(&self, report_id: &str, sections: Vec<EmbeddedSection>) -> Result<(), StoreError>;
}

/// Normalized section rows
#[async_trait]
pub trait SectionRowStore: Send + Sync {
    /// Rows of one report
    async fn list_by_report_id(&self, report_id: &str) -> Result<Vec<SectionRow>, StoreError>;

    /// Insert or overwrite rows by id; returns the number written
    async fn upsert_many(&self, rows: Vec<SectionRow>) -> Result<usize, StoreError>;
}
