//! Clinical evaluation update engine
//!
//! Ties the pure crates to persisted state:
//! - [`UpdateService`] applies untrusted update batches to section rows
//! - [`SectionStoreReconciler`] keeps embedded sections and rows consistent
//! - [`ReportStore`] / [`SectionRowStore`] are the storage seams
//!
//! # Example
//!
//! ```rust
//! use cedit_core::{EngineConfig, InMemorySectionRowStore, SectionRow, UpdateService};
//! use cedit_schema::SchemaRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = Arc::new(InMemorySectionRowStore::with_rows([SectionRow::new("s1", "r1", "history")]));
//! let service = UpdateService::new(rows.clone(), Arc::new(SchemaRegistry::new()), EngineConfig::default());
//!
//! let response = service
//!     .apply_updates("r1", &json!({"updates": [
//!         {"section_id": "s1", "field_path": "hpi", "value": "cough", "merge_strategy": "replace"}
//!     ]}))
//!     .await?;
//!
//! assert_eq!(response.applied_count, 1);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, ReconciliationError, StoreError};
pub use reconcile::{project_embedded, ReportOutcome, SectionStoreReconciler};
pub use service::UpdateService;
pub use store::{InMemoryReportStore, InMemorySectionRowStore, ReportStore, SectionRowStore};
pub use types::{
    EmbeddedSection, ReconcileRequest, ReconcileSummary, Report, ReportFailure, SectionRow,
    UpdateBatchResponse,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{
        EngineConfig, EngineError, ReconcileRequest, ReconcileSummary, Report, ReportStore,
        SectionRow, SectionRowStore, SectionStoreReconciler, UpdateBatchResponse, UpdateService,
    };
    pub use cedit_document::{Document, FieldPath};
    pub use cedit_merge::{MergeStrategy, SourceRef, UpdateProposal};
    pub use cedit_schema::{SchemaRegistry, SectionSchema};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
