//! Field-level merge system
//!
//! Applies sanitized update proposals to section documents.
//!
//! # Core Concepts
//!
//! - [`UpdateProposal`]: one field update with its [`MergeStrategy`] and provenance
//! - [`MergeEngine`]: `replace`, `append` and `merge` over a [`Document`](cedit_document::Document)
//! - [`MergeEngine::apply_batch`]: left fold, later proposals see earlier results
//! - [`ProvenanceAttacher`]: bounded per-field source references
//!
//! # Example
//!
//! ```rust
//! use cedit_document::Document;
//! use cedit_merge::{MergeEngine, MergeStrategy, UpdateProposal};
//! use serde_json::json;
//!
//! let engine = MergeEngine::new();
//! let doc = Document::from(json!({"meds": ["aspirin"]}));
//! let update = UpdateProposal::new("s1", "meds".parse().unwrap(), "metformin")
//!     .with_strategy(MergeStrategy::Append);
//!
//! let applied = engine.apply(&doc, &update, None).unwrap();
//! assert_eq!(applied.document, Document::from(json!({"meds": ["aspirin", "metformin"]})));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod proposal;
mod provenance;
mod strategy;

// Re-exports
pub use engine::{AppliedChange, BatchOutcome, ChangeLogEntry, MergeEngine};
pub use proposal::{SourceRef, UpdateProposal};
pub use provenance::{ProvenanceAttacher, ProvenanceConfig, ProvenanceLog, DEFAULT_MAX_ENTRIES};
pub use strategy::{AppendConfig, MergeError, MergeStrategy, SeparatorPolicy, UnknownStrategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
