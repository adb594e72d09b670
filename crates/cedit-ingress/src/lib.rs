//! Update batch ingress
//!
//! The trusted boundary between untrusted update batches (typically produced
//! by an extraction model) and the merge engine.
//!
//! # Architecture
//!
//! ```text
//! { updates } → decode → [entry] → sanitize → valid_updates + errors → MergeEngine
//!                 ↓
//!             ParseError (whole batch)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cedit_ingress::ProposalSanitizer;
//! use serde_json::json;
//!
//! let sanitizer = ProposalSanitizer::default();
//! let batch = sanitizer
//!     .process(&json!({"updates": [
//!         {"section_id": "s1", "field_path": "hpi", "value": "cough", "merge_strategy": "append"},
//!         {"section_id": "s1", "field_path": "hpi", "merge_strategy": "append"}
//!     ]}))
//!     .unwrap();
//!
//! assert_eq!(batch.valid_updates.len(), 1);
//! assert_eq!(batch.errors[0].reason, "missing value");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod sanitizer;

// Re-exports for convenience
pub use error::{ParseError, ValidationError};
pub use sanitizer::{IngressConfig, ProposalSanitizer, SanitizedBatch, DEFAULT_MAX_BATCH_SIZE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for batch ingress
    pub use crate::error::{ParseError, ValidationError};
    pub use crate::sanitizer::{IngressConfig, ProposalSanitizer, SanitizedBatch};
    pub use cedit_merge::{MergeStrategy, SourceRef, UpdateProposal};
}
