//! Section Schema System
//!
//! Field-schema trees describing which dot-paths a section type accepts.
//!
//! # Overview
//!
//! - **SectionSchema**: tree of [`FieldSchema`] nodes for one section type
//! - **Declaration checks**: [`SectionSchema::is_declared`], [`SectionSchema::leaf_type`]
//! - **Enumeration**: [`SectionSchema::all_field_paths`], [`SectionSchema::requestable_fields`]
//! - **SchemaRegistry**: lookup by `section_type`, permissive when absent
//!
//! # Example
//!
//! ```rust
//! use cedit_schema::{FieldSchema, FieldType, SectionSchema};
//!
//! let schema = SectionSchema::new(
//!     "vitals",
//!     vec![FieldSchema::new("bp", "Blood pressure", FieldType::String)],
//! );
//!
//! assert!(schema.is_declared(&"bp".parse().unwrap()));
//! assert!(!schema.is_declared(&"temp".parse().unwrap()));
//! ```

#![warn(missing_docs)]

pub mod registry;
pub mod schema;
pub mod validation;

// Re-exports
pub use registry::SchemaRegistry;
pub use schema::{FieldSchema, FieldType, SchemaError, SectionSchema};
pub use validation::RequestableField;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for schema operations
    pub use crate::{FieldSchema, FieldType, RequestableField, SchemaRegistry, SectionSchema};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
