//! Document model for section structured data
//!
//! Persistent JSON documents addressed by dot-notation paths.
//!
//! # Core Concepts
//!
//! - [`Document`]: closed tagged union over JSON values with structural sharing
//! - [`FieldPath`]: ordered [`PathStep`]s parsed from `a.b.0.c`
//! - [`Document::get`] / [`Document::set`]: structural read and immutable write
//! - [`DocumentHash`]: Blake3 hash of the canonical encoding
//!
//! # Example
//!
//! ```rust
//! use cedit_document::{Document, FieldPath};
//! use serde_json::json;
//!
//! let doc = Document::from(json!({"vitals": {"bp": "120/80"}}));
//! let path: FieldPath = "vitals.hr".parse().unwrap();
//! let next = doc.set(&path, Document::from(72)).unwrap();
//!
//! assert_eq!(next.get(&path).unwrap(), &Document::from(72));
//! assert!(doc.get(&path).is_err()); // original unchanged
//! ```

#![warn(unreachable_pub)]

mod document;
mod hash;
mod path;
mod resolve;

pub use document::{ArrayVec, Document, DocumentKind, ObjectMap};
pub use hash::{DocumentHash, HashError};
pub use path::{FieldPath, PathError, PathStep};
pub use resolve::DocumentError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
