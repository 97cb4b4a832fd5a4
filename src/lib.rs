//! Pathkeeper – path-addressed access to nested documents.
//!
//! A document is a tree of [`node::Node`]s: scalars, ordered sequences and
//! insertion-ordered mappings. Values are addressed with slash-delimited
//! paths such as `persons/3/age`, where a `*` segment fans out over every
//! child at that level (`persons/*/age`).
//!
//! ## Modules
//! * [`node`] – The tree itself and conversions from and to `serde_json`.
//! * [`path`] – Path parsing and the [`path::PathKeeper`] that owns parsed paths.
//! * [`cursor`] – Resolution, wildcard fan-out and writes over a tree.
//! * [`cache`] – Memoized resolutions and the write invalidation policy.
//! * [`guard`] – The memory guard consulted before fan-out.
//! * [`pattern`] – Named patterns and the regex matcher behind validation.
//! * [`validation`] – Rule evaluation with statuses folded into ancestors.
//! * [`filter`] – Type coercion and callbacks applied to read results.
//! * [`config`] – Everything a document is configured with, from code or file.
//! * [`document`] – The [`document::Document`] tying the above together.
//!
//! ## Quick Start
//! ```
//! use pathkeeper::{Document, DocumentConfig, Rule};
//! let config = DocumentConfig::new()
//!     .with_pattern("age", "#^[0-9]+$#")
//!     .with_rule(Rule::new("persons/*/age", "age", true));
//! let mut doc = Document::from_json(
//!     r#"{"persons": [{"age": "34"}, {"age": "old"}]}"#,
//!     config,
//! ).unwrap();
//! assert!(doc.is_valid("persons/0").unwrap());
//! assert!(!doc.is_valid("persons/1/age").unwrap());
//! doc.set("persons/1/age", "35").unwrap();
//! assert!(doc.is_valid("").unwrap());
//! ```
//!
//! ## Caching and Validity
//! Every literal read is cached until a write invalidates it, following the
//! configured [`cache::CachePolicy`]. Validation statuses are computed on the
//! first query and discarded on every write.

pub mod cache;
pub mod config;
pub mod cursor;
pub mod document;
pub mod error;
pub mod filter;
pub mod guard;
pub mod node;
pub mod path;
pub mod pattern;
pub mod validation;

pub use cache::CachePolicy;
pub use config::DocumentConfig;
pub use cursor::{Resolved, TreeCursor};
pub use document::Document;
pub use error::{PathkeeperError, Result};
pub use filter::{CastType, FilterCallback, FilterRule};
pub use guard::{MemoryGuard, ResourceGuard};
pub use node::{Node, Scalar};
pub use path::PathSpec;
pub use validation::Rule;
