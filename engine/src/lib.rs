//! # docsync Engine
//!
//! The reconciliation core behind the `docsync` command-line tool: pull a
//! structured document from a remote content store, compare it with a local
//! edit, and push the edit back only when it is safe to do so.
//!
//! ## Design Principles
//!
//! - **No IO of its own**: the remote store is reached through the
//!   [`DocumentStore`] trait; files are read by the caller
//! - **Semantic, not textual**: documents are compared as value trees, so
//!   indentation, key order and JSON vs YAML never show up as changes
//! - **Reject, never merge**: a stale edit is refused with both revisions
//!   reported
//!
//! ## Core Concepts
//!
//! ### Values and Formats
//!
//! [`Value`] is the canonical tree every format parses into. The [`format`]
//! module converts between bytes and trees for [`Format::Json`] and
//! [`Format::Yaml`].
//!
//! ### Documents
//!
//! A [`Document`] is what the store returned: ID, revision and content. A
//! [`LocalEdit`] is the operator's new content, carrying the `_id` and
//! `_modified` it was based on.
//!
//! ### Diff
//!
//! [`compare`] produces a [`DiffResult`] of [`Change`]s; [`render`] turns it
//! into the annotated report shown to the operator.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] runs fetch, diff, optimistic lock check, and then either
//! a dry-run [`Plan`] or a save.
//!
//! ## Quick Start
//!
//! ```rust
//! use docsync_engine::{
//!     Format, LocalEdit, MemoryStore, Outcome, ReconcileOptions, Reconciler, Value,
//! };
//! use serde_json::json;
//!
//! // 1. A store holding the remote document
//! let store = MemoryStore::new();
//! store
//!     .insert("posts", Value::from(json!({"_id": "a", "_modified": 3, "title": "Old"})))
//!     .unwrap();
//!
//! // 2. The operator's edit, written in YAML
//! let edit = LocalEdit::parse(b"_id: a\n_modified: 3\ntitle: New\n", Format::Yaml).unwrap();
//!
//! // 3. Reconcile
//! let mut report = String::new();
//! let outcome = Reconciler::new(&store)
//!     .reconcile("posts", edit, None, ReconcileOptions::default(), |r| {
//!         report = r.text.clone()
//!     })
//!     .unwrap();
//!
//! assert_eq!(report, "~ title\n  - \"Old\"\n  + \"New\"\n");
//! assert!(matches!(outcome, Outcome::Committed { from: 3, to: 4, .. }));
//! ```

pub mod diff;
pub mod document;
pub mod error;
pub mod format;
pub mod path;
pub mod reconcile;
pub mod store;
pub mod value;

// Re-export main types at crate root
pub use diff::{compare, render, Change, ChangeKind, DiffResult};
pub use document::{display_revision, Document, LocalEdit, ID_FIELD, REVISION_FIELD};
pub use error::Error;
pub use error::Result;
pub use format::Format;
pub use path::{Path, Segment};
pub use reconcile::{Outcome, Plan, ReconcileOptions, Reconciler, Report};
pub use store::{DocumentStore, EntryQuery, MemoryStore};
pub use value::{Map, Number, Value};

/// Type aliases for clarity
pub type DocumentId = String;
pub type CollectionName = String;
pub type Revision = i64;
