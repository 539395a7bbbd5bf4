//! # deltadoc: Change-Tracked Documents for Versioned Stores
//!
//! This crate provides an in-memory document model in the JSON family,
//! together with the machinery to *record* every mutation made to a document
//! as a replayable operation log, and a keyed store that uses those logs as
//! deltas under an optimistic, versioned compare-and-swap protocol.
//!
//! The primary goal is efficient multi-writer persistence: instead of
//! shipping or storing a whole document after each edit, only the small,
//! ordered list of operations from the editing session needs to travel.
//! Replaying that list against the same starting document reproduces the
//! edited document exactly.
//!
//! ## Core Concepts
//!
//! - [`Document`] and [`Array`]: the two container primitives, holding
//!   [`Value`]s. A `Document` preserves field insertion order; equality is
//!   field-order-insensitive.
//! - [`Editor`]: a recording façade over a `Document`. Every mutation made
//!   through it lands in the document *and* appends one [`Operation`] to the
//!   session's [`Changes`] log. Nested containers are edited through
//!   closure-scoped sub-editors, so every recorded operation carries the
//!   [`Path`] it applies at.
//! - [`Changes`]: the ordered operation log. [`Changes::replay`] applies it
//!   to a document; [`Changes::replay_with`] additionally notifies an
//!   [`Observer`] of each state-changing operation.
//! - [`Entry`]: what a store holds against a key. Either a full snapshot or
//!   a base version plus changes to replay on top of it.
//! - [`DocumentStore`]: a keyed map of versioned documents. Writes happen
//!   through an editor inside [`DocumentStore::write`] and commit only when
//!   the caller's expected version still matches, so concurrent writers get
//!   a clean conflict instead of a lost update.
//! - [`Registry`]: the binary codec. Every value, operation, and entry
//!   variant has a stable numeric type id; the id table is append-only so
//!   persisted bytes stay readable across versions.
//!
//! ## Recorded operations replay exactly
//!
//! An operation is recorded *after* it has been applied, carrying everything
//! needed to reproduce its effect: requested arguments plus observed
//! outcomes (previous values, resolved indices, whether a conditional write
//! applied). Replay is therefore deterministic and never consults the
//! target's state to make decisions, only to apply them.
//!
//! ## Getting Started
//!
//! ```rust
//! use deltadoc::{DocumentStore, StoreConfig, Value};
//!
//! let store = DocumentStore::new(StoreConfig::default());
//!
//! // Expected version 0 creates the entry.
//! let v1 = store
//!     .write("user:7", 0, |editor| {
//!         editor.put("name", "John Doe");
//!         editor.put("age", 43);
//!     })
//!     .unwrap();
//! assert_eq!(v1, 1);
//!
//! // A second writer must present the current version...
//! let (_, version) = store.read_versioned("user:7").unwrap();
//! let v2 = store
//!     .write("user:7", version, |editor| {
//!         editor.put("age", 44);
//!     })
//!     .unwrap();
//! assert_eq!(v2, 2);
//!
//! // ...and a stale version is a conflict, not a lost update.
//! assert!(store.write("user:7", 1, |editor| { editor.remove("name"); }).is_err());
//!
//! let doc = store.read("user:7").unwrap();
//! assert_eq!(doc.get("age"), Some(&Value::Int32(44)));
//! ```
//!
//! Editing outside a store works too, and yields the log directly:
//!
//! ```rust
//! use deltadoc::{Editor, document};
//!
//! let original = document! { "tags" => deltadoc::array!["a", "b"] };
//!
//! // Isolated mode edits a clone; the original is untouched.
//! let mut editor = Editor::isolated(&original);
//! editor.edit_array("tags", |tags| {
//!     tags.add_value("c");
//! });
//! let changes = editor.changes();
//!
//! // Replaying the log against an equal document reproduces the edit.
//! let mut replica = original.clone();
//! changes.replay(&mut replica).unwrap();
//! assert_eq!(replica, editor.into_document());
//! ```
//!
//! ## Features
//!
//! - `json`: conversion of documents to and from `serde_json::Value`,
//!   including parsing and rendering. Enabled by default.
//! - `serde`: `serde` support for the document model and entry types.
//! - `chrono`: conversion between [`value::Timestamp`] and
//!   `chrono::DateTime<Utc>`. Enabled by default.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod document;
pub use document::{Array, ArrayEntry, Document};
pub mod value;
pub use value::Value;
pub mod path;
pub use path::{Path, Segment};
pub mod ops;
pub use ops::{Changes, Operation, ReplayError};
pub mod editor;
pub use editor::{ArrayEditor, DocumentEditor, Editor};
pub mod observer;
pub use observer::{NullObserver, Observer};
pub mod entry;
pub use entry::{ContentType, Entry, EntryMetadata, MaterializeError};
pub mod store;
pub use store::{DocumentStore, StoreConfig, StoreError};
pub mod wire;
pub use wire::{Registry, WireError};
#[cfg(feature = "json")]
pub mod json;
#[cfg(feature = "json")]
pub use json::JsonError;
/// Macros usable for tests and initialization
pub mod macros;

#[cfg(feature = "chrono")]
pub use chrono;
