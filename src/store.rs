//! Keyed document store with versioned compare-and-swap writes.
//!
//! [`DocumentStore`] is the in-memory realization of the entry store
//! contract: `read` always yields a fully materialized [`Document`] (never a
//! half-applied delta), `write` is a versioned compare-and-swap that either
//! bumps the key's version or fails with
//! [`StoreError::Conflict`], and `compact` forces a key's accumulated delta
//! chain back into a literal snapshot.
//!
//! The representation stored per key (literal, delta-on-base, or
//! whole-delta) is chosen at write time and is invisible to readers;
//! [`DocumentStore::entry`] exposes the current choice for shipping over the
//! wire. Writes accumulate into a delta until the pending operation count
//! crosses [`StoreConfig::compact_after_ops`], at which point the record is
//! compacted automatically.
//!
//! No lock is held across a caller's read-modify-write cycle; the version
//! check is the sole concurrency control, and a conflicting writer retries
//! by re-reading, re-applying its edit, and resubmitting.

use crate::{
    Changes, Document, Editor,
    entry::{ContentType, Entry, EntryMetadata},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// A write whose expected version no longer matches the stored one.
///
/// Always surfaced; recoverable by the caller via read-modify-retry. The
/// bounded-retry policy belongs to the caller, not the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("concurrent modification of {key:?}: expected version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },
}

/// Tuning knobs for the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Pending operation count at which a key's delta chain is folded into
    /// a fresh literal snapshot on write.
    pub compact_after_ops: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compact_after_ops: 32,
        }
    }
}

/// How a record is currently represented, mirrored into [`Entry`] on read.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Repr {
    Literal,
    Delta,
    WholeDelta,
}

struct Record {
    version: u64,
    /// Snapshot the pending changes are relative to.
    base: Document,
    base_version: u64,
    pending: Changes,
    /// Materialized view kept current on every write, so reads never replay.
    current: Document,
    repr: Repr,
    content_type: ContentType,
}

impl Record {
    fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            content_type: self.content_type,
            version: self.version,
        }
    }

    fn compact(&mut self) {
        self.base = self.current.clone();
        self.base_version = self.version;
        self.pending = Changes::new();
        self.repr = Repr::Literal;
    }
}

/// In-memory keyed store of versioned documents.
///
/// Single process-wide lock per operation; the caller-visible concurrency
/// protocol is purely optimistic versioning.
pub struct DocumentStore {
    records: Mutex<HashMap<String, Record, ahash::RandomState>>,
    config: StoreConfig,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl DocumentStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            records: Mutex::new(HashMap::default()),
            config,
        }
    }

    /// The materialized document under `key`, if any.
    pub fn read(&self, key: &str) -> Option<Document> {
        self.records.lock().get(key).map(|r| r.current.clone())
    }

    /// The materialized document and its version, for a subsequent
    /// compare-and-swap write.
    pub fn read_versioned(&self, key: &str) -> Option<(Document, u64)> {
        self.records
            .lock()
            .get(key)
            .map(|r| (r.current.clone(), r.version))
    }

    pub fn version_of(&self, key: &str) -> Option<u64> {
        self.records.lock().get(key).map(|r| r.version)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.lock().contains_key(key)
    }

    /// Applies `edit` to the document under `key`, guarded by the versioned
    /// compare-and-swap.
    ///
    /// `expected_version == 0` means "the key does not exist yet"; the first
    /// successful write creates a literal entry at version 1. For an
    /// existing key, the edit runs against the current materialized document
    /// and its recorded operations extend the key's pending delta. An edit
    /// that records no operations leaves the version untouched.
    ///
    /// Returns the new version, or [`StoreError::Conflict`] when
    /// `expected_version` is stale; the caller then re-reads, re-applies,
    /// and resubmits.
    pub fn write<F>(&self, key: &str, expected_version: u64, edit: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut Editor<'_>),
    {
        let mut records = self.records.lock();
        match records.get_mut(key) {
            None => {
                if expected_version != 0 {
                    debug!(key, expected_version, actual = 0u64, "write conflict");
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected: expected_version,
                        actual: 0,
                    });
                }
                let mut document = Document::new();
                let mut editor = Editor::in_place(&mut document);
                edit(&mut editor);
                records.insert(
                    key.to_string(),
                    Record {
                        version: 1,
                        base: document.clone(),
                        base_version: 1,
                        pending: Changes::new(),
                        current: document,
                        repr: Repr::Literal,
                        content_type: ContentType::default(),
                    },
                );
                debug!(key, version = 1u64, "created literal entry");
                Ok(1)
            }
            Some(record) => {
                if record.version != expected_version {
                    debug!(
                        key,
                        expected_version,
                        actual = record.version,
                        "write conflict"
                    );
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected: expected_version,
                        actual: record.version,
                    });
                }
                let mut working = record.current.clone();
                let mut editor = Editor::in_place(&mut working);
                edit(&mut editor);
                let changes = editor.changes();
                if changes.is_empty() {
                    return Ok(record.version);
                }
                record.current = working;
                record.pending.append(changes);
                record.version += 1;
                record.repr = Repr::Delta;
                if record.pending.len() >= self.config.compact_after_ops {
                    record.compact();
                    debug!(key, version = record.version, "auto-compacted delta chain");
                } else {
                    debug!(
                        key,
                        version = record.version,
                        pending = record.pending.len(),
                        "extended delta"
                    );
                }
                Ok(record.version)
            }
        }
    }

    /// Replaces the document under `key` wholesale, keeping the version
    /// protocol. The stored representation becomes a whole-delta.
    pub fn replace(
        &self,
        key: &str,
        expected_version: u64,
        document: Document,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.lock();
        match records.get_mut(key) {
            None => {
                if expected_version != 0 {
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected: expected_version,
                        actual: 0,
                    });
                }
                records.insert(
                    key.to_string(),
                    Record {
                        version: 1,
                        base: document.clone(),
                        base_version: 1,
                        pending: Changes::new(),
                        current: document,
                        repr: Repr::Literal,
                        content_type: ContentType::default(),
                    },
                );
                Ok(1)
            }
            Some(record) => {
                if record.version != expected_version {
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected: expected_version,
                        actual: record.version,
                    });
                }
                record.version += 1;
                record.base = document.clone();
                record.base_version = record.version;
                record.pending = Changes::new();
                record.current = document;
                record.repr = Repr::WholeDelta;
                debug!(key, version = record.version, "replaced with whole delta");
                Ok(record.version)
            }
        }
    }

    /// Forces delta → literal materialization for `key`. Returns `true` if
    /// the key existed.
    pub fn compact(&self, key: &str) -> bool {
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(key) else {
            return false;
        };
        record.compact();
        debug!(key, version = record.version, "compacted");
        true
    }

    /// The representation currently stored under `key`, for shipping over
    /// the wire or into the backing cache.
    pub fn entry(&self, key: &str) -> Option<Entry> {
        let records = self.records.lock();
        let record = records.get(key)?;
        Some(match record.repr {
            Repr::Literal => Entry::Literal {
                metadata: record.metadata(),
                document: record.current.clone(),
            },
            Repr::Delta => Entry::Delta {
                metadata: record.metadata(),
                base_version: record.base_version,
                changes: record.pending.clone(),
            },
            Repr::WholeDelta => Entry::WholeDelta {
                metadata: record.metadata(),
                document: record.current.clone(),
            },
        })
    }

    /// The base snapshot a key's delta entry is relative to.
    pub fn base_of(&self, key: &str) -> Option<(Document, u64)> {
        self.records
            .lock()
            .get(key)
            .map(|r| (r.base.clone(), r.base_version))
    }

    pub fn keys(&self) -> Vec<String> {
        self.records.lock().keys().cloned().collect()
    }

    /// A consistent enumeration of every key with its materialized document
    /// and version, taken under one lock acquisition: the backup
    /// collaborator's view. A half-applied delta is never observable.
    pub fn snapshot(&self) -> Vec<(String, Document, u64)> {
        self.records
            .lock()
            .iter()
            .map(|(key, record)| (key.clone(), record.current.clone(), record.version))
            .collect()
    }

    /// Re-creates literal entries from a backup enumeration, replacing any
    /// existing state under the same keys. The operation log plays no part.
    pub fn restore(&self, entries: impl IntoIterator<Item = (String, Document, u64)>) {
        let mut records = self.records.lock();
        for (key, document, version) in entries {
            debug!(key, version, "restored literal entry");
            records.insert(
                key,
                Record {
                    version,
                    base: document.clone(),
                    base_version: version,
                    pending: Changes::new(),
                    current: document,
                    repr: Repr::Literal,
                    content_type: ContentType::default(),
                },
            );
        }
    }
}
