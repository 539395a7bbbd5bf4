//! The stored unit in the backing cache.
//!
//! An [`Entry`] is what sits against a key: either a *literal* (a complete
//! document snapshot), a *delta* (a base version identifier plus an ordered
//! [`Changes`] log replayed on top of that base), or a *whole-delta* (a full
//! replacement snapshot that still participates in the versioned
//! compare-and-swap protocol, used when accumulated deltas are compacted
//! back into one snapshot). Which representation a key holds at any moment
//! is a space/time trade-off made by the [`DocumentStore`](crate::DocumentStore)
//! and transparent to readers, who always observe a materialized
//! [`Document`].

use crate::{Changes, Document, ReplayError};
use std::fmt;

/// What the document payload of an entry semantically is.
///
/// Carried as metadata so collaborators shipping entries between nodes can
/// route payloads without inspecting them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ContentType {
    #[default]
    Json,
    Binary,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Binary => "application/octet-stream",
        }
    }
}

impl fmt::Debug for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata wrapper shared by every entry representation.
///
/// The version counter increases monotonically with every successful write
/// under the key and is the token of the optimistic-concurrency protocol: a
/// write succeeds only when the caller's expected version matches.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct EntryMetadata {
    pub content_type: ContentType,
    pub version: u64,
}

impl EntryMetadata {
    pub fn new(version: u64) -> Self {
        Self {
            content_type: ContentType::default(),
            version,
        }
    }
}

impl fmt::Debug for EntryMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} ({:?})", self.version, self.content_type)
    }
}

/// One stored entry, in whichever representation the store chose at write
/// time. All three share one logical identity: a versioned document.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Entry {
    /// A complete document snapshot.
    Literal {
        metadata: EntryMetadata,
        document: Document,
    },
    /// A reference to a base version plus the changes to replay on top of
    /// it, in recorded order, to reconstitute the current value.
    Delta {
        metadata: EntryMetadata,
        base_version: u64,
        changes: Changes,
    },
    /// A full replacement snapshot that keeps the versioning protocol of a
    /// delta; produced when a delta chain is compacted or a document is
    /// replaced wholesale.
    WholeDelta {
        metadata: EntryMetadata,
        document: Document,
    },
}

impl Entry {
    pub fn metadata(&self) -> &EntryMetadata {
        match self {
            Entry::Literal { metadata, .. }
            | Entry::Delta { metadata, .. }
            | Entry::WholeDelta { metadata, .. } => metadata,
        }
    }

    pub fn version(&self) -> u64 {
        self.metadata().version
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, Entry::Delta { .. })
    }

    /// Resolves this entry to one materialized document.
    ///
    /// A literal or whole-delta resolves directly to its snapshot. A delta
    /// needs the materialized document of its base version, supplied by the
    /// caller (typically the store, which owns the base literal): the base
    /// is cloned and the changes replayed in recorded order.
    pub fn materialize(&self, base: Option<&Document>) -> Result<Document, MaterializeError> {
        match self {
            Entry::Literal { document, .. } | Entry::WholeDelta { document, .. } => {
                Ok(document.clone())
            }
            Entry::Delta {
                base_version,
                changes,
                ..
            } => {
                let base = base.ok_or(MaterializeError::MissingBase {
                    base_version: *base_version,
                })?;
                let mut document = base.clone();
                changes.replay(&mut document)?;
                Ok(document)
            }
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Literal { metadata, document } => {
                write!(f, "Literal[{metadata:?}] {document:?}")
            }
            Entry::Delta {
                metadata,
                base_version,
                changes,
            } => write!(
                f,
                "Delta[{metadata:?}, base v{base_version}] {changes:?}"
            ),
            Entry::WholeDelta { metadata, document } => {
                write!(f, "WholeDelta[{metadata:?}] {document:?}")
            }
        }
    }
}

/// Failure to resolve an entry to a materialized document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterializeError {
    /// A delta entry was resolved without its base document.
    #[error("delta entry needs its base document (base version {base_version})")]
    MissingBase { base_version: u64 },
    /// The delta's changes do not fit the supplied base.
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Editor, Value};

    fn snapshot() -> Document {
        let mut doc = Document::new();
        doc.put("n", 1);
        doc
    }

    #[test]
    fn literal_materializes_to_its_snapshot() {
        let entry = Entry::Literal {
            metadata: EntryMetadata::new(1),
            document: snapshot(),
        };
        assert_eq!(entry.materialize(None).unwrap(), snapshot());
    }

    #[test]
    fn delta_materializes_by_replaying_onto_a_cloned_base() {
        let base = snapshot();
        let mut editor = Editor::isolated(&base);
        editor.put("n", 2);
        editor.put("m", 3);

        let entry = Entry::Delta {
            metadata: EntryMetadata::new(3),
            base_version: 1,
            changes: editor.changes(),
        };

        let materialized = entry.materialize(Some(&base)).unwrap();
        assert_eq!(materialized.get("n"), Some(&Value::Int32(2)));
        assert_eq!(materialized.get("m"), Some(&Value::Int32(3)));
        // The base itself stays untouched.
        assert_eq!(base, snapshot());
    }

    #[test]
    fn delta_without_base_is_an_error() {
        let entry = Entry::Delta {
            metadata: EntryMetadata::new(2),
            base_version: 1,
            changes: Changes::new(),
        };
        assert_eq!(
            entry.materialize(None),
            Err(MaterializeError::MissingBase { base_version: 1 })
        );
    }

    #[test]
    fn whole_delta_is_a_snapshot_under_the_version_protocol() {
        let entry = Entry::WholeDelta {
            metadata: EntryMetadata::new(7),
            document: snapshot(),
        };
        assert_eq!(entry.version(), 7);
        assert!(!entry.is_delta());
        assert_eq!(entry.materialize(None).unwrap(), snapshot());
    }
}
