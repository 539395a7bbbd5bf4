//! Granular notification of replayed mutations.
//!
//! An [`Observer`] receives one callback per *effective* operation while a
//! [`Changes`](crate::Changes) log is replayed: dependent indexes or caches
//! can update incrementally instead of re-scanning whole documents. Recorded
//! no-ops (a put-if-absent that did not apply, a remove that found nothing)
//! stay silent, so the stream an observer sees is a causally faithful,
//! minimal account of what actually changed.
//!
//! All methods have no-op default bodies; implementors override only the
//! kinds they care about.

use crate::{ArrayEntry, Path, Value};

/// Callbacks driven by replay, one per mutation kind.
#[expect(unused_variables)]
pub trait Observer {
    /// A field was set (created or overwritten) on the document at `path`.
    fn put(&mut self, path: &Path, field: &str, value: &Value) {}

    /// A field was removed from the document at `path`.
    fn remove(&mut self, path: &Path, field: &str) {}

    /// The array at `path` had the element at `entry.index` overwritten.
    fn set_array_value(&mut self, path: &Path, entry: &ArrayEntry) {}

    /// The array at `path` gained `entry.value` at `entry.index`.
    fn add_array_value(&mut self, path: &Path, entry: &ArrayEntry) {}

    /// The array at `path` lost `entry.value` from `entry.index`.
    fn remove_array_value(&mut self, path: &Path, entry: &ArrayEntry) {}

    /// The container at `path` was emptied.
    fn clear(&mut self, path: &Path) {}
}

/// An [`Observer`] that ignores everything.
///
/// Used for observer-free replays; the no-op bodies let the compiler strip
/// the notification calls entirely.
pub struct NullObserver;

impl Observer for NullObserver {}
