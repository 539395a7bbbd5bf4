//! The operation log: a closed set of replayable mutation records.
//!
//! Every structural mutation made through an [`Editor`](crate::Editor) is
//! recorded as one [`Operation`]. An operation is immutable once constructed
//! and self-sufficient: it carries the [`Path`] of its parent container and
//! every piece of state needed to re-apply the mutation against a
//! structurally compatible document and to report it to an
//! [`Observer`](crate::Observer), independent of any other state.
//!
//! A [`Changes`] value is the ordered log of one editing session. Replay
//! applies operations strictly in recorded order; later operations may
//! depend on the structural state left by earlier ones (an index-based array
//! operation after a prior removal, for instance), so the order is never
//! rearranged.

use crate::{
    Array, ArrayEntry, Document, Path, Value,
    observer::{NullObserver, Observer},
    path::Target,
};
use std::fmt;
use thiserror::Error;

/// Replaying a log against a document whose shape does not match a recorded
/// operation. This indicates a logic or ordering bug upstream and is
/// surfaced to the caller rather than recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("structural mismatch at {path}: {reason}")]
    StructuralMismatch { path: Path, reason: String },
}

impl ReplayError {
    fn mismatch(path: &Path, reason: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

/// One atomic, replayable mutation.
///
/// Degenerate calls are recorded too (a [`Operation::PutIfAbsent`] that did
/// not apply still appends, with `applied = false`), so the log length
/// reflects call count; [`Operation::changed_state`] tells the two apart,
/// and replay notification skips the no-ops.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Operation {
    /// Set a field to a new value; the field may or may not have existed.
    Put {
        path: Path,
        field: String,
        new_value: Value,
        /// Present when the put overwrote an existing value (undo state).
        old_value: Option<Value>,
    },
    /// Set a field only if it was absent.
    PutIfAbsent {
        path: Path,
        field: String,
        new_value: Value,
        applied: bool,
    },
    /// Remove a field if present.
    Remove {
        path: Path,
        field: String,
        /// The removed value, when the field existed.
        removed: Option<Value>,
    },
    /// Overwrite the array element at `index`.
    SetValue {
        path: Path,
        index: usize,
        value: Value,
    },
    /// Insert or append a value.
    AddValue {
        path: Path,
        /// The insert position the caller asked for; `None` means append.
        requested_index: Option<usize>,
        value: Value,
        /// Where the value actually landed; `None` when the add was a no-op.
        /// A `None` is never reported to an observer.
        actual_index: Option<usize>,
    },
    /// Append only if no structurally equal value was already present.
    AddValueIfAbsent {
        path: Path,
        value: Value,
        added: bool,
        /// Where the value was added, or where the existing match sat.
        index: usize,
    },
    /// Remove the first value structurally equal to `value`.
    RemoveValue {
        path: Path,
        value: Value,
        /// Index of the match, `None` when nothing matched.
        actual_index: Option<usize>,
    },
    /// Remove the value at a specific index.
    RemoveAtIndex {
        path: Path,
        index: usize,
        removed: Value,
    },
    /// Keep only values present in `values` (set intersection).
    RetainAllValues {
        path: Path,
        values: Vec<Value>,
        /// Every removed (index, value), indices as of the pre-operation
        /// array, in removal order.
        removed: Vec<ArrayEntry>,
    },
    /// Remove every value present in `values`.
    RemoveAllValues {
        path: Path,
        values: Vec<Value>,
        removed: Vec<ArrayEntry>,
    },
    /// Empty the container (document or array) at `path`.
    Clear { path: Path },
}

impl Operation {
    /// The path of the container this operation mutates.
    pub fn parent_path(&self) -> &Path {
        match self {
            Operation::Put { path, .. }
            | Operation::PutIfAbsent { path, .. }
            | Operation::Remove { path, .. }
            | Operation::SetValue { path, .. }
            | Operation::AddValue { path, .. }
            | Operation::AddValueIfAbsent { path, .. }
            | Operation::RemoveValue { path, .. }
            | Operation::RemoveAtIndex { path, .. }
            | Operation::RetainAllValues { path, .. }
            | Operation::RemoveAllValues { path, .. }
            | Operation::Clear { path } => path,
        }
    }

    /// Whether this operation changed state when it was recorded.
    ///
    /// Recorded no-ops replay as no-ops and never reach an observer.
    pub fn changed_state(&self) -> bool {
        match self {
            Operation::Put { .. }
            | Operation::SetValue { .. }
            | Operation::RemoveAtIndex { .. }
            | Operation::Clear { .. } => true,
            Operation::PutIfAbsent { applied, .. } => *applied,
            Operation::Remove { removed, .. } => removed.is_some(),
            Operation::AddValue { actual_index, .. } => actual_index.is_some(),
            Operation::AddValueIfAbsent { added, .. } => *added,
            Operation::RemoveValue { actual_index, .. } => actual_index.is_some(),
            Operation::RetainAllValues { removed, .. }
            | Operation::RemoveAllValues { removed, .. } => !removed.is_empty(),
        }
    }

    /// Re-applies this operation's recorded effect against `root`.
    fn replay(&self, root: &mut Document) -> Result<(), ReplayError> {
        let path = self.parent_path();
        match self {
            Operation::Put {
                field, new_value, ..
            } => {
                let doc = resolve_document(path, root)?;
                doc.put(field.clone(), new_value.clone());
            }
            Operation::PutIfAbsent {
                field,
                new_value,
                applied,
                ..
            } => {
                if *applied {
                    let doc = resolve_document(path, root)?;
                    doc.put(field.clone(), new_value.clone());
                }
            }
            Operation::Remove { field, removed, .. } => {
                if removed.is_some() {
                    let doc = resolve_document(path, root)?;
                    doc.remove(field);
                }
            }
            Operation::SetValue { index, value, .. } => {
                let arr = resolve_array(path, root)?;
                if arr.set(*index, value.clone()).is_none() {
                    return Err(ReplayError::mismatch(
                        path,
                        format!("set at index {index} but array has {} elements", arr.len()),
                    ));
                }
            }
            Operation::AddValue {
                value,
                actual_index,
                ..
            } => {
                if let Some(index) = actual_index {
                    let arr = resolve_array(path, root)?;
                    if *index > arr.len() {
                        return Err(ReplayError::mismatch(
                            path,
                            format!("add at index {index} but array has {} elements", arr.len()),
                        ));
                    }
                    arr.insert(*index, value.clone());
                }
            }
            Operation::AddValueIfAbsent {
                value,
                added,
                index,
                ..
            } => {
                if *added {
                    let arr = resolve_array(path, root)?;
                    if *index > arr.len() {
                        return Err(ReplayError::mismatch(
                            path,
                            format!("add at index {index} but array has {} elements", arr.len()),
                        ));
                    }
                    arr.insert(*index, value.clone());
                }
            }
            Operation::RemoveValue { actual_index, .. } => {
                if let Some(index) = actual_index {
                    let arr = resolve_array(path, root)?;
                    if arr.remove_at(*index).is_none() {
                        return Err(ReplayError::mismatch(
                            path,
                            format!(
                                "remove at index {index} but array has {} elements",
                                arr.len()
                            ),
                        ));
                    }
                }
            }
            Operation::RemoveAtIndex { index, .. } => {
                let arr = resolve_array(path, root)?;
                if arr.remove_at(*index).is_none() {
                    return Err(ReplayError::mismatch(
                        path,
                        format!("remove at index {index} but array has {} elements", arr.len()),
                    ));
                }
            }
            Operation::RetainAllValues { values, .. } => {
                let arr = resolve_array(path, root)?;
                let kept: Array = arr
                    .iter()
                    .filter(|v| values.contains(v))
                    .cloned()
                    .collect();
                *arr = kept;
            }
            Operation::RemoveAllValues { values, .. } => {
                let arr = resolve_array(path, root)?;
                let kept: Array = arr
                    .iter()
                    .filter(|v| !values.contains(v))
                    .cloned()
                    .collect();
                *arr = kept;
            }
            Operation::Clear { path } => match path.resolve(root) {
                Some(Target::Document(doc)) => doc.clear(),
                Some(Target::Array(arr)) => arr.clear(),
                None => return Err(ReplayError::mismatch(path, "no container at path")),
            },
        }
        Ok(())
    }

    /// Drives the one observer callback this operation maps to, if it
    /// changed state. Matched exhaustively so a new variant cannot be
    /// forgotten.
    fn notify(&self, observer: &mut dyn Observer) {
        match self {
            Operation::Put {
                path,
                field,
                new_value,
                ..
            } => observer.put(path, field, new_value),
            Operation::PutIfAbsent {
                path,
                field,
                new_value,
                applied,
            } => {
                if *applied {
                    observer.put(path, field, new_value);
                }
            }
            Operation::Remove {
                path,
                field,
                removed,
            } => {
                if removed.is_some() {
                    observer.remove(path, field);
                }
            }
            Operation::SetValue { path, index, value } => {
                observer.set_array_value(path, &ArrayEntry::new(*index, value.clone()));
            }
            Operation::AddValue {
                path,
                value,
                actual_index,
                ..
            } => {
                if let Some(index) = actual_index {
                    observer.add_array_value(path, &ArrayEntry::new(*index, value.clone()));
                }
            }
            Operation::AddValueIfAbsent {
                path,
                value,
                added,
                index,
            } => {
                if *added {
                    observer.add_array_value(path, &ArrayEntry::new(*index, value.clone()));
                }
            }
            Operation::RemoveValue {
                path,
                value,
                actual_index,
            } => {
                if let Some(index) = actual_index {
                    observer.remove_array_value(path, &ArrayEntry::new(*index, value.clone()));
                }
            }
            Operation::RemoveAtIndex {
                path,
                index,
                removed,
            } => {
                observer.remove_array_value(path, &ArrayEntry::new(*index, removed.clone()));
            }
            Operation::RetainAllValues { path, removed, .. }
            | Operation::RemoveAllValues { path, removed, .. } => {
                for entry in removed {
                    observer.remove_array_value(path, entry);
                }
            }
            Operation::Clear { path } => observer.clear(path),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Put {
                path,
                field,
                new_value,
                old_value,
            } => match old_value {
                Some(old) => write!(f, "Put({path} {field}={new_value:?}, was {old:?})"),
                None => write!(f, "Put({path} {field}={new_value:?})"),
            },
            Operation::PutIfAbsent {
                path,
                field,
                new_value,
                applied,
            } => write!(
                f,
                "PutIfAbsent({path} {field}={new_value:?}, applied={applied})"
            ),
            Operation::Remove {
                path,
                field,
                removed,
            } => write!(f, "Remove({path} {field}, removed={removed:?})"),
            Operation::SetValue { path, index, value } => {
                write!(f, "SetValue({path}[{index}]={value:?})")
            }
            Operation::AddValue {
                path,
                value,
                actual_index,
                ..
            } => write!(f, "AddValue({path} {value:?} at {actual_index:?})"),
            Operation::AddValueIfAbsent {
                path,
                value,
                added,
                index,
            } => write!(
                f,
                "AddValueIfAbsent({path} {value:?}, added={added} at {index})"
            ),
            Operation::RemoveValue {
                path,
                value,
                actual_index,
            } => write!(f, "RemoveValue({path} {value:?} at {actual_index:?})"),
            Operation::RemoveAtIndex {
                path,
                index,
                removed,
            } => write!(f, "RemoveAtIndex({path}[{index}], removed {removed:?})"),
            Operation::RetainAllValues { path, removed, .. } => {
                write!(f, "RetainAllValues({path}, removed {removed:?})")
            }
            Operation::RemoveAllValues { path, removed, .. } => {
                write!(f, "RemoveAllValues({path}, removed {removed:?})")
            }
            Operation::Clear { path } => write!(f, "Clear({path})"),
        }
    }
}

fn resolve_document<'doc>(
    path: &Path,
    root: &'doc mut Document,
) -> Result<&'doc mut Document, ReplayError> {
    match path.resolve(root) {
        Some(Target::Document(doc)) => Ok(doc),
        Some(Target::Array(_)) => Err(ReplayError::mismatch(path, "expected document, found array")),
        None => Err(ReplayError::mismatch(path, "no document at path")),
    }
}

fn resolve_array<'doc>(
    path: &Path,
    root: &'doc mut Document,
) -> Result<&'doc mut Array, ReplayError> {
    match path.resolve(root) {
        Some(Target::Array(arr)) => Ok(arr),
        Some(Target::Document(_)) => Err(ReplayError::mismatch(path, "expected array, found document")),
        None => Err(ReplayError::mismatch(path, "no array at path")),
    }
}

/// The ordered, finite log of one editing session.
///
/// Once extracted from an editor, a `Changes` is an immutable value object
/// safe to share for reading across threads. All contained state is owned,
/// so `Clone` is a true deep copy: the clone and the original never alias,
/// and either side can be shipped to another execution context safely.
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Changes {
    operations: Vec<Operation>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emptiness is first-class and cheap; an empty log replays as a
    /// guaranteed no-op.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub(crate) fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub(crate) fn append(&mut self, other: Changes) {
        self.operations.extend(other.operations);
    }

    /// Replays every operation, in recorded order, against `document`.
    pub fn replay(&self, document: &mut Document) -> Result<(), ReplayError> {
        self.replay_with(document, &mut NullObserver)
    }

    /// Replays with an observer: after each operation is applied, the one
    /// callback its variant maps to is driven, but only when the operation
    /// actually changed state.
    pub fn replay_with(
        &self,
        document: &mut Document,
        observer: &mut dyn Observer,
    ) -> Result<(), ReplayError> {
        for operation in &self.operations {
            operation.replay(document)?;
            operation.notify(observer);
        }
        Ok(())
    }
}

impl fmt::Debug for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.operations.iter()).finish()
    }
}

impl FromIterator<Operation> for Changes {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Changes {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl IntoIterator for Changes {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::test::RecordingObserver;

    fn doc_with_list() -> Document {
        let mut doc = Document::new();
        doc.put("list", Array::from(vec![Value::Int32(10), Value::Int32(20)]));
        doc
    }

    #[test]
    fn empty_changes_replay_is_a_noop() {
        let mut doc = doc_with_list();
        let before = doc.clone();
        let mut observer = RecordingObserver::default();
        Changes::new().replay_with(&mut doc, &mut observer).unwrap();
        assert_eq!(doc, before);
        assert!(observer.events.is_empty());
    }

    #[test]
    fn put_replays_and_notifies() {
        let mut doc = Document::new();
        let changes: Changes = [Operation::Put {
            path: Path::root(),
            field: "a".into(),
            new_value: Value::Int32(1),
            old_value: None,
        }]
        .into_iter()
        .collect();

        let mut observer = RecordingObserver::default();
        changes.replay_with(&mut doc, &mut observer).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Int32(1)));
        assert_eq!(observer.events, vec!["put / a=1"]);
    }

    #[test]
    fn unapplied_put_if_absent_is_silent() {
        let mut doc = Document::new();
        doc.put("a", 1);
        let changes: Changes = [Operation::PutIfAbsent {
            path: Path::root(),
            field: "a".into(),
            new_value: Value::Int32(9),
            applied: false,
        }]
        .into_iter()
        .collect();

        let mut observer = RecordingObserver::default();
        changes.replay_with(&mut doc, &mut observer).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Int32(1)));
        assert!(observer.events.is_empty());
    }

    #[test]
    fn add_value_with_no_actual_index_is_silent_and_inert() {
        let mut doc = doc_with_list();
        let before = doc.clone();
        let changes: Changes = [Operation::AddValue {
            path: Path::root().child_field("list"),
            requested_index: Some(0),
            value: Value::Int32(99),
            actual_index: None,
        }]
        .into_iter()
        .collect();

        let mut observer = RecordingObserver::default();
        changes.replay_with(&mut doc, &mut observer).unwrap();
        assert_eq!(doc, before);
        assert!(observer.events.is_empty());
    }

    #[test]
    fn indexed_operation_against_short_array_fails() {
        let mut doc = doc_with_list();
        let changes: Changes = [Operation::SetValue {
            path: Path::root().child_field("list"),
            index: 7,
            value: Value::Int32(0),
        }]
        .into_iter()
        .collect();

        let err = changes.replay(&mut doc).unwrap_err();
        let ReplayError::StructuralMismatch { path, .. } = err;
        assert_eq!(path.to_string(), "/list");
    }

    #[test]
    fn retain_all_notifies_each_removed_entry_in_order() {
        let mut doc = doc_with_list();
        let path = Path::root().child_field("list");
        let changes: Changes = [Operation::RetainAllValues {
            path: path.clone(),
            values: vec![Value::Int32(20)],
            removed: vec![ArrayEntry::new(0, Value::Int32(10))],
        }]
        .into_iter()
        .collect();

        let mut observer = RecordingObserver::default();
        changes.replay_with(&mut doc, &mut observer).unwrap();
        let arr = doc.get("list").and_then(Value::as_array).unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr.get(0), Some(&Value::Int32(20)));
        assert_eq!(observer.events, vec!["del /list [0]=10"]);
    }

    #[test]
    fn clear_empties_either_container_kind() {
        let mut doc = doc_with_list();
        let changes: Changes = [
            Operation::Clear {
                path: Path::root().child_field("list"),
            },
            Operation::Clear { path: Path::root() },
        ]
        .into_iter()
        .collect();
        changes.replay(&mut doc).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn clone_is_independent_and_replays_identically() {
        let path = Path::root().child_field("list");
        let changes: Changes = [Operation::RemoveAllValues {
            path,
            values: vec![Value::Int32(10)],
            removed: vec![ArrayEntry::new(0, Value::Int32(10))],
        }]
        .into_iter()
        .collect();
        let cloned = changes.clone();

        let mut a = doc_with_list();
        let mut b = doc_with_list();
        let mut obs_a = RecordingObserver::default();
        let mut obs_b = RecordingObserver::default();
        changes.replay_with(&mut a, &mut obs_a).unwrap();
        cloned.replay_with(&mut b, &mut obs_b).unwrap();

        assert_eq!(a, b);
        assert_eq!(obs_a.events, obs_b.events);
    }
}
