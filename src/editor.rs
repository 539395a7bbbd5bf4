//! Recording editor over a [`Document`].
//!
//! An [`Editor`] wraps a document and intercepts every structural mutation:
//! each call updates the document in place *and* appends exactly one
//! [`Operation`] to the session log, including degenerate no-ops (a
//! [`put_if_absent`](Editor::put_if_absent) on a present field still appends
//! an operation with `applied = false`). The accumulated log is extracted as
//! a [`Changes`] value at any time, ready to be cloned, shipped, and
//! replayed elsewhere.
//!
//! Two attach modes exist, chosen at construction: *in place*
//! ([`Editor::in_place`]) mutates the caller's document through a mutable
//! borrow, while *isolated* ([`Editor::isolated`]) clones first and leaves
//! the caller's copy untouched.
//!
//! Nested containers are edited through closure-scoped sub-editors
//! ([`Editor::edit_document`], [`Editor::edit_array`]); all operations land
//! in the one log owned by the top-level editor, each carrying its own
//! parent [`Path`], so flattening is lossless.
//!
//! An editor and its document are single-writer: nothing here is
//! synchronized, and callers needing concurrency coordinate externally or
//! work on independent clones.

use crate::{Array, ArrayEntry, Changes, Document, Operation, Path, Value};

enum DocTarget<'a> {
    InPlace(&'a mut Document),
    Isolated(Document),
}

impl DocTarget<'_> {
    fn get(&self) -> &Document {
        match self {
            DocTarget::InPlace(doc) => doc,
            DocTarget::Isolated(doc) => doc,
        }
    }

    fn get_mut(&mut self) -> &mut Document {
        match self {
            DocTarget::InPlace(doc) => doc,
            DocTarget::Isolated(doc) => doc,
        }
    }
}

/// A session object that mutates a document while recording [`Changes`].
pub struct Editor<'a> {
    target: DocTarget<'a>,
    changes: Changes,
}

impl<'a> Editor<'a> {
    /// Attaches destructively: mutations go straight to `document`.
    pub fn in_place(document: &'a mut Document) -> Self {
        Self {
            target: DocTarget::InPlace(document),
            changes: Changes::new(),
        }
    }

    /// Attaches to a private clone of `document`, leaving the original
    /// untouched. The edited result is recovered with
    /// [`into_document`](Editor::into_document).
    pub fn isolated(document: &Document) -> Self {
        Self {
            target: DocTarget::Isolated(document.clone()),
            changes: Changes::new(),
        }
    }

    /// Read access to the document in its current (mid-session) state.
    pub fn document(&self) -> &Document {
        self.target.get()
    }

    /// The log accumulated so far. Repeatable, and monotonically growing
    /// until the editor is discarded.
    pub fn changes(&self) -> Changes {
        self.changes.clone()
    }

    /// Consumes the editor, returning the edited document.
    ///
    /// For an in-place editor this is a clone of the caller's (already
    /// mutated) document.
    pub fn into_document(self) -> Document {
        match self.target {
            DocTarget::InPlace(doc) => doc.clone(),
            DocTarget::Isolated(doc) => doc,
        }
    }

    /// Consumes the editor, returning the edited document and the log.
    pub fn into_parts(self) -> (Document, Changes) {
        let changes = self.changes.clone();
        (self.into_document(), changes)
    }

    /// Sets `field` to `value`, returning the previous value if any.
    pub fn put(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        put(self.target.get_mut(), &Path::root(), &mut self.changes, field.into(), value.into())
    }

    /// Sets `field` only if absent; returns whether the value was stored.
    pub fn put_if_absent(&mut self, field: impl Into<String>, value: impl Into<Value>) -> bool {
        put_if_absent(
            self.target.get_mut(),
            &Path::root(),
            &mut self.changes,
            field.into(),
            value.into(),
        )
    }

    /// Removes `field`, returning its value if it was present.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        remove(self.target.get_mut(), &Path::root(), &mut self.changes, field)
    }

    /// Empties the document.
    pub fn clear(&mut self) {
        self.changes.push(Operation::Clear { path: Path::root() });
        self.target.get_mut().clear();
    }

    /// Edits the sub-document held by `field` through a nested editor.
    ///
    /// Returns `None` without recording anything when the field is absent
    /// or holds a non-document value.
    pub fn edit_document<R>(
        &mut self,
        field: &str,
        f: impl FnOnce(&mut DocumentEditor<'_>) -> R,
    ) -> Option<R> {
        let path = Path::root().child_field(field);
        let doc = self.target.get_mut().get_mut(field)?.as_document_mut()?;
        let mut editor = DocumentEditor {
            doc,
            path,
            changes: &mut self.changes,
        };
        Some(f(&mut editor))
    }

    /// Edits the array held by `field` through a nested editor.
    pub fn edit_array<R>(
        &mut self,
        field: &str,
        f: impl FnOnce(&mut ArrayEditor<'_>) -> R,
    ) -> Option<R> {
        let path = Path::root().child_field(field);
        let array = self.target.get_mut().get_mut(field)?.as_array_mut()?;
        let mut editor = ArrayEditor {
            array,
            path,
            changes: &mut self.changes,
        };
        Some(f(&mut editor))
    }
}

/// A nested editor over a sub-document, sharing the top-level log.
pub struct DocumentEditor<'a> {
    doc: &'a mut Document,
    path: Path,
    changes: &'a mut Changes,
}

impl DocumentEditor<'_> {
    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn put(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        put(self.doc, &self.path, self.changes, field.into(), value.into())
    }

    pub fn put_if_absent(&mut self, field: impl Into<String>, value: impl Into<Value>) -> bool {
        put_if_absent(self.doc, &self.path, self.changes, field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        remove(self.doc, &self.path, self.changes, field)
    }

    pub fn clear(&mut self) {
        self.changes.push(Operation::Clear {
            path: self.path.clone(),
        });
        self.doc.clear();
    }

    pub fn edit_document<R>(
        &mut self,
        field: &str,
        f: impl FnOnce(&mut DocumentEditor<'_>) -> R,
    ) -> Option<R> {
        let path = self.path.child_field(field);
        let doc = self.doc.get_mut(field)?.as_document_mut()?;
        let mut editor = DocumentEditor {
            doc,
            path,
            changes: self.changes,
        };
        Some(f(&mut editor))
    }

    pub fn edit_array<R>(
        &mut self,
        field: &str,
        f: impl FnOnce(&mut ArrayEditor<'_>) -> R,
    ) -> Option<R> {
        let path = self.path.child_field(field);
        let array = self.doc.get_mut(field)?.as_array_mut()?;
        let mut editor = ArrayEditor {
            array,
            path,
            changes: self.changes,
        };
        Some(f(&mut editor))
    }
}

/// A nested editor over an array, sharing the top-level log.
pub struct ArrayEditor<'a> {
    array: &'a mut Array,
    path: Path,
    changes: &'a mut Changes,
}

impl ArrayEditor<'_> {
    pub fn array(&self) -> &Array {
        self.array
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Overwrites the element at `index`, returning the previous value.
    ///
    /// An out-of-range index mutates nothing, records nothing, and returns
    /// `None`.
    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        let previous = self.array.set(index, value.clone())?;
        self.changes.push(Operation::SetValue {
            path: self.path.clone(),
            index,
            value,
        });
        Some(previous)
    }

    /// Appends `value`, returning the index it landed at.
    pub fn add_value(&mut self, value: impl Into<Value>) -> usize {
        let value = value.into();
        let actual = self.array.len();
        self.array.push(value.clone());
        self.changes.push(Operation::AddValue {
            path: self.path.clone(),
            requested_index: None,
            value,
            actual_index: Some(actual),
        });
        actual
    }

    /// Inserts `value` at `index`, clamping an out-of-range request to
    /// append. Returns the index the value actually landed at.
    pub fn add_value_at(&mut self, index: usize, value: impl Into<Value>) -> usize {
        let value = value.into();
        let actual = self.array.insert(index, value.clone());
        self.changes.push(Operation::AddValue {
            path: self.path.clone(),
            requested_index: Some(index),
            value,
            actual_index: Some(actual),
        });
        actual
    }

    /// Appends `value` only if no structurally equal value is present.
    /// Returns whether the value was added.
    pub fn add_value_if_absent(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let (added, index) = match self.array.position_of(&value) {
            Some(existing) => (false, existing),
            None => {
                let index = self.array.len();
                self.array.push(value.clone());
                (true, index)
            }
        };
        self.changes.push(Operation::AddValueIfAbsent {
            path: self.path.clone(),
            value,
            added,
            index,
        });
        added
    }

    /// Removes the first value structurally equal to `value`, returning the
    /// index it held. First match by ascending index wins.
    pub fn remove_value(&mut self, value: impl Into<Value>) -> Option<usize> {
        let value = value.into();
        let actual_index = self.array.position_of(&value);
        if let Some(index) = actual_index {
            self.array.remove_at(index);
        }
        self.changes.push(Operation::RemoveValue {
            path: self.path.clone(),
            value,
            actual_index,
        });
        actual_index
    }

    /// Removes and returns the value at `index`.
    ///
    /// An out-of-range index mutates nothing, records nothing, and returns
    /// `None`.
    pub fn remove_at_index(&mut self, index: usize) -> Option<Value> {
        let removed = self.array.remove_at(index)?;
        self.changes.push(Operation::RemoveAtIndex {
            path: self.path.clone(),
            index,
            removed: removed.clone(),
        });
        Some(removed)
    }

    /// Keeps only values present in `values`, processing the array once,
    /// front to back. Returns the removed (index, value) entries, indices
    /// as of the pre-operation array, in removal order.
    pub fn retain_all_values(&mut self, values: Vec<Value>) -> Vec<ArrayEntry> {
        let removed = self.filter_in_place(&values, true);
        self.changes.push(Operation::RetainAllValues {
            path: self.path.clone(),
            values,
            removed: removed.clone(),
        });
        removed
    }

    /// Removes every value present in `values`, processing the array once,
    /// front to back. Returns the removed entries as
    /// [`retain_all_values`](ArrayEditor::retain_all_values) does.
    pub fn remove_all_values(&mut self, values: Vec<Value>) -> Vec<ArrayEntry> {
        let removed = self.filter_in_place(&values, false);
        self.changes.push(Operation::RemoveAllValues {
            path: self.path.clone(),
            values,
            removed: removed.clone(),
        });
        removed
    }

    fn filter_in_place(&mut self, values: &[Value], keep_matches: bool) -> Vec<ArrayEntry> {
        let mut removed = Vec::new();
        let mut kept = Array::new();
        for (index, value) in std::mem::take(self.array).into_iter().enumerate() {
            if values.contains(&value) == keep_matches {
                kept.push(value);
            } else {
                removed.push(ArrayEntry::new(index, value));
            }
        }
        *self.array = kept;
        removed
    }

    /// Empties the array.
    pub fn clear(&mut self) {
        self.changes.push(Operation::Clear {
            path: self.path.clone(),
        });
        self.array.clear();
    }

    /// Edits the sub-document at `index` through a nested editor.
    pub fn edit_document<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut DocumentEditor<'_>) -> R,
    ) -> Option<R> {
        let path = self.path.child_index(index);
        let doc = self.array.get_mut(index)?.as_document_mut()?;
        let mut editor = DocumentEditor {
            doc,
            path,
            changes: self.changes,
        };
        Some(f(&mut editor))
    }

    /// Edits the nested array at `index` through a nested editor.
    pub fn edit_array<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut ArrayEditor<'_>) -> R,
    ) -> Option<R> {
        let path = self.path.child_index(index);
        let array = self.array.get_mut(index)?.as_array_mut()?;
        let mut editor = ArrayEditor {
            array,
            path,
            changes: self.changes,
        };
        Some(f(&mut editor))
    }
}

fn put(
    doc: &mut Document,
    path: &Path,
    changes: &mut Changes,
    field: String,
    value: Value,
) -> Option<Value> {
    let old_value = doc.put(field.clone(), value.clone());
    changes.push(Operation::Put {
        path: path.clone(),
        field,
        new_value: value,
        old_value: old_value.clone(),
    });
    old_value
}

fn put_if_absent(
    doc: &mut Document,
    path: &Path,
    changes: &mut Changes,
    field: String,
    value: Value,
) -> bool {
    let applied = doc.put_if_absent(field.clone(), value.clone());
    changes.push(Operation::PutIfAbsent {
        path: path.clone(),
        field,
        new_value: value,
        applied,
    });
    applied
}

fn remove(doc: &mut Document, path: &Path, changes: &mut Changes, field: &str) -> Option<Value> {
    let removed = doc.remove(field);
    changes.push(Operation::Remove {
        path: path.clone(),
        field: field.to_string(),
        removed: removed.clone(),
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Document {
        let mut doc = Document::new();
        doc.put("a", 1);
        doc.put("b", Array::from(vec![Value::Int32(10), Value::Int32(20)]));
        doc
    }

    #[test]
    fn log_length_reflects_call_count_including_noops() {
        let mut doc = base();
        let mut editor = Editor::in_place(&mut doc);
        editor.put_if_absent("a", 99);
        editor.put_if_absent("c", 3);
        editor.remove("missing");
        let changes = editor.changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes.iter().filter(|op| op.changed_state()).count(), 1);
    }

    #[test]
    fn isolated_mode_leaves_the_original_untouched() {
        let doc = base();
        let mut editor = Editor::isolated(&doc);
        editor.put("c", 3);
        editor.remove("a");
        let edited = editor.into_document();

        assert_eq!(doc, base());
        assert!(edited.contains_field("c"));
        assert!(!edited.contains_field("a"));
    }

    #[test]
    fn replaying_the_session_log_reproduces_the_post_edit_state() {
        let pre_edit = base();
        let mut doc = base();
        let mut editor = Editor::in_place(&mut doc);
        editor.put("c", 3);
        editor.edit_array("b", |arr| {
            arr.add_value(20);
            arr.remove_value(20);
        });
        editor.put_if_absent("c", 4);
        editor.remove("a");
        let changes = editor.changes();

        let mut replayed = pre_edit.clone();
        changes.replay(&mut replayed).unwrap();
        assert_eq!(replayed, doc);
    }

    #[test]
    fn nested_operations_carry_their_parent_path() {
        let mut doc = Document::new();
        let mut inner = Document::new();
        inner.put("list", Array::new());
        doc.put("outer", inner);

        let mut editor = Editor::in_place(&mut doc);
        editor.edit_document("outer", |outer| {
            outer.put("x", 1);
            outer.edit_array("list", |list| {
                list.add_value(5);
            });
        });

        let changes = editor.changes();
        let paths: Vec<_> = changes
            .iter()
            .map(|op| op.parent_path().to_string())
            .collect();
        assert_eq!(paths, vec!["/outer", "/outer/list"]);
    }

    #[test]
    fn remove_value_removes_first_match_only() {
        let mut doc = Document::new();
        doc.put(
            "b",
            Array::from(vec![Value::Int32(10), Value::Int32(20), Value::Int32(20)]),
        );
        let mut editor = Editor::in_place(&mut doc);
        let index = editor.edit_array("b", |arr| arr.remove_value(20)).unwrap();
        assert_eq!(index, Some(1));
        let arr = doc.get("b").and_then(Value::as_array).unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(1), Some(&Value::Int32(20)));
    }

    #[test]
    fn add_value_clamps_and_records_the_actual_index() {
        let mut doc = base();
        let mut editor = Editor::in_place(&mut doc);
        let landed = editor.edit_array("b", |arr| arr.add_value_at(99, 30)).unwrap();
        assert_eq!(landed, 2);
        match editor.changes().iter().next().unwrap() {
            Operation::AddValue {
                requested_index,
                actual_index,
                ..
            } => {
                assert_eq!(*requested_index, Some(99));
                assert_eq!(*actual_index, Some(2));
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn retain_all_records_removed_entries_in_order() {
        let mut doc = Document::new();
        doc.put(
            "b",
            Array::from(vec![
                Value::Int32(1),
                Value::Int32(2),
                Value::Int32(3),
                Value::Int32(2),
            ]),
        );
        let mut editor = Editor::in_place(&mut doc);
        let removed = editor
            .edit_array("b", |arr| arr.retain_all_values(vec![Value::Int32(2)]))
            .unwrap();
        assert_eq!(
            removed,
            vec![
                ArrayEntry::new(0, Value::Int32(1)),
                ArrayEntry::new(2, Value::Int32(3)),
            ]
        );
        let arr = doc.get("b").and_then(Value::as_array).unwrap();
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn edit_array_on_a_scalar_field_records_nothing() {
        let mut doc = base();
        let mut editor = Editor::in_place(&mut doc);
        assert!(editor.edit_array("a", |arr| arr.add_value(1)).is_none());
        assert!(editor.changes().is_empty());
    }

    #[derive(Clone, Debug)]
    enum Step {
        Put(u8, i32),
        PutIfAbsent(u8, i32),
        Remove(u8),
        AddValue(i32),
        AddValueAt(u8, i32),
        AddIfAbsent(i32),
        RemoveValue(i32),
        RemoveAtIndex(u8),
        SetValue(u8, i32),
        RetainAll(Vec<i32>),
        RemoveAll(Vec<i32>),
        ClearList,
    }

    impl quickcheck::Arbitrary for Step {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            use quickcheck::Arbitrary;
            // Small value/index domains so collisions and no-ops are common.
            let v = i32::from(u8::arbitrary(g) % 5);
            let i = u8::arbitrary(g) % 8;
            let f = u8::arbitrary(g) % 3;
            let set = |g: &mut quickcheck::Gen| {
                Vec::<u8>::arbitrary(g)
                    .into_iter()
                    .take(3)
                    .map(|x| i32::from(x % 5))
                    .collect()
            };
            match u8::arbitrary(g) % 12 {
                0 => Step::Put(f, v),
                1 => Step::PutIfAbsent(f, v),
                2 => Step::Remove(f),
                3 => Step::AddValue(v),
                4 => Step::AddValueAt(i, v),
                5 => Step::AddIfAbsent(v),
                6 => Step::RemoveValue(v),
                7 => Step::RemoveAtIndex(i),
                8 => Step::SetValue(i, v),
                9 => Step::RetainAll(set(g)),
                10 => Step::RemoveAll(set(g)),
                _ => Step::ClearList,
            }
        }
    }

    fn field_name(f: u8) -> &'static str {
        ["a", "b", "c"][f as usize % 3]
    }

    #[quickcheck]
    fn any_session_log_replays_to_the_edited_document(steps: Vec<Step>) -> bool {
        let original = base();
        let mut editor = Editor::isolated(&original);
        for step in &steps {
            match step {
                Step::Put(f, v) => {
                    editor.put(field_name(*f), *v);
                }
                Step::PutIfAbsent(f, v) => {
                    editor.put_if_absent(field_name(*f), *v);
                }
                Step::Remove(f) => {
                    editor.remove(field_name(*f));
                }
                // Array steps silently no-op once "b" stops being an array.
                Step::AddValue(v) => {
                    editor.edit_array("b", |arr| arr.add_value(*v));
                }
                Step::AddValueAt(i, v) => {
                    editor.edit_array("b", |arr| arr.add_value_at(*i as usize, *v));
                }
                Step::AddIfAbsent(v) => {
                    editor.edit_array("b", |arr| arr.add_value_if_absent(*v));
                }
                Step::RemoveValue(v) => {
                    editor.edit_array("b", |arr| arr.remove_value(*v));
                }
                Step::RemoveAtIndex(i) => {
                    editor.edit_array("b", |arr| arr.remove_at_index(*i as usize));
                }
                Step::SetValue(i, v) => {
                    editor.edit_array("b", |arr| arr.set_value(*i as usize, *v));
                }
                Step::RetainAll(vs) => {
                    let values: Vec<Value> = vs.iter().map(|v| Value::Int32(*v)).collect();
                    editor.edit_array("b", |arr| arr.retain_all_values(values));
                }
                Step::RemoveAll(vs) => {
                    let values: Vec<Value> = vs.iter().map(|v| Value::Int32(*v)).collect();
                    editor.edit_array("b", |arr| arr.remove_all_values(values));
                }
                Step::ClearList => {
                    editor.edit_array("b", |arr| arr.clear());
                }
            }
        }
        let (edited, changes) = editor.into_parts();

        let mut replica = original;
        changes.replay(&mut replica).is_ok() && replica == edited
    }
}
