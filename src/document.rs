//! The two container primitives: [`Document`] and [`Array`].
//!
//! A `Document` is an insertion-ordered mapping from field name to
//! [`Value`]; an `Array` is an index-addressable sequence of values. Both
//! are plain owned structures: cloning either produces a fully independent
//! deep copy, which is what the [`Editor`](crate::Editor)'s isolated mode
//! and the delta materialization path rely on.

use crate::Value;
use std::fmt;

/// An ordered mapping from field name to [`Value`].
///
/// Field order is insertion order and is preserved across clone and replay.
/// Lookups are by name; a name is unique within the document (a repeated
/// `put` overwrites in place, keeping the original position).
///
/// Equality is order-*insensitive* over the (name, value) pairs, while
/// iteration remains order-preserving, per the document model contract.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Sets `name` to `value`, returning the previous value if the field
    /// already existed. An existing field keeps its position; a new field is
    /// appended.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Sets `name` to `value` only if the field is absent. Returns `true`
    /// if the value was stored.
    pub fn put_if_absent(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.contains_field(&name) {
            return false;
        }
        self.fields.push((name, value.into()));
        true
    }

    /// Removes the field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterates over (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates over field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.iter() {
            map.entry(&name, value);
        }
        map.finish()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (name, value) in iter {
            doc.put(name, value);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// An ordered, index-addressable sequence of [`Value`]s.
///
/// Duplicate values are allowed; identity is by position. Value-based
/// operations (`position_of` and the editor's remove-by-value family)
/// resolve by deep structural equality, first match by ascending index.
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Array {
    values: Vec<Value>,
}

impl Array {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Overwrites the value at `index`, returning the previous value.
    /// Returns `None` (and stores nothing) if `index` is out of range.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let slot = self.values.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Inserts at `index`, clamping an out-of-range index to append.
    /// Returns the index the value actually landed at.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> usize {
        let index = index.min(self.values.len());
        self.values.insert(index, value.into());
        index
    }

    /// Removes and returns the value at `index`, if in range.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        if index < self.values.len() {
            Some(self.values.remove(index))
        } else {
            None
        }
    }

    /// Index of the first value structurally equal to `value`.
    pub fn position_of(&self, value: &Value) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.position_of(value).is_some()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Iterates over [`ArrayEntry`] views pairing each index with its value.
    pub fn entries(&self) -> impl Iterator<Item = ArrayEntry> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| ArrayEntry {
                index,
                value: value.clone(),
            })
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// An (index, value) pair capturing one array slot at a point in time.
///
/// Used to report array additions and removals to an
/// [`Observer`](crate::Observer) without the receiver re-reading the array.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct ArrayEntry {
    pub index: usize,
    pub value: Value,
}

impl ArrayEntry {
    pub fn new(index: usize, value: Value) -> Self {
        Self { index, value }
    }
}

impl fmt::Debug for ArrayEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]={:?}", self.index, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_preserves_insertion_order_and_overwrites_in_place() {
        let mut doc = Document::new();
        assert_eq!(doc.put("a", 1), None);
        assert_eq!(doc.put("b", 2), None);
        assert_eq!(doc.put("a", 3), Some(Value::Int32(1)));
        let names: Vec<_> = doc.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(doc.get("a"), Some(&Value::Int32(3)));
    }

    #[test]
    fn equality_ignores_field_order() {
        let mut a = Document::new();
        a.put("x", 1);
        a.put("y", 2);
        let mut b = Document::new();
        b.put("y", 2);
        b.put("x", 1);
        assert_eq!(a, b);

        b.put("x", 9);
        assert_ne!(a, b);
    }

    #[test]
    fn clone_is_deep() {
        let mut inner = Document::new();
        inner.put("n", 1);
        let mut doc = Document::new();
        doc.put("inner", inner);

        let copy = doc.clone();
        doc.get_mut("inner")
            .and_then(Value::as_document_mut)
            .unwrap()
            .put("n", 2);

        assert_eq!(
            copy.get("inner").and_then(Value::as_document).unwrap().get("n"),
            Some(&Value::Int32(1))
        );
    }

    #[test]
    fn put_if_absent_keeps_existing() {
        let mut doc = Document::new();
        assert!(doc.put_if_absent("a", 1));
        assert!(!doc.put_if_absent("a", 2));
        assert_eq!(doc.get("a"), Some(&Value::Int32(1)));
    }

    #[test]
    fn array_insert_clamps_to_append() {
        let mut arr = Array::new();
        arr.push(10);
        arr.push(20);
        assert_eq!(arr.insert(99, 30), 2);
        assert_eq!(arr.insert(1, 15), 1);
        let values: Vec<_> = arr.iter().cloned().collect();
        assert_eq!(
            values,
            vec![
                Value::Int32(10),
                Value::Int32(15),
                Value::Int32(20),
                Value::Int32(30)
            ]
        );
    }

    #[test]
    fn array_position_of_finds_first_match() {
        let arr: Array = vec![Value::Int32(1), Value::Int32(2), Value::Int32(2)]
            .into_iter()
            .collect();
        assert_eq!(arr.position_of(&Value::Int32(2)), Some(1));
        assert_eq!(arr.position_of(&Value::Int32(3)), None);
    }

    #[test]
    fn array_set_out_of_range_is_a_noop() {
        let mut arr = Array::new();
        arr.push(1);
        assert_eq!(arr.set(5, 9), None);
        assert_eq!(arr.len(), 1);
    }
}
