//! Locating a mutation target inside one document.
//!
//! A [`Path`] is the sequence of field names and array indices leading from
//! a document root to the *parent container* an operation mutates. Every
//! recorded [`Operation`](crate::Operation) carries the path of its parent,
//! so replay and observer notification can address the correct nested
//! location without re-walking the tree.

use crate::{Array, Document, Value};
use smallvec::SmallVec;
use std::fmt;

/// One step of a [`Path`]: a document field or an array index.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{name}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// The location of a container relative to a document root.
///
/// Paths are small in practice (documents are rarely nested deeply), so
/// segments are stored inline up to four levels.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Path {
    segments: SmallVec<[Segment; 4]>,
}

impl Path {
    /// The root path: the document itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Returns this path extended by a field name.
    pub fn child_field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.into()));
        Self { segments }
    }

    /// Returns this path extended by an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Resolves this path against `root` to the targeted container.
    ///
    /// Returns `None` if any segment is missing or addresses a non-container
    /// value; callers translate that into a structural-mismatch error.
    pub fn resolve<'doc>(&self, root: &'doc mut Document) -> Option<Target<'doc>> {
        let mut target = Target::Document(root);
        for segment in &self.segments {
            let value = match (target, segment) {
                (Target::Document(doc), Segment::Field(name)) => doc.get_mut(name)?,
                (Target::Array(arr), Segment::Index(index)) => arr.get_mut(*index)?,
                _ => return None,
            };
            target = match value {
                Value::Document(doc) => Target::Document(doc),
                Value::Array(arr) => Target::Array(arr),
                _ => return None,
            };
        }
        Some(target)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => write!(f, "/{name}")?,
                Segment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

/// A mutable view of the container a path resolves to.
pub enum Target<'doc> {
    Document(&'doc mut Document),
    Array(&'doc mut Array),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut inner = Document::new();
        inner.put("list", Array::from(vec![Value::Int32(1), Value::Int32(2)]));
        let mut doc = Document::new();
        doc.put("inner", inner);
        doc
    }

    #[test]
    fn root_path_resolves_to_the_document() {
        let mut doc = sample();
        match Path::root().resolve(&mut doc) {
            Some(Target::Document(_)) => {}
            _ => panic!("root must resolve to the document"),
        }
    }

    #[test]
    fn nested_array_resolution() {
        let mut doc = sample();
        let path = Path::root().child_field("inner").child_field("list");
        match path.resolve(&mut doc) {
            Some(Target::Array(arr)) => assert_eq!(arr.len(), 2),
            _ => panic!("expected array target"),
        }
    }

    #[test]
    fn missing_or_scalar_segments_fail_resolution() {
        let mut doc = sample();
        assert!(Path::root().child_field("nope").resolve(&mut doc).is_none());

        let scalar = Path::root()
            .child_field("inner")
            .child_field("list")
            .child_index(0);
        assert!(scalar.resolve(&mut doc).is_none());
    }

    #[test]
    fn display_formats_segments() {
        let path = Path::root().child_field("a").child_index(3);
        assert_eq!(path.to_string(), "/a/3");
        assert_eq!(Path::root().to_string(), "/");
    }
}
