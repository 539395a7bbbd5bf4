//! The scalar alphabet of the document model.
//!
//! A [`Value`] is either a plain JSON-style scalar, a nested container
//! ([`Document`](crate::Document) or [`Array`](crate::Array)), or one of the
//! interop scalars carried for identity and wire compatibility with external
//! stores ([`ObjectId`], [`Symbol`], [`Code`], [`CodeWithScope`], [`MinKey`],
//! [`MaxKey`], [`Timestamp`]).
//!
//! Values are immutable once constructed, except when they are themselves a
//! `Document` or `Array` reached through an [`Editor`](crate::Editor).
//! Equality is deep and structural throughout, which is what the operation
//! log relies on for duplicate detection and value-based removal.

use crate::{Array, Document};
use std::fmt;

/// A single value in a document tree.
///
/// Construction is total: every variant is built from fully-formed parts and
/// there is no partially-initialized state. Cloning produces a fully
/// independent copy, including nested containers, because every variant owns
/// its data.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    // The #[serde] here is needed to get efficient encoding of byte-arrays
    // for protocols that support it:
    // <https://docs.rs/rmp-serde/1/rmp_serde/index.html#efficient-storage-of-u8-types>
    Binary(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
    Document(Document),
    Array(Array),
    ObjectId(ObjectId),
    Symbol(Symbol),
    Code(Code),
    CodeWithScope(CodeWithScope),
    MinKey,
    MaxKey,
    Timestamp(Timestamp),
}

impl Value {
    /// Gives a short name describing the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::Binary(_) => "Binary",
            Self::Document(_) => "Document",
            Self::Array(_) => "Array",
            Self::ObjectId(_) => "ObjectId",
            Self::Symbol(_) => "Symbol",
            Self::Code(_) => "Code",
            Self::CodeWithScope(_) => "CodeWithScope",
            Self::MinKey => "MinKey",
            Self::MaxKey => "MaxKey",
            Self::Timestamp(_) => "Timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Self::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(inner) => inner.fmt(f),
            Self::Int32(inner) => write!(f, "{inner}"),
            Self::Int64(inner) => write!(f, "{inner}L"),
            // {:?} always prints at least one decimal, so Int64 and Double
            // stay visually distinct.
            Self::Double(inner) => write!(f, "{inner:?}"),
            Self::String(inner) => inner.fmt(f),
            Self::Binary(inner) => write!(f, "{inner:02X?}"),
            Self::Document(inner) => inner.fmt(f),
            Self::Array(inner) => inner.fmt(f),
            Self::ObjectId(inner) => inner.fmt(f),
            Self::Symbol(inner) => inner.fmt(f),
            Self::Code(inner) => inner.fmt(f),
            Self::CodeWithScope(inner) => inner.fmt(f),
            Self::MinKey => write!(f, "MinKey"),
            Self::MaxKey => write!(f, "MaxKey"),
            Self::Timestamp(inner) => inner.fmt(f),
        }
    }
}

macro_rules! impl_from {
(
    $(
        $source:ty => $target:ident $(with $conv:ident)?
    ),* $(,)?
    ) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Self::$target(impl_from!(value$(, $conv)?))
                }
            }
        )*
    };

    ($value:ident, $conv:ident) => {
        $value.$conv()
    };

    ($value:ident) => {
        $value
    };
}

impl_from!(
    bool           => Boolean,
    i8             => Int32 with into,
    i16            => Int32 with into,
    i32            => Int32,
    i64            => Int64,
    f64            => Double,
    String         => String,
    &str           => String with to_string,
    Vec<u8>        => Binary,
    &[u8]          => Binary with into,
    Document       => Document,
    Array          => Array,
    ObjectId       => ObjectId,
    Symbol         => Symbol,
    Code           => Code,
    CodeWithScope  => CodeWithScope,
    Timestamp      => Timestamp,
);

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A 12-byte identity marker, printed and parsed as 24 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn new(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Parses 24 hex digits into an `ObjectId`.
    ///
    /// Returns `None` if the input has the wrong length or contains
    /// non-hex characters.
    pub fn parse(hex: &str) -> Option<Self> {
        if hex.len() != 24 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

/// An interned-name scalar, distinct from `String` on the wire but otherwise
/// behaving like one.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Symbol(pub String);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A code fragment carried opaquely through the store.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Code(pub String);

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({:?})", self.0)
    }
}

/// A code fragment paired with a scope document.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct CodeWithScope {
    pub code: String,
    pub scope: Document,
}

impl fmt::Debug for CodeWithScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({:?}, scope: {:?})", self.code, self.scope)
    }
}

/// A seconds-plus-increment instant, used as an opaque ordering marker.
///
/// The pair is *not* a wall-clock datetime by itself; the `increment`
/// disambiguates multiple instants recorded within the same second. With the
/// `chrono` feature enabled the seconds component converts to and from a
/// `DateTime<Utc>` truncated to whole seconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Timestamp {
    seconds: u32,
    increment: u32,
}

impl Timestamp {
    pub fn new(seconds: u32, increment: u32) -> Self {
        Self { seconds, increment }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// Creates a `Timestamp` from a `chrono::DateTime<Utc>`, truncating to
    /// whole seconds, with an increment of zero.
    ///
    /// Returns `None` for datetimes before the epoch or past the `u32`
    /// seconds range.
    #[cfg(feature = "chrono")]
    pub fn from_datetime(datetime: chrono::DateTime<chrono::Utc>) -> Option<Self> {
        let seconds = u32::try_from(datetime.timestamp()).ok()?;
        Some(Self {
            seconds,
            increment: 0,
        })
    }

    /// Converts the seconds component to a `chrono::DateTime<Utc>`.
    #[cfg(feature = "chrono")]
    pub fn as_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(i64::from(self.seconds), 0)
            .expect("u32 seconds is always in range")
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.seconds, self.increment)
    }
}
