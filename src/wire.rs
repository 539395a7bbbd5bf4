//! Binary wire format and the serialization registry.
//!
//! Every persisted or transmitted object is `[type id: u8][payload]`;
//! containers (documents, arrays, changes) encode a `u32` element count
//! followed by their recursively encoded elements in iteration order.
//! Fixed-width integers are little-endian.
//!
//! The [`Registry`] is the fixed table mapping every concrete value,
//! operation, and entry variant to its stable numeric identifier and codec.
//! It is constructed once at process start, treated as read-only, and passed
//! explicitly to encode/decode call sites; there is no ambient global. The
//! id table in [`ids`] is append-only: identifiers are never reused, since
//! persisted entries and in-flight transfers may span process restarts and
//! mixed-version nodes. Decoding an id absent from the table fails
//! immediately with [`WireError::UnknownType`]; it is never skipped.

use crate::{
    Array, ArrayEntry, Changes, Document, Operation, Path, Value,
    entry::{ContentType, Entry, EntryMetadata},
    path::Segment,
    value::{Code, CodeWithScope, ObjectId, Symbol, Timestamp},
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use thiserror::Error;

/// Stable type identifiers. Append-only; never reuse a value.
pub mod ids {
    pub const NULL: u8 = 1;
    pub const BOOLEAN: u8 = 2;
    pub const INT32: u8 = 3;
    pub const INT64: u8 = 4;
    pub const DOUBLE: u8 = 5;
    pub const STRING: u8 = 6;
    pub const BINARY: u8 = 7;
    pub const DOCUMENT: u8 = 8;
    pub const ARRAY: u8 = 9;
    pub const OBJECT_ID: u8 = 10;
    pub const SYMBOL: u8 = 11;
    pub const CODE: u8 = 12;
    pub const CODE_WITH_SCOPE: u8 = 13;
    pub const MIN_KEY: u8 = 14;
    pub const MAX_KEY: u8 = 15;
    pub const TIMESTAMP: u8 = 16;
    pub const PATH: u8 = 17;
    pub const CHANGES: u8 = 18;
    pub const OP_PUT: u8 = 19;
    pub const OP_PUT_IF_ABSENT: u8 = 20;
    pub const OP_REMOVE: u8 = 21;
    pub const OP_SET_VALUE: u8 = 22;
    pub const OP_ADD_VALUE: u8 = 23;
    pub const OP_ADD_VALUE_IF_ABSENT: u8 = 24;
    pub const OP_REMOVE_VALUE: u8 = 25;
    pub const OP_REMOVE_AT_INDEX: u8 = 26;
    pub const OP_RETAIN_ALL_VALUES: u8 = 27;
    pub const OP_REMOVE_ALL_VALUES: u8 = 28;
    pub const OP_CLEAR: u8 = 29;
    pub const ENTRY_LITERAL: u8 = 30;
    pub const ENTRY_DELTA: u8 = 31;
    pub const ENTRY_WHOLE_DELTA: u8 = 32;

    pub(super) const ALL: &[(u8, &str)] = &[
        (NULL, "Null"),
        (BOOLEAN, "Boolean"),
        (INT32, "Int32"),
        (INT64, "Int64"),
        (DOUBLE, "Double"),
        (STRING, "String"),
        (BINARY, "Binary"),
        (DOCUMENT, "Document"),
        (ARRAY, "Array"),
        (OBJECT_ID, "ObjectId"),
        (SYMBOL, "Symbol"),
        (CODE, "Code"),
        (CODE_WITH_SCOPE, "CodeWithScope"),
        (MIN_KEY, "MinKey"),
        (MAX_KEY, "MaxKey"),
        (TIMESTAMP, "Timestamp"),
        (PATH, "Path"),
        (CHANGES, "Changes"),
        (OP_PUT, "Put"),
        (OP_PUT_IF_ABSENT, "PutIfAbsent"),
        (OP_REMOVE, "Remove"),
        (OP_SET_VALUE, "SetValue"),
        (OP_ADD_VALUE, "AddValue"),
        (OP_ADD_VALUE_IF_ABSENT, "AddValueIfAbsent"),
        (OP_REMOVE_VALUE, "RemoveValue"),
        (OP_REMOVE_AT_INDEX, "RemoveAtIndex"),
        (OP_RETAIN_ALL_VALUES, "RetainAllValues"),
        (OP_REMOVE_ALL_VALUES, "RemoveAllValues"),
        (OP_CLEAR, "Clear"),
        (ENTRY_LITERAL, "EntryLiteral"),
        (ENTRY_DELTA, "EntryDelta"),
        (ENTRY_WHOLE_DELTA, "EntryWholeDelta"),
    ];
}

/// Decoding failure. Encoding into a byte vector cannot fail.
#[derive(Debug, Error)]
pub enum WireError {
    /// The id is absent from the registry, likely a newer peer or
    /// corruption. Fatal for this decode; surfaced immediately so data is
    /// never silently dropped.
    #[error("unknown type id {id} while decoding {context}")]
    UnknownType { id: u8, context: &'static str },
    /// A registered but out-of-place id (say, an operation id where a value
    /// was required).
    #[error("expected {expected} but found {found} ({id})")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
        id: u8,
    },
    #[error("input ended mid-{0}")]
    UnexpectedEof(&'static str),
    #[error("invalid {0} payload")]
    InvalidPayload(&'static str),
}

/// The constructed-once table of codecs for every registered type.
pub struct Registry {
    names: [Option<&'static str>; 256],
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Builds the registry deterministically from the [`ids`] table.
    pub fn new() -> Self {
        let mut names = [None; 256];
        for &(id, name) in ids::ALL {
            debug_assert!(names[id as usize].is_none(), "duplicate type id {id}");
            names[id as usize] = Some(name);
        }
        Self { names }
    }

    pub fn is_registered(&self, id: u8) -> bool {
        self.names[id as usize].is_some()
    }

    pub fn name_of(&self, id: u8) -> Option<&'static str> {
        self.names[id as usize]
    }

    fn expect_id(
        &self,
        input: &mut &[u8],
        expected_id: u8,
        context: &'static str,
    ) -> Result<(), WireError> {
        let id = read_u8(input, context)?;
        if id == expected_id {
            return Ok(());
        }
        match self.name_of(id) {
            Some(found) => Err(WireError::UnexpectedType {
                expected: context,
                found,
                id,
            }),
            None => Err(WireError::UnknownType { id, context }),
        }
    }

    // --- values ---

    pub fn encode_value(&self, value: &Value, out: &mut Vec<u8>) {
        match value {
            Value::Null => out.push(ids::NULL),
            Value::Boolean(b) => {
                out.push(ids::BOOLEAN);
                out.push(u8::from(*b));
            }
            Value::Int32(n) => {
                out.push(ids::INT32);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Value::Int64(n) => {
                out.push(ids::INT64);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Value::Double(n) => {
                out.push(ids::DOUBLE);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Value::String(s) => {
                out.push(ids::STRING);
                write_str(s, out);
            }
            Value::Binary(bytes) => {
                out.push(ids::BINARY);
                write_bytes(bytes, out);
            }
            Value::Document(doc) => {
                out.push(ids::DOCUMENT);
                self.write_document_body(doc, out);
            }
            Value::Array(arr) => {
                out.push(ids::ARRAY);
                self.write_array_body(arr, out);
            }
            Value::ObjectId(oid) => {
                out.push(ids::OBJECT_ID);
                out.extend_from_slice(oid.bytes());
            }
            Value::Symbol(Symbol(s)) => {
                out.push(ids::SYMBOL);
                write_str(s, out);
            }
            Value::Code(Code(s)) => {
                out.push(ids::CODE);
                write_str(s, out);
            }
            Value::CodeWithScope(cws) => {
                out.push(ids::CODE_WITH_SCOPE);
                write_str(&cws.code, out);
                self.write_document_body(&cws.scope, out);
            }
            Value::MinKey => out.push(ids::MIN_KEY),
            Value::MaxKey => out.push(ids::MAX_KEY),
            Value::Timestamp(ts) => {
                out.push(ids::TIMESTAMP);
                out.extend_from_slice(&ts.seconds().to_le_bytes());
                out.extend_from_slice(&ts.increment().to_le_bytes());
            }
        }
    }

    pub fn decode_value(&self, input: &mut &[u8]) -> Result<Value, WireError> {
        let id = read_u8(input, "value")?;
        Ok(match id {
            ids::NULL => Value::Null,
            ids::BOOLEAN => Value::Boolean(read_bool(input)?),
            ids::INT32 => Value::Int32(
                input
                    .read_i32::<LittleEndian>()
                    .map_err(|_| WireError::UnexpectedEof("Int32"))?,
            ),
            ids::INT64 => Value::Int64(
                input
                    .read_i64::<LittleEndian>()
                    .map_err(|_| WireError::UnexpectedEof("Int64"))?,
            ),
            ids::DOUBLE => Value::Double(
                input
                    .read_f64::<LittleEndian>()
                    .map_err(|_| WireError::UnexpectedEof("Double"))?,
            ),
            ids::STRING => Value::String(read_str(input)?),
            ids::BINARY => Value::Binary(read_byte_vec(input)?),
            ids::DOCUMENT => Value::Document(self.read_document_body(input)?),
            ids::ARRAY => Value::Array(self.read_array_body(input)?),
            ids::OBJECT_ID => {
                let mut bytes = [0u8; 12];
                input
                    .read_exact(&mut bytes)
                    .map_err(|_| WireError::UnexpectedEof("ObjectId"))?;
                Value::ObjectId(ObjectId::new(bytes))
            }
            ids::SYMBOL => Value::Symbol(Symbol(read_str(input)?)),
            ids::CODE => Value::Code(Code(read_str(input)?)),
            ids::CODE_WITH_SCOPE => {
                let code = read_str(input)?;
                let scope = self.read_document_body(input)?;
                Value::CodeWithScope(CodeWithScope { code, scope })
            }
            ids::MIN_KEY => Value::MinKey,
            ids::MAX_KEY => Value::MaxKey,
            ids::TIMESTAMP => {
                let seconds = input
                    .read_u32::<LittleEndian>()
                    .map_err(|_| WireError::UnexpectedEof("Timestamp"))?;
                let increment = input
                    .read_u32::<LittleEndian>()
                    .map_err(|_| WireError::UnexpectedEof("Timestamp"))?;
                Value::Timestamp(Timestamp::new(seconds, increment))
            }
            other => match self.name_of(other) {
                Some(found) => {
                    return Err(WireError::UnexpectedType {
                        expected: "value",
                        found,
                        id: other,
                    });
                }
                None => {
                    return Err(WireError::UnknownType {
                        id: other,
                        context: "value",
                    });
                }
            },
        })
    }

    // --- containers ---

    pub fn encode_document(&self, document: &Document, out: &mut Vec<u8>) {
        out.push(ids::DOCUMENT);
        self.write_document_body(document, out);
    }

    pub fn decode_document(&self, input: &mut &[u8]) -> Result<Document, WireError> {
        self.expect_id(input, ids::DOCUMENT, "Document")?;
        self.read_document_body(input)
    }

    fn write_document_body(&self, document: &Document, out: &mut Vec<u8>) {
        write_count(document.len(), out);
        for (name, value) in document.iter() {
            write_str(name, out);
            self.encode_value(value, out);
        }
    }

    fn read_document_body(&self, input: &mut &[u8]) -> Result<Document, WireError> {
        let count = read_count(input, "Document")?;
        let mut document = Document::new();
        for _ in 0..count {
            let name = read_str(input)?;
            let value = self.decode_value(input)?;
            document.put(name, value);
        }
        Ok(document)
    }

    fn write_array_body(&self, array: &Array, out: &mut Vec<u8>) {
        write_count(array.len(), out);
        for value in array.iter() {
            self.encode_value(value, out);
        }
    }

    fn read_array_body(&self, input: &mut &[u8]) -> Result<Array, WireError> {
        let count = read_count(input, "Array")?;
        let mut array = Array::new();
        for _ in 0..count {
            array.push(self.decode_value(input)?);
        }
        Ok(array)
    }

    // --- paths ---

    pub fn encode_path(&self, path: &Path, out: &mut Vec<u8>) {
        out.push(ids::PATH);
        write_count(path.len(), out);
        for segment in path.segments() {
            match segment {
                Segment::Field(name) => {
                    out.push(0);
                    write_str(name, out);
                }
                Segment::Index(index) => {
                    out.push(1);
                    write_u64(*index as u64, out);
                }
            }
        }
    }

    pub fn decode_path(&self, input: &mut &[u8]) -> Result<Path, WireError> {
        self.expect_id(input, ids::PATH, "Path")?;
        let count = read_count(input, "Path")?;
        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            segments.push(match read_u8(input, "Path segment")? {
                0 => Segment::Field(read_str(input)?),
                1 => Segment::Index(read_usize(input, "Path segment")?),
                _ => return Err(WireError::InvalidPayload("Path segment")),
            });
        }
        Ok(segments.into_iter().collect())
    }

    // --- operations ---

    pub fn encode_operation(&self, operation: &Operation, out: &mut Vec<u8>) {
        match operation {
            Operation::Put {
                path,
                field,
                new_value,
                old_value,
            } => {
                out.push(ids::OP_PUT);
                self.encode_path(path, out);
                write_str(field, out);
                self.encode_value(new_value, out);
                self.write_opt_value(old_value, out);
            }
            Operation::PutIfAbsent {
                path,
                field,
                new_value,
                applied,
            } => {
                out.push(ids::OP_PUT_IF_ABSENT);
                self.encode_path(path, out);
                write_str(field, out);
                self.encode_value(new_value, out);
                out.push(u8::from(*applied));
            }
            Operation::Remove {
                path,
                field,
                removed,
            } => {
                out.push(ids::OP_REMOVE);
                self.encode_path(path, out);
                write_str(field, out);
                self.write_opt_value(removed, out);
            }
            Operation::SetValue { path, index, value } => {
                out.push(ids::OP_SET_VALUE);
                self.encode_path(path, out);
                write_u64(*index as u64, out);
                self.encode_value(value, out);
            }
            Operation::AddValue {
                path,
                requested_index,
                value,
                actual_index,
            } => {
                out.push(ids::OP_ADD_VALUE);
                self.encode_path(path, out);
                write_opt_u64(*requested_index, out);
                self.encode_value(value, out);
                write_opt_u64(*actual_index, out);
            }
            Operation::AddValueIfAbsent {
                path,
                value,
                added,
                index,
            } => {
                out.push(ids::OP_ADD_VALUE_IF_ABSENT);
                self.encode_path(path, out);
                self.encode_value(value, out);
                out.push(u8::from(*added));
                write_u64(*index as u64, out);
            }
            Operation::RemoveValue {
                path,
                value,
                actual_index,
            } => {
                out.push(ids::OP_REMOVE_VALUE);
                self.encode_path(path, out);
                self.encode_value(value, out);
                write_opt_u64(*actual_index, out);
            }
            Operation::RemoveAtIndex {
                path,
                index,
                removed,
            } => {
                out.push(ids::OP_REMOVE_AT_INDEX);
                self.encode_path(path, out);
                write_u64(*index as u64, out);
                self.encode_value(removed, out);
            }
            Operation::RetainAllValues {
                path,
                values,
                removed,
            } => {
                out.push(ids::OP_RETAIN_ALL_VALUES);
                self.encode_path(path, out);
                self.write_value_list(values, out);
                self.write_entry_list(removed, out);
            }
            Operation::RemoveAllValues {
                path,
                values,
                removed,
            } => {
                out.push(ids::OP_REMOVE_ALL_VALUES);
                self.encode_path(path, out);
                self.write_value_list(values, out);
                self.write_entry_list(removed, out);
            }
            Operation::Clear { path } => {
                out.push(ids::OP_CLEAR);
                self.encode_path(path, out);
            }
        }
    }

    pub fn decode_operation(&self, input: &mut &[u8]) -> Result<Operation, WireError> {
        let id = read_u8(input, "operation")?;
        Ok(match id {
            ids::OP_PUT => Operation::Put {
                path: self.decode_path(input)?,
                field: read_str(input)?,
                new_value: self.decode_value(input)?,
                old_value: self.read_opt_value(input)?,
            },
            ids::OP_PUT_IF_ABSENT => Operation::PutIfAbsent {
                path: self.decode_path(input)?,
                field: read_str(input)?,
                new_value: self.decode_value(input)?,
                applied: read_bool(input)?,
            },
            ids::OP_REMOVE => Operation::Remove {
                path: self.decode_path(input)?,
                field: read_str(input)?,
                removed: self.read_opt_value(input)?,
            },
            ids::OP_SET_VALUE => Operation::SetValue {
                path: self.decode_path(input)?,
                index: read_usize(input, "SetValue")?,
                value: self.decode_value(input)?,
            },
            ids::OP_ADD_VALUE => Operation::AddValue {
                path: self.decode_path(input)?,
                requested_index: read_opt_usize(input, "AddValue")?,
                value: self.decode_value(input)?,
                actual_index: read_opt_usize(input, "AddValue")?,
            },
            ids::OP_ADD_VALUE_IF_ABSENT => Operation::AddValueIfAbsent {
                path: self.decode_path(input)?,
                value: self.decode_value(input)?,
                added: read_bool(input)?,
                index: read_usize(input, "AddValueIfAbsent")?,
            },
            ids::OP_REMOVE_VALUE => Operation::RemoveValue {
                path: self.decode_path(input)?,
                value: self.decode_value(input)?,
                actual_index: read_opt_usize(input, "RemoveValue")?,
            },
            ids::OP_REMOVE_AT_INDEX => Operation::RemoveAtIndex {
                path: self.decode_path(input)?,
                index: read_usize(input, "RemoveAtIndex")?,
                removed: self.decode_value(input)?,
            },
            ids::OP_RETAIN_ALL_VALUES => Operation::RetainAllValues {
                path: self.decode_path(input)?,
                values: self.read_value_list(input)?,
                removed: self.read_entry_list(input)?,
            },
            ids::OP_REMOVE_ALL_VALUES => Operation::RemoveAllValues {
                path: self.decode_path(input)?,
                values: self.read_value_list(input)?,
                removed: self.read_entry_list(input)?,
            },
            ids::OP_CLEAR => Operation::Clear {
                path: self.decode_path(input)?,
            },
            other => match self.name_of(other) {
                Some(found) => {
                    return Err(WireError::UnexpectedType {
                        expected: "operation",
                        found,
                        id: other,
                    });
                }
                None => {
                    return Err(WireError::UnknownType {
                        id: other,
                        context: "operation",
                    });
                }
            },
        })
    }

    // --- changes ---

    pub fn encode_changes(&self, changes: &Changes, out: &mut Vec<u8>) {
        out.push(ids::CHANGES);
        write_count(changes.len(), out);
        for operation in changes {
            self.encode_operation(operation, out);
        }
    }

    pub fn decode_changes(&self, input: &mut &[u8]) -> Result<Changes, WireError> {
        self.expect_id(input, ids::CHANGES, "Changes")?;
        let count = read_count(input, "Changes")?;
        let mut operations = Vec::with_capacity(count);
        for _ in 0..count {
            operations.push(self.decode_operation(input)?);
        }
        Ok(operations.into_iter().collect())
    }

    // --- entries ---

    pub fn encode_entry(&self, entry: &Entry, out: &mut Vec<u8>) {
        match entry {
            Entry::Literal { metadata, document } => {
                out.push(ids::ENTRY_LITERAL);
                write_metadata(metadata, out);
                self.encode_document(document, out);
            }
            Entry::Delta {
                metadata,
                base_version,
                changes,
            } => {
                out.push(ids::ENTRY_DELTA);
                write_metadata(metadata, out);
                write_u64(*base_version, out);
                self.encode_changes(changes, out);
            }
            Entry::WholeDelta { metadata, document } => {
                out.push(ids::ENTRY_WHOLE_DELTA);
                write_metadata(metadata, out);
                self.encode_document(document, out);
            }
        }
    }

    pub fn decode_entry(&self, input: &mut &[u8]) -> Result<Entry, WireError> {
        let id = read_u8(input, "entry")?;
        Ok(match id {
            ids::ENTRY_LITERAL => Entry::Literal {
                metadata: read_metadata(input)?,
                document: self.decode_document(input)?,
            },
            ids::ENTRY_DELTA => Entry::Delta {
                metadata: read_metadata(input)?,
                base_version: read_u64(input, "entry")?,
                changes: self.decode_changes(input)?,
            },
            ids::ENTRY_WHOLE_DELTA => Entry::WholeDelta {
                metadata: read_metadata(input)?,
                document: self.decode_document(input)?,
            },
            other => match self.name_of(other) {
                Some(found) => {
                    return Err(WireError::UnexpectedType {
                        expected: "entry",
                        found,
                        id: other,
                    });
                }
                None => {
                    return Err(WireError::UnknownType {
                        id: other,
                        context: "entry",
                    });
                }
            },
        })
    }

    // --- shared helpers needing the registry ---

    fn write_opt_value(&self, value: &Option<Value>, out: &mut Vec<u8>) {
        match value {
            Some(value) => {
                out.push(1);
                self.encode_value(value, out);
            }
            None => out.push(0),
        }
    }

    fn read_opt_value(&self, input: &mut &[u8]) -> Result<Option<Value>, WireError> {
        match read_u8(input, "optional value")? {
            0 => Ok(None),
            1 => Ok(Some(self.decode_value(input)?)),
            _ => Err(WireError::InvalidPayload("optional value")),
        }
    }

    fn write_value_list(&self, values: &[Value], out: &mut Vec<u8>) {
        write_count(values.len(), out);
        for value in values {
            self.encode_value(value, out);
        }
    }

    fn read_value_list(&self, input: &mut &[u8]) -> Result<Vec<Value>, WireError> {
        let count = read_count(input, "value list")?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.decode_value(input)?);
        }
        Ok(values)
    }

    fn write_entry_list(&self, entries: &[ArrayEntry], out: &mut Vec<u8>) {
        write_count(entries.len(), out);
        for entry in entries {
            write_u64(entry.index as u64, out);
            self.encode_value(&entry.value, out);
        }
    }

    fn read_entry_list(&self, input: &mut &[u8]) -> Result<Vec<ArrayEntry>, WireError> {
        let count = read_count(input, "entry list")?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let index = read_usize(input, "entry list")?;
            let value = self.decode_value(input)?;
            entries.push(ArrayEntry::new(index, value));
        }
        Ok(entries)
    }
}

// --- primitive helpers ---

fn write_str(s: &str, out: &mut Vec<u8>) {
    write_count(s.len(), out);
    out.extend_from_slice(s.as_bytes());
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_count(bytes.len(), out);
    out.extend_from_slice(bytes);
}

fn write_count(count: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(count as u32).to_le_bytes());
}

fn write_u64(value: u64, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_opt_u64(value: Option<usize>, out: &mut Vec<u8>) {
    match value {
        Some(value) => {
            out.push(1);
            write_u64(value as u64, out);
        }
        None => out.push(0),
    }
}

fn write_metadata(metadata: &EntryMetadata, out: &mut Vec<u8>) {
    out.push(match metadata.content_type {
        ContentType::Json => 0,
        ContentType::Binary => 1,
    });
    write_u64(metadata.version, out);
}

fn read_metadata(input: &mut &[u8]) -> Result<EntryMetadata, WireError> {
    let content_type = match read_u8(input, "entry metadata")? {
        0 => ContentType::Json,
        1 => ContentType::Binary,
        _ => return Err(WireError::InvalidPayload("content type")),
    };
    let version = read_u64(input, "entry metadata")?;
    Ok(EntryMetadata {
        content_type,
        version,
    })
}

fn read_u8(input: &mut &[u8], context: &'static str) -> Result<u8, WireError> {
    input.read_u8().map_err(|_| WireError::UnexpectedEof(context))
}

fn read_bool(input: &mut &[u8]) -> Result<bool, WireError> {
    match read_u8(input, "boolean")? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(WireError::InvalidPayload("boolean")),
    }
}

fn read_u64(input: &mut &[u8], context: &'static str) -> Result<u64, WireError> {
    input
        .read_u64::<LittleEndian>()
        .map_err(|_| WireError::UnexpectedEof(context))
}

fn read_usize(input: &mut &[u8], context: &'static str) -> Result<usize, WireError> {
    let value = read_u64(input, context)?;
    usize::try_from(value).map_err(|_| WireError::InvalidPayload(context))
}

fn read_opt_usize(input: &mut &[u8], context: &'static str) -> Result<Option<usize>, WireError> {
    match read_u8(input, context)? {
        0 => Ok(None),
        1 => Ok(Some(read_usize(input, context)?)),
        _ => Err(WireError::InvalidPayload(context)),
    }
}

fn read_count(input: &mut &[u8], context: &'static str) -> Result<usize, WireError> {
    let count = input
        .read_u32::<LittleEndian>()
        .map_err(|_| WireError::UnexpectedEof(context))?;
    Ok(count as usize)
}

fn read_str(input: &mut &[u8]) -> Result<String, WireError> {
    let len = read_count(input, "string")?;
    if input.len() < len {
        return Err(WireError::UnexpectedEof("string"));
    }
    let (bytes, rest) = input.split_at(len);
    let s = std::str::from_utf8(bytes)
        .map_err(|_| WireError::InvalidPayload("string"))?
        .to_string();
    *input = rest;
    Ok(s)
}

fn read_byte_vec(input: &mut &[u8]) -> Result<Vec<u8>, WireError> {
    let len = read_count(input, "binary")?;
    if input.len() < len {
        return Err(WireError::UnexpectedEof("binary"));
    }
    let (bytes, rest) = input.split_at(len);
    let bytes = bytes.to_vec();
    *input = rest;
    Ok(bytes)
}
