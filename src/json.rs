//! JSON representation
//!
//! Documents convert losslessly to and from [`serde_json::Value`]. The JSON
//! type system is smaller than the document model, so the variants JSON lacks
//! are written as single-field wrapper objects keyed by a `$`-prefixed name,
//! in the style of extended JSON:
//!
//! | variant           | JSON form                                  |
//! |-------------------|--------------------------------------------|
//! | `Binary`          | `{ "$binary": "<base64>" }`                |
//! | `ObjectId`        | `{ "$oid": "<24 hex digits>" }`            |
//! | `Symbol`          | `{ "$symbol": "..." }`                     |
//! | `Code`            | `{ "$code": "..." }`                       |
//! | `CodeWithScope`   | `{ "$code": "...", "$scope": { ... } }`    |
//! | `MinKey`          | `{ "$minKey": 1 }`                         |
//! | `MaxKey`          | `{ "$maxKey": 1 }`                         |
//! | `Timestamp`       | `{ "$ts": <seconds>, "$inc": <counter> }`  |
//!
//! When parsing, an object whose first field name starts with `$` is treated
//! as one of these wrappers and rejected if malformed; `$`-prefixed field
//! names are therefore reserved and cannot appear in ordinary documents.
//!
//! Integers that fit `i32` parse as `Int32`, wider ones as `Int64`, and
//! everything else numeric as `Double`. A non-finite `Double` has no JSON
//! number form and renders as `null`.

use crate::{
    Array, Document, Value,
    value::{Code, CodeWithScope, ObjectId, Symbol, Timestamp},
};
use base64::Engine;
use serde_json::{Map, Number, json};
use thiserror::Error;

/// Failure to interpret JSON as a document.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("malformed JSON")]
    Parse(#[from] serde_json::Error),
    /// A `$`-prefixed wrapper object had the wrong shape or payload.
    #[error("malformed {wrapper} wrapper: {reason}")]
    MalformedWrapper {
        wrapper: &'static str,
        reason: &'static str,
    },
    /// Only objects can become documents.
    #[error("top-level JSON value is not an object")]
    NotAnObject,
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => (*b).into(),
            Value::Int32(n) => (*n).into(),
            Value::Int64(n) => (*n).into(),
            Value::Double(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => s.clone().into(),
            Value::Binary(bytes) => {
                json!({ "$binary": base64::engine::general_purpose::STANDARD.encode(bytes) })
            }
            Value::Document(doc) => doc.into(),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(serde_json::Value::from).collect())
            }
            Value::ObjectId(oid) => json!({ "$oid": oid.to_string() }),
            Value::Symbol(Symbol(s)) => json!({ "$symbol": s }),
            Value::Code(Code(s)) => json!({ "$code": s }),
            Value::CodeWithScope(cws) => {
                json!({ "$code": cws.code, "$scope": serde_json::Value::from(&cws.scope) })
            }
            Value::MinKey => json!({ "$minKey": 1 }),
            Value::MaxKey => json!({ "$maxKey": 1 }),
            Value::Timestamp(ts) => json!({ "$ts": ts.seconds(), "$inc": ts.increment() }),
        }
    }
}

impl From<&Document> for serde_json::Value {
    fn from(document: &Document) -> Self {
        let mut object = Map::with_capacity(document.len());
        for (name, value) in document.iter() {
            object.insert(name.to_string(), value.into());
        }
        serde_json::Value::Object(object)
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = JsonError;

    fn try_from(json: &serde_json::Value) -> Result<Self, JsonError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(i) => Value::Int32(i),
                        Err(_) => Value::Int64(i),
                    }
                } else {
                    // u64 beyond i64::MAX or a fractional number.
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                let mut array = Array::new();
                for item in items {
                    array.push(Value::try_from(item)?);
                }
                Value::Array(array)
            }
            serde_json::Value::Object(object) => match unwrap_extended(object)? {
                Some(value) => value,
                None => Value::Document(document_from_object(object)?),
            },
        })
    }
}

impl TryFrom<&serde_json::Value> for Document {
    type Error = JsonError;

    fn try_from(json: &serde_json::Value) -> Result<Self, JsonError> {
        match json {
            serde_json::Value::Object(object) => document_from_object(object),
            _ => Err(JsonError::NotAnObject),
        }
    }
}

impl Document {
    /// Parses a JSON object into a document.
    pub fn from_json_str(json: &str) -> Result<Self, JsonError> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Document::try_from(&parsed)
    }

    /// Renders the document as compact JSON.
    pub fn to_json_string(&self) -> String {
        serde_json::Value::from(self).to_string()
    }

    /// Renders the document as indented JSON.
    pub fn to_json_string_pretty(&self) -> String {
        let json = serde_json::Value::from(self);
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
    }
}

fn document_from_object(object: &Map<String, serde_json::Value>) -> Result<Document, JsonError> {
    let mut document = Document::new();
    for (name, value) in object {
        document.put(name.clone(), Value::try_from(value)?);
    }
    Ok(document)
}

/// Recognizes the `$`-prefixed wrapper objects. Returns `Ok(None)` for plain
/// objects.
fn unwrap_extended(
    object: &Map<String, serde_json::Value>,
) -> Result<Option<Value>, JsonError> {
    let Some(first) = object.keys().next() else {
        return Ok(None);
    };
    if !first.starts_with('$') {
        return Ok(None);
    }
    let malformed = |wrapper: &'static str, reason: &'static str| JsonError::MalformedWrapper {
        wrapper,
        reason,
    };
    let single = |wrapper: &'static str| -> Result<&serde_json::Value, JsonError> {
        if object.len() != 1 {
            return Err(malformed(wrapper, "extra fields"));
        }
        Ok(&object[wrapper])
    };
    Ok(Some(match first.as_str() {
        "$binary" => {
            let encoded = single("$binary")?
                .as_str()
                .ok_or_else(|| malformed("$binary", "payload is not a string"))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|_| malformed("$binary", "payload is not base64"))?;
            Value::Binary(bytes)
        }
        "$oid" => {
            let hex = single("$oid")?
                .as_str()
                .ok_or_else(|| malformed("$oid", "payload is not a string"))?;
            let oid = ObjectId::parse(hex).ok_or_else(|| malformed("$oid", "not 24 hex digits"))?;
            Value::ObjectId(oid)
        }
        "$symbol" => {
            let s = single("$symbol")?
                .as_str()
                .ok_or_else(|| malformed("$symbol", "payload is not a string"))?;
            Value::Symbol(Symbol(s.to_string()))
        }
        "$code" => {
            let code = object["$code"]
                .as_str()
                .ok_or_else(|| malformed("$code", "payload is not a string"))?
                .to_string();
            match object.len() {
                1 => Value::Code(Code(code)),
                2 => {
                    let scope = object
                        .get("$scope")
                        .ok_or_else(|| malformed("$code", "extra fields"))?;
                    let scope = Document::try_from(scope)
                        .map_err(|_| malformed("$code", "scope is not an object"))?;
                    Value::CodeWithScope(CodeWithScope { code, scope })
                }
                _ => return Err(malformed("$code", "extra fields")),
            }
        }
        "$minKey" => {
            single("$minKey")?;
            Value::MinKey
        }
        "$maxKey" => {
            single("$maxKey")?;
            Value::MaxKey
        }
        "$ts" | "$inc" => {
            let seconds = object
                .get("$ts")
                .and_then(serde_json::Value::as_u64)
                .and_then(|s| u32::try_from(s).ok())
                .ok_or_else(|| malformed("$ts", "seconds out of range"))?;
            let increment = object
                .get("$inc")
                .and_then(serde_json::Value::as_u64)
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| malformed("$ts", "increment out of range"))?;
            if object.len() != 2 {
                return Err(malformed("$ts", "extra fields"));
            }
            Value::Timestamp(Timestamp::new(seconds, increment))
        }
        _ => {
            return Err(JsonError::MalformedWrapper {
                wrapper: "$",
                reason: "unknown reserved field name",
            });
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(doc: &Document) -> Document {
        Document::from_json_str(&doc.to_json_string()).unwrap()
    }

    #[test]
    fn plain_json_types_map_directly() {
        let doc = Document::from_json_str(
            r#"{"s":"x","b":true,"n":null,"i":7,"big":9999999999,"f":1.5,"a":[1,2],"d":{"k":"v"}}"#,
        )
        .unwrap();
        assert_eq!(doc.get("s"), Some(&Value::String("x".into())));
        assert_eq!(doc.get("b"), Some(&Value::Boolean(true)));
        assert_eq!(doc.get("n"), Some(&Value::Null));
        assert_eq!(doc.get("i"), Some(&Value::Int32(7)));
        assert_eq!(doc.get("big"), Some(&Value::Int64(9_999_999_999)));
        assert_eq!(doc.get("f"), Some(&Value::Double(1.5)));
        assert!(matches!(doc.get("a"), Some(Value::Array(_))));
        assert!(matches!(doc.get("d"), Some(Value::Document(_))));
        assert_eq!(roundtrip(&doc), doc);
    }

    #[test]
    fn wrapped_variants_roundtrip() {
        let mut doc = Document::new();
        doc.put("bin", Value::Binary(vec![1, 2, 3]));
        doc.put("oid", Value::ObjectId(ObjectId::new([0xab; 12])));
        doc.put("sym", Value::Symbol(Symbol("name".into())));
        doc.put("code", Value::Code(Code("x + 1".into())));
        doc.put(
            "scoped",
            Value::CodeWithScope(CodeWithScope {
                code: "y".into(),
                scope: {
                    let mut scope = Document::new();
                    scope.put("y", 2);
                    scope
                },
            }),
        );
        doc.put("lo", Value::MinKey);
        doc.put("hi", Value::MaxKey);
        doc.put("ts", Value::Timestamp(Timestamp::new(10, 3)));
        assert_eq!(roundtrip(&doc), doc);
    }

    #[test]
    fn wrapper_shapes_are_the_documented_ones() {
        let mut doc = Document::new();
        doc.put("oid", Value::ObjectId(ObjectId::new([0x01; 12])));
        assert_eq!(
            doc.to_json_string(),
            r#"{"oid":{"$oid":"010101010101010101010101"}}"#
        );

        let mut doc = Document::new();
        doc.put("ts", Value::Timestamp(Timestamp::new(5, 1)));
        // serde_json orders object keys lexicographically.
        assert_eq!(doc.to_json_string(), r#"{"ts":{"$inc":1,"$ts":5}}"#);
    }

    #[test]
    fn malformed_wrappers_are_rejected() {
        for json in [
            r#"{"x":{"$oid":"nope"}}"#,
            r#"{"x":{"$binary":"???"}}"#,
            r#"{"x":{"$binary":"AA==","other":1}}"#,
            r#"{"x":{"$ts":5}}"#,
            r#"{"x":{"$unknown":1}}"#,
        ] {
            assert!(matches!(
                Document::from_json_str(json),
                Err(JsonError::MalformedWrapper { .. })
            ));
        }
    }

    #[test]
    fn top_level_non_object_is_rejected() {
        assert!(matches!(
            Document::from_json_str("[1,2,3]"),
            Err(JsonError::NotAnObject)
        ));
        assert!(matches!(
            Document::from_json_str("not json at all"),
            Err(JsonError::Parse(_))
        ));
    }

    #[test]
    fn non_finite_doubles_render_as_null() {
        let mut doc = Document::new();
        doc.put("nan", f64::NAN);
        assert_eq!(doc.to_json_string(), r#"{"nan":null}"#);
    }
}
