//! Dynamically typed values.
//!
//! Every encodable datum is a [`Value`]. Documents and arrays are two of its
//! cases, so traversal code dispatches on the variant tag alone.

use std::fmt;

use crate::model::{Document, ObjectId};

/// Value kinds with their wire type bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueKind {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Boolean = 0x08,
    Null = 0x0A,
    Int32 = 0x10,
    Int64 = 0x12,
}

impl ValueKind {
    /// Every kind, in wire byte order.
    pub const ALL: [ValueKind; 10] = [
        ValueKind::Double,
        ValueKind::String,
        ValueKind::Document,
        ValueKind::Array,
        ValueKind::Binary,
        ValueKind::ObjectId,
        ValueKind::Boolean,
        ValueKind::Null,
        ValueKind::Int32,
        ValueKind::Int64,
    ];

    /// Creates a ValueKind from its wire representation.
    pub fn from_u8(v: u8) -> Option<ValueKind> {
        match v {
            0x01 => Some(ValueKind::Double),
            0x02 => Some(ValueKind::String),
            0x03 => Some(ValueKind::Document),
            0x04 => Some(ValueKind::Array),
            0x05 => Some(ValueKind::Binary),
            0x07 => Some(ValueKind::ObjectId),
            0x08 => Some(ValueKind::Boolean),
            0x0A => Some(ValueKind::Null),
            0x10 => Some(ValueKind::Int32),
            0x12 => Some(ValueKind::Int64),
            _ => None,
        }
    }

    /// Returns the wire type byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true for documents and arrays.
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Document | ValueKind::Array)
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    /// Opaque bytes (generic binary subtype).
    Binary(Vec<u8>),
    /// Globally-unique identifier, the default `_id` value.
    ObjectId(ObjectId),
    Document(Document),
    Array(Vec<Value>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Binary(_) => ValueKind::Binary,
            Value::ObjectId(_) => ValueKind::ObjectId,
            Value::Document(_) => ValueKind::Document,
            Value::Array(_) => ValueKind::Array,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Renders scalars the way a hook stringifying a value would expect:
/// `1.1` for doubles, the raw text for strings, hex for ids.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::String(s) => f.write_str(s),
            Value::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::ObjectId(id) => write!(f, "{id}"),
            Value::Document(doc) => {
                f.write_str("{")?;
                for (i, (key, value)) in doc.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, value) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_byte_roundtrip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(ValueKind::from_u8(0x00), None);
        assert_eq!(ValueKind::from_u8(0x06), None);
        assert_eq!(ValueKind::from_u8(0xFF), None);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(1).kind(), ValueKind::Int32);
        assert_eq!(Value::from(1i64).kind(), ValueKind::Int64);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Double);
        assert_eq!(Value::from("a").kind(), ValueKind::String);
        assert_eq!(Value::from(vec![1u8]).kind(), ValueKind::Binary);
        assert_eq!(Value::from(Document::new()).kind(), ValueKind::Document);
        assert_eq!(Value::from(vec![Value::Null]).kind(), ValueKind::Array);
    }

    #[test]
    fn test_container_kinds() {
        assert!(ValueKind::Document.is_container());
        assert!(ValueKind::Array.is_container());
        assert!(!ValueKind::Double.is_container());
        assert!(!ValueKind::ObjectId.is_container());
    }

    #[test]
    fn test_double_display() {
        assert_eq!(Value::Double(1.1).to_string(), "1.1");
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::from("x").to_string(), "x");
    }
}
