//! In-memory sink and source backed by [`Document`] values.
//!
//! Useful for inspecting exactly what the codec emits (field order, value
//! kinds) without a byte-level round trip.

use crate::codec::sink::{DocumentSink, DocumentSource};
use crate::error::{DecodeError, EncodeError};
use crate::model::{Document, ObjectId, Value, ValueKind};

// =============================================================================
// ENCODING
// =============================================================================

#[derive(Debug)]
enum Building {
    Document {
        doc: Document,
        pending_name: Option<String>,
    },
    Array(Vec<Value>),
}

/// Sink that materializes the written stream as a [`Document`].
#[derive(Debug, Default)]
pub struct TreeWriter {
    stack: Vec<Building>,
    finished: Option<Document>,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completed top-level document.
    pub fn into_document(self) -> Result<Document, EncodeError> {
        self.finished.ok_or(EncodeError::InvalidState {
            context: "no completed document",
        })
    }

    fn attach(&mut self, value: Value) -> Result<(), EncodeError> {
        match self.stack.last_mut() {
            Some(Building::Document { doc, pending_name }) => {
                let name = pending_name.take().ok_or(EncodeError::InvalidState {
                    context: "value written without a name",
                })?;
                doc.insert(name, value);
                Ok(())
            }
            Some(Building::Array(items)) => {
                items.push(value);
                Ok(())
            }
            None => Err(EncodeError::InvalidState {
                context: "value written outside a document",
            }),
        }
    }
}

impl DocumentSink for TreeWriter {
    fn write_start_document(&mut self) -> Result<(), EncodeError> {
        if self.stack.is_empty() && self.finished.is_some() {
            return Err(EncodeError::InvalidState {
                context: "document already completed",
            });
        }
        self.stack.push(Building::Document {
            doc: Document::new(),
            pending_name: None,
        });
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), EncodeError> {
        match self.stack.pop() {
            Some(Building::Document {
                doc,
                pending_name: None,
            }) => {
                if self.stack.is_empty() {
                    self.finished = Some(doc);
                    Ok(())
                } else {
                    self.attach(Value::Document(doc))
                }
            }
            _ => Err(EncodeError::InvalidState {
                context: "mismatched end of document",
            }),
        }
    }

    fn write_start_array(&mut self) -> Result<(), EncodeError> {
        if self.stack.is_empty() {
            return Err(EncodeError::InvalidState {
                context: "array written outside a document",
            });
        }
        self.stack.push(Building::Array(Vec::new()));
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), EncodeError> {
        match self.stack.pop() {
            Some(Building::Array(items)) => self.attach(Value::Array(items)),
            _ => Err(EncodeError::InvalidState {
                context: "mismatched end of array",
            }),
        }
    }

    fn write_name(&mut self, name: &str) -> Result<(), EncodeError> {
        match self.stack.last_mut() {
            Some(Building::Document { pending_name, .. }) if pending_name.is_none() => {
                *pending_name = Some(name.to_string());
                Ok(())
            }
            _ => Err(EncodeError::InvalidState {
                context: "name written out of place",
            }),
        }
    }

    fn write_null(&mut self) -> Result<(), EncodeError> {
        self.attach(Value::Null)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.attach(Value::Boolean(value))
    }

    fn write_int32(&mut self, value: i32) -> Result<(), EncodeError> {
        self.attach(Value::Int32(value))
    }

    fn write_int64(&mut self, value: i64) -> Result<(), EncodeError> {
        self.attach(Value::Int64(value))
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.attach(Value::Double(value))
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.attach(Value::String(value.to_string()))
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.attach(Value::Binary(value.to_vec()))
    }

    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), EncodeError> {
        self.attach(Value::ObjectId(*value))
    }
}

// =============================================================================
// DECODING
// =============================================================================

#[derive(Debug)]
enum Walking {
    Document(std::vec::IntoIter<(String, Value)>),
    Array(std::vec::IntoIter<Value>),
}

/// Source that replays a [`Document`] as a read stream.
#[derive(Debug)]
pub struct TreeReader {
    root: Option<Document>,
    stack: Vec<Walking>,
    current_name: Option<String>,
    current: Option<Value>,
}

impl TreeReader {
    pub fn new(document: Document) -> Self {
        Self {
            root: Some(document),
            stack: Vec::new(),
            current_name: None,
            current: None,
        }
    }

    fn take_value(&mut self, expected: ValueKind) -> Result<Value, DecodeError> {
        match self.current.take() {
            Some(value) if value.kind() == expected => {
                self.current_name = None;
                Ok(value)
            }
            Some(value) => {
                let found = value.kind();
                self.current = Some(value);
                Err(DecodeError::KindMismatch { expected, found })
            }
            None => Err(DecodeError::MalformedEncoding {
                context: "value read without a kind",
            }),
        }
    }
}

impl DocumentSource for TreeReader {
    fn read_start_document(&mut self) -> Result<(), DecodeError> {
        let doc = if self.stack.is_empty() {
            self.root.take().ok_or(DecodeError::MalformedEncoding {
                context: "document already read",
            })?
        } else {
            match self.take_value(ValueKind::Document)? {
                Value::Document(doc) => doc,
                _ => unreachable!("take_value checked the kind"),
            }
        };
        self.stack.push(Walking::Document(doc.into_iter()));
        Ok(())
    }

    fn read_end_document(&mut self) -> Result<(), DecodeError> {
        match self.stack.pop() {
            Some(Walking::Document(rest)) if rest.as_slice().is_empty() => Ok(()),
            _ => Err(DecodeError::MalformedEncoding {
                context: "end of document before its last field",
            }),
        }
    }

    fn read_start_array(&mut self) -> Result<(), DecodeError> {
        match self.take_value(ValueKind::Array)? {
            Value::Array(items) => {
                self.stack.push(Walking::Array(items.into_iter()));
                Ok(())
            }
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_end_array(&mut self) -> Result<(), DecodeError> {
        match self.stack.pop() {
            Some(Walking::Array(rest)) if rest.as_slice().is_empty() => Ok(()),
            _ => Err(DecodeError::MalformedEncoding {
                context: "end of array before its last element",
            }),
        }
    }

    fn read_value_kind(&mut self) -> Result<Option<ValueKind>, DecodeError> {
        if self.current.is_some() {
            return Err(DecodeError::MalformedEncoding {
                context: "previous value not consumed",
            });
        }
        let next = match self.stack.last_mut() {
            Some(Walking::Document(fields)) => fields.next().map(|(name, value)| (Some(name), value)),
            Some(Walking::Array(items)) => items.next().map(|value| (None, value)),
            None => {
                return Err(DecodeError::MalformedEncoding {
                    context: "kind read outside a document",
                })
            }
        };
        Ok(next.map(|(name, value)| {
            let kind = value.kind();
            self.current_name = name;
            self.current = Some(value);
            kind
        }))
    }

    fn read_name(&mut self) -> Result<String, DecodeError> {
        self.current_name.take().ok_or(DecodeError::MalformedEncoding {
            context: "name read without a pending element",
        })
    }

    fn read_null(&mut self) -> Result<(), DecodeError> {
        self.take_value(ValueKind::Null).map(|_| ())
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.take_value(ValueKind::Boolean)? {
            Value::Boolean(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_int32(&mut self) -> Result<i32, DecodeError> {
        match self.take_value(ValueKind::Int32)? {
            Value::Int32(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_int64(&mut self) -> Result<i64, DecodeError> {
        match self.take_value(ValueKind::Int64)? {
            Value::Int64(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        match self.take_value(ValueKind::Double)? {
            Value::Double(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        match self.take_value(ValueKind::String)? {
            Value::String(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        match self.take_value(ValueKind::Binary)? {
            Value::Binary(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn read_object_id(&mut self) -> Result<ObjectId, DecodeError> {
        match self.take_value(ValueKind::ObjectId)? {
            Value::ObjectId(v) => Ok(v),
            _ => unreachable!("take_value checked the kind"),
        }
    }
}
