//! Binary sink and source.
//!
//! Wire layout (all integers little-endian):
//! ```text
//! document := i32 total_len, element*, 0x00
//! element  := kind_byte, cstring key, payload
//! array    := document whose keys are "0", "1", ...
//! string   := i32 (len + 1), utf8 bytes, 0x00
//! binary   := i32 len, 0x00 subtype, bytes
//! objectid := 12 raw bytes
//! ```

use crate::codec::primitives::{length_prefix, Reader, Writer};
use crate::codec::sink::{DocumentSink, DocumentSource};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_DOCUMENT_SIZE, MAX_LENGTH_PREFIX, MIN_DOCUMENT_SIZE, OBJECT_ID_LEN};
use crate::model::{ObjectId, ValueKind};

/// Binary subtype for generic bytes.
const BINARY_SUBTYPE_GENERIC: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Document,
    Array,
}

// =============================================================================
// ENCODING
// =============================================================================

#[derive(Debug)]
struct WriteFrame {
    container: Container,
    /// Offset of the length prefix.
    start: usize,
    next_index: usize,
}

/// Sink writing the binary format into an owned buffer.
#[derive(Debug)]
pub struct BinaryWriter {
    writer: Writer,
    stack: Vec<WriteFrame>,
    pending_name: Option<String>,
    max_document_size: usize,
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::with_max_document_size(MAX_DOCUMENT_SIZE)
    }

    /// Creates a writer rejecting documents larger than `max_document_size`,
    /// clamped to what a length prefix can carry.
    pub fn with_max_document_size(max_document_size: usize) -> Self {
        Self {
            writer: Writer::with_capacity(256),
            stack: Vec::new(),
            pending_name: None,
            max_document_size: max_document_size.min(MAX_LENGTH_PREFIX),
        }
    }

    /// Returns true when no document is open.
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.writer.as_bytes()
    }

    /// Returns the written bytes, failing if a document is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>, EncodeError> {
        if !self.stack.is_empty() {
            return Err(EncodeError::InvalidState {
                context: "document not closed",
            });
        }
        Ok(self.writer.into_bytes())
    }

    /// Writes the kind byte and key that precede every nested value.
    fn write_element_header(&mut self, kind: ValueKind) -> Result<(), EncodeError> {
        let frame = self.stack.last_mut().ok_or(EncodeError::InvalidState {
            context: "value written outside a document",
        })?;
        match frame.container {
            Container::Document => {
                let name = self.pending_name.take().ok_or(EncodeError::InvalidState {
                    context: "value written without a name",
                })?;
                self.writer.write_byte(kind.as_u8());
                self.writer.write_cstring(&name);
            }
            Container::Array => {
                let index = frame.next_index;
                frame.next_index += 1;
                self.writer.write_byte(kind.as_u8());
                self.writer.write_cstring(&index.to_string());
            }
        }
        Ok(())
    }

    fn start_container(&mut self, container: Container) {
        let start = self.writer.len();
        self.writer.write_i32(0);
        self.stack.push(WriteFrame {
            container,
            start,
            next_index: 0,
        });
    }

    fn end_container(&mut self, container: Container) -> Result<(), EncodeError> {
        match self.stack.last() {
            Some(frame) if frame.container == container => {}
            _ => {
                return Err(EncodeError::InvalidState {
                    context: "mismatched end of container",
                })
            }
        }
        if self.pending_name.is_some() {
            return Err(EncodeError::InvalidState {
                context: "name written without a value",
            });
        }
        let frame = self.stack.pop().ok_or(EncodeError::InvalidState {
            context: "mismatched end of container",
        })?;
        self.writer.write_byte(0);
        let size = self.writer.len() - frame.start;
        if size > self.max_document_size {
            return Err(EncodeError::DocumentTooLarge {
                size,
                max: self.max_document_size,
            });
        }
        self.writer.patch_i32(frame.start, length_prefix(size)?);
        Ok(())
    }
}

impl DocumentSink for BinaryWriter {
    fn write_start_document(&mut self) -> Result<(), EncodeError> {
        if !self.stack.is_empty() {
            self.write_element_header(ValueKind::Document)?;
        }
        self.start_container(Container::Document);
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), EncodeError> {
        self.end_container(Container::Document)
    }

    fn write_start_array(&mut self) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Array)?;
        self.start_container(Container::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), EncodeError> {
        self.end_container(Container::Array)
    }

    fn write_name(&mut self, name: &str) -> Result<(), EncodeError> {
        match self.stack.last() {
            Some(frame) if frame.container == Container::Document => {}
            _ => {
                return Err(EncodeError::InvalidState {
                    context: "name written outside a document",
                })
            }
        }
        if self.pending_name.is_some() {
            return Err(EncodeError::InvalidState {
                context: "name written without a value",
            });
        }
        if name.as_bytes().contains(&0) {
            return Err(EncodeError::InvalidFieldName {
                name: name.to_string(),
            });
        }
        self.pending_name = Some(name.to_string());
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Null)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Boolean)?;
        self.writer.write_byte(value as u8);
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Int32)?;
        self.writer.write_i32(value);
        Ok(())
    }

    fn write_int64(&mut self, value: i64) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Int64)?;
        self.writer.write_i64(value);
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Double)?;
        self.writer.write_f64(value);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::String)?;
        self.writer.write_string(value)
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::Binary)?;
        self.writer.write_i32(length_prefix(value.len())?);
        self.writer.write_byte(BINARY_SUBTYPE_GENERIC);
        self.writer.write_bytes(value);
        Ok(())
    }

    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), EncodeError> {
        self.write_element_header(ValueKind::ObjectId)?;
        self.writer.write_bytes(&value.bytes());
        Ok(())
    }
}

// =============================================================================
// DECODING
// =============================================================================

#[derive(Debug)]
struct ReadFrame {
    container: Container,
    /// Offset one past the terminator.
    end: usize,
    terminated: bool,
}

/// Source reading the binary format from a byte slice.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    reader: Reader<'a>,
    stack: Vec<ReadFrame>,
    current: Option<ValueKind>,
    name_pending: bool,
    max_document_size: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_document_size(data, MAX_DOCUMENT_SIZE)
    }

    pub fn with_max_document_size(data: &'a [u8], max_document_size: usize) -> Self {
        Self {
            reader: Reader::new(data),
            stack: Vec::new(),
            current: None,
            name_pending: false,
            max_document_size,
        }
    }

    /// Fails unless every byte has been consumed and no document is open.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if !self.stack.is_empty() {
            return Err(DecodeError::MalformedEncoding {
                context: "document not closed",
            });
        }
        if !self.reader.is_empty() {
            return Err(DecodeError::TrailingBytes {
                len: self.reader.remaining_len(),
            });
        }
        Ok(())
    }

    /// Consumes the value announced by the last `read_value_kind`.
    fn take_value(&mut self, expected: ValueKind) -> Result<(), DecodeError> {
        if self.name_pending {
            return Err(DecodeError::MalformedEncoding {
                context: "value read before its name",
            });
        }
        match self.current.take() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(DecodeError::KindMismatch { expected, found }),
            None => Err(DecodeError::MalformedEncoding {
                context: "value read without a kind",
            }),
        }
    }

    fn start_container(&mut self, container: Container, field: &'static str) -> Result<(), DecodeError> {
        let start = self.reader.position();
        let len = self.reader.read_i32(field)?;
        if len < MIN_DOCUMENT_SIZE as i32 {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
            });
        }
        let len = len as usize;
        if len > self.max_document_size {
            return Err(DecodeError::DocumentTooLarge {
                size: len,
                max: self.max_document_size,
            });
        }
        let end = start + len;
        let limit = match self.stack.last() {
            // Leave room for the parent's terminator.
            Some(parent) => parent.end - 1,
            None => start + 4 + self.reader.remaining_len(),
        };
        if end > limit {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
            });
        }
        self.stack.push(ReadFrame {
            container,
            end,
            terminated: false,
        });
        Ok(())
    }

    fn end_container(&mut self, container: Container) -> Result<(), DecodeError> {
        match self.stack.last() {
            Some(frame) if frame.container == container && frame.terminated => {
                self.stack.pop();
                Ok(())
            }
            _ => Err(DecodeError::MalformedEncoding {
                context: "end of container before its terminator",
            }),
        }
    }
}

impl DocumentSource for BinaryReader<'_> {
    fn read_start_document(&mut self) -> Result<(), DecodeError> {
        if !self.stack.is_empty() {
            self.take_value(ValueKind::Document)?;
        }
        self.start_container(Container::Document, "document")
    }

    fn read_end_document(&mut self) -> Result<(), DecodeError> {
        self.end_container(Container::Document)
    }

    fn read_start_array(&mut self) -> Result<(), DecodeError> {
        self.take_value(ValueKind::Array)?;
        self.start_container(Container::Array, "array")
    }

    fn read_end_array(&mut self) -> Result<(), DecodeError> {
        self.end_container(Container::Array)
    }

    fn read_value_kind(&mut self) -> Result<Option<ValueKind>, DecodeError> {
        if self.current.is_some() {
            return Err(DecodeError::MalformedEncoding {
                context: "previous value not consumed",
            });
        }
        let frame = self.stack.last().ok_or(DecodeError::MalformedEncoding {
            context: "kind read outside a document",
        })?;
        let (container, end) = (frame.container, frame.end);

        let byte = self.reader.read_byte("kind")?;
        if byte == 0 {
            if self.reader.position() != end {
                return Err(DecodeError::MalformedEncoding {
                    context: "document length does not match its terminator",
                });
            }
            if let Some(frame) = self.stack.last_mut() {
                frame.terminated = true;
            }
            return Ok(None);
        }
        if self.reader.position() >= end {
            return Err(DecodeError::MalformedEncoding {
                context: "element overruns its document",
            });
        }

        let kind = ValueKind::from_u8(byte).ok_or(DecodeError::UnknownValueKind { byte })?;
        match container {
            Container::Document => self.name_pending = true,
            // Array keys are positional; the index is implied by order.
            Container::Array => {
                self.reader.read_cstring("array index")?;
            }
        }
        self.current = Some(kind);
        Ok(Some(kind))
    }

    fn read_name(&mut self) -> Result<String, DecodeError> {
        if !self.name_pending {
            return Err(DecodeError::MalformedEncoding {
                context: "name read without a pending element",
            });
        }
        self.name_pending = false;
        self.reader.read_cstring("field name")
    }

    fn read_null(&mut self) -> Result<(), DecodeError> {
        self.take_value(ValueKind::Null)
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.take_value(ValueKind::Boolean)?;
        match self.reader.read_byte("bool")? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            value => Err(DecodeError::InvalidBool { value }),
        }
    }

    fn read_int32(&mut self) -> Result<i32, DecodeError> {
        self.take_value(ValueKind::Int32)?;
        self.reader.read_i32("int32")
    }

    fn read_int64(&mut self) -> Result<i64, DecodeError> {
        self.take_value(ValueKind::Int64)?;
        self.reader.read_i64("int64")
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.take_value(ValueKind::Double)?;
        self.reader.read_f64("double")
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        self.take_value(ValueKind::String)?;
        self.reader.read_string(self.max_document_size, "string")
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.take_value(ValueKind::Binary)?;
        let len = self.reader.read_i32("binary")?;
        if len < 0 || len as usize > self.max_document_size {
            return Err(DecodeError::InvalidLength {
                field: "binary",
                len: len as i64,
            });
        }
        let subtype = self.reader.read_byte("binary subtype")?;
        if subtype != BINARY_SUBTYPE_GENERIC {
            return Err(DecodeError::MalformedEncoding {
                context: "unsupported binary subtype",
            });
        }
        Ok(self.reader.read_bytes(len as usize, "binary")?.to_vec())
    }

    fn read_object_id(&mut self) -> Result<ObjectId, DecodeError> {
        self.take_value(ValueKind::ObjectId)?;
        let bytes: [u8; OBJECT_ID_LEN] = self.reader.read_array("object id")?;
        Ok(ObjectId::from_bytes(bytes))
    }
}
