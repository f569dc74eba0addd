//! Sink and source seams consumed by the codec.
//!
//! A sink receives an ordered stream of structural events: matching
//! start/end pairs for documents and arrays, and one name followed by one
//! value per document field. Array elements carry no name; the sink numbers
//! them. A source yields the same stream back.

use crate::error::{DecodeError, EncodeError};
use crate::model::{ObjectId, ValueKind};

/// Receives encoded documents.
pub trait DocumentSink {
    fn write_start_document(&mut self) -> Result<(), EncodeError>;
    fn write_end_document(&mut self) -> Result<(), EncodeError>;
    fn write_start_array(&mut self) -> Result<(), EncodeError>;
    fn write_end_array(&mut self) -> Result<(), EncodeError>;

    /// Names the next value. Only valid inside a document.
    fn write_name(&mut self, name: &str) -> Result<(), EncodeError>;

    fn write_null(&mut self) -> Result<(), EncodeError>;
    fn write_bool(&mut self, value: bool) -> Result<(), EncodeError>;
    fn write_int32(&mut self, value: i32) -> Result<(), EncodeError>;
    fn write_int64(&mut self, value: i64) -> Result<(), EncodeError>;
    fn write_double(&mut self, value: f64) -> Result<(), EncodeError>;
    fn write_string(&mut self, value: &str) -> Result<(), EncodeError>;
    fn write_binary(&mut self, value: &[u8]) -> Result<(), EncodeError>;
    fn write_object_id(&mut self, value: &ObjectId) -> Result<(), EncodeError>;
}

/// Yields encoded documents.
pub trait DocumentSource {
    fn read_start_document(&mut self) -> Result<(), DecodeError>;
    fn read_end_document(&mut self) -> Result<(), DecodeError>;
    fn read_start_array(&mut self) -> Result<(), DecodeError>;
    fn read_end_array(&mut self) -> Result<(), DecodeError>;

    /// Returns the kind of the next value, or `None` at the end of the
    /// current document or array.
    fn read_value_kind(&mut self) -> Result<Option<ValueKind>, DecodeError>;

    /// Returns the name of the value whose kind was just read. Only valid
    /// inside a document.
    fn read_name(&mut self) -> Result<String, DecodeError>;

    fn read_null(&mut self) -> Result<(), DecodeError>;
    fn read_bool(&mut self) -> Result<bool, DecodeError>;
    fn read_int32(&mut self) -> Result<i32, DecodeError>;
    fn read_int64(&mut self) -> Result<i64, DecodeError>;
    fn read_double(&mut self) -> Result<f64, DecodeError>;
    fn read_string(&mut self) -> Result<String, DecodeError>;
    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError>;
    fn read_object_id(&mut self) -> Result<ObjectId, DecodeError>;
}

/// Per-call encode settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderContext {
    is_encoding_collectible_document: bool,
}

impl EncoderContext {
    pub fn builder() -> EncoderContextBuilder {
        EncoderContextBuilder::default()
    }

    /// Context for a top-level persisted document: `_id` is generated if
    /// missing and written first.
    pub fn collectible() -> Self {
        Self {
            is_encoding_collectible_document: true,
        }
    }

    pub fn is_encoding_collectible_document(&self) -> bool {
        self.is_encoding_collectible_document
    }
}

/// Builder for [`EncoderContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderContextBuilder {
    is_encoding_collectible_document: bool,
}

impl EncoderContextBuilder {
    pub fn is_encoding_collectible_document(mut self, value: bool) -> Self {
        self.is_encoding_collectible_document = value;
        self
    }

    pub fn build(self) -> EncoderContext {
        EncoderContext {
            is_encoding_collectible_document: self.is_encoding_collectible_document,
        }
    }
}

/// Per-call decode settings. Carries nothing yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderContext {}

impl DecoderContext {
    pub fn new() -> Self {
        Self::default()
    }
}
