//! Document encoding/decoding.
//!
//! [`DocumentCodec`] walks a [`Document`] tree, resolving a codec for every
//! value from its [`CodecRegistry`] and consulting the hook snapshot taken at
//! the start of the call. When encoding a collectible document it also
//! enforces the identity policy: `_id` is generated if missing and always
//! written first.

use std::sync::Arc;

use crate::codec::binary::{BinaryReader, BinaryWriter};
use crate::codec::registry::{CodecRegistry, NestedDecoder, NestedEncoder};
use crate::codec::sink::{DecoderContext, DocumentSink, DocumentSource, EncoderContext};
use crate::codec::transform::{self, TransformerRegistry, Transformers};
use crate::error::{DecodeError, EncodeError, IdentityError};
use crate::limits::{ID_FIELD, MAX_DOCUMENT_SIZE, MAX_LENGTH_PREFIX, MAX_NESTING_DEPTH};
use crate::model::{Document, ObjectId, Value, ValueKind};

/// Limits applied by a [`DocumentCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Largest encoded document accepted in either direction.
    pub max_document_size: usize,
    /// Deepest document/array nesting accepted in either direction.
    pub max_nesting_depth: usize,
}

impl CodecOptions {
    /// Creates options with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size limit, clamped to what an i32 length prefix can carry.
    pub fn max_document_size(mut self, size: usize) -> Self {
        self.max_document_size = size.min(MAX_LENGTH_PREFIX);
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_document_size: MAX_DOCUMENT_SIZE,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Encodes and decodes dynamically typed documents.
#[derive(Debug, Clone)]
pub struct DocumentCodec {
    registry: Arc<CodecRegistry>,
    transformers: Arc<TransformerRegistry>,
    options: CodecOptions,
}

impl Default for DocumentCodec {
    fn default() -> Self {
        Self::new(Arc::new(CodecRegistry::default()))
    }
}

impl DocumentCodec {
    /// Creates a codec over `registry` with its own empty hook registry.
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self {
            registry,
            transformers: Arc::new(TransformerRegistry::new()),
            options: CodecOptions::default(),
        }
    }

    /// Uses `transformers` for hook lookups.
    pub fn with_transformers(mut self, transformers: Arc<TransformerRegistry>) -> Self {
        self.transformers = transformers;
        self
    }

    /// Uses the process-wide hook registry.
    pub fn with_global_transformers(self) -> Self {
        self.with_transformers(transform::global())
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    pub fn transformers(&self) -> &Arc<TransformerRegistry> {
        &self.transformers
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Writes `document` to `sink`.
    ///
    /// For a collectible document a missing `_id` is generated and inserted
    /// into `document` so the caller can observe it, and `_id` is written
    /// before every other field. Otherwise fields are written as they are.
    pub fn encode(
        &self,
        sink: &mut dyn DocumentSink,
        document: &mut Document,
        context: EncoderContext,
    ) -> Result<(), EncodeError> {
        let hooks = self.transformers.snapshot();
        let walk = EncodeWalk {
            registry: &self.registry,
            hooks: &hooks,
            max_depth: self.options.max_nesting_depth,
            depth: 0,
        };
        if context.is_encoding_collectible_document() {
            self.generate_id_if_absent_from_document(document);
            walk.encode_collectible(sink, document)
        } else {
            walk.encode_document(sink, document)
        }
    }

    /// Encodes `document` to a new byte vector.
    pub fn encode_to_vec(&self, document: &mut Document, context: EncoderContext) -> Result<Vec<u8>, EncodeError> {
        let mut writer = BinaryWriter::with_max_document_size(self.options.max_document_size);
        self.encode(&mut writer, document, context)?;
        writer.into_bytes()
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Reads one document from `source`, preserving wire field order.
    pub fn decode(&self, source: &mut dyn DocumentSource, _context: DecoderContext) -> Result<Document, DecodeError> {
        let hooks = self.transformers.snapshot();
        let walk = DecodeWalk {
            registry: &self.registry,
            hooks: &hooks,
            max_depth: self.options.max_nesting_depth,
            depth: 0,
        };
        walk.decode_document(source)
    }

    /// Decodes exactly one document from `bytes`.
    pub fn decode_from_slice(&self, bytes: &[u8]) -> Result<Document, DecodeError> {
        let mut reader = BinaryReader::with_max_document_size(bytes, self.options.max_document_size);
        let document = self.decode(&mut reader, DecoderContext::new())?;
        reader.finish()?;
        Ok(document)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns true if `document` has an `_id` field.
    pub fn document_has_id(&self, document: &Document) -> bool {
        document.contains_key(ID_FIELD)
    }

    /// Returns the `_id` value without encoding anything.
    pub fn get_document_id<'d>(&self, document: &'d Document) -> Result<&'d Value, IdentityError> {
        document.get(ID_FIELD).ok_or(IdentityError::MissingId)
    }

    /// Inserts a fresh [`ObjectId`] as `_id` unless one is present.
    pub fn generate_id_if_absent_from_document<'d>(&self, document: &'d mut Document) -> &'d mut Document {
        if !self.document_has_id(document) {
            let id = ObjectId::new();
            tracing::debug!(%id, "generated missing _id");
            document.insert(ID_FIELD, id);
        }
        document
    }
}

// =============================================================================
// TRAVERSAL
// =============================================================================

#[derive(Clone, Copy)]
struct EncodeWalk<'a> {
    registry: &'a CodecRegistry,
    hooks: &'a Transformers,
    max_depth: usize,
    depth: usize,
}

impl<'a> EncodeWalk<'a> {
    fn descend(&self) -> Result<EncodeWalk<'a>, EncodeError> {
        if self.depth >= self.max_depth {
            return Err(EncodeError::NestingTooDeep { max: self.max_depth });
        }
        Ok(EncodeWalk {
            depth: self.depth + 1,
            ..*self
        })
    }

    fn encode_collectible(&self, sink: &mut dyn DocumentSink, document: &Document) -> Result<(), EncodeError> {
        let inner = self.descend()?;
        sink.write_start_document()?;
        if let Some(id) = document.get(ID_FIELD) {
            inner.write_field(sink, ID_FIELD, id)?;
        }
        for (name, value) in document.iter().filter(|(name, _)| *name != ID_FIELD) {
            inner.write_field(sink, name, value)?;
        }
        sink.write_end_document()
    }

    fn write_field(&self, sink: &mut dyn DocumentSink, name: &str, value: &Value) -> Result<(), EncodeError> {
        sink.write_name(name)?;
        self.write_value(sink, value)
    }

    fn write_value(&self, sink: &mut dyn DocumentSink, value: &Value) -> Result<(), EncodeError> {
        let kind = value.kind();
        match self.hooks.encode_hook(kind) {
            Some(hook) => {
                let transformed = hook(value.clone()).map_err(|source| EncodeError::Hook { kind, source })?;
                tracing::trace!(from = ?kind, to = ?transformed.kind(), "applied encode hook");
                self.write_resolved(sink, &transformed)
            }
            None => self.write_resolved(sink, value),
        }
    }

    fn write_resolved(&self, sink: &mut dyn DocumentSink, value: &Value) -> Result<(), EncodeError> {
        let codec = self.registry.resolve(value.kind())?;
        codec.encode(sink, value, self)
    }
}

impl NestedEncoder for EncodeWalk<'_> {
    fn encode_document(&self, sink: &mut dyn DocumentSink, document: &Document) -> Result<(), EncodeError> {
        let inner = self.descend()?;
        sink.write_start_document()?;
        for (name, value) in document {
            inner.write_field(sink, name, value)?;
        }
        sink.write_end_document()
    }

    fn encode_array(&self, sink: &mut dyn DocumentSink, items: &[Value]) -> Result<(), EncodeError> {
        let inner = self.descend()?;
        sink.write_start_array()?;
        for value in items {
            inner.write_value(sink, value)?;
        }
        sink.write_end_array()
    }
}

#[derive(Clone, Copy)]
struct DecodeWalk<'a> {
    registry: &'a CodecRegistry,
    hooks: &'a Transformers,
    max_depth: usize,
    depth: usize,
}

impl<'a> DecodeWalk<'a> {
    fn descend(&self) -> Result<DecodeWalk<'a>, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::NestingTooDeep { max: self.max_depth });
        }
        Ok(DecodeWalk {
            depth: self.depth + 1,
            ..*self
        })
    }

    fn read_value(&self, source: &mut dyn DocumentSource, kind: ValueKind) -> Result<Value, DecodeError> {
        let codec = self.registry.resolve(kind)?;
        let value = codec.decode(source, self)?;
        // Decode hooks see leaves only; containers were rebuilt from hooked leaves.
        if kind.is_container() {
            return Ok(value);
        }
        match self.hooks.decode_hook(kind) {
            Some(hook) => {
                let transformed = hook(value).map_err(|source| DecodeError::Hook { kind, source })?;
                tracing::trace!(from = ?kind, to = ?transformed.kind(), "applied decode hook");
                Ok(transformed)
            }
            None => Ok(value),
        }
    }
}

impl NestedDecoder for DecodeWalk<'_> {
    fn decode_document(&self, source: &mut dyn DocumentSource) -> Result<Document, DecodeError> {
        let inner = self.descend()?;
        source.read_start_document()?;
        let mut document = Document::new();
        while let Some(kind) = source.read_value_kind()? {
            let name = source.read_name()?;
            if document.contains_key(&name) {
                return Err(DecodeError::DuplicateField { name });
            }
            let value = inner.read_value(source, kind)?;
            document.insert(name, value);
        }
        source.read_end_document()?;
        Ok(document)
    }

    fn decode_array(&self, source: &mut dyn DocumentSource) -> Result<Vec<Value>, DecodeError> {
        let inner = self.descend()?;
        source.read_start_array()?;
        let mut items = Vec::new();
        while let Some(kind) = source.read_value_kind()? {
            items.push(inner.read_value(source, kind)?);
        }
        source.read_end_array()?;
        Ok(items)
    }
}
