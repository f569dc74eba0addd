//! Per-kind codecs and the registry that resolves them.
//!
//! A [`CodecRegistry`] is composed once from an ordered list of
//! [`CodecProvider`]s; for each kind the first provider that supplies a codec
//! wins. The registry is immutable afterwards and shared behind an `Arc`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::codec::sink::{DocumentSink, DocumentSource};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::model::{Document, Value, ValueKind};

/// Recursion seam handed to container codecs during encoding.
pub trait NestedEncoder {
    fn encode_document(&self, sink: &mut dyn DocumentSink, document: &Document) -> Result<(), EncodeError>;
    fn encode_array(&self, sink: &mut dyn DocumentSink, items: &[Value]) -> Result<(), EncodeError>;
}

/// Recursion seam handed to container codecs during decoding.
pub trait NestedDecoder {
    fn decode_document(&self, source: &mut dyn DocumentSource) -> Result<Document, DecodeError>;
    fn decode_array(&self, source: &mut dyn DocumentSource) -> Result<Vec<Value>, DecodeError>;
}

/// Encodes and decodes values of one kind.
pub trait ValueCodec: Send + Sync {
    fn kind(&self) -> ValueKind;

    fn encode(
        &self,
        sink: &mut dyn DocumentSink,
        value: &Value,
        nested: &dyn NestedEncoder,
    ) -> Result<(), EncodeError>;

    /// Reads a value whose kind has already been announced by the source.
    fn decode(&self, source: &mut dyn DocumentSource, nested: &dyn NestedDecoder) -> Result<Value, DecodeError>;
}

/// Optionally supplies a codec for a kind.
pub trait CodecProvider {
    fn codec_for(&self, kind: ValueKind) -> Option<Arc<dyn ValueCodec>>;
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Immutable kind-to-codec table.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: FxHashMap<ValueKind, Arc<dyn ValueCodec>>,
}

impl CodecRegistry {
    /// Composes a registry; earlier providers take precedence.
    pub fn from_providers<I>(providers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn CodecProvider>>,
    {
        let providers: Vec<_> = providers.into_iter().collect();
        let mut codecs = FxHashMap::default();
        for kind in ValueKind::ALL {
            if let Some(codec) = providers.iter().find_map(|p| p.codec_for(kind)) {
                codecs.insert(kind, codec);
            }
        }
        tracing::debug!(
            providers = providers.len(),
            kinds = codecs.len(),
            "composed codec registry"
        );
        Self { codecs }
    }

    /// Resolves the codec for `kind`.
    pub fn resolve(&self, kind: ValueKind) -> Result<&Arc<dyn ValueCodec>, ConfigError> {
        self.codecs.get(&kind).ok_or(ConfigError::NoCodecForKind { kind })
    }

    /// Returns true if a codec is registered for `kind`.
    pub fn supports(&self, kind: ValueKind) -> bool {
        self.codecs.contains_key(&kind)
    }
}

impl Default for CodecRegistry {
    /// Scalar codecs followed by document and array codecs.
    fn default() -> Self {
        Self::from_providers([
            Box::new(ScalarCodecProvider) as Box<dyn CodecProvider>,
            Box::new(DocumentCodecProvider),
        ])
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.codecs.keys().copied().collect();
        kinds.sort();
        f.debug_struct("CodecRegistry").field("kinds", &kinds).finish()
    }
}

// =============================================================================
// SCALAR CODECS
// =============================================================================

/// Supplies codecs for every non-container kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarCodecProvider;

impl CodecProvider for ScalarCodecProvider {
    fn codec_for(&self, kind: ValueKind) -> Option<Arc<dyn ValueCodec>> {
        if kind.is_container() {
            None
        } else {
            Some(Arc::new(ScalarCodec { kind }))
        }
    }
}

#[derive(Debug)]
struct ScalarCodec {
    kind: ValueKind,
}

impl ValueCodec for ScalarCodec {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn encode(
        &self,
        sink: &mut dyn DocumentSink,
        value: &Value,
        _nested: &dyn NestedEncoder,
    ) -> Result<(), EncodeError> {
        if value.kind() != self.kind {
            return Err(EncodeError::KindMismatch {
                expected: self.kind,
                found: value.kind(),
            });
        }
        match value {
            Value::Null => sink.write_null(),
            Value::Boolean(v) => sink.write_bool(*v),
            Value::Int32(v) => sink.write_int32(*v),
            Value::Int64(v) => sink.write_int64(*v),
            Value::Double(v) => sink.write_double(*v),
            Value::String(v) => sink.write_string(v),
            Value::Binary(v) => sink.write_binary(v),
            Value::ObjectId(v) => sink.write_object_id(v),
            Value::Document(_) | Value::Array(_) => Err(EncodeError::KindMismatch {
                expected: self.kind,
                found: value.kind(),
            }),
        }
    }

    fn decode(&self, source: &mut dyn DocumentSource, _nested: &dyn NestedDecoder) -> Result<Value, DecodeError> {
        Ok(match self.kind {
            ValueKind::Null => {
                source.read_null()?;
                Value::Null
            }
            ValueKind::Boolean => Value::Boolean(source.read_bool()?),
            ValueKind::Int32 => Value::Int32(source.read_int32()?),
            ValueKind::Int64 => Value::Int64(source.read_int64()?),
            ValueKind::Double => Value::Double(source.read_double()?),
            ValueKind::String => Value::String(source.read_string()?),
            ValueKind::Binary => Value::Binary(source.read_binary()?),
            ValueKind::ObjectId => Value::ObjectId(source.read_object_id()?),
            ValueKind::Document | ValueKind::Array => {
                return Err(DecodeError::MalformedEncoding {
                    context: "container handed to scalar codec",
                })
            }
        })
    }
}

// =============================================================================
// CONTAINER CODECS
// =============================================================================

/// Supplies the document and array codecs, which recurse through the
/// caller's [`NestedEncoder`]/[`NestedDecoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodecProvider;

impl CodecProvider for DocumentCodecProvider {
    fn codec_for(&self, kind: ValueKind) -> Option<Arc<dyn ValueCodec>> {
        match kind {
            ValueKind::Document => Some(Arc::new(EmbeddedDocumentCodec)),
            ValueKind::Array => Some(Arc::new(ArrayCodec)),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct EmbeddedDocumentCodec;

impl ValueCodec for EmbeddedDocumentCodec {
    fn kind(&self) -> ValueKind {
        ValueKind::Document
    }

    fn encode(
        &self,
        sink: &mut dyn DocumentSink,
        value: &Value,
        nested: &dyn NestedEncoder,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Document(doc) => nested.encode_document(sink, doc),
            other => Err(EncodeError::KindMismatch {
                expected: ValueKind::Document,
                found: other.kind(),
            }),
        }
    }

    fn decode(&self, source: &mut dyn DocumentSource, nested: &dyn NestedDecoder) -> Result<Value, DecodeError> {
        nested.decode_document(source).map(Value::Document)
    }
}

#[derive(Debug)]
struct ArrayCodec;

impl ValueCodec for ArrayCodec {
    fn kind(&self) -> ValueKind {
        ValueKind::Array
    }

    fn encode(
        &self,
        sink: &mut dyn DocumentSink,
        value: &Value,
        nested: &dyn NestedEncoder,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Array(items) => nested.encode_array(sink, items),
            other => Err(EncodeError::KindMismatch {
                expected: ValueKind::Array,
                found: other.kind(),
            }),
        }
    }

    fn decode(&self, source: &mut dyn DocumentSource, nested: &dyn NestedDecoder) -> Result<Value, DecodeError> {
        nested.decode_array(source).map(Value::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tree::TreeWriter;

    struct NoNesting;

    impl NestedEncoder for NoNesting {
        fn encode_document(&self, _: &mut dyn DocumentSink, _: &Document) -> Result<(), EncodeError> {
            Err(EncodeError::InvalidState { context: "no nesting" })
        }
        fn encode_array(&self, _: &mut dyn DocumentSink, _: &[Value]) -> Result<(), EncodeError> {
            Err(EncodeError::InvalidState { context: "no nesting" })
        }
    }

    /// Writes every Int32 as an Int64.
    struct WideningProvider;

    struct WideningCodec;

    impl ValueCodec for WideningCodec {
        fn kind(&self) -> ValueKind {
            ValueKind::Int32
        }
        fn encode(&self, sink: &mut dyn DocumentSink, value: &Value, _: &dyn NestedEncoder) -> Result<(), EncodeError> {
            sink.write_int64(value.as_i32().unwrap_or_default() as i64)
        }
        fn decode(&self, source: &mut dyn DocumentSource, _: &dyn NestedDecoder) -> Result<Value, DecodeError> {
            source.read_int32().map(Value::Int32)
        }
    }

    impl CodecProvider for WideningProvider {
        fn codec_for(&self, kind: ValueKind) -> Option<Arc<dyn ValueCodec>> {
            (kind == ValueKind::Int32).then(|| Arc::new(WideningCodec) as Arc<dyn ValueCodec>)
        }
    }

    #[test]
    fn test_default_registry_covers_every_kind() {
        let registry = CodecRegistry::default();
        for kind in ValueKind::ALL {
            let codec = registry.resolve(kind).unwrap();
            assert_eq!(codec.kind(), kind);
        }
    }

    #[test]
    fn test_missing_codec_is_config_error() {
        let registry = CodecRegistry::from_providers([Box::new(ScalarCodecProvider) as Box<dyn CodecProvider>]);
        assert!(registry.supports(ValueKind::Double));
        assert!(!registry.supports(ValueKind::Document));
        assert_eq!(
            registry.resolve(ValueKind::Array).err(),
            Some(ConfigError::NoCodecForKind { kind: ValueKind::Array })
        );
    }

    #[test]
    fn test_first_provider_wins() {
        let registry = CodecRegistry::from_providers([
            Box::new(WideningProvider) as Box<dyn CodecProvider>,
            Box::new(ScalarCodecProvider),
        ]);

        let mut sink = TreeWriter::new();
        sink.write_start_document().unwrap();
        sink.write_name("n").unwrap();
        registry
            .resolve(ValueKind::Int32)
            .unwrap()
            .encode(&mut sink, &Value::Int32(7), &NoNesting)
            .unwrap();
        sink.write_end_document().unwrap();

        let doc = sink.into_document().unwrap();
        assert_eq!(doc.get("n"), Some(&Value::Int64(7)));
    }

    #[test]
    fn test_scalar_codec_rejects_other_kind() {
        let registry = CodecRegistry::default();
        let mut sink = TreeWriter::new();
        let result = registry
            .resolve(ValueKind::Double)
            .unwrap()
            .encode(&mut sink, &Value::from("1.1"), &NoNesting);
        assert!(matches!(
            result,
            Err(EncodeError::KindMismatch {
                expected: ValueKind::Double,
                found: ValueKind::String
            })
        ));
    }

    #[test]
    fn test_debug_lists_kinds() {
        let registry = CodecRegistry::from_providers([Box::new(DocumentCodecProvider) as Box<dyn CodecProvider>]);
        assert_eq!(
            format!("{registry:?}"),
            "CodecRegistry { kinds: [Document, Array] }"
        );
    }
}
