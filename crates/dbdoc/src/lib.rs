//! dbdoc: a codec for dynamically shaped documents.
//!
//! This crate converts ordered, string-keyed documents whose values may be
//! scalars, nested documents or arrays to and from a compact little-endian
//! binary format.
//!
//! # Overview
//!
//! On top of plain serialization the codec provides:
//! - **Identity policy**: documents encoded as collectible records get a
//!   generated `_id` when they lack one, and `_id` is always written first
//! - **Pluggable codecs**: each value kind is handled by a codec resolved
//!   from an immutable registry composed from ordered providers
//! - **Transformation hooks**: per-kind functions that rewrite values on
//!   the way in or out
//!
//! # Quick Start
//!
//! ```rust
//! use dbdoc::{Document, DocumentCodec, EncoderContext, Value, ValueKind};
//!
//! let codec = DocumentCodec::default();
//!
//! let mut doc = Document::new().append("x", 2).append("name", "Alice");
//! let bytes = codec.encode_to_vec(&mut doc, EncoderContext::collectible()).unwrap();
//!
//! // The generated id is visible on the caller's document.
//! assert_eq!(doc.get("_id").unwrap().kind(), ValueKind::ObjectId);
//!
//! let decoded = codec.decode_from_slice(&bytes).unwrap();
//! let keys: Vec<_> = decoded.keys().collect();
//! assert_eq!(keys, vec!["_id", "x", "name"]);
//! assert_eq!(decoded.get("name"), Some(&Value::from("Alice")));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (Value, Document, ObjectId)
//! - [`codec`]: Traversal, codec registry, hooks, sinks and sources
//! - [`validate`]: Field-name validation for stored documents
//! - [`error`]: Error types
//! - [`limits`]: Size limits and reserved names
//!
//! # Hooks
//!
//! Hooks live in a [`TransformerRegistry`]. Each [`DocumentCodec`] owns an
//! empty one unless another is injected; [`codec::transform::global`] returns
//! a process-wide instance. Every encode/decode call reads one consistent
//! snapshot of the hooks, so registering or clearing hooks concurrently
//! never produces a half-applied configuration.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    CodecOptions, CodecProvider, CodecRegistry, DecoderContext, DocumentCodec, DocumentSink,
    DocumentSource, EncoderContext, TransformerRegistry, Transformers, ValueCodec,
};
pub use error::{ConfigError, DecodeError, EncodeError, HookError, IdentityError, ValidationError};
pub use limits::ID_FIELD;
pub use model::{Document, ObjectId, Value, ValueKind};
pub use validate::{validate_field_names, FieldNameRules};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
