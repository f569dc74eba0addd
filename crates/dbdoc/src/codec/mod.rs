//! Encoding/decoding of dynamic documents.
//!
//! - [`document`]: the traversal, identity policy and hook application
//! - [`registry`]: per-kind codecs and their providers
//! - [`transform`]: encode/decode hooks
//! - [`sink`]: the sink/source seams
//! - [`binary`], [`tree`]: the bundled sinks and sources

pub mod binary;
pub mod document;
pub mod primitives;
pub mod registry;
pub mod sink;
pub mod transform;
pub mod tree;

pub use binary::{BinaryReader, BinaryWriter};
pub use document::{CodecOptions, DocumentCodec};
pub use registry::{
    CodecProvider, CodecRegistry, DocumentCodecProvider, NestedDecoder, NestedEncoder,
    ScalarCodecProvider, ValueCodec,
};
pub use sink::{DecoderContext, DocumentSink, DocumentSource, EncoderContext, EncoderContextBuilder};
pub use transform::{Transformer, TransformerRegistry, Transformers};
pub use tree::{TreeReader, TreeWriter};
