//! Error types for document encoding, decoding and validation.

use thiserror::Error;

use crate::model::ValueKind;

/// Error raised by a caller-supplied transformation hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Codec registry misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no codec registered for value kind {kind:?}")]
    NoCodecForKind { kind: ValueKind },
}

/// Identity field lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("document has no `_id` field")]
    MissingId,
}

/// Error during document encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("encode hook for {kind:?} failed")]
    Hook {
        kind: ValueKind,
        #[source]
        source: HookError,
    },

    #[error("field name {name:?} contains a NUL byte")]
    InvalidFieldName { name: String },

    #[error("document size {size} exceeds maximum {max}")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("nesting depth exceeds maximum {max}")]
    NestingTooDeep { max: usize },

    #[error("codec for {expected:?} was handed a {found:?} value")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("sink state error: {context}")]
    InvalidState { context: &'static str },
}

/// Error during document decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("decode hook for {kind:?} failed")]
    Hook {
        kind: ValueKind,
        #[source]
        source: HookError,
    },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unknown value kind byte 0x{byte:02x}")]
    UnknownValueKind { byte: u8 },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("invalid bool value: {value} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("{field} length {len} is invalid")]
    InvalidLength { field: &'static str, len: i64 },

    #[error("document size {size} exceeds maximum {max}")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("nesting depth exceeds maximum {max}")]
    NestingTooDeep { max: usize },

    #[error("duplicate field name {name:?}")]
    DuplicateField { name: String },

    #[error("expected {expected:?}, found {found:?}")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("malformed encoding: {context}")]
    MalformedEncoding { context: &'static str },

    #[error("{len} trailing bytes after document")]
    TrailingBytes { len: usize },
}

/// Field-name validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("field name {name:?} contains a NUL byte")]
    NulInFieldName { name: String },

    #[error("top-level field name {name:?} must not start with '$'")]
    DollarPrefix { name: String },

    #[error("field name {name:?} must not contain '.'")]
    DotInFieldName { name: String },
}
