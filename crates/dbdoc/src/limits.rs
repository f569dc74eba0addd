//! Size limits and reserved names.
//!
//! The decoder enforces these bounds on untrusted input. The encoder enforces
//! the same bounds so that anything it writes can be read back.

/// Reserved field name holding a document's primary key.
pub const ID_FIELD: &str = "_id";

/// Maximum encoded size of a single document in bytes (16 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Largest length an i32 length prefix can carry. Size limits above this are
/// clamped to it.
pub const MAX_LENGTH_PREFIX: usize = i32::MAX as usize;

/// Maximum nesting depth of documents and arrays.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Smallest valid encoded document: length prefix plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Length of an encoded ObjectId.
pub const OBJECT_ID_LEN: usize = 12;
