//! Data model types.
//!
//! - Values (the tagged variant of all encodable data)
//! - Documents (ordered string-keyed fields)
//! - Identifiers (generated `_id` values)

pub mod document;
pub mod id;
pub mod value;

pub use document::Document;
pub use id::{ObjectId, ParseObjectIdError};
pub use value::{Value, ValueKind};
