//! Globally-unique document identifiers.
//!
//! An [`ObjectId`] is 12 raw bytes:
//! ```text
//! [0..4]   seconds since Unix epoch, big-endian
//! [4..9]   random value chosen once per process
//! [9..12]  counter, big-endian, starting at a random value
//! ```
//! The process component keeps ids unique across machines without
//! coordination; the counter keeps them unique within one second.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use uuid::Uuid;

use crate::limits::OBJECT_ID_LEN;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

lazy_static! {
    static ref PROCESS_UNIQUE: [u8; 5] = {
        let seed = Uuid::new_v4();
        let mut bytes = [0u8; 5];
        bytes.copy_from_slice(&seed.as_bytes()[..5]);
        bytes
    };
    static ref COUNTER: AtomicU32 = {
        let seed = Uuid::new_v4();
        let b = seed.as_bytes();
        AtomicU32::new(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    };
}

/// A 12-byte globally-unique identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..]);

        let id = ObjectId(bytes);
        tracing::trace!(id = %id, "generated object id");
        id
    }

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        ObjectId(bytes)
    }

    /// Returns the raw bytes.
    pub const fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Returns the creation time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Formats as 24 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(OBJECT_ID_LEN * 2);
        for byte in &self.0 {
            s.push_str(&format!("{:02x}", byte));
        }
        s
    }

    /// Parses 24 hex characters.
    pub fn parse_hex(s: &str) -> Option<ObjectId> {
        if s.len() != OBJECT_ID_LEN * 2 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let byte_str = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(byte_str, 16).ok()?;
        }
        Some(ObjectId(bytes))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when parsing an [`ObjectId`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id {0:?}: expected 24 hex characters")]
pub struct ParseObjectIdError(pub String);

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_hex(s).ok_or_else(|| ParseObjectIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<ObjectId> = (0..10_000).map(|_| ObjectId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..1000).map(|_| ObjectId::new()).collect::<Vec<_>>()))
            .collect();
        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 4000);
    }

    #[test]
    fn test_process_component_is_shared() {
        let a = ObjectId::new().bytes();
        let b = ObjectId::new().bytes();
        assert_eq!(a[4..9], b[4..9]);
    }

    #[test]
    fn test_timestamp_is_recent() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let ts = ObjectId::new().timestamp();
        assert!(ts <= now && now - ts < 60);
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert_eq!(ObjectId::parse_hex(&hex), Some(id));
        assert_eq!(hex.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ObjectId::parse_hex("").is_none());
        assert!(ObjectId::parse_hex("zz0000000000000000000000").is_none());
        assert!(ObjectId::parse_hex("0000").is_none());
        assert!("not-an-id".parse::<ObjectId>().is_err());
    }
}
