//! Primitive encoding/decoding for the binary document format.
//!
//! Implements little-endian fixed-width integers, doubles and the two string
//! forms (NUL-terminated keys and length-prefixed values).

use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_LENGTH_PREFIX;

/// Converts a byte length to its i32 wire form.
pub fn length_prefix(len: usize) -> Result<i32, EncodeError> {
    i32::try_from(len).map_err(|_| EncodeError::DocumentTooLarge {
        size: len,
        max: MAX_LENGTH_PREFIX,
    })
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly N bytes into an array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a NUL-terminated UTF-8 string.
    pub fn read_cstring(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(DecodeError::UnexpectedEof { context: field })?;
        let s = std::str::from_utf8(&rest[..end])
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })?;
        self.pos += end + 1;
        Ok(s)
    }

    /// Reads an i32-length-prefixed, NUL-terminated UTF-8 string.
    ///
    /// The length counts the terminator, so the empty string has length 1.
    pub fn read_string(&mut self, max_len: usize, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_i32(field)?;
        if len < 1 || len as usize > max_len {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
            });
        }
        let bytes = self.read_bytes(len as usize, field)?;
        let (body, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator[0] != 0 {
            return Err(DecodeError::MalformedEncoding {
                context: "string not NUL-terminated",
            });
        }
        // Validate UTF-8 on borrowed slice, then allocate once
        std::str::from_utf8(body)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a NUL-terminated string. The caller guarantees `s` has no NUL.
    pub fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Writes an i32-length-prefixed, NUL-terminated string.
    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_i32(length_prefix(s.len() + 1)?);
        self.write_cstring(s);
        Ok(())
    }

    /// Overwrites four bytes at `pos` with a little-endian i32.
    pub fn patch_i32(&mut self, pos: usize, value: i32) {
        self.buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_i64_roundtrip() {
        let mut writer = Writer::new();
        for v in [0i32, 1, -1, i32::MAX, i32::MIN] {
            writer.write_i32(v);
        }
        for v in [0i64, -1, i64::MAX, i64::MIN] {
            writer.write_i64(v);
        }

        let mut reader = Reader::new(writer.as_bytes());
        for v in [0i32, 1, -1, i32::MAX, i32::MIN] {
            assert_eq!(reader.read_i32("test").unwrap(), v);
        }
        for v in [0i64, -1, i64::MAX, i64::MIN] {
            assert_eq!(reader.read_i64("test").unwrap(), v);
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn test_little_endian_layout() {
        let mut writer = Writer::new();
        writer.write_i32(0x0102_0304);
        assert_eq!(writer.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_f64_roundtrip() {
        let test_values = [0.0, 1.1, -1.0, f64::INFINITY, f64::NEG_INFINITY, 3.14159];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_f64(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_f64("test").unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
        }
    }

    #[test]
    fn test_string_roundtrip() {
        let test_strings = ["", "hello", "hello world", "unicode: \u{1F600}"];

        for s in test_strings {
            let mut writer = Writer::new();
            writer.write_string(s).unwrap();
            writer.write_cstring(s);

            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_string(1000, "test").unwrap(), s);
            assert_eq!(reader.read_cstring("test").unwrap(), s);
        }
    }

    #[test]
    fn test_empty_string_layout() {
        let mut writer = Writer::new();
        writer.write_string("").unwrap();
        assert_eq!(writer.as_bytes(), &[1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_length_prefix_bounds() {
        assert_eq!(length_prefix(0).unwrap(), 0);
        assert_eq!(length_prefix(MAX_LENGTH_PREFIX).unwrap(), i32::MAX);
        assert!(matches!(
            length_prefix(MAX_LENGTH_PREFIX + 1),
            Err(EncodeError::DocumentTooLarge { max: MAX_LENGTH_PREFIX, .. })
        ));
        assert!(length_prefix(usize::MAX).is_err());
    }

    #[test]
    fn test_string_length_rejected() {
        let mut writer = Writer::new();
        writer.write_i32(0);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_string(100, "test"),
            Err(DecodeError::InvalidLength { len: 0, .. })
        ));

        let mut writer = Writer::new();
        writer.write_i32(1000);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_string(100, "test"),
            Err(DecodeError::InvalidLength { len: 1000, .. })
        ));
    }

    #[test]
    fn test_string_missing_terminator() {
        let mut writer = Writer::new();
        writer.write_i32(2);
        writer.write_bytes(b"ab");
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_string(100, "test"),
            Err(DecodeError::MalformedEncoding { .. })
        ));
    }

    #[test]
    fn test_cstring_unterminated() {
        let mut reader = Reader::new(b"abc");
        assert!(matches!(
            reader.read_cstring("key"),
            Err(DecodeError::UnexpectedEof { context: "key" })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut reader = Reader::new(&[0xFF, 0xFE, 0x00]);
        assert!(matches!(
            reader.read_cstring("key"),
            Err(DecodeError::InvalidUtf8 { field: "key" })
        ));
    }

    #[test]
    fn test_patch_i32() {
        let mut writer = Writer::new();
        writer.write_i32(0);
        writer.write_byte(0xAA);
        writer.patch_i32(0, 5);
        assert_eq!(writer.as_bytes(), &[5, 0, 0, 0, 0xAA]);
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        let result = reader.read_bytes(10, "test");
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));
    }
}
