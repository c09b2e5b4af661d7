//! Primitive encoding/decoding for the BSON wire format.
//!
//! Implements the fixed-width little-endian integer, double, cstring and
//! length-prefixed string layouts that every element type is built from.

use crate::error::{DecodeError, EncodeError};
use crate::limits::OBJECT_ID_LEN;

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

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
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
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2, context)?;
        // SAFETY: read_bytes guarantees exactly 2 bytes, try_into always succeeds
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        let bytes = self.read_bytes(4, context)?;
        // SAFETY: read_bytes guarantees exactly 4 bytes, try_into always succeeds
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4, context)?;
        // SAFETY: read_bytes guarantees exactly 4 bytes, try_into always succeeds
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        let bytes = self.read_bytes(8, context)?;
        // SAFETY: read_bytes guarantees exactly 8 bytes, try_into always succeeds
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8, context)?;
        // SAFETY: read_bytes guarantees exactly 8 bytes, try_into always succeeds
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian IEEE-754 f64. NaN payloads pass through bit-exact.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        let bytes = self.read_bytes(8, context)?;
        // SAFETY: read_bytes guarantees exactly 8 bytes, try_into always succeeds
        Ok(f64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a 12-byte object id.
    #[inline]
    pub fn read_object_id(&mut self, context: &'static str) -> Result<[u8; OBJECT_ID_LEN], DecodeError> {
        let bytes = self.read_bytes(OBJECT_ID_LEN, context)?;
        // SAFETY: read_bytes guarantees exactly 12 bytes, try_into always succeeds
        Ok(bytes.try_into().unwrap())
    }

    /// Reads the bytes of a NUL-terminated cstring, consuming the terminator.
    ///
    /// The returned slice excludes the terminator.
    pub fn read_cstring_bytes(&mut self, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::MissingTerminator { context })?;
        let bytes = &rest[..nul];
        self.pos += nul + 1;
        Ok(bytes)
    }

    /// Reads a NUL-terminated UTF-8 cstring.
    pub fn read_cstring(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        let bytes = self.read_cstring_bytes(field)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Reads the payload of a length-prefixed string, validating the prefix
    /// and the trailing NUL. The returned slice excludes the terminator.
    ///
    /// Wire layout: i32 length (counting the terminator), payload bytes, 0x00.
    pub fn read_string_bytes(&mut self, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let offset = self.pos;
        let len = self.read_i32(field)?;
        if len < 1 {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
                offset,
            });
        }
        if len as usize > self.remaining_len() {
            return Err(DecodeError::InvalidLength {
                field,
                len: len as i64,
                offset,
            });
        }
        let bytes = self.read_bytes(len as usize - 1, field)?;
        let terminator = self.read_byte(field)?;
        if terminator != 0 {
            return Err(DecodeError::MissingTerminator { context: field });
        }
        Ok(bytes)
    }

    /// Reads a length-prefixed UTF-8 string.
    #[inline]
    pub fn read_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let bytes = self.read_string_bytes(field)?;
        // Validate UTF-8 on the borrowed slice, then allocate once
        std::str::from_utf8(bytes)
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

    /// Writes a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian IEEE-754 f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 12-byte object id.
    #[inline]
    pub fn write_object_id(&mut self, bytes: &[u8; OBJECT_ID_LEN]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a NUL-terminated cstring, rejecting interior NUL bytes.
    pub fn write_cstring(&mut self, s: &str, context: &'static str) -> Result<(), EncodeError> {
        if s.as_bytes().contains(&0) {
            return Err(EncodeError::InteriorNul { context });
        }
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string (i32 length counting the
    /// terminator, payload bytes, 0x00).
    pub fn write_string(&mut self, s: &str) {
        self.write_i32(s.len() as i32 + 1);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Writes a 4-byte length placeholder and returns its position for a
    /// later [`patch_length`](Self::patch_length) once the body is complete.
    #[inline]
    pub fn reserve_length(&mut self) -> usize {
        let pos = self.buf.len();
        self.write_i32(0);
        pos
    }

    /// Overwrites a previously reserved 4-byte length slot.
    #[inline]
    pub fn patch_length(&mut self, pos: usize, value: i32) {
        // SAFETY: pos comes from reserve_length, so pos..pos+4 is in bounds
        self.buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_roundtrip() {
        let mut writer = Writer::new();
        writer.write_byte(0xAB);
        writer.write_u16(0xBEEF);
        writer.write_i32(-123_456);
        writer.write_u32(0xDEAD_BEEF);
        writer.write_i64(i64::MIN);
        writer.write_u64(u64::MAX);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_byte("test").unwrap(), 0xAB);
        assert_eq!(reader.read_u16("test").unwrap(), 0xBEEF);
        assert_eq!(reader.read_i32("test").unwrap(), -123_456);
        assert_eq!(reader.read_u32("test").unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i64("test").unwrap(), i64::MIN);
        assert_eq!(reader.read_u64("test").unwrap(), u64::MAX);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_little_endian_layout() {
        let mut writer = Writer::new();
        writer.write_i32(1);
        assert_eq!(writer.as_bytes(), &[1, 0, 0, 0]);

        let mut writer = Writer::new();
        writer.write_i64(258);
        assert_eq!(writer.as_bytes(), &[2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_f64_roundtrip() {
        let test_values = [0.0, 1.0, -1.0, 2.0, f64::INFINITY, f64::NEG_INFINITY, 3.14159];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_f64(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_f64("test").unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
        }
    }

    #[test]
    fn test_f64_nan_bits_preserved() {
        let mut writer = Writer::new();
        writer.write_f64(f64::NAN);

        let mut reader = Reader::new(writer.as_bytes());
        let decoded = reader.read_f64("test").unwrap();
        assert_eq!(decoded.to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn test_string_roundtrip() {
        let test_strings = ["", "hello", "hello world", "unicode: \u{1F600}"];

        for s in test_strings {
            let mut writer = Writer::new();
            writer.write_string(s);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_string("test").unwrap();
            assert_eq!(s, decoded);
        }
    }

    #[test]
    fn test_string_wire_layout() {
        let mut writer = Writer::new();
        writer.write_string("hello");
        assert_eq!(writer.as_bytes(), b"\x06\x00\x00\x00hello\x00");
    }

    #[test]
    fn test_string_zero_length_rejected() {
        // Length must count the terminator, so 0 is never valid
        let data = [0u8, 0, 0, 0];
        let mut reader = Reader::new(&data);
        let result = reader.read_string("test");
        assert!(matches!(result, Err(DecodeError::InvalidLength { .. })));
    }

    #[test]
    fn test_string_negative_length_rejected() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = Reader::new(&data);
        let result = reader.read_string("test");
        assert!(matches!(
            result,
            Err(DecodeError::InvalidLength { len: -1, .. })
        ));
    }

    #[test]
    fn test_string_length_exceeds_buffer() {
        let data = [100u8, 0, 0, 0, b'h', b'i', 0];
        let mut reader = Reader::new(&data);
        let result = reader.read_string("test");
        assert!(matches!(result, Err(DecodeError::InvalidLength { len: 100, .. })));
    }

    #[test]
    fn test_string_missing_terminator() {
        // Declares 3 bytes of payload+NUL but the last byte is not 0x00
        let data = [4u8, 0, 0, 0, b'a', b'b', b'c', b'd'];
        let mut reader = Reader::new(&data);
        let result = reader.read_string("test");
        assert!(matches!(result, Err(DecodeError::MissingTerminator { .. })));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let data = [3u8, 0, 0, 0, 0xFF, 0xFE, 0];
        let mut reader = Reader::new(&data);
        let result = reader.read_string("test");
        assert!(matches!(result, Err(DecodeError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_cstring_roundtrip() {
        let test_strings = ["", "name", "a.b.c", "unicode: \u{00E9}"];

        for s in test_strings {
            let mut writer = Writer::new();
            writer.write_cstring(s, "test").unwrap();

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_cstring("test").unwrap();
            assert_eq!(s, decoded);
        }
    }

    #[test]
    fn test_cstring_interior_nul_rejected() {
        let mut writer = Writer::new();
        let result = writer.write_cstring("a\0b", "element name");
        assert!(matches!(result, Err(EncodeError::InteriorNul { .. })));
    }

    #[test]
    fn test_cstring_missing_terminator() {
        let data = b"name";
        let mut reader = Reader::new(data);
        let result = reader.read_cstring("test");
        assert!(matches!(result, Err(DecodeError::MissingTerminator { .. })));
    }

    #[test]
    fn test_object_id_roundtrip() {
        let id = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

        let mut writer = Writer::new();
        writer.write_object_id(&id);

        let mut reader = Reader::new(writer.as_bytes());
        let decoded = reader.read_object_id("test").unwrap();
        assert_eq!(id, decoded);
    }

    #[test]
    fn test_reserve_and_patch_length() {
        let mut writer = Writer::new();
        let slot = writer.reserve_length();
        writer.write_bytes(b"body");
        let total = writer.len() as i32;
        writer.patch_length(slot, total);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_i32("test").unwrap(), 8);
        assert_eq!(reader.read_bytes(4, "test").unwrap(), b"body");
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        let result = reader.read_bytes(10, "test");
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_position_tracking() {
        let data = [1u8, 0, 0, 0, 9];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.position(), 0);
        reader.read_i32("test").unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.remaining_len(), 1);
        reader.read_byte("test").unwrap();
        assert!(reader.is_empty());
    }
}
