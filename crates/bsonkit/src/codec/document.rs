//! Document-level framing for the binary codec.
//!
//! A document is a 4-byte total length (counting itself and the trailing
//! 0x00), a run of elements, and the 0x00 terminator. Arrays share the
//! layout with index-string names that are ignored on decode and
//! regenerated on encode.

use crate::codec::element;
use crate::codec::raw::{Reader, Writer};
use crate::codec::settings::{BinaryReaderSettings, BinaryWriterSettings};
use crate::error::{DecodeError, EncodeError};
use crate::limits::MIN_DOCUMENT_SIZE;
use crate::model::{Array, Document, ElementType, Value};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a complete document with default settings.
///
/// The whole buffer must be one document: trailing bytes are an error.
pub fn decode_document(bytes: &[u8]) -> Result<Document, DecodeError> {
    decode_document_with_settings(bytes, &BinaryReaderSettings::new())
}

/// Decodes a complete document.
pub fn decode_document_with_settings(
    bytes: &[u8],
    settings: &BinaryReaderSettings,
) -> Result<Document, DecodeError> {
    let mut reader = Reader::new(bytes);
    let doc = read_document_body(&mut reader, settings, 0)?;
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: reader.remaining_len(),
        });
    }
    Ok(doc)
}

/// Validates a document/array frame header and returns `(start, declared)`.
fn read_frame_header(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
) -> Result<(usize, usize), DecodeError> {
    let start = reader.position();
    let declared = reader.read_i32("document length")?;
    if (declared as i64) < MIN_DOCUMENT_SIZE as i64 {
        return Err(DecodeError::InvalidLength {
            field: "document",
            len: declared as i64,
            offset: start,
        });
    }
    let declared = declared as usize;
    if declared > settings.max_document_size() {
        return Err(DecodeError::DocumentTooLarge {
            size: declared,
            max: settings.max_document_size(),
        });
    }
    if declared - 4 > reader.remaining_len() {
        return Err(DecodeError::InvalidLength {
            field: "document",
            len: declared as i64,
            offset: start,
        });
    }
    Ok((start, declared))
}

pub(crate) fn read_document_body(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
    depth: usize,
) -> Result<Document, DecodeError> {
    if depth > settings.max_depth() {
        return Err(DecodeError::NestingDepthExceeded {
            max: settings.max_depth(),
        });
    }
    let (start, declared) = read_frame_header(reader, settings)?;
    let mut doc = Document::new();
    loop {
        let offset = reader.position();
        let tag = reader.read_byte("element type")?;
        if tag == 0 {
            let actual = reader.position() - start;
            if actual != declared {
                return Err(DecodeError::LengthMismatch {
                    field: "document",
                    declared,
                    actual,
                });
            }
            return Ok(doc);
        }
        let ty = ElementType::from_u8(tag).ok_or(DecodeError::InvalidElementType { tag, offset })?;
        let name = element::read_name(reader, settings)?;
        let value = element::decode_value(reader, ty, settings, depth)?;
        doc.push(name, value);
    }
}

pub(crate) fn read_array_body(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
    depth: usize,
) -> Result<Array, DecodeError> {
    if depth > settings.max_depth() {
        return Err(DecodeError::NestingDepthExceeded {
            max: settings.max_depth(),
        });
    }
    let (start, declared) = read_frame_header(reader, settings)?;
    let mut array = Array::new();
    loop {
        let offset = reader.position();
        let tag = reader.read_byte("element type")?;
        if tag == 0 {
            let actual = reader.position() - start;
            if actual != declared {
                return Err(DecodeError::LengthMismatch {
                    field: "array",
                    declared,
                    actual,
                });
            }
            return Ok(array);
        }
        let ty = ElementType::from_u8(tag).ok_or(DecodeError::InvalidElementType { tag, offset })?;
        // Index names carry no information; validated and discarded
        element::read_name(reader, settings)?;
        let value = element::decode_value(reader, ty, settings, depth)?;
        array.push(value);
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a document with default settings.
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    encode_document_with_settings(doc, &BinaryWriterSettings::new())
}

/// Encodes a document.
pub fn encode_document_with_settings(
    doc: &Document,
    settings: &BinaryWriterSettings,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::with_capacity(128);
    write_document_body(&mut writer, doc, settings, 0)?;
    Ok(writer.into_bytes())
}

pub(crate) fn write_document_body(
    writer: &mut Writer,
    doc: &Document,
    settings: &BinaryWriterSettings,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > settings.max_depth() {
        return Err(EncodeError::NestingDepthExceeded {
            max: settings.max_depth(),
        });
    }
    let slot = writer.reserve_length();
    for (name, value) in doc {
        element::encode_element(writer, name, value, settings, depth)?;
    }
    writer.write_byte(0);
    finish_frame(writer, slot, settings)
}

pub(crate) fn write_array_body(
    writer: &mut Writer,
    array: &[Value],
    settings: &BinaryWriterSettings,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > settings.max_depth() {
        return Err(EncodeError::NestingDepthExceeded {
            max: settings.max_depth(),
        });
    }
    let slot = writer.reserve_length();
    for (index, value) in array.iter().enumerate() {
        element::encode_element(writer, &index.to_string(), value, settings, depth)?;
    }
    writer.write_byte(0);
    finish_frame(writer, slot, settings)
}

fn finish_frame(
    writer: &mut Writer,
    slot: usize,
    settings: &BinaryWriterSettings,
) -> Result<(), EncodeError> {
    let size = writer.len() - slot;
    if size > settings.max_document_size() {
        return Err(EncodeError::DocumentTooLarge {
            size,
            max: settings.max_document_size(),
        });
    }
    writer.patch_length(slot, size as i32);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::guid::GuidRepresentationMode;
    use crate::guid::UuidRepresentation;
    use crate::model::{Binary, BinarySubtype, DateTime, ObjectId, Regex, Timestamp};

    #[test]
    fn test_golden_bytes() {
        let doc = doc! { "x" => 1, "y" => "hello" };
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(
            bytes,
            [
                0x19, 0x00, 0x00, 0x00, // total length 25
                0x10, 0x78, 0x00, // int32 "x"
                0x01, 0x00, 0x00, 0x00, // 1
                0x02, 0x79, 0x00, // string "y"
                0x06, 0x00, 0x00, 0x00, // string length 6
                0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, // "hello\0"
                0x00, // terminator
            ]
        );
        assert_eq!(decode_document(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_empty_document() {
        let bytes = encode_document(&doc! {}).unwrap();
        assert_eq!(bytes, [5, 0, 0, 0, 0]);
        assert!(decode_document(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_array_index_names() {
        let doc = doc! { "a" => [1, 2] };
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(
            bytes,
            [
                0x1B, 0x00, 0x00, 0x00, // total 27
                0x04, 0x61, 0x00, // array "a"
                0x13, 0x00, 0x00, 0x00, // array doc length 19
                0x10, 0x30, 0x00, 0x01, 0x00, 0x00, 0x00, // "0": 1
                0x10, 0x31, 0x00, 0x02, 0x00, 0x00, 0x00, // "1": 2
                0x00, 0x00,
            ]
        );
        assert_eq!(decode_document(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_array_names_ignored_on_decode() {
        // Same layout as {"a": [1, 2]} but with names "5" and "x"
        let bytes = [
            0x1B, 0x00, 0x00, 0x00, 0x04, 0x61, 0x00, 0x13, 0x00, 0x00, 0x00, 0x10, 0x35, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x10, 0x78, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let doc = decode_document(&bytes).unwrap();
        assert_eq!(doc, doc! { "a" => [1, 2] });
        // Re-encoding regenerates canonical index names
        let reencoded = encode_document(&doc).unwrap();
        assert_eq!(reencoded[12..14], [0x30, 0x00]);
        assert_eq!(reencoded[19..21], [0x31, 0x00]);
    }

    #[test]
    fn test_roundtrip_all_types() {
        let doc = doc! {
            "double" => 2.5,
            "string" => "text",
            "doc" => doc! { "inner" => true },
            "array" => [1, 2, 3],
            "binary" => Binary::new(BinarySubtype::Generic, vec![0xDE, 0xAD]),
            "undefined" => crate::Value::Undefined,
            "oid" => ObjectId::from_bytes([3; 12]),
            "bool" => false,
            "datetime" => DateTime::from_millis(1_700_000_000_000),
            "null" => crate::Value::Null,
            "regex" => Regex::new("^x", "i"),
            "code" => crate::Value::JavaScript("f()".to_owned()),
            "symbol" => crate::Value::Symbol("s".to_owned()),
            "int32" => i32::MIN,
            "timestamp" => Timestamp { seconds: 100, increment: 7 },
            "int64" => i64::MIN,
            "decimal" => "9.5E+300".parse::<crate::Decimal128>().unwrap(),
            "maxkey" => crate::Value::MaxKey,
            "minkey" => crate::Value::MinKey,
        };
        let bytes = encode_document(&doc).unwrap();
        let decoded = decode_document(&bytes).unwrap();
        assert_eq!(decoded, doc);
        // Canonical bytes re-encode byte-identically
        assert_eq!(encode_document(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_document(&doc! { "x" => 1 }).unwrap();
        bytes.push(0x00);
        assert_eq!(
            decode_document(&bytes),
            Err(DecodeError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn test_declared_length_too_small() {
        let bytes = [4, 0, 0, 0];
        assert!(matches!(
            decode_document(&bytes),
            Err(DecodeError::InvalidLength { field: "document", len: 4, .. })
        ));
    }

    #[test]
    fn test_declared_length_exceeds_buffer() {
        let bytes = [10, 0, 0, 0, 0];
        assert!(matches!(
            decode_document(&bytes),
            Err(DecodeError::InvalidLength { field: "document", len: 10, .. })
        ));
    }

    #[test]
    fn test_declared_length_consumed_mismatch() {
        let mut bytes = encode_document(&doc! { "x" => 1 }).unwrap();
        let actual = bytes.len();
        bytes[0] += 1;
        bytes.push(0x00); // keep the buffer long enough for the bad length
        assert_eq!(
            decode_document(&bytes),
            Err(DecodeError::LengthMismatch {
                field: "document",
                declared: actual + 1,
                actual,
            })
        );
    }

    #[test]
    fn test_unknown_tag_with_offset() {
        // Valid header, then tag 0xAB at offset 4
        let bytes = [8, 0, 0, 0, 0xAB, 0x61, 0x00, 0x00];
        assert_eq!(
            decode_document(&bytes),
            Err(DecodeError::InvalidElementType { tag: 0xAB, offset: 4 })
        );
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(
            decode_document(&[]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_nesting_depth_limit() {
        fn nest(levels: usize) -> Document {
            let mut doc = doc! {};
            for _ in 0..levels {
                doc = doc! { "d" => doc };
            }
            doc
        }

        let mut ws = BinaryWriterSettings::new();
        ws.set_max_depth(3).unwrap();
        // Root at depth 0, so 3 wrapper levels reach depth 3 exactly
        assert!(encode_document_with_settings(&nest(3), &ws).is_ok());
        assert_eq!(
            encode_document_with_settings(&nest(4), &ws),
            Err(EncodeError::NestingDepthExceeded { max: 3 })
        );

        let bytes = encode_document(&nest(4)).unwrap();
        let mut rs = BinaryReaderSettings::new();
        rs.set_max_depth(3).unwrap();
        assert_eq!(
            decode_document_with_settings(&bytes, &rs),
            Err(DecodeError::NestingDepthExceeded { max: 3 })
        );
        rs.set_max_depth(4).unwrap();
        assert!(decode_document_with_settings(&bytes, &rs).is_ok());
    }

    #[test]
    fn test_depth_limit_counts_arrays() {
        let doc = doc! { "a" => [vec![vec![1]]] };
        let mut ws = BinaryWriterSettings::new();
        ws.set_max_depth(2).unwrap();
        assert_eq!(
            encode_document_with_settings(&doc, &ws),
            Err(EncodeError::NestingDepthExceeded { max: 2 })
        );
    }

    #[test]
    fn test_document_size_limit() {
        let doc = doc! { "data" => Binary::new(BinarySubtype::Generic, vec![0; 64]) };

        let mut ws = BinaryWriterSettings::new();
        ws.set_max_document_size(32).unwrap();
        assert!(matches!(
            encode_document_with_settings(&doc, &ws),
            Err(EncodeError::DocumentTooLarge { max: 32, .. })
        ));

        let bytes = encode_document(&doc).unwrap();
        let mut rs = BinaryReaderSettings::new();
        rs.set_max_document_size(32).unwrap();
        assert!(matches!(
            decode_document_with_settings(&bytes, &rs),
            Err(DecodeError::DocumentTooLarge { max: 32, .. })
        ));
    }

    #[test]
    fn test_duplicate_names_roundtrip() {
        // {"a": 1, "a": 2} built by hand
        let mut bytes = vec![0x13, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0x10, 0x61, 0x00, 1, 0, 0, 0]);
        bytes.extend_from_slice(&[0x10, 0x61, 0x00, 2, 0, 0, 0]);
        bytes.push(0x00);
        let doc = decode_document(&bytes).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get_i32("a"), Ok(1));
        assert_eq!(encode_document(&doc).unwrap(), bytes);
    }

    #[test]
    fn test_interior_nul_name_rejected() {
        let mut doc = Document::new();
        doc.insert("bad\0name", 1);
        assert_eq!(
            encode_document(&doc),
            Err(EncodeError::InteriorNul { context: "element name" })
        );
    }

    #[test]
    fn test_frozen_settings_still_decode() {
        let mut rs = BinaryReaderSettings::new();
        rs.freeze();
        let bytes = encode_document(&doc! { "x" => 1 }).unwrap();
        assert!(decode_document_with_settings(&bytes, &rs).is_ok());
    }

    #[test]
    fn test_uuid_roundtrip_with_explicit_settings() {
        let ws = BinaryWriterSettings::with_mode(
            GuidRepresentationMode::V2,
            UuidRepresentation::PythonLegacy,
        );
        let rs = BinaryReaderSettings::with_mode(
            GuidRepresentationMode::V2,
            UuidRepresentation::PythonLegacy,
        );
        let binary = Binary::new(BinarySubtype::UuidLegacy, vec![0x11; 16])
            .with_representation(UuidRepresentation::PythonLegacy)
            .unwrap();
        let doc = doc! { "u" => binary };
        let bytes = encode_document_with_settings(&doc, &ws).unwrap();
        let decoded = decode_document_with_settings(&bytes, &rs).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(
            decoded.get_binary("u").unwrap().representation(),
            UuidRepresentation::PythonLegacy
        );
        assert_eq!(encode_document_with_settings(&decoded, &ws).unwrap(), bytes);
    }
}
