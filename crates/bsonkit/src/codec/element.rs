//! Element value encoding/decoding.
//!
//! Implements the per-tag wire layouts. Document and array framing lives in
//! [`codec::document`](crate::codec::document); this module handles
//! everything between an element's name and the next tag byte.

use crate::codec::document::{
    read_array_body, read_document_body, write_array_body, write_document_body,
};
use crate::codec::raw::{Reader, Writer};
use crate::codec::settings::{BinaryReaderSettings, BinaryWriterSettings};
use crate::error::{DecodeError, EncodeError};
use crate::guid::{GuidRepresentationMode, UuidRepresentation};
use crate::limits::UUID_PAYLOAD_LEN;
use crate::model::{
    Binary, BinarySubtype, DateTime, DbPointer, Decimal128, ElementType, JavaScriptWithScope,
    ObjectId, Regex, Timestamp, Value,
};

// =============================================================================
// DECODING
// =============================================================================

/// Reads an element name, honoring the lossy UTF-8 setting.
pub(crate) fn read_name(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
) -> Result<String, DecodeError> {
    read_utf8_cstring(reader, "element name", settings)
}

fn read_utf8_cstring(
    reader: &mut Reader<'_>,
    field: &'static str,
    settings: &BinaryReaderSettings,
) -> Result<String, DecodeError> {
    let bytes = reader.read_cstring_bytes(field)?;
    if settings.utf8_lossy() {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    } else {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

fn read_utf8_string(
    reader: &mut Reader<'_>,
    field: &'static str,
    settings: &BinaryReaderSettings,
) -> Result<String, DecodeError> {
    let bytes = reader.read_string_bytes(field)?;
    if settings.utf8_lossy() {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    } else {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

/// Decodes a value from the reader based on the element type.
pub(crate) fn decode_value(
    reader: &mut Reader<'_>,
    ty: ElementType,
    settings: &BinaryReaderSettings,
    depth: usize,
) -> Result<Value, DecodeError> {
    match ty {
        ElementType::Double => Ok(Value::Double(reader.read_f64("double")?)),
        ElementType::String => Ok(Value::String(read_utf8_string(reader, "string", settings)?)),
        ElementType::Document => Ok(Value::Document(read_document_body(
            reader,
            settings,
            depth + 1,
        )?)),
        ElementType::Array => Ok(Value::Array(read_array_body(reader, settings, depth + 1)?)),
        ElementType::Binary => decode_binary(reader, settings),
        ElementType::Undefined => Ok(Value::Undefined),
        ElementType::ObjectId => Ok(Value::ObjectId(ObjectId::from_bytes(
            reader.read_object_id("object id")?,
        ))),
        ElementType::Boolean => decode_bool(reader),
        ElementType::DateTime => Ok(Value::DateTime(DateTime::from_millis(
            reader.read_i64("datetime")?,
        ))),
        ElementType::Null => Ok(Value::Null),
        ElementType::Regex => {
            let pattern = read_utf8_cstring(reader, "regex pattern", settings)?;
            let options = read_utf8_cstring(reader, "regex options", settings)?;
            Ok(Value::Regex(Regex { pattern, options }))
        }
        ElementType::DbPointer => {
            let namespace = read_utf8_string(reader, "db pointer namespace", settings)?;
            let id = ObjectId::from_bytes(reader.read_object_id("db pointer id")?);
            Ok(Value::DbPointer(DbPointer { namespace, id }))
        }
        ElementType::JavaScript => Ok(Value::JavaScript(read_utf8_string(
            reader,
            "javascript code",
            settings,
        )?)),
        ElementType::Symbol => Ok(Value::Symbol(read_utf8_string(reader, "symbol", settings)?)),
        ElementType::JavaScriptWithScope => decode_javascript_with_scope(reader, settings, depth),
        ElementType::Int32 => Ok(Value::Int32(reader.read_i32("int32")?)),
        ElementType::Timestamp => Ok(Value::Timestamp(Timestamp::from_u64(
            reader.read_u64("timestamp")?,
        ))),
        ElementType::Int64 => Ok(Value::Int64(reader.read_i64("int64")?)),
        ElementType::Decimal128 => {
            let bytes = reader.read_bytes(16, "decimal128")?;
            // SAFETY: read_bytes guarantees exactly 16 bytes, try_into always succeeds
            Ok(Value::Decimal128(Decimal128::from_bytes(
                bytes.try_into().unwrap(),
            )))
        }
        ElementType::MaxKey => Ok(Value::MaxKey),
        ElementType::MinKey => Ok(Value::MinKey),
    }
}

fn decode_bool(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let byte = reader.read_byte("bool")?;
    match byte {
        0x00 => Ok(Value::Boolean(false)),
        0x01 => Ok(Value::Boolean(true)),
        _ => Err(DecodeError::InvalidBool { value: byte }),
    }
}

fn decode_binary(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
) -> Result<Value, DecodeError> {
    let offset = reader.position();
    let outer = reader.read_i32("binary length")?;
    if outer < 0 {
        return Err(DecodeError::InvalidLength {
            field: "binary",
            len: outer as i64,
            offset,
        });
    }
    let mut subtype = BinarySubtype::from_u8(reader.read_byte("binary subtype")?);

    let payload = if subtype == BinarySubtype::OldBinary {
        // Deprecated double-length layout: the outer length counts the
        // nested length prefix, the inner one counts only the payload
        let inner_offset = reader.position();
        let inner = reader.read_i32("old binary inner length")?;
        if inner < 0 {
            return Err(DecodeError::InvalidLength {
                field: "old binary",
                len: inner as i64,
                offset: inner_offset,
            });
        }
        if inner != outer - 4 {
            return Err(DecodeError::OldBinaryLength {
                outer: outer as i64,
                inner: inner as i64,
            });
        }
        if settings.fix_old_binary_subtype_on_input() {
            subtype = BinarySubtype::Generic;
        }
        reader.read_bytes(inner as usize, "binary payload")?
    } else {
        reader.read_bytes(outer as usize, "binary payload")?
    };

    let mut binary = Binary::new(subtype, payload.to_vec());
    if settings.mode() == GuidRepresentationMode::V2 && binary.bytes().len() == UUID_PAYLOAD_LEN {
        let effective = match binary.subtype() {
            BinarySubtype::UuidStandard => UuidRepresentation::Standard,
            // A legacy payload never tags Standard; an ambient Standard
            // (or Unspecified) leaves it untagged
            BinarySubtype::UuidLegacy => match settings.guid_representation() {
                rep @ (UuidRepresentation::CSharpLegacy
                | UuidRepresentation::JavaLegacy
                | UuidRepresentation::PythonLegacy) => rep,
                _ => UuidRepresentation::Unspecified,
            },
            _ => UuidRepresentation::Unspecified,
        };
        if effective != UuidRepresentation::Unspecified {
            binary.tag_representation(effective);
        }
    }
    Ok(Value::Binary(binary))
}

fn decode_javascript_with_scope(
    reader: &mut Reader<'_>,
    settings: &BinaryReaderSettings,
    depth: usize,
) -> Result<Value, DecodeError> {
    let offset = reader.position();
    let declared = reader.read_i32("code with scope length")?;
    // Minimum: 4-byte length + empty string (5) + empty document (5)
    if declared < 14 {
        return Err(DecodeError::InvalidLength {
            field: "code with scope",
            len: declared as i64,
            offset,
        });
    }
    let code = read_utf8_string(reader, "javascript code", settings)?;
    let scope = read_document_body(reader, settings, depth + 1)?;
    let consumed = reader.position() - offset;
    if consumed != declared as usize {
        return Err(DecodeError::LengthMismatch {
            field: "code with scope",
            declared: declared as usize,
            actual: consumed,
        });
    }
    Ok(Value::JavaScriptWithScope(JavaScriptWithScope { code, scope }))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes one element: tag byte, name cstring, value.
pub(crate) fn encode_element(
    writer: &mut Writer,
    name: &str,
    value: &Value,
    settings: &BinaryWriterSettings,
    depth: usize,
) -> Result<(), EncodeError> {
    writer.write_byte(value.element_type() as u8);
    writer.write_cstring(name, "element name")?;
    encode_value(writer, value, settings, depth)
}

fn encode_value(
    writer: &mut Writer,
    value: &Value,
    settings: &BinaryWriterSettings,
    depth: usize,
) -> Result<(), EncodeError> {
    match value {
        Value::Double(v) => writer.write_f64(*v),
        Value::String(v) => writer.write_string(v),
        Value::Document(v) => write_document_body(writer, v, settings, depth + 1)?,
        Value::Array(v) => write_array_body(writer, v, settings, depth + 1)?,
        Value::Binary(v) => encode_binary(writer, v, settings)?,
        Value::Undefined => {}
        Value::ObjectId(v) => writer.write_object_id(v.bytes()),
        Value::Boolean(v) => writer.write_byte(*v as u8),
        Value::DateTime(v) => writer.write_i64(v.millis()),
        Value::Null => {}
        Value::Regex(v) => {
            writer.write_cstring(&v.pattern, "regex pattern")?;
            writer.write_cstring(&v.options, "regex options")?;
        }
        Value::DbPointer(v) => {
            writer.write_string(&v.namespace);
            writer.write_object_id(v.id.bytes());
        }
        Value::JavaScript(v) => writer.write_string(v),
        Value::Symbol(v) => writer.write_string(v),
        Value::JavaScriptWithScope(v) => {
            let slot = writer.reserve_length();
            writer.write_string(&v.code);
            write_document_body(writer, &v.scope, settings, depth + 1)?;
            let total = writer.len() - slot;
            writer.patch_length(slot, total as i32);
        }
        Value::Int32(v) => writer.write_i32(*v),
        Value::Timestamp(v) => writer.write_u64(v.to_u64()),
        Value::Int64(v) => writer.write_i64(*v),
        Value::Decimal128(v) => writer.write_bytes(v.bytes()),
        Value::MaxKey | Value::MinKey => {}
    }
    Ok(())
}

fn encode_binary(
    writer: &mut Writer,
    binary: &Binary,
    settings: &BinaryWriterSettings,
) -> Result<(), EncodeError> {
    if settings.check_uuid_representation()
        && settings.mode() == GuidRepresentationMode::V2
        && binary.subtype() == BinarySubtype::UuidLegacy
        && binary.representation() != UuidRepresentation::Unspecified
        && settings.guid_representation() != UuidRepresentation::Unspecified
        && binary.representation() != settings.guid_representation()
    {
        return Err(EncodeError::GuidRepresentationMismatch {
            value: binary.representation(),
            writer: settings.guid_representation(),
        });
    }

    let bytes = binary.bytes();
    if binary.subtype() == BinarySubtype::OldBinary
        && !settings.fix_old_binary_subtype_on_output()
    {
        writer.write_i32(bytes.len() as i32 + 4);
        writer.write_byte(BinarySubtype::OldBinary.to_u8());
        writer.write_i32(bytes.len() as i32);
    } else {
        let subtype = if binary.subtype() == BinarySubtype::OldBinary {
            BinarySubtype::Generic
        } else {
            binary.subtype()
        };
        writer.write_i32(bytes.len() as i32);
        writer.write_byte(subtype.to_u8());
    }
    writer.write_bytes(bytes);
    Ok(())
}
