//! Per-kind converter functions for the textual dialects.
//!
//! A [`JsonConverters`] holds one function pointer per leaf value kind;
//! nesting (documents, arrays, scoped code) is structural and handled by the
//! writer. The built-in [`SHELL`] and [`STRICT`] sets implement the two
//! dialects; `with_*` builders derive customized copies without mutating the
//! originals.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::guid::{GuidRepresentationMode, UuidRepresentation};
use crate::model::{Binary, DateTime, DbPointer, Decimal128, ObjectId, Regex, Timestamp};
use crate::text::settings::JsonWriterSettings;

// =============================================================================
// CONVERTER SET
// =============================================================================

/// An immutable set of per-kind converter functions.
///
/// Every slot must be filled, so a set is complete by construction. Binary
/// conversion takes the writer settings because uuid subtypes render under
/// the effective guid representation.
#[derive(Debug, Clone, Copy)]
pub struct JsonConverters {
    pub(crate) double: fn(f64, &mut String),
    pub(crate) string: fn(&str, &mut String),
    pub(crate) boolean: fn(bool, &mut String),
    pub(crate) null: fn(&mut String),
    pub(crate) undefined: fn(&mut String),
    pub(crate) int32: fn(i32, &mut String),
    pub(crate) int64: fn(i64, &mut String),
    pub(crate) datetime: fn(DateTime, &mut String),
    pub(crate) object_id: fn(&ObjectId, &mut String),
    pub(crate) binary: fn(&Binary, &JsonWriterSettings, &mut String),
    pub(crate) regex: fn(&Regex, &mut String),
    pub(crate) javascript: fn(&str, &mut String),
    pub(crate) symbol: fn(&str, &mut String),
    pub(crate) timestamp: fn(Timestamp, &mut String),
    pub(crate) decimal128: fn(&Decimal128, &mut String),
    pub(crate) min_key: fn(&mut String),
    pub(crate) max_key: fn(&mut String),
    pub(crate) db_pointer: fn(&DbPointer, &mut String),
}

/// Copy-and-override builders, one per slot.
impl JsonConverters {
    pub fn with_double(&self, converter: fn(f64, &mut String)) -> JsonConverters {
        JsonConverters {
            double: converter,
            ..*self
        }
    }

    pub fn with_string(&self, converter: fn(&str, &mut String)) -> JsonConverters {
        JsonConverters {
            string: converter,
            ..*self
        }
    }

    pub fn with_boolean(&self, converter: fn(bool, &mut String)) -> JsonConverters {
        JsonConverters {
            boolean: converter,
            ..*self
        }
    }

    pub fn with_null(&self, converter: fn(&mut String)) -> JsonConverters {
        JsonConverters {
            null: converter,
            ..*self
        }
    }

    pub fn with_undefined(&self, converter: fn(&mut String)) -> JsonConverters {
        JsonConverters {
            undefined: converter,
            ..*self
        }
    }

    pub fn with_int32(&self, converter: fn(i32, &mut String)) -> JsonConverters {
        JsonConverters {
            int32: converter,
            ..*self
        }
    }

    pub fn with_int64(&self, converter: fn(i64, &mut String)) -> JsonConverters {
        JsonConverters {
            int64: converter,
            ..*self
        }
    }

    pub fn with_datetime(&self, converter: fn(DateTime, &mut String)) -> JsonConverters {
        JsonConverters {
            datetime: converter,
            ..*self
        }
    }

    pub fn with_object_id(&self, converter: fn(&ObjectId, &mut String)) -> JsonConverters {
        JsonConverters {
            object_id: converter,
            ..*self
        }
    }

    pub fn with_binary(
        &self,
        converter: fn(&Binary, &JsonWriterSettings, &mut String),
    ) -> JsonConverters {
        JsonConverters {
            binary: converter,
            ..*self
        }
    }

    pub fn with_regex(&self, converter: fn(&Regex, &mut String)) -> JsonConverters {
        JsonConverters {
            regex: converter,
            ..*self
        }
    }

    pub fn with_javascript(&self, converter: fn(&str, &mut String)) -> JsonConverters {
        JsonConverters {
            javascript: converter,
            ..*self
        }
    }

    pub fn with_symbol(&self, converter: fn(&str, &mut String)) -> JsonConverters {
        JsonConverters {
            symbol: converter,
            ..*self
        }
    }

    pub fn with_timestamp(&self, converter: fn(Timestamp, &mut String)) -> JsonConverters {
        JsonConverters {
            timestamp: converter,
            ..*self
        }
    }

    pub fn with_decimal128(&self, converter: fn(&Decimal128, &mut String)) -> JsonConverters {
        JsonConverters {
            decimal128: converter,
            ..*self
        }
    }

    pub fn with_min_key(&self, converter: fn(&mut String)) -> JsonConverters {
        JsonConverters {
            min_key: converter,
            ..*self
        }
    }

    pub fn with_max_key(&self, converter: fn(&mut String)) -> JsonConverters {
        JsonConverters {
            max_key: converter,
            ..*self
        }
    }

    pub fn with_db_pointer(&self, converter: fn(&DbPointer, &mut String)) -> JsonConverters {
        JsonConverters {
            db_pointer: converter,
            ..*self
        }
    }
}

/// The shell dialect: constructor syntax the mongo shell evaluates directly.
pub static SHELL: JsonConverters = JsonConverters {
    double: write_double,
    string: write_string,
    boolean: write_boolean,
    null: write_null,
    undefined: shell_undefined,
    int32: write_int32,
    int64: shell_int64,
    datetime: shell_datetime,
    object_id: shell_object_id,
    binary: shell_binary,
    regex: shell_regex,
    javascript: write_javascript,
    symbol: write_string,
    timestamp: shell_timestamp,
    decimal128: shell_decimal128,
    min_key: shell_min_key,
    max_key: shell_max_key,
    db_pointer: shell_db_pointer,
};

/// The strict dialect: `$`-wrapper objects any JSON parser can read.
pub static STRICT: JsonConverters = JsonConverters {
    double: write_double,
    string: write_string,
    boolean: write_boolean,
    null: write_null,
    undefined: strict_undefined,
    int32: write_int32,
    int64: strict_int64,
    datetime: strict_datetime,
    object_id: strict_object_id,
    binary: strict_binary,
    regex: strict_regex,
    javascript: write_javascript,
    symbol: strict_symbol,
    timestamp: strict_timestamp,
    decimal128: strict_decimal128,
    min_key: strict_min_key,
    max_key: strict_max_key,
    db_pointer: strict_db_pointer,
};

// =============================================================================
// ESCAPING
// =============================================================================

/// Appends the JSON escape of `text`: quote, backslash and the short escapes
/// by name, every other control or non-ASCII character as `\uXXXX` with
/// surrogate pairs above the BMP.
pub(crate) fn write_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='\x7e' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
}

/// Appends `text` quoted and escaped.
pub(crate) fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    write_escaped(out, text);
    out.push('"');
}

// =============================================================================
// SHARED CONVERTERS
// =============================================================================

// The decimal point distinguishes a double from the integer types on the way
// back in, so whole doubles render as "2.0" rather than "2".
fn write_double(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let mut text = value.to_string();
        if !text.contains('.') && !text.contains('e') {
            text.push_str(".0");
        }
        out.push_str(&text);
    }
}

fn write_string(value: &str, out: &mut String) {
    write_quoted(out, value);
}

fn write_boolean(value: bool, out: &mut String) {
    out.push_str(if value { "true" } else { "false" });
}

fn write_null(out: &mut String) {
    out.push_str("null");
}

fn write_int32(value: i32, out: &mut String) {
    out.push_str(&value.to_string());
}

// Scope-free code is a leaf; the writer recurses for scoped code.
fn write_javascript(code: &str, out: &mut String) {
    out.push_str("{ \"$code\" : ");
    write_quoted(out, code);
    out.push_str(" }");
}

// =============================================================================
// SHELL CONVERTERS
// =============================================================================

fn shell_undefined(out: &mut String) {
    out.push_str("undefined");
}

fn shell_int64(value: i64, out: &mut String) {
    if i32::try_from(value).is_ok() {
        out.push_str(&format!("NumberLong({})", value));
    } else {
        // Shell number literals are doubles; quoting keeps the precision
        out.push_str(&format!("NumberLong(\"{}\")", value));
    }
}

fn shell_datetime(value: DateTime, out: &mut String) {
    match value.to_iso_string() {
        Some(iso) => out.push_str(&format!("ISODate(\"{}\")", iso)),
        None => out.push_str(&format!("new Date({})", value.millis())),
    }
}

fn shell_object_id(value: &ObjectId, out: &mut String) {
    out.push_str(&format!("ObjectId(\"{}\")", value.to_hex()));
}

fn shell_binary(value: &Binary, settings: &JsonWriterSettings, out: &mut String) {
    if value.subtype().is_uuid() {
        let representation = effective_representation(value, settings);
        if let Some(constructor) = uuid_constructor(representation) {
            if let Ok(uuid) = value.to_uuid_with_representation(representation) {
                out.push_str(&format!("{}(\"{}\")", constructor, uuid.hyphenated()));
                return;
            }
        }
        // Unresolvable byte order (or an undersized payload): hex keeps the
        // stored bytes visible instead of committing to a uuid reading
        out.push_str(&format!(
            "HexData({}, \"{}\")",
            value.subtype().to_u8(),
            dashed_hex(value.bytes())
        ));
        return;
    }
    out.push_str(&format!(
        "new BinData({}, \"{}\")",
        value.subtype().to_u8(),
        BASE64.encode(value.bytes())
    ));
}

fn shell_regex(value: &Regex, out: &mut String) {
    out.push('/');
    if value.pattern.is_empty() {
        // An empty pattern would collide with the // comment marker
        out.push_str("(?:)");
    } else {
        out.push_str(&value.pattern.replace('/', "\\/"));
    }
    out.push('/');
    out.push_str(&value.options);
}

fn shell_timestamp(value: Timestamp, out: &mut String) {
    out.push_str(&format!("Timestamp({}, {})", value.seconds, value.increment));
}

fn shell_decimal128(value: &Decimal128, out: &mut String) {
    out.push_str(&format!("NumberDecimal(\"{}\")", value));
}

fn shell_min_key(out: &mut String) {
    out.push_str("MinKey");
}

fn shell_max_key(out: &mut String) {
    out.push_str("MaxKey");
}

fn shell_db_pointer(value: &DbPointer, out: &mut String) {
    out.push_str("DBPointer(");
    write_quoted(out, &value.namespace);
    out.push_str(&format!(", ObjectId(\"{}\"))", value.id.to_hex()));
}

// =============================================================================
// STRICT CONVERTERS
// =============================================================================

fn strict_undefined(out: &mut String) {
    out.push_str("{ \"$undefined\" : true }");
}

fn strict_int64(value: i64, out: &mut String) {
    out.push_str(&value.to_string());
}

fn strict_datetime(value: DateTime, out: &mut String) {
    out.push_str(&format!("{{ \"$date\" : {} }}", value.millis()));
}

fn strict_object_id(value: &ObjectId, out: &mut String) {
    out.push_str(&format!("{{ \"$oid\" : \"{}\" }}", value.to_hex()));
}

fn strict_binary(value: &Binary, _settings: &JsonWriterSettings, out: &mut String) {
    out.push_str(&format!(
        "{{ \"$binary\" : \"{}\", \"$type\" : \"{:02x}\" }}",
        BASE64.encode(value.bytes()),
        value.subtype().to_u8()
    ));
}

fn strict_regex(value: &Regex, out: &mut String) {
    out.push_str("{ \"$regex\" : ");
    write_quoted(out, &value.pattern);
    out.push_str(", \"$options\" : ");
    write_quoted(out, &value.options);
    out.push_str(" }");
}

fn strict_symbol(value: &str, out: &mut String) {
    out.push_str("{ \"$symbol\" : ");
    write_quoted(out, value);
    out.push_str(" }");
}

fn strict_timestamp(value: Timestamp, out: &mut String) {
    out.push_str(&format!(
        "{{ \"$timestamp\" : {{ \"t\" : {}, \"i\" : {} }} }}",
        value.seconds, value.increment
    ));
}

fn strict_decimal128(value: &Decimal128, out: &mut String) {
    out.push_str(&format!("{{ \"$numberDecimal\" : \"{}\" }}", value));
}

fn strict_min_key(out: &mut String) {
    out.push_str("{ \"$minKey\" : 1 }");
}

fn strict_max_key(out: &mut String) {
    out.push_str("{ \"$maxKey\" : 1 }");
}

fn strict_db_pointer(value: &DbPointer, out: &mut String) {
    out.push_str("{ \"$dbPointer\" : { \"$ref\" : ");
    write_quoted(out, &value.namespace);
    out.push_str(&format!(
        ", \"$id\" : {{ \"$oid\" : \"{}\" }} }} }}",
        value.id.to_hex()
    ));
}

// =============================================================================
// UUID RESOLUTION
// =============================================================================

/// Resolves the representation a uuid-subtype value renders under: subtype
/// 0x04 is always Standard; subtype 0x03 takes the value's own tag, falling
/// back to the settings snapshot when that names a legacy order in V2 mode.
fn effective_representation(
    value: &Binary,
    settings: &JsonWriterSettings,
) -> UuidRepresentation {
    use crate::model::BinarySubtype;

    match value.subtype() {
        BinarySubtype::UuidStandard => UuidRepresentation::Standard,
        BinarySubtype::UuidLegacy => {
            if value.representation() != UuidRepresentation::Unspecified {
                value.representation()
            } else if settings.mode() == GuidRepresentationMode::V2 {
                match settings.guid_representation() {
                    rep @ (UuidRepresentation::CSharpLegacy
                    | UuidRepresentation::JavaLegacy
                    | UuidRepresentation::PythonLegacy) => rep,
                    _ => UuidRepresentation::Unspecified,
                }
            } else {
                UuidRepresentation::Unspecified
            }
        }
        _ => UuidRepresentation::Unspecified,
    }
}

fn uuid_constructor(representation: UuidRepresentation) -> Option<&'static str> {
    match representation {
        UuidRepresentation::Standard => Some("UUID"),
        UuidRepresentation::CSharpLegacy => Some("CSUUID"),
        UuidRepresentation::JavaLegacy => Some("JUUID"),
        UuidRepresentation::PythonLegacy => Some("PYUUID"),
        UuidRepresentation::Unspecified => None,
    }
}

/// Formats bytes as lowercase hex, dashed 8-4-4-4-12 for 16-byte payloads.
fn dashed_hex(bytes: &[u8]) -> String {
    let hex = hex::encode(bytes);
    if bytes.len() == 16 {
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    } else {
        hex
    }
}
