//! Structural writer for the textual dialects.
//!
//! The writer walks documents and arrays and hands every leaf to the
//! converter set; layout (braces, separators, indentation, name quoting) is
//! decided here and is identical for both dialects.

use crate::model::{Document, JavaScriptWithScope, Value};
use crate::text::convert::{self, JsonConverters, SHELL, STRICT};
use crate::text::settings::{JsonOutputMode, JsonWriterSettings};

/// Renders a document with the given converter set and settings.
pub fn write_text(
    document: &Document,
    converters: &JsonConverters,
    settings: &JsonWriterSettings,
) -> String {
    let mut out = String::new();
    write_document(&mut out, document, converters, settings, 0);
    out
}

/// Renders a document in the compact shell dialect.
pub fn to_shell_string(document: &Document) -> String {
    write_text(document, &SHELL, &JsonWriterSettings::shell())
}

/// Renders a document in the compact strict dialect.
pub fn to_strict_string(document: &Document) -> String {
    write_text(document, &STRICT, &JsonWriterSettings::strict())
}

/// Renders a single value in the compact shell dialect. Backs the `Display`
/// impls on [`Value`] and [`Document`].
pub(crate) fn value_to_shell_string(value: &Value) -> String {
    let settings = JsonWriterSettings::shell();
    let mut out = String::new();
    write_value(&mut out, value, &SHELL, &settings, 0);
    out
}

fn write_document(
    out: &mut String,
    document: &Document,
    converters: &JsonConverters,
    settings: &JsonWriterSettings,
    depth: usize,
) {
    if document.is_empty() {
        out.push_str("{ }");
        return;
    }
    out.push('{');
    let mut first = true;
    for (name, value) in document.iter() {
        if !first {
            out.push(',');
        }
        first = false;
        begin_element(out, settings, depth);
        write_name(out, name, settings);
        out.push_str(" : ");
        write_value(out, value, converters, settings, depth + 1);
    }
    end_document(out, settings, depth);
}

// Arrays stay on one line in both layouts.
fn write_array(
    out: &mut String,
    values: &[Value],
    converters: &JsonConverters,
    settings: &JsonWriterSettings,
    depth: usize,
) {
    out.push('[');
    let mut first = true;
    for value in values {
        if !first {
            out.push_str(", ");
        }
        first = false;
        write_value(out, value, converters, settings, depth + 1);
    }
    out.push(']');
}

fn write_value(
    out: &mut String,
    value: &Value,
    converters: &JsonConverters,
    settings: &JsonWriterSettings,
    depth: usize,
) {
    match value {
        Value::Double(v) => (converters.double)(*v, out),
        Value::String(v) => (converters.string)(v, out),
        Value::Document(v) => write_document(out, v, converters, settings, depth),
        Value::Array(v) => write_array(out, v, converters, settings, depth),
        Value::Binary(v) => (converters.binary)(v, settings, out),
        Value::Undefined => (converters.undefined)(out),
        Value::ObjectId(v) => (converters.object_id)(v, out),
        Value::Boolean(v) => (converters.boolean)(*v, out),
        Value::DateTime(v) => (converters.datetime)(*v, out),
        Value::Null => (converters.null)(out),
        Value::Regex(v) => (converters.regex)(v, out),
        Value::DbPointer(v) => (converters.db_pointer)(v, out),
        Value::JavaScript(v) => (converters.javascript)(v, out),
        Value::Symbol(v) => (converters.symbol)(v, out),
        Value::JavaScriptWithScope(v) => {
            write_code_with_scope(out, v, converters, settings, depth)
        }
        Value::Int32(v) => (converters.int32)(*v, out),
        Value::Timestamp(v) => (converters.timestamp)(*v, out),
        Value::Int64(v) => (converters.int64)(*v, out),
        Value::Decimal128(v) => (converters.decimal128)(v, out),
        Value::MaxKey => (converters.max_key)(out),
        Value::MinKey => (converters.min_key)(out),
    }
}

// Scoped code renders as a two-element document so the scope participates in
// indentation like any embedded document.
fn write_code_with_scope(
    out: &mut String,
    value: &JavaScriptWithScope,
    converters: &JsonConverters,
    settings: &JsonWriterSettings,
    depth: usize,
) {
    out.push('{');
    begin_element(out, settings, depth);
    write_name(out, "$code", settings);
    out.push_str(" : ");
    (converters.string)(&value.code, out);
    out.push(',');
    begin_element(out, settings, depth);
    write_name(out, "$scope", settings);
    out.push_str(" : ");
    write_document(out, &value.scope, converters, settings, depth + 1);
    end_document(out, settings, depth);
}

fn write_name(out: &mut String, name: &str, settings: &JsonWriterSettings) {
    let bare = settings.output_mode() == JsonOutputMode::Shell
        && !settings.always_quote_names()
        && is_plain_identifier(name);
    if bare {
        out.push_str(name);
    } else {
        convert::write_quoted(out, name);
    }
}

// The shell accepts a name without quotes when it is a plain JS identifier.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn begin_element(out: &mut String, settings: &JsonWriterSettings, depth: usize) {
    if settings.indent() {
        out.push_str(settings.newline_chars());
        for _ in 0..=depth {
            out.push_str(settings.indent_chars());
        }
    } else {
        out.push(' ');
    }
}

fn end_document(out: &mut String, settings: &JsonWriterSettings, depth: usize) {
    if settings.indent() {
        out.push_str(settings.newline_chars());
        for _ in 0..depth {
            out.push_str(settings.indent_chars());
        }
        out.push('}');
    } else {
        out.push_str(" }");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::{GuidRepresentationMode, UuidRepresentation};
    use crate::model::{Binary, BinarySubtype, DateTime, ObjectId, Regex, Timestamp};
    use crate::{array, doc};

    #[test]
    fn test_compact_shell_layout() {
        let doc = doc! {
            "x" => 1,
            "y" => "hello",
            "z" => 2.5,
        };
        assert_eq!(
            to_shell_string(&doc),
            "{ \"x\" : 1, \"y\" : \"hello\", \"z\" : 2.5 }"
        );
    }

    #[test]
    fn test_empty_document_and_array() {
        assert_eq!(to_shell_string(&Document::new()), "{ }");
        assert_eq!(to_strict_string(&Document::new()), "{ }");
        let doc = doc! { "a" => array![] };
        assert_eq!(to_shell_string(&doc), "{ \"a\" : [] }");
    }

    #[test]
    fn test_nested_structures() {
        let doc = doc! {
            "outer" => doc! { "inner" => array![1, 2] },
            "list" => array![doc! { "k" => true }, Value::Null],
        };
        assert_eq!(
            to_shell_string(&doc),
            "{ \"outer\" : { \"inner\" : [1, 2] }, \"list\" : [{ \"k\" : true }, null] }"
        );
    }

    #[test]
    fn test_shell_and_strict_diverge_on_special_types() {
        let doc = doc! {
            "id" => ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap(),
            "n" => 5i64,
        };
        assert_eq!(
            to_shell_string(&doc),
            "{ \"id\" : ObjectId(\"507f1f77bcf86cd799439011\"), \"n\" : NumberLong(5) }"
        );
        assert_eq!(
            to_strict_string(&doc),
            "{ \"id\" : { \"$oid\" : \"507f1f77bcf86cd799439011\" }, \"n\" : 5 }"
        );
    }

    #[test]
    fn test_bare_names_in_shell_mode_only() {
        let doc = doc! {
            "plain" => 1,
            "$dollar" => 2,
            "needs quoting" => 3,
            "0leading" => 4,
        };

        let mut settings = JsonWriterSettings::shell();
        settings.set_always_quote_names(false).unwrap();
        assert_eq!(
            write_text(&doc, &SHELL, &settings),
            "{ plain : 1, $dollar : 2, \"needs quoting\" : 3, \"0leading\" : 4 }"
        );

        // Strict quotes regardless of the flag
        let mut settings = JsonWriterSettings::strict();
        settings.set_always_quote_names(false).unwrap();
        assert_eq!(
            write_text(&doc, &STRICT, &settings),
            "{ \"plain\" : 1, \"$dollar\" : 2, \"needs quoting\" : 3, \"0leading\" : 4 }"
        );
    }

    #[test]
    fn test_name_escaping() {
        let doc = doc! { "a\"b" => 1 };
        assert_eq!(to_shell_string(&doc), "{ \"a\\\"b\" : 1 }");
    }

    #[test]
    fn test_indent_layout() {
        let doc = doc! {
            "a" => 1,
            "b" => doc! { "c" => 2 },
            "d" => array![3, 4],
        };
        let mut settings = JsonWriterSettings::shell();
        settings.set_indent(true).unwrap();
        assert_eq!(
            write_text(&doc, &SHELL, &settings),
            "{\n  \"a\" : 1,\n  \"b\" : {\n    \"c\" : 2\n  },\n  \"d\" : [3, 4]\n}"
        );
    }

    #[test]
    fn test_indent_custom_chars() {
        let doc = doc! { "a" => 1 };
        let mut settings = JsonWriterSettings::shell();
        settings.set_indent(true).unwrap();
        settings.set_indent_chars("\t").unwrap();
        settings.set_newline_chars("\r\n").unwrap();
        assert_eq!(
            write_text(&doc, &SHELL, &settings),
            "{\r\n\t\"a\" : 1\r\n}"
        );
    }

    #[test]
    fn test_code_with_scope_layout() {
        let doc = doc! {
            "f" => JavaScriptWithScope {
                code: "x".to_string(),
                scope: doc! { "x" => 1 },
            },
        };
        assert_eq!(
            to_shell_string(&doc),
            "{ \"f\" : { \"$code\" : \"x\", \"$scope\" : { \"x\" : 1 } } }"
        );
        assert_eq!(
            to_strict_string(&doc),
            "{ \"f\" : { \"$code\" : \"x\", \"$scope\" : { \"x\" : 1 } } }"
        );
    }

    #[test]
    fn test_uuid_value_renders_under_writer_snapshot() {
        let bytes = vec![
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF,
        ];
        let doc = doc! { "u" => Binary::new(BinarySubtype::UuidLegacy, bytes) };
        let settings = JsonWriterSettings::with_mode(
            JsonOutputMode::Shell,
            GuidRepresentationMode::V2,
            UuidRepresentation::JavaLegacy,
        );
        assert_eq!(
            write_text(&doc, &SHELL, &settings),
            "{ \"u\" : JUUID(\"77665544-3322-1100-ffee-ddccbbaa9988\") }"
        );
    }

    #[test]
    fn test_display_uses_compact_shell() {
        let doc = doc! {
            "ts" => Timestamp { seconds: 10, increment: 1 },
            "re" => Regex::new("a+", "i"),
            "when" => DateTime::from_millis(0),
        };
        assert_eq!(
            doc.to_string(),
            "{ \"ts\" : Timestamp(10, 1), \"re\" : /a+/i, \
             \"when\" : ISODate(\"1970-01-01T00:00:00Z\") }"
        );
        assert_eq!(Value::Int32(7).to_string(), "7");
        assert_eq!(
            Value::Array(vec![Value::Boolean(false)]).to_string(),
            "[false]"
        );
    }
}
