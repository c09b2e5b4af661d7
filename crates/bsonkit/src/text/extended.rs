//! Recognition of the `$`-wrapper forms the strict dialect produces.
//!
//! Promotion is shared by the text parser, the serde bridge and the
//! `serde_json::Value` conversions, so every consumer accepts the same
//! forms. Recognition is lenient: a document that almost matches a wrapper
//! (wrong payload type, bad base64, out-of-range field) stays a plain
//! document instead of failing the caller.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::doc;
use crate::model::{
    Binary, BinarySubtype, DateTime, DbPointer, Decimal128, Document, JavaScriptWithScope,
    ObjectId, Regex, Timestamp, Value,
};

/// Converts a document in a recognized `$`-wrapper form into the value it
/// denotes, or returns the document unchanged.
pub(crate) fn from_extended_document(doc: Document) -> Result<Value, Document> {
    match try_promote(&doc) {
        Some(value) => Ok(value),
        None => Err(doc),
    }
}

/// Produces the `$`-wrapper document for a value with no plain JSON
/// representation, or `None` for the kinds that map directly.
pub(crate) fn to_extended_document(value: &Value) -> Option<Document> {
    let doc = match value {
        Value::Binary(binary) => doc! {
            "$binary" => BASE64.encode(binary.bytes()),
            "$type" => format!("{:02x}", binary.subtype().to_u8()),
        },
        Value::Undefined => doc! { "$undefined" => true },
        Value::ObjectId(id) => doc! { "$oid" => id.to_hex() },
        Value::DateTime(datetime) => doc! { "$date" => datetime.millis() },
        Value::Regex(regex) => doc! {
            "$regex" => regex.pattern.clone(),
            "$options" => regex.options.clone(),
        },
        Value::DbPointer(pointer) => doc! {
            "$dbPointer" => doc! {
                "$ref" => pointer.namespace.clone(),
                "$id" => Value::ObjectId(pointer.id),
            },
        },
        Value::JavaScript(code) => doc! { "$code" => code.clone() },
        Value::Symbol(symbol) => doc! { "$symbol" => symbol.clone() },
        Value::JavaScriptWithScope(code) => doc! {
            "$code" => code.code.clone(),
            "$scope" => code.scope.clone(),
        },
        Value::Timestamp(timestamp) => doc! {
            "$timestamp" => doc! {
                "t" => timestamp.seconds as i64,
                "i" => timestamp.increment as i64,
            },
        },
        Value::Decimal128(decimal) => doc! { "$numberDecimal" => decimal.to_string() },
        Value::MinKey => doc! { "$minKey" => 1 },
        Value::MaxKey => doc! { "$maxKey" => 1 },
        _ => return None,
    };
    Some(doc)
}

fn try_promote(doc: &Document) -> Option<Value> {
    match doc.len() {
        1 => {
            let (key, value) = doc.iter().next()?;
            promote_single(key, value)
        }
        2 => promote_pair(doc),
        _ => None,
    }
}

fn promote_single(key: &str, value: &Value) -> Option<Value> {
    match (key, value) {
        ("$oid", Value::String(hex)) => ObjectId::parse_str(hex).map(Value::ObjectId),
        ("$date", Value::Int32(ms)) => Some(Value::DateTime(DateTime::from_millis(*ms as i64))),
        ("$date", Value::Int64(ms)) => Some(Value::DateTime(DateTime::from_millis(*ms))),
        ("$date", Value::String(iso)) => DateTime::parse_iso(iso).ok().map(Value::DateTime),
        ("$symbol", Value::String(symbol)) => Some(Value::Symbol(symbol.clone())),
        ("$code", Value::String(code)) => Some(Value::JavaScript(code.clone())),
        ("$numberDecimal", Value::String(text)) => {
            text.parse::<Decimal128>().ok().map(Value::Decimal128)
        }
        ("$undefined", Value::Boolean(true)) => Some(Value::Undefined),
        ("$minKey", Value::Int32(1)) => Some(Value::MinKey),
        ("$maxKey", Value::Int32(1)) => Some(Value::MaxKey),
        ("$timestamp", Value::Document(inner)) => promote_timestamp(inner),
        ("$dbPointer", Value::Document(inner)) => promote_db_pointer(inner),
        _ => None,
    }
}

// Two-key wrappers match by name in either field order.
fn promote_pair(doc: &Document) -> Option<Value> {
    if let (Some(Value::String(encoded)), Some(Value::String(subtype))) =
        (doc.get("$binary"), doc.get("$type"))
    {
        return promote_binary(encoded, subtype);
    }
    if let (Some(Value::String(pattern)), Some(Value::String(options))) =
        (doc.get("$regex"), doc.get("$options"))
    {
        return Some(Value::Regex(Regex::new(pattern.clone(), options.clone())));
    }
    if let (Some(Value::String(code)), Some(Value::Document(scope))) =
        (doc.get("$code"), doc.get("$scope"))
    {
        return Some(Value::JavaScriptWithScope(JavaScriptWithScope {
            code: code.clone(),
            scope: scope.clone(),
        }));
    }
    None
}

fn promote_binary(encoded: &str, subtype: &str) -> Option<Value> {
    // A bare parse would also accept a sign
    if subtype.is_empty() || !subtype.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let subtype = u8::from_str_radix(subtype, 16).ok()?;
    let bytes = BASE64.decode(encoded).ok()?;
    Some(Value::Binary(Binary::new(
        BinarySubtype::from_u8(subtype),
        bytes,
    )))
}

fn promote_timestamp(inner: &Document) -> Option<Value> {
    if inner.len() != 2 {
        return None;
    }
    let seconds = unsigned_field(inner.get("t")?)?;
    let increment = unsigned_field(inner.get("i")?)?;
    Some(Value::Timestamp(Timestamp { seconds, increment }))
}

fn unsigned_field(value: &Value) -> Option<u32> {
    match value {
        Value::Int32(v) => u32::try_from(*v).ok(),
        Value::Int64(v) => u32::try_from(*v).ok(),
        _ => None,
    }
}

// The inner `{ "$oid" : … }` has already been promoted bottom-up by the
// caller, so `$id` arrives as an object id value.
fn promote_db_pointer(inner: &Document) -> Option<Value> {
    if inner.len() != 2 {
        return None;
    }
    let namespace = match inner.get("$ref")? {
        Value::String(namespace) => namespace.clone(),
        _ => return None,
    };
    let id = match inner.get("$id")? {
        Value::ObjectId(id) => *id,
        _ => return None,
    };
    Some(Value::DbPointer(DbPointer { namespace, id }))
}
