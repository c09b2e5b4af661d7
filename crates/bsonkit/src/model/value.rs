//! The value model: every type an element can carry.

use crate::model::binary::Binary;
use crate::model::datetime::DateTime;
use crate::model::decimal128::Decimal128;
use crate::model::document::Document;
use crate::model::oid::ObjectId;

/// An ordered list of values. Arrays serialize as documents whose keys are
/// the decimal indexes "0", "1", ..., regenerated on every encode.
pub type Array = Vec<Value>;

/// Element type tags as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    DbPointer = 0x0C,
    JavaScript = 0x0D,
    Symbol = 0x0E,
    JavaScriptWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl ElementType {
    /// Creates an ElementType from its wire tag.
    pub fn from_u8(v: u8) -> Option<ElementType> {
        match v {
            0x01 => Some(ElementType::Double),
            0x02 => Some(ElementType::String),
            0x03 => Some(ElementType::Document),
            0x04 => Some(ElementType::Array),
            0x05 => Some(ElementType::Binary),
            0x06 => Some(ElementType::Undefined),
            0x07 => Some(ElementType::ObjectId),
            0x08 => Some(ElementType::Boolean),
            0x09 => Some(ElementType::DateTime),
            0x0A => Some(ElementType::Null),
            0x0B => Some(ElementType::Regex),
            0x0C => Some(ElementType::DbPointer),
            0x0D => Some(ElementType::JavaScript),
            0x0E => Some(ElementType::Symbol),
            0x0F => Some(ElementType::JavaScriptWithScope),
            0x10 => Some(ElementType::Int32),
            0x11 => Some(ElementType::Timestamp),
            0x12 => Some(ElementType::Int64),
            0x13 => Some(ElementType::Decimal128),
            0x7F => Some(ElementType::MaxKey),
            0xFF => Some(ElementType::MinKey),
            _ => None,
        }
    }
}

/// An opaque internal timestamp: a seconds/increment pair packed into a
/// uint64 on the wire, with the increment in the low 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: u32,
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn from_u64(v: u64) -> Timestamp {
        Timestamp {
            seconds: (v >> 32) as u32,
            increment: v as u32,
        }
    }

    pub(crate) fn to_u64(self) -> u64 {
        (self.seconds as u64) << 32 | self.increment as u64
    }
}

/// A regular expression pattern with its option flags, both stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    pub pattern: String,
    pub options: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, options: impl Into<String>) -> Regex {
        Regex {
            pattern: pattern.into(),
            options: options.into(),
        }
    }
}

/// JavaScript code paired with the document of variables in scope.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptWithScope {
    pub code: String,
    pub scope: Document,
}

/// A deprecated namespace/id pair pointing at another document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

/// A single value of any element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit IEEE 754 binary float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Embedded document.
    Document(Document),
    /// Array, serialized with index keys.
    Array(Array),
    /// Binary payload with a subtype.
    Binary(Binary),
    /// Deprecated undefined value.
    Undefined,
    /// 12-byte object identifier.
    ObjectId(ObjectId),
    /// Boolean.
    Boolean(bool),
    /// UTC datetime in milliseconds since the Unix epoch.
    DateTime(DateTime),
    /// Null.
    Null,
    /// Regular expression.
    Regex(Regex),
    /// Deprecated database pointer.
    DbPointer(DbPointer),
    /// JavaScript code without scope.
    JavaScript(String),
    /// Deprecated symbol, stored like a string.
    Symbol(String),
    /// JavaScript code with a scope document.
    JavaScriptWithScope(JavaScriptWithScope),
    /// 32-bit signed integer.
    Int32(i32),
    /// Internal timestamp.
    Timestamp(Timestamp),
    /// 64-bit signed integer.
    Int64(i64),
    /// 128-bit decimal float.
    Decimal128(Decimal128),
    /// Greater than every other value.
    MaxKey,
    /// Less than every other value.
    MinKey,
}

impl Value {
    /// Returns the wire tag for this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Array(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Boolean(_) => ElementType::Boolean,
            Value::DateTime(_) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::Regex(_) => ElementType::Regex,
            Value::DbPointer(_) => ElementType::DbPointer,
            Value::JavaScript(_) => ElementType::JavaScript,
            Value::Symbol(_) => ElementType::Symbol,
            Value::JavaScriptWithScope(_) => ElementType::JavaScriptWithScope,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp(_) => ElementType::Timestamp,
            Value::Int64(_) => ElementType::Int64,
            Value::Decimal128(_) => ElementType::Decimal128,
            Value::MaxKey => ElementType::MaxKey,
            Value::MinKey => ElementType::MinKey,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_null(&self) -> Option<()> {
        match self {
            Value::Null => Some(()),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Value::Regex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_javascript(&self) -> Option<&str> {
        match self {
            Value::JavaScript(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match self {
            Value::Decimal128(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    /// Formats the value as a shell-dialect JSON fragment.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::text::value_to_shell_string(self))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Double(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Value {
        Value::ObjectId(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<Decimal128> for Value {
    fn from(v: Decimal128) -> Value {
        Value::Decimal128(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Value {
        Value::Binary(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Value {
        Value::Regex(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Value {
        Value::Timestamp(v)
    }
}

impl From<JavaScriptWithScope> for Value {
    fn from(v: JavaScriptWithScope) -> Value {
        Value::JavaScriptWithScope(v)
    }
}

impl From<DbPointer> for Value {
    fn from(v: DbPointer) -> Value {
        Value::DbPointer(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Value {
        Value::Document(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Value {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    /// Converts plain JSON into the value model, promoting recognized
    /// `$`-wrapper objects into their special kinds. Numbers narrow to
    /// int32 when they fit, then int64; a u64 beyond `i64::MAX` keeps its
    /// magnitude as a double at the cost of precision.
    fn from(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Boolean(v),
            serde_json::Value::Number(number) => {
                if let Some(v) = number.as_i64() {
                    match i32::try_from(v) {
                        Ok(v) => Value::Int32(v),
                        Err(_) => Value::Int64(v),
                    }
                } else if let Some(v) = number.as_u64() {
                    // Only reached above i64::MAX
                    Value::Double(v as f64)
                } else {
                    Value::Double(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(v) => Value::String(v),
            serde_json::Value::Array(entries) => {
                Value::Array(entries.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => {
                let mut document = Document::new();
                for (key, value) in entries {
                    document.push(key, Value::from(value));
                }
                match crate::text::from_extended_document(document) {
                    Ok(value) => value,
                    Err(document) => Value::Document(document),
                }
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    /// Converts into plain JSON. Special kinds become their `$`-wrapper
    /// objects; a non-finite double has no JSON number form and becomes
    /// null.
    fn from(value: Value) -> serde_json::Value {
        match value {
            Value::Double(v) => serde_json::Number::from_f64(v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(v) => serde_json::Value::String(v),
            Value::Document(document) => serde_json::Value::Object(
                document
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
            Value::Array(entries) => serde_json::Value::Array(
                entries.into_iter().map(serde_json::Value::from).collect(),
            ),
            Value::Boolean(v) => serde_json::Value::Bool(v),
            Value::Null => serde_json::Value::Null,
            Value::Int32(v) => serde_json::Value::Number(v.into()),
            Value::Int64(v) => serde_json::Value::Number(v.into()),
            other => match crate::text::to_extended_document(&other) {
                Some(wrapper) => serde_json::Value::from(Value::Document(wrapper)),
                // Every remaining kind has a wrapper form
                None => serde_json::Value::Null,
            },
        }
    }
}
