//! Serde serialization into the document model.
//!
//! [`to_bson`] and [`to_document`] turn any [`Serialize`] type into a
//! [`Value`] tree. Model types serialize themselves as their `$`-wrapper
//! documents, and the generic map serializer promotes those wrappers back
//! when a map closes, so special kinds survive a pass through serde intact.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::ser::{Serialize, SerializeMap};

use crate::doc;
use crate::error::EncodeError;
use crate::model::{
    Array, Binary, BinarySubtype, DateTime, DbPointer, Decimal128, Document, JavaScriptWithScope,
    ObjectId, Regex, Timestamp, Value,
};
use crate::text::from_extended_document;

impl serde::ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> EncodeError {
        EncodeError::Custom {
            message: msg.to_string(),
        }
    }
}

/// Serializes a value into a [`Value`] tree.
///
/// Unsigned integers that fit an int32 or int64 narrow accordingly; a `u64`
/// above `i64::MAX` fails with [`EncodeError::UnsignedOutOfRange`].
pub fn to_bson<T>(value: &T) -> Result<Value, EncodeError>
where
    T: Serialize + ?Sized,
{
    value.serialize(Serializer)
}

/// Serializes a value that represents a map or struct into a [`Document`].
pub fn to_document<T>(value: &T) -> Result<Document, EncodeError>
where
    T: Serialize + ?Sized,
{
    match to_bson(value)? {
        Value::Document(document) => Ok(document),
        other => Err(EncodeError::Custom {
            message: format!(
                "expected a document at the root, got {:?}",
                other.element_type()
            ),
        }),
    }
}

/// Serializer producing [`Value`] trees.
struct Serializer;

impl serde::Serializer for Serializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = ArraySerializer;
    type SerializeTuple = ArraySerializer;
    type SerializeTupleStruct = ArraySerializer;
    type SerializeTupleVariant = VariantArraySerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = MapSerializer;
    type SerializeStructVariant = VariantMapSerializer;

    fn serialize_bool(self, v: bool) -> Result<Value, EncodeError> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, EncodeError> {
        Ok(Value::Int32(v as i32))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, EncodeError> {
        Ok(Value::Int32(v as i32))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, EncodeError> {
        Ok(Value::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, EncodeError> {
        Ok(Value::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, EncodeError> {
        Ok(Value::Int32(v as i32))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, EncodeError> {
        Ok(Value::Int32(v as i32))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, EncodeError> {
        Ok(match i32::try_from(v) {
            Ok(v) => Value::Int32(v),
            Err(_) => Value::Int64(v as i64),
        })
    }

    fn serialize_u64(self, v: u64) -> Result<Value, EncodeError> {
        match i64::try_from(v) {
            Ok(v) => Ok(Value::Int64(v)),
            Err(_) => Err(EncodeError::UnsignedOutOfRange { value: v }),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value, EncodeError> {
        Ok(Value::Double(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, EncodeError> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, EncodeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, EncodeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, EncodeError> {
        Ok(Value::Binary(Binary::new(
            BinarySubtype::Generic,
            v.to_vec(),
        )))
    }

    fn serialize_none(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, EncodeError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Value::Document(doc! { variant => to_bson(value)? }))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ArraySerializer, EncodeError> {
        Ok(ArraySerializer {
            array: Array::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<ArraySerializer, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<ArraySerializer, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantArraySerializer, EncodeError> {
        Ok(VariantArraySerializer {
            variant,
            array: Array::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer, EncodeError> {
        Ok(MapSerializer {
            document: Document::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<MapSerializer, EncodeError> {
        self.serialize_map(None)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantMapSerializer, EncodeError> {
        Ok(VariantMapSerializer {
            variant,
            document: Document::new(),
        })
    }
}

struct ArraySerializer {
    array: Array,
}

impl serde::ser::SerializeSeq for ArraySerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.array.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.array))
    }
}

impl serde::ser::SerializeTuple for ArraySerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        serde::ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        serde::ser::SerializeSeq::end(self)
    }
}

impl serde::ser::SerializeTupleStruct for ArraySerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        serde::ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        serde::ser::SerializeSeq::end(self)
    }
}

struct VariantArraySerializer {
    variant: &'static str,
    array: Array,
}

impl serde::ser::SerializeTupleVariant for VariantArraySerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.array.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Document(
            doc! { self.variant => Value::Array(self.array) },
        ))
    }
}

struct MapSerializer {
    document: Document,
    pending_key: Option<String>,
}

// A closing map in a recognized `$`-wrapper form becomes the special kind
// it denotes. This is what lets the model types round-trip through serde.
fn finish_document(document: Document) -> Value {
    match from_extended_document(document) {
        Ok(value) => value,
        Err(document) => Value::Document(document),
    }
}

fn document_key<T>(key: &T) -> Result<String, EncodeError>
where
    T: Serialize + ?Sized,
{
    match key.serialize(Serializer)? {
        Value::String(key) => Ok(key),
        _ => Err(EncodeError::KeyMustBeString),
    }
}

impl serde::ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.pending_key = Some(document_key(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let key = match self.pending_key.take() {
            Some(key) => key,
            None => {
                return Err(EncodeError::Custom {
                    message: "map value serialized before its key".to_string(),
                })
            }
        };
        self.document.push(key, value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(finish_document(self.document))
    }
}

impl serde::ser::SerializeStruct for MapSerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.document
            .push(key.to_string(), value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(finish_document(self.document))
    }
}

struct VariantMapSerializer {
    variant: &'static str,
    document: Document,
}

impl serde::ser::SerializeStructVariant for VariantMapSerializer {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.document
            .push(key.to_string(), value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Document(
            doc! { self.variant => Value::Document(self.document) },
        ))
    }
}

// ===== SERIALIZE IMPLS FOR THE MODEL =====

fn wrapper_entry<S, T>(serializer: S, key: &'static str, value: &T) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Document(v) => v.serialize(serializer),
            Value::Array(v) => v.serialize(serializer),
            Value::Binary(v) => v.serialize(serializer),
            Value::Undefined => wrapper_entry(serializer, "$undefined", &true),
            Value::ObjectId(v) => v.serialize(serializer),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::DateTime(v) => v.serialize(serializer),
            Value::Null => serializer.serialize_unit(),
            Value::Regex(v) => v.serialize(serializer),
            Value::DbPointer(v) => v.serialize(serializer),
            Value::JavaScript(code) => wrapper_entry(serializer, "$code", code),
            Value::Symbol(symbol) => wrapper_entry(serializer, "$symbol", symbol),
            Value::JavaScriptWithScope(v) => v.serialize(serializer),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Timestamp(v) => v.serialize(serializer),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Decimal128(v) => v.serialize(serializer),
            Value::MinKey => wrapper_entry(serializer, "$minKey", &1i32),
            Value::MaxKey => wrapper_entry(serializer, "$maxKey", &1i32),
        }
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        wrapper_entry(serializer, "$oid", &self.to_hex())
    }
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        wrapper_entry(serializer, "$date", &self.millis())
    }
}

impl Serialize for Binary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("$binary", &BASE64.encode(self.bytes()))?;
        map.serialize_entry("$type", &format!("{:02x}", self.subtype().to_u8()))?;
        map.end()
    }
}

impl Serialize for Regex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("$regex", &self.pattern)?;
        map.serialize_entry("$options", &self.options)?;
        map.end()
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        wrapper_entry(
            serializer,
            "$timestamp",
            &doc! {
                "t" => self.seconds as i64,
                "i" => self.increment as i64,
            },
        )
    }
}

impl Serialize for Decimal128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        wrapper_entry(serializer, "$numberDecimal", &self.to_string())
    }
}

impl Serialize for JavaScriptWithScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("$code", &self.code)?;
        map.serialize_entry("$scope", &self.scope)?;
        map.end()
    }
}

impl Serialize for DbPointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        wrapper_entry(
            serializer,
            "$dbPointer",
            &doc! {
                "$ref" => self.namespace.clone(),
                "$id" => Value::ObjectId(self.id),
            },
        )
    }
}
