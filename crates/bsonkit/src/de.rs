//! Serde deserialization out of the document model.
//!
//! [`from_bson`] and [`from_document`] drive any [`Deserialize`] type from
//! a [`Value`] tree. Special kinds present themselves to visitors as their
//! `$`-wrapper documents, and [`Value`]'s own visitor promotes such maps
//! back, so the bridge is symmetric with [`to_bson`](crate::ser::to_bson).

use std::fmt;

use serde::de::{
    Deserialize, DeserializeOwned, DeserializeSeed, EnumAccess, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};

use crate::error::DecodeError;
use crate::model::{
    Binary, BinarySubtype, DateTime, DbPointer, Decimal128, Document, JavaScriptWithScope,
    ObjectId, Regex, Timestamp, Value,
};
use crate::text::{from_extended_document, to_extended_document};

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> DecodeError {
        DecodeError::Custom {
            message: msg.to_string(),
        }
    }
}

/// Deserializes a value out of a [`Value`] tree.
pub fn from_bson<T>(value: Value) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(value))
}

/// Deserializes a value out of a [`Document`].
pub fn from_document<T>(document: Document) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    from_bson(Value::Document(document))
}

/// Deserializer consuming a [`Value`] tree.
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Deserializer {
        Deserializer { value }
    }
}

fn visit_document<'de, V>(document: Document, visitor: V) -> Result<V::Value, DecodeError>
where
    V: Visitor<'de>,
{
    visitor.visit_map(DocumentAccess {
        iter: document.into_iter(),
        value: None,
    })
}

fn visit_array<'de, V>(array: Vec<Value>, visitor: V) -> Result<V::Value, DecodeError>
where
    V: Visitor<'de>,
{
    visitor.visit_seq(ArrayAccess {
        iter: array.into_iter(),
    })
}

impl<'de> serde::Deserializer<'de> for Deserializer {
    type Error = DecodeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Double(v) => visitor.visit_f64(v),
            Value::String(v) => visitor.visit_string(v),
            Value::Document(v) => visit_document(v, visitor),
            Value::Array(v) => visit_array(v, visitor),
            Value::Boolean(v) => visitor.visit_bool(v),
            Value::Null => visitor.visit_unit(),
            Value::Int32(v) => visitor.visit_i32(v),
            Value::Int64(v) => visitor.visit_i64(v),
            // Every remaining kind has a wrapper form
            other => match to_extended_document(&other) {
                Some(wrapper) => visit_document(wrapper, visitor),
                None => Err(DecodeError::Custom {
                    message: format!("cannot deserialize {:?}", other.element_type()),
                }),
            },
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null | Value::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        if let Value::Binary(binary) = self.value {
            visitor.visit_byte_buf(binary.into_bytes())
        } else {
            self.deserialize_any(visitor)
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Document(document) => {
                let mut iter = document.into_iter();
                let entry = iter.next();
                match (entry, iter.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    _ => Err(DecodeError::Custom {
                        message: "expected a single-entry document for an enum".to_string(),
                    }),
                }
            }
            other => Err(DecodeError::Custom {
                message: format!("cannot deserialize enum from {:?}", other.element_type()),
            }),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

struct DocumentAccess {
    iter: std::vec::IntoIter<(String, Value)>,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for DocumentAccess {
    type Error = DecodeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, DecodeError>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, DecodeError>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(DecodeError::Custom {
                message: "map value requested before its key".to_string(),
            }),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ArrayAccess {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = DecodeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, DecodeError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = DecodeError;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantDeserializer), DecodeError>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Deserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(DecodeError::Custom {
                message: "unexpected payload for unit variant".to_string(),
            }),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, DecodeError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(DecodeError::Custom {
                message: "missing payload for newtype variant".to_string(),
            }),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(array)) => visit_array(array, visitor),
            Some(other) => Err(DecodeError::Custom {
                message: format!(
                    "expected an array payload for tuple variant, got {:?}",
                    other.element_type()
                ),
            }),
            None => Err(DecodeError::Custom {
                message: "missing payload for tuple variant".to_string(),
            }),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::Document(document)) => visit_document(document, visitor),
            Some(other) => Err(DecodeError::Custom {
                message: format!(
                    "expected a document payload for struct variant, got {:?}",
                    other.element_type()
                ),
            }),
            None => Err(DecodeError::Custom {
                message: "missing payload for struct variant".to_string(),
            }),
        }
    }
}

// ===== DESERIALIZE IMPLS FOR THE MODEL =====

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any valid value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i8<E>(self, v: i8) -> Result<Value, E> {
        Ok(Value::Int32(v as i32))
    }

    fn visit_i16<E>(self, v: i16) -> Result<Value, E> {
        Ok(Value::Int32(v as i32))
    }

    fn visit_i32<E>(self, v: i32) -> Result<Value, E> {
        Ok(Value::Int32(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int64(v))
    }

    fn visit_u8<E>(self, v: u8) -> Result<Value, E> {
        Ok(Value::Int32(v as i32))
    }

    fn visit_u16<E>(self, v: u16) -> Result<Value, E> {
        Ok(Value::Int32(v as i32))
    }

    fn visit_u32<E>(self, v: u32) -> Result<Value, E> {
        Ok(match i32::try_from(v) {
            Ok(v) => Value::Int32(v),
            Err(_) => Value::Int64(v as i64),
        })
    }

    // Beyond i64::MAX there is no integer kind wide enough; precision loss
    // is accepted over failure here.
    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(v) => Value::Int64(v),
            Err(_) => Value::Double(v as f64),
        })
    }

    fn visit_f32<E>(self, v: f32) -> Result<Value, E> {
        Ok(Value::Double(v as f64))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_char<E>(self, v: char) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Binary(Binary::new(
            BinarySubtype::Generic,
            v.to_vec(),
        )))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Binary(Binary::new(BinarySubtype::Generic, v)))
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut array = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(value) = access.next_element()? {
            array.push(value);
        }
        Ok(Value::Array(array))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut document = Document::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            document.push(key, value);
        }
        Ok(match from_extended_document(document) {
            Ok(value) => value,
            Err(document) => Value::Document(document),
        })
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Document, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a document")
    }

    // The top level stays a document even in a wrapper shape; nested values
    // still promote through Value's visitor.
    fn visit_map<A>(self, mut access: A) -> Result<Document, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut document = Document::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            document.push(key, value);
        }
        Ok(document)
    }
}

fn kind_mismatch<E: serde::de::Error>(expected: &str, value: &Value) -> E {
    E::custom(format!(
        "expected {}, got {:?}",
        expected,
        value.element_type()
    ))
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<ObjectId, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::ObjectId(id) => Ok(id),
            other => Err(kind_mismatch("an object id", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<DateTime, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::DateTime(datetime) => Ok(datetime),
            // A bare millisecond count is accepted as well
            Value::Int64(millis) => Ok(DateTime::from_millis(millis)),
            Value::Int32(millis) => Ok(DateTime::from_millis(millis as i64)),
            other => Err(kind_mismatch("a datetime", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for Binary {
    fn deserialize<D>(deserializer: D) -> Result<Binary, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Binary(binary) => Ok(binary),
            other => Err(kind_mismatch("a binary value", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for Regex {
    fn deserialize<D>(deserializer: D) -> Result<Regex, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Regex(regex) => Ok(regex),
            other => Err(kind_mismatch("a regular expression", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Timestamp(timestamp) => Ok(timestamp),
            other => Err(kind_mismatch("a timestamp", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for Decimal128 {
    fn deserialize<D>(deserializer: D) -> Result<Decimal128, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Decimal128(decimal) => Ok(decimal),
            other => Err(kind_mismatch("a decimal128", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for JavaScriptWithScope {
    fn deserialize<D>(deserializer: D) -> Result<JavaScriptWithScope, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::JavaScriptWithScope(code) => Ok(code),
            other => Err(kind_mismatch("scoped javascript", &other)),
        }
    }
}

impl<'de> Deserialize<'de> for DbPointer {
    fn deserialize<D>(deserializer: D) -> Result<DbPointer, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::DbPointer(pointer) => Ok(pointer),
            other => Err(kind_mismatch("a db pointer", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::{to_bson, to_document};
    use crate::{array, doc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: ObjectId,
        label: String,
        seen: DateTime,
        attempts: Vec<i32>,
        note: Option<String>,
    }

    fn sample_record() -> Record {
        Record {
            id: ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap(),
            label: "alpha".to_string(),
            seen: DateTime::from_millis(1_710_513_000_123),
            attempts: vec![1, 2, 3],
            note: None,
        }
    }

    #[test]
    fn test_struct_roundtrip() {
        let record = sample_record();
        let document = to_document(&record).unwrap();
        assert_eq!(from_document::<Record>(document), Ok(sample_record()));
    }

    #[test]
    fn test_from_document_fields() {
        let record: Record = from_document(doc! {
            "id" => Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()),
            "label" => "alpha",
            "seen" => Value::DateTime(DateTime::from_millis(1_710_513_000_123)),
            "attempts" => array![1, 2, 3],
            "note" => "kept",
        })
        .unwrap();
        assert_eq!(record.note.as_deref(), Some("kept"));
        assert_eq!(record.attempts, [1, 2, 3]);
    }

    #[test]
    fn test_optional_fields() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Sparse {
            a: Option<i32>,
            b: Option<i32>,
            c: Option<i32>,
        }

        let sparse: Sparse = from_document(doc! {
            "a" => Value::Null,
            "b" => Value::Undefined,
            "c" => 3,
        })
        .unwrap();
        assert_eq!(
            sparse,
            Sparse {
                a: None,
                b: None,
                c: Some(3),
            }
        );
        // A missing optional field also reads as None
        let missing: Sparse = from_document(doc! { "c" => 3 }).unwrap();
        assert_eq!(missing.a, None);
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(from_bson::<i64>(Value::Int32(5)), Ok(5));
        assert_eq!(from_bson::<i32>(Value::Int64(5)), Ok(5));
        assert!(from_bson::<i32>(Value::Int64(i64::MAX)).is_err());
    }

    #[test]
    fn test_special_kinds_identity() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let specials = [
            Value::ObjectId(id),
            Value::DateTime(DateTime::from_millis(-5000)),
            Value::Binary(Binary::new(BinarySubtype::Md5, vec![1, 2, 3])),
            Value::Regex(Regex::new("^a", "i")),
            Value::JavaScript("f()".to_string()),
            Value::Symbol("sym".to_string()),
            Value::JavaScriptWithScope(JavaScriptWithScope {
                code: "g()".to_string(),
                scope: doc! { "x" => 1 },
            }),
            Value::Timestamp(Timestamp {
                seconds: 9,
                increment: 1,
            }),
            Value::Decimal128("1.5".parse().unwrap()),
            Value::DbPointer(DbPointer {
                namespace: "db.coll".to_string(),
                id,
            }),
            Value::Undefined,
            Value::MinKey,
            Value::MaxKey,
        ];
        for value in specials {
            // Undefined presents as its wrapper and reads back as itself
            assert_eq!(
                from_bson::<Value>(value.clone()),
                Ok(value.clone()),
                "identity lost for {:?}",
                value
            );
        }
    }

    #[test]
    fn test_typed_special_fields() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Blobby {
            blob: Binary,
            stamp: Timestamp,
            pattern: Regex,
            amount: Decimal128,
        }

        let blobby = Blobby {
            blob: Binary::new(BinarySubtype::Generic, vec![7, 8]),
            stamp: Timestamp {
                seconds: 1,
                increment: 2,
            },
            pattern: Regex::new("x+", ""),
            amount: "0.001".parse().unwrap(),
        };
        let document = to_document(&blobby).unwrap();
        assert_eq!(from_document::<Blobby>(document).unwrap(), blobby);
    }

    #[test]
    fn test_enum_roundtrip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        enum Shape {
            Unit,
            Newtype(i32),
            Tuple(i32, i32),
            Struct { x: i32 },
        }

        for shape in [
            Shape::Unit,
            Shape::Newtype(5),
            Shape::Tuple(1, 2),
            Shape::Struct { x: 3 },
        ] {
            let value = to_bson(&shape).unwrap();
            assert_eq!(from_bson::<Shape>(value), Ok(shape));
        }
    }

    #[test]
    fn test_document_root_stays_document() {
        let document = doc! { "$oid" => "507f1f77bcf86cd799439011" };
        assert_eq!(
            from_bson::<Document>(Value::Document(document.clone())),
            Ok(document)
        );
    }

    #[test]
    fn test_nested_wrapper_promotes() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let nested: Document = from_bson(Value::Document(doc! {
            "ref" => doc! { "$oid" => "507f1f77bcf86cd799439011" },
        }))
        .unwrap();
        assert_eq!(nested.get("ref"), Some(&Value::ObjectId(id)));
    }

    #[test]
    fn test_kind_mismatch_errors() {
        assert!(from_bson::<ObjectId>(Value::Int32(5)).is_err());
        assert!(from_bson::<Timestamp>(Value::String("nope".to_string())).is_err());
        assert!(matches!(
            from_bson::<ObjectId>(Value::Int32(5)),
            Err(DecodeError::Custom { .. })
        ));
    }
}
