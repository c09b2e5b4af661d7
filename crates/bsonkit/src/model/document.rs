//! Ordered document container.
//!
//! Elements keep their insertion order, which is significant on the wire:
//! two documents with the same entries in different orders encode to
//! different bytes and compare unequal.

use crate::error::{ValueAccessError, ValueAccessResult};
use crate::model::binary::Binary;
use crate::model::datetime::DateTime;
use crate::model::decimal128::Decimal128;
use crate::model::oid::ObjectId;
use crate::model::value::{Array, ElementType, Regex, Timestamp, Value};

/// An ordered collection of named elements.
///
/// [`insert`](Document::insert) has map semantics: a repeated name replaces
/// the existing value in place. Decoding preserves whatever the wire holds,
/// including repeated names, so re-encoding reproduces the original bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Document {
        Document { entries: Vec::new() }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a value under a name, replacing (in place) any element that
    /// already uses it. Returns the replaced value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Appends an element without checking for an existing name.
    pub(crate) fn push(&mut self, key: String, value: Value) {
        self.entries.push((key, value));
    }

    /// Returns the first value stored under a name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Removes and returns the first value stored under a name.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let at = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(at).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over `(name, value)` pairs in element order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    fn access<'a, T>(
        &'a self,
        key: &str,
        expected: ElementType,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> ValueAccessResult<T> {
        let value = self.get(key).ok_or(ValueAccessError::NotPresent)?;
        extract(value).ok_or(ValueAccessError::UnexpectedType {
            expected,
            actual: value.element_type(),
        })
    }

    pub fn get_f64(&self, key: &str) -> ValueAccessResult<f64> {
        self.access(key, ElementType::Double, Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> ValueAccessResult<&str> {
        self.access(key, ElementType::String, Value::as_str)
    }

    pub fn get_document(&self, key: &str) -> ValueAccessResult<&Document> {
        self.access(key, ElementType::Document, Value::as_document)
    }

    pub fn get_array(&self, key: &str) -> ValueAccessResult<&Array> {
        self.access(key, ElementType::Array, Value::as_array)
    }

    pub fn get_binary(&self, key: &str) -> ValueAccessResult<&Binary> {
        self.access(key, ElementType::Binary, Value::as_binary)
    }

    pub fn get_object_id(&self, key: &str) -> ValueAccessResult<ObjectId> {
        self.access(key, ElementType::ObjectId, Value::as_object_id)
    }

    pub fn get_bool(&self, key: &str) -> ValueAccessResult<bool> {
        self.access(key, ElementType::Boolean, Value::as_bool)
    }

    pub fn get_datetime(&self, key: &str) -> ValueAccessResult<DateTime> {
        self.access(key, ElementType::DateTime, Value::as_datetime)
    }

    pub fn get_regex(&self, key: &str) -> ValueAccessResult<&Regex> {
        self.access(key, ElementType::Regex, Value::as_regex)
    }

    pub fn get_i32(&self, key: &str) -> ValueAccessResult<i32> {
        self.access(key, ElementType::Int32, Value::as_i32)
    }

    pub fn get_timestamp(&self, key: &str) -> ValueAccessResult<Timestamp> {
        self.access(key, ElementType::Timestamp, Value::as_timestamp)
    }

    pub fn get_i64(&self, key: &str) -> ValueAccessResult<i64> {
        self.access(key, ElementType::Int64, Value::as_i64)
    }

    pub fn get_decimal128(&self, key: &str) -> ValueAccessResult<Decimal128> {
        self.access(key, ElementType::Decimal128, Value::as_decimal128)
    }
}

/// Borrowing iterator over document elements.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, Value)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Document {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl std::fmt::Display for Document {
    /// Formats the document in the shell dialect.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::text::to_shell_string(self))
    }
}
