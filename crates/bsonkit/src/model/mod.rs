//! Data model types.
//!
//! This module contains the in-memory representation of documents:
//! - Values (one variant per element type)
//! - Documents (ordered name/value containers)
//! - Scalar types with structure of their own (object ids, binary payloads,
//!   datetimes, decimal128)

pub mod binary;
pub mod datetime;
pub mod decimal128;
pub mod document;
pub mod oid;
pub mod value;

pub use binary::{Binary, BinarySubtype};
pub use datetime::DateTime;
pub use decimal128::{Decimal128, Decimal128ParseError};
pub use document::{Document, Iter};
pub use oid::ObjectId;
pub use value::{
    Array, DbPointer, ElementType, JavaScriptWithScope, Regex, Timestamp, Value,
};
