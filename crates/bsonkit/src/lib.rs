//! Binary document codec with shell and strict JSON text dialects.
//!
//! This crate implements a length-prefixed binary document format together
//! with the two textual dialects commonly used to display and re-enter such
//! documents, plus a serde bridge into Rust types.
//!
//! # Overview
//!
//! - **Byte-exact binary codec**: documents encode to and decode from the
//!   little-endian wire layout, preserving element order and duplicate
//!   names.
//! - **Two text dialects**: shell output (`ObjectId("…")`, `ISODate("…")`)
//!   reads well for humans; strict output (`{ "$oid" : "…" }`) stays plain
//!   JSON. One parser accepts both, and mixtures.
//! - **Explicit uuid byte orders**: the historical uuid byte orders are
//!   first-class, so binary uuid fields round-trip across ecosystems that
//!   disagree about them.
//!
//! # Quick Start
//!
//! ```rust
//! use bsonkit::{doc, decode_document, encode_document, to_shell_string};
//!
//! let document = doc! {
//!     "x" => 1,
//!     "y" => "hello",
//! };
//!
//! // Encode to the binary wire format
//! let bytes = encode_document(&document).unwrap();
//! assert_eq!(bytes.len(), 25);
//!
//! // Decode back
//! let decoded = decode_document(&bytes).unwrap();
//! assert_eq!(decoded, document);
//!
//! // Render as shell-dialect text
//! assert_eq!(to_shell_string(&document), r#"{ "x" : 1, "y" : "hello" }"#);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (Document, Value, ObjectId, Decimal128)
//! - [`codec`]: Binary encoding/decoding with reader/writer settings
//! - [`text`]: Shell/strict writers and the text parser
//! - [`guid`]: Uuid byte-order representations and the legacy globals
//! - [`ser`] / [`de`]: Serde bridge over the value model
//! - [`error`]: Error types
//! - [`limits`]: Security limits for decoding
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Every declared length is validated against the remaining buffer
//! - Nesting depth and total document size are capped by settings
//! - Invalid data is rejected with descriptive errors

mod macros;

pub mod codec;
pub mod de;
pub mod error;
pub mod guid;
pub mod limits;
pub mod model;
pub mod ser;
pub mod text;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{
    decode_document, decode_document_with_settings, encode_document,
    encode_document_with_settings, BinaryReaderSettings, BinaryWriterSettings,
};
pub use de::{from_bson, from_document, Deserializer};
pub use error::{
    ConfigError, DecodeError, EncodeError, GuidError, ParseError, ValueAccessError,
    ValueAccessResult,
};
pub use guid::{guid_from_bytes, guid_to_bytes, GuidRepresentationMode, UuidRepresentation};
pub use model::{
    Array, Binary, BinarySubtype, DateTime, DbPointer, Decimal128, Decimal128ParseError, Document,
    ElementType, Iter, JavaScriptWithScope, ObjectId, Regex, Timestamp, Value,
};
pub use ser::{to_bson, to_document};
pub use text::{
    parse_text, to_shell_string, to_strict_string, write_text, JsonConverters, JsonOutputMode,
    JsonWriterSettings, SHELL, STRICT,
};
pub use util::DateTimeParseError;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire format version this crate implements.
pub const FORMAT_VERSION: &str = "1.1";
