//! Binary encoding/decoding.
//!
//! This module implements the binary document wire format: primitive
//! little-endian layouts, element dispatch, document framing, and the
//! reader/writer settings objects.

pub mod document;
pub mod element;
pub mod raw;
pub mod settings;

pub use document::{
    decode_document, decode_document_with_settings, encode_document,
    encode_document_with_settings,
};
pub use raw::{Reader, Writer};
pub use settings::{BinaryReaderSettings, BinaryWriterSettings};
