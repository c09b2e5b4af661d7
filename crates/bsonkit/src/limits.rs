//! Security limits for decoding untrusted input.
//!
//! Every allocation and recursion the decoder performs is bounded by one of
//! these limits. The defaults can be overridden per call through
//! [`BinaryReaderSettings`](crate::codec::BinaryReaderSettings),
//! [`BinaryWriterSettings`](crate::codec::BinaryWriterSettings) and
//! [`JsonWriterSettings`](crate::text::JsonWriterSettings).

/// Default maximum nesting depth for documents and arrays.
///
/// Applies to binary decode, binary encode and text parse. Exceeding it is a
/// hard error rather than a stack overflow.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default maximum size in bytes of a single root document.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Smallest possible document: 4-byte length prefix plus the 0x00 terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Payload length of a 128-bit identifier stored in a uuid binary subtype.
pub const UUID_PAYLOAD_LEN: usize = 16;

/// Payload length of an object id.
pub const OBJECT_ID_LEN: usize = 12;
