//! Error types for binary encoding/decoding, text parsing and configuration.

use thiserror::Error;

use crate::guid::UuidRepresentation;
use crate::model::{BinarySubtype, ElementType};

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unrecognized element type 0x{tag:02x} at offset {offset}")]
    InvalidElementType { tag: u8, offset: usize },

    #[error("invalid {field} length {len} at offset {offset}")]
    InvalidLength {
        field: &'static str,
        len: i64,
        offset: usize,
    },

    #[error("{field} declared {declared} bytes but {actual} were consumed")]
    LengthMismatch {
        field: &'static str,
        declared: usize,
        actual: usize,
    },

    #[error("missing NUL terminator for {context}")]
    MissingTerminator { context: &'static str },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("nesting depth exceeds maximum {max}")]
    NestingDepthExceeded { max: usize },

    #[error("document size {size} exceeds maximum {max}")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("{remaining} trailing bytes after document end")]
    TrailingBytes { remaining: usize },

    #[error("invalid bool value 0x{value:02x} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("old binary inner length {inner} does not match outer length {outer}")]
    OldBinaryLength { outer: i64, inner: i64 },

    #[error("{message}")]
    Custom { message: String },
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Guid(#[from] GuidError),

    #[error("value representation {value:?} conflicts with writer representation {writer:?}")]
    GuidRepresentationMismatch {
        value: UuidRepresentation,
        writer: UuidRepresentation,
    },

    #[error("{context} contains an interior NUL byte")]
    InteriorNul { context: &'static str },

    #[error("document size {size} exceeds maximum {max}")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("nesting depth exceeds maximum {max}")]
    NestingDepthExceeded { max: usize },

    #[error("document keys must be strings")]
    KeyMustBeString,

    #[error("unsigned integer {value} does not fit in an int64")]
    UnsignedOutOfRange { value: u64 },

    #[error("{message}")]
    Custom { message: String },
}

/// Error during text parsing. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character {found:?} at offset {pos}")]
    UnexpectedCharacter { found: char, pos: usize },

    #[error("expected {expected} but found {found} at offset {pos}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: usize,
    },

    #[error("unexpected end of input at offset {pos}")]
    UnexpectedEnd { pos: usize },

    #[error("unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid escape sequence at offset {pos}")]
    InvalidEscape { pos: usize },

    #[error("invalid number literal {literal:?} at offset {pos}")]
    InvalidNumber { literal: String, pos: usize },

    #[error("malformed {kind} literal {literal:?} at offset {pos}")]
    InvalidLiteral {
        kind: &'static str,
        literal: String,
        pos: usize,
    },

    #[error("unknown constructor {name:?} at offset {pos}")]
    UnknownConstructor { name: String, pos: usize },

    #[error("nesting depth exceeds maximum {max} at offset {pos}")]
    NestingDepthExceeded { max: usize, pos: usize },

    #[error("trailing characters after document end at offset {pos}")]
    TrailingCharacters { pos: usize },
}

/// Error raised when mutating settings that have been frozen, or when a
/// setting value is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cannot modify frozen {target}")]
    Frozen { target: &'static str },

    #[error("{name} must be greater than zero")]
    InvalidValue { name: &'static str },
}

/// Error from 128-bit identifier byte-order resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidError {
    #[error("representation must be specified for uuid byte-order conversion")]
    UnspecifiedRepresentation,

    #[error("binary subtype {subtype:?} conflicts with representation {representation:?}")]
    RepresentationMismatch {
        subtype: BinarySubtype,
        representation: UuidRepresentation,
    },

    #[error("uuid payload must be 16 bytes, found {len}")]
    InvalidLength { len: usize },
}

/// Error from typed [`Document`](crate::Document) accessors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueAccessError {
    #[error("no value found for key")]
    NotPresent,

    #[error("expected {expected:?} but found {actual:?}")]
    UnexpectedType {
        expected: ElementType,
        actual: ElementType,
    },
}

/// Result alias for typed [`Document`](crate::Document) accessors.
pub type ValueAccessResult<T> = Result<T, ValueAccessError>;
