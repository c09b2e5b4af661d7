//! Textual dialects for documents.
//!
//! Two output dialects share one writer:
//!
//! * **Shell**, the default: values render the way an interactive shell
//!   prints them (`ObjectId("…")`, `ISODate("…")`, `/pattern/options`),
//!   readable but not plain JSON.
//! * **Strict**: every special kind renders as a `$`-wrapper document
//!   (`{ "$oid" : "…" }`), so the output parses as ordinary JSON.
//!
//! [`parse_text`] accepts both dialects, including mixtures, and promotes
//! recognized `$`-wrappers back to their value kinds as documents close.
//! Layout is governed by [`JsonWriterSettings`]; per-kind rendering can be
//! swapped out through a [`JsonConverters`] table.
//!
//! ```
//! use bsonkit::{doc, parse_text, to_shell_string};
//!
//! let document = doc! { "status" => "ok", "count" => 3 };
//! let text = to_shell_string(&document);
//! assert_eq!(text, r#"{ "status" : "ok", "count" : 3 }"#);
//! assert_eq!(parse_text(&text)?, document);
//! # Ok::<(), bsonkit::ParseError>(())
//! ```

mod convert;
mod extended;
mod parser;
mod scanner;
mod settings;
mod writer;

pub use convert::{JsonConverters, SHELL, STRICT};
pub use parser::parse_text;
pub use settings::{JsonOutputMode, JsonWriterSettings};
pub use writer::{to_shell_string, to_strict_string, write_text};

pub(crate) use extended::{from_extended_document, to_extended_document};
pub(crate) use writer::value_to_shell_string;
