//! Recursive-descent parser covering both textual dialects.
//!
//! A single grammar accepts strict output, shell output and hand-written
//! mixtures of the two: `$`-wrapper documents are promoted bottom-up as
//! they close, and shell constructor calls are dispatched through a name
//! table. Nesting depth is capped the same way the binary decoder caps it.

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::ParseError;
use crate::guid::UuidRepresentation;
use crate::limits::DEFAULT_MAX_DEPTH;
use crate::model::{
    Binary, BinarySubtype, DateTime, DbPointer, Decimal128, Document, ObjectId, Regex, Timestamp,
    Value,
};
use crate::text::extended::from_extended_document;
use crate::text::scanner::{Scanner, SpannedToken, Token};

/// Parses a textual document in either dialect.
///
/// The whole input must be consumed; anything after the closing brace is
/// reported as [`ParseError::TrailingCharacters`].
pub fn parse_text(input: &str) -> Result<Document, ParseError> {
    let mut parser = Parser {
        scanner: Scanner::new(input),
    };
    let first = parser.scanner.next_token()?;
    let document = match first.token {
        Token::LeftBrace => parser.parse_document_body(0, first.pos)?,
        _ => return Err(unexpected("'{'", &first)),
    };
    let trailing = parser.scanner.next_token()?;
    if trailing.token != Token::EndOfInput {
        return Err(ParseError::TrailingCharacters { pos: trailing.pos });
    }
    Ok(document)
}

struct Parser<'a> {
    scanner: Scanner<'a>,
}

type ConstructorFn = fn(&mut Parser<'_>) -> Result<Value, ParseError>;

lazy_static! {
    // "Date" is absent on purpose: it constructs only behind `new`, and an
    // unprefixed call falls through to UnknownConstructor.
    static ref CONSTRUCTORS: FxHashMap<&'static str, ConstructorFn> = {
        let mut table: FxHashMap<&'static str, ConstructorFn> = FxHashMap::default();
        table.insert("ObjectId", object_id_constructor as ConstructorFn);
        table.insert("ISODate", iso_date_constructor);
        table.insert("NumberInt", number_int_constructor);
        table.insert("NumberLong", number_long_constructor);
        table.insert("NumberDecimal", number_decimal_constructor);
        table.insert("Timestamp", timestamp_constructor);
        table.insert("BinData", bin_data_constructor);
        table.insert("HexData", hex_data_constructor);
        table.insert("UUID", standard_uuid_constructor);
        table.insert("CSUUID", csharp_uuid_constructor);
        table.insert("JUUID", java_uuid_constructor);
        table.insert("PYUUID", python_uuid_constructor);
        table.insert("RegExp", reg_exp_constructor);
        table.insert("DBPointer", db_pointer_constructor);
        table
    };
}

impl Parser<'_> {
    // `depth` counts enclosing bodies exactly like the binary decoder: the
    // root body runs at zero and every nested document or array adds one.
    fn parse_document_body(
        &mut self,
        depth: usize,
        open_pos: usize,
    ) -> Result<Document, ParseError> {
        if depth > DEFAULT_MAX_DEPTH {
            return Err(ParseError::NestingDepthExceeded {
                max: DEFAULT_MAX_DEPTH,
                pos: open_pos,
            });
        }
        let mut document = Document::new();
        let mut first = true;
        loop {
            let spanned = self.scanner.next_token()?;
            let name = match spanned.token {
                Token::RightBrace if first => return Ok(document),
                Token::String(name) | Token::Word(name) => name,
                _ => {
                    let expected = if first { "element name or '}'" } else { "element name" };
                    return Err(unexpected(expected, &spanned));
                }
            };
            first = false;
            self.expect(Token::Colon, "':'")?;
            let value = self.parse_value(depth)?;
            // Duplicate names survive, as they do on the binary path
            document.push(name, value);
            let next = self.scanner.next_token()?;
            match next.token {
                Token::Comma => {}
                Token::RightBrace => return Ok(document),
                _ => return Err(unexpected("',' or '}'", &next)),
            }
        }
    }

    fn parse_array_body(&mut self, depth: usize, open_pos: usize) -> Result<Vec<Value>, ParseError> {
        if depth > DEFAULT_MAX_DEPTH {
            return Err(ParseError::NestingDepthExceeded {
                max: DEFAULT_MAX_DEPTH,
                pos: open_pos,
            });
        }
        let mut array = Vec::new();
        let spanned = self.scanner.next_token()?;
        if spanned.token == Token::RightBracket {
            return Ok(array);
        }
        self.scanner.put_back(spanned);
        loop {
            array.push(self.parse_value(depth)?);
            let next = self.scanner.next_token()?;
            match next.token {
                Token::Comma => {}
                Token::RightBracket => return Ok(array),
                _ => return Err(unexpected("',' or ']'", &next)),
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseError> {
        let spanned = self.scanner.next_token()?;
        match spanned.token {
            Token::LeftBrace => {
                let body = self.parse_document_body(depth + 1, spanned.pos)?;
                Ok(match from_extended_document(body) {
                    Ok(value) => value,
                    Err(body) => Value::Document(body),
                })
            }
            Token::LeftBracket => Ok(Value::Array(self.parse_array_body(depth + 1, spanned.pos)?)),
            Token::String(text) => Ok(Value::String(text)),
            Token::Int32(value) => Ok(Value::Int32(value)),
            Token::Int64(value) => Ok(Value::Int64(value)),
            Token::Double(value) => Ok(Value::Double(value)),
            Token::Regex { pattern, options } => Ok(Value::Regex(Regex::new(pattern, options))),
            Token::Word(word) => self.parse_word_value(&word, spanned.pos),
            _ => Err(unexpected("value", &spanned)),
        }
    }

    fn parse_word_value(&mut self, word: &str, pos: usize) -> Result<Value, ParseError> {
        match word {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            "null" => Ok(Value::Null),
            "undefined" => Ok(Value::Undefined),
            "NaN" => Ok(Value::Double(f64::NAN)),
            "Infinity" => Ok(Value::Double(f64::INFINITY)),
            "MinKey" => {
                self.consume_empty_parens()?;
                Ok(Value::MinKey)
            }
            "MaxKey" => {
                self.consume_empty_parens()?;
                Ok(Value::MaxKey)
            }
            "new" => {
                let next = self.scanner.next_token()?;
                match next.token {
                    Token::Word(name) if name == "Date" => date_constructor(self),
                    Token::Word(name) => self.run_constructor(&name, next.pos),
                    _ => Err(unexpected("constructor name", &next)),
                }
            }
            _ => self.run_constructor(word, pos),
        }
    }

    fn run_constructor(&mut self, name: &str, pos: usize) -> Result<Value, ParseError> {
        match CONSTRUCTORS.get(name) {
            Some(constructor) => constructor(self),
            None => Err(ParseError::UnknownConstructor {
                name: name.to_string(),
                pos,
            }),
        }
    }

    // MinKey and MaxKey read equally well with or without the call parens.
    fn consume_empty_parens(&mut self) -> Result<(), ParseError> {
        let next = self.scanner.next_token()?;
        if next.token == Token::LeftParen {
            self.expect(Token::RightParen, "')'")?;
        } else {
            self.scanner.put_back(next);
        }
        Ok(())
    }

    fn expect(&mut self, token: Token, describe: &'static str) -> Result<(), ParseError> {
        let next = self.scanner.next_token()?;
        if next.token != token {
            return Err(unexpected(describe, &next));
        }
        Ok(())
    }

    fn string_arg(&mut self) -> Result<(String, usize), ParseError> {
        let next = self.scanner.next_token()?;
        match next.token {
            Token::String(text) => Ok((text, next.pos)),
            _ => Err(unexpected("string", &next)),
        }
    }

    fn integer_arg(&mut self) -> Result<(i64, usize), ParseError> {
        let next = self.scanner.next_token()?;
        match next.token {
            Token::Int32(value) => Ok((value as i64, next.pos)),
            Token::Int64(value) => Ok((value, next.pos)),
            _ => Err(unexpected("integer", &next)),
        }
    }
}

fn unexpected(expected: &'static str, spanned: &SpannedToken) -> ParseError {
    match &spanned.token {
        Token::EndOfInput => ParseError::UnexpectedEnd { pos: spanned.pos },
        other => ParseError::UnexpectedToken {
            expected,
            found: other.describe(),
            pos: spanned.pos,
        },
    }
}

fn object_id_argument(parser: &mut Parser<'_>) -> Result<ObjectId, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (hex, hex_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    match ObjectId::parse_str(&hex) {
        Some(id) => Ok(id),
        None => Err(ParseError::InvalidLiteral {
            kind: "object id",
            literal: hex,
            pos: hex_pos,
        }),
    }
}

fn object_id_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    object_id_argument(parser).map(Value::ObjectId)
}

fn iso_date_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (text, text_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    match DateTime::parse_iso(&text) {
        Ok(datetime) => Ok(Value::DateTime(datetime)),
        Err(_) => Err(ParseError::InvalidLiteral {
            kind: "datetime",
            literal: text,
            pos: text_pos,
        }),
    }
}

// Reached only through `new Date(…)`; the argument is the millisecond count.
fn date_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (millis, _) = parser.integer_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    Ok(Value::DateTime(DateTime::from_millis(millis)))
}

fn number_int_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let next = parser.scanner.next_token()?;
    let value = match next.token {
        Token::Int32(value) => value,
        Token::String(text) => match text.parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                return Err(ParseError::InvalidNumber {
                    literal: text,
                    pos: next.pos,
                })
            }
        },
        _ => return Err(unexpected("integer or string", &next)),
    };
    parser.expect(Token::RightParen, "')'")?;
    Ok(Value::Int32(value))
}

fn number_long_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let next = parser.scanner.next_token()?;
    let value = match next.token {
        Token::Int32(value) => value as i64,
        Token::Int64(value) => value,
        Token::String(text) => match text.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                return Err(ParseError::InvalidNumber {
                    literal: text,
                    pos: next.pos,
                })
            }
        },
        _ => return Err(unexpected("integer or string", &next)),
    };
    parser.expect(Token::RightParen, "')'")?;
    Ok(Value::Int64(value))
}

fn number_decimal_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (text, text_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    match text.parse::<Decimal128>() {
        Ok(decimal) => Ok(Value::Decimal128(decimal)),
        Err(_) => Err(ParseError::InvalidLiteral {
            kind: "decimal",
            literal: text,
            pos: text_pos,
        }),
    }
}

fn timestamp_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (seconds, seconds_pos) = parser.integer_arg()?;
    parser.expect(Token::Comma, "','")?;
    let (increment, increment_pos) = parser.integer_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    let seconds = unsigned_argument(seconds, seconds_pos)?;
    let increment = unsigned_argument(increment, increment_pos)?;
    Ok(Value::Timestamp(Timestamp { seconds, increment }))
}

fn unsigned_argument(value: i64, pos: usize) -> Result<u32, ParseError> {
    u32::try_from(value).map_err(|_| ParseError::InvalidNumber {
        literal: value.to_string(),
        pos,
    })
}

fn subtype_argument(value: i64, pos: usize) -> Result<BinarySubtype, ParseError> {
    match u8::try_from(value) {
        Ok(byte) => Ok(BinarySubtype::from_u8(byte)),
        Err(_) => Err(ParseError::InvalidNumber {
            literal: value.to_string(),
            pos,
        }),
    }
}

fn bin_data_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (subtype, subtype_pos) = parser.integer_arg()?;
    parser.expect(Token::Comma, "','")?;
    let (encoded, encoded_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    let subtype = subtype_argument(subtype, subtype_pos)?;
    match BASE64.decode(&encoded) {
        Ok(bytes) => Ok(Value::Binary(Binary::new(subtype, bytes))),
        Err(_) => Err(ParseError::InvalidLiteral {
            kind: "base64",
            literal: encoded,
            pos: encoded_pos,
        }),
    }
}

fn hex_data_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (subtype, subtype_pos) = parser.integer_arg()?;
    parser.expect(Token::Comma, "','")?;
    let (text, text_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    let subtype = subtype_argument(subtype, subtype_pos)?;
    // Dashes are accepted so uuid-shaped output reads back
    let stripped: String = text.chars().filter(|c| *c != '-').collect();
    match hex::decode(&stripped) {
        Ok(bytes) => Ok(Value::Binary(Binary::new(subtype, bytes))),
        Err(_) => Err(ParseError::InvalidLiteral {
            kind: "hex",
            literal: text,
            pos: text_pos,
        }),
    }
}

fn uuid_argument(
    parser: &mut Parser<'_>,
    representation: UuidRepresentation,
) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (text, text_pos) = parser.string_arg()?;
    parser.expect(Token::RightParen, "')'")?;
    let uuid = match uuid::Uuid::parse_str(&text) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Err(ParseError::InvalidLiteral {
                kind: "uuid",
                literal: text,
                pos: text_pos,
            })
        }
    };
    match Binary::from_uuid_with_representation(uuid, representation) {
        Ok(binary) => Ok(Value::Binary(binary)),
        Err(_) => Err(ParseError::InvalidLiteral {
            kind: "uuid",
            literal: text,
            pos: text_pos,
        }),
    }
}

fn standard_uuid_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    uuid_argument(parser, UuidRepresentation::Standard)
}

fn csharp_uuid_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    uuid_argument(parser, UuidRepresentation::CSharpLegacy)
}

fn java_uuid_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    uuid_argument(parser, UuidRepresentation::JavaLegacy)
}

fn python_uuid_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    uuid_argument(parser, UuidRepresentation::PythonLegacy)
}

fn reg_exp_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (pattern, _) = parser.string_arg()?;
    let next = parser.scanner.next_token()?;
    let options = match next.token {
        Token::Comma => {
            let (options, _) = parser.string_arg()?;
            parser.expect(Token::RightParen, "')'")?;
            options
        }
        Token::RightParen => String::new(),
        _ => return Err(unexpected("',' or ')'", &next)),
    };
    Ok(Value::Regex(Regex::new(pattern, options)))
}

fn db_pointer_constructor(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    parser.expect(Token::LeftParen, "'('")?;
    let (namespace, _) = parser.string_arg()?;
    parser.expect(Token::Comma, "','")?;
    let next = parser.scanner.next_token()?;
    let id = match next.token {
        Token::Word(ref word) if word.as_str() == "ObjectId" => object_id_argument(parser)?,
        Token::String(hex) => match ObjectId::parse_str(&hex) {
            Some(id) => id,
            None => {
                return Err(ParseError::InvalidLiteral {
                    kind: "object id",
                    literal: hex,
                    pos: next.pos,
                })
            }
        },
        _ => return Err(unexpected("ObjectId or hex string", &next)),
    };
    parser.expect(Token::RightParen, "')'")?;
    Ok(Value::DbPointer(DbPointer { namespace, id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JavaScriptWithScope;
    use crate::text::{to_shell_string, to_strict_string};
    use crate::{array, doc};

    fn parsed(input: &str) -> Document {
        match parse_text(input) {
            Ok(document) => document,
            Err(err) => panic!("parse of {:?} failed: {}", input, err),
        }
    }

    fn single(input: &str) -> Value {
        let mut document = parsed(input);
        assert_eq!(document.len(), 1, "expected one element in {:?}", input);
        document.remove("v").unwrap()
    }

    #[test]
    fn test_parse_plain_json() {
        let document = parsed(r#"{ "a" : 1, "b" : "two", "c" : [1.5, true, null], "d" : { } }"#);
        assert_eq!(
            document,
            doc! {
                "a" => 1,
                "b" => "two",
                "c" => array![1.5, true, Value::Null],
                "d" => Document::new(),
            }
        );
    }

    #[test]
    fn test_parse_compact_and_unquoted() {
        assert_eq!(parsed("{}"), Document::new());
        assert_eq!(parsed("{a:1,b:2}"), doc! { "a" => 1, "b" => 2 });
        assert_eq!(parsed("{ $set : { x : 1 } }"), doc! { "$set" => doc! { "x" => 1 } });
    }

    #[test]
    fn test_parse_number_widths() {
        assert_eq!(single(r#"{ "v" : 5 }"#), Value::Int32(5));
        assert_eq!(
            single(r#"{ "v" : 3000000000 }"#),
            Value::Int64(3_000_000_000)
        );
        assert_eq!(single(r#"{ "v" : 1.25 }"#), Value::Double(1.25));
        assert_eq!(single(r#"{ "v" : -2 }"#), Value::Int32(-2));
    }

    #[test]
    fn test_parse_special_words() {
        assert_eq!(single("{ v : true }"), Value::Boolean(true));
        assert_eq!(single("{ v : false }"), Value::Boolean(false));
        assert_eq!(single("{ v : null }"), Value::Null);
        assert_eq!(single("{ v : undefined }"), Value::Undefined);
        assert_eq!(single("{ v : Infinity }"), Value::Double(f64::INFINITY));
        assert_eq!(single("{ v : -Infinity }"), Value::Double(f64::NEG_INFINITY));
        match single("{ v : NaN }") {
            Value::Double(value) => assert!(value.is_nan()),
            other => panic!("expected double, got {:?}", other),
        }
        assert_eq!(single("{ v : MinKey }"), Value::MinKey);
        assert_eq!(single("{ v : MaxKey() }"), Value::MaxKey);
    }

    #[test]
    fn test_parse_regex_literal() {
        assert_eq!(
            single("{ v : /ab+c/i }"),
            Value::Regex(Regex::new("ab+c", "i"))
        );
        assert_eq!(
            single(r"{ v : /a\/b/ }"),
            Value::Regex(Regex::new("a/b", ""))
        );
    }

    #[test]
    fn test_parse_shell_constructors() {
        assert_eq!(
            single(r#"{ v : ObjectId("507f1f77bcf86cd799439011") }"#),
            Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap())
        );
        assert_eq!(
            single(r#"{ v : ISODate("2024-03-15T14:30:00.123Z") }"#),
            Value::DateTime(DateTime::from_millis(1_710_513_000_123))
        );
        assert_eq!(
            single("{ v : new Date(-5000) }"),
            Value::DateTime(DateTime::from_millis(-5000))
        );
        assert_eq!(single("{ v : NumberInt(7) }"), Value::Int32(7));
        assert_eq!(single(r#"{ v : NumberInt("7") }"#), Value::Int32(7));
        assert_eq!(single("{ v : NumberLong(5) }"), Value::Int64(5));
        assert_eq!(
            single(r#"{ v : NumberLong("-9223372036854775808") }"#),
            Value::Int64(i64::MIN)
        );
        assert_eq!(
            single(r#"{ v : NumberDecimal("1.5") }"#),
            Value::Decimal128("1.5".parse().unwrap())
        );
        assert_eq!(
            single("{ v : Timestamp(4000000000, 2) }"),
            Value::Timestamp(Timestamp {
                seconds: 4_000_000_000,
                increment: 2,
            })
        );
        assert_eq!(
            single(r#"{ v : BinData(0, "AQID") }"#),
            Value::Binary(Binary::new(BinarySubtype::Generic, vec![1, 2, 3]))
        );
        assert_eq!(
            single(r#"{ v : HexData(5, "01-02-03") }"#),
            Value::Binary(Binary::new(BinarySubtype::Md5, vec![1, 2, 3]))
        );
        assert_eq!(
            single(r#"{ v : RegExp("^a", "i") }"#),
            Value::Regex(Regex::new("^a", "i"))
        );
        assert_eq!(
            single(r#"{ v : RegExp("^a") }"#),
            Value::Regex(Regex::new("^a", ""))
        );
    }

    #[test]
    fn test_parse_uuid_constructors() {
        let text = "00112233-4455-6677-8899-aabbccddeeff";
        let uuid = uuid::Uuid::parse_str(text).unwrap();
        for (input, representation) in [
            (r#"{ v : UUID("00112233-4455-6677-8899-aabbccddeeff") }"#, UuidRepresentation::Standard),
            (r#"{ v : CSUUID("00112233-4455-6677-8899-aabbccddeeff") }"#, UuidRepresentation::CSharpLegacy),
            (r#"{ v : JUUID("00112233-4455-6677-8899-aabbccddeeff") }"#, UuidRepresentation::JavaLegacy),
            (r#"{ v : PYUUID("00112233-4455-6677-8899-aabbccddeeff") }"#, UuidRepresentation::PythonLegacy),
        ] {
            let value = single(input);
            let expected = Binary::from_uuid_with_representation(uuid, representation).unwrap();
            match value {
                Value::Binary(binary) => {
                    assert_eq!(binary.bytes(), expected.bytes(), "bytes for {}", input);
                    assert_eq!(binary.subtype(), expected.subtype(), "subtype for {}", input);
                    assert_eq!(
                        binary.representation(),
                        representation,
                        "representation for {}",
                        input
                    );
                }
                other => panic!("expected binary for {}, got {:?}", input, other),
            }
        }
        // Simple form without hyphens parses too
        assert_eq!(
            single(r#"{ v : UUID("00112233445566778899aabbccddeeff") }"#),
            single(r#"{ v : UUID("00112233-4455-6677-8899-aabbccddeeff") }"#)
        );
    }

    #[test]
    fn test_parse_db_pointer_both_shapes() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let expected = Value::DbPointer(DbPointer {
            namespace: "db.coll".to_string(),
            id,
        });
        assert_eq!(
            single(r#"{ v : DBPointer("db.coll", ObjectId("507f1f77bcf86cd799439011")) }"#),
            expected
        );
        assert_eq!(
            single(r#"{ v : DBPointer("db.coll", "507f1f77bcf86cd799439011") }"#),
            expected
        );
    }

    #[test]
    fn test_parse_strict_wrappers() {
        assert_eq!(
            single(r#"{ "v" : { "$oid" : "507f1f77bcf86cd799439011" } }"#),
            Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap())
        );
        assert_eq!(
            single(r#"{ "v" : { "$date" : 1710513000123 } }"#),
            Value::DateTime(DateTime::from_millis(1_710_513_000_123))
        );
        assert_eq!(
            single(r#"{ "v" : { "$binary" : "AQID", "$type" : "80" } }"#),
            Value::Binary(Binary::new(BinarySubtype::UserDefined(0x80), vec![1, 2, 3]))
        );
        assert_eq!(
            single(r#"{ "v" : { "$regex" : "^a", "$options" : "i" } }"#),
            Value::Regex(Regex::new("^a", "i"))
        );
        assert_eq!(
            single(r#"{ "v" : { "$timestamp" : { "t" : 10, "i" : 2 } } }"#),
            Value::Timestamp(Timestamp {
                seconds: 10,
                increment: 2,
            })
        );
        assert_eq!(
            single(r#"{ "v" : { "$code" : "f()", "$scope" : { "x" : 1 } } }"#),
            Value::JavaScriptWithScope(JavaScriptWithScope {
                code: "f()".to_string(),
                scope: doc! { "x" => 1 },
            })
        );
        assert_eq!(single(r#"{ "v" : { "$minKey" : 1 } }"#), Value::MinKey);
        // Unknown operators stay plain documents
        assert_eq!(
            single(r#"{ "v" : { "$gt" : 5 } }"#),
            Value::Document(doc! { "$gt" => 5 })
        );
    }

    #[test]
    fn test_root_document_never_promoted() {
        let document = parsed(r#"{ "$oid" : "507f1f77bcf86cd799439011" }"#);
        assert_eq!(
            document,
            doc! { "$oid" => "507f1f77bcf86cd799439011" }
        );
    }

    #[test]
    fn test_duplicate_names_preserved() {
        let document = parsed(r#"{ "a" : 1, "a" : 2 }"#);
        assert_eq!(document.len(), 2);
        let values: Vec<&Value> = document.iter().map(|(_, value)| value).collect();
        assert_eq!(values, [&Value::Int32(1), &Value::Int32(2)]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_text("5"),
            Err(ParseError::UnexpectedToken {
                expected: "'{'",
                found: "number 5".to_string(),
                pos: 0,
            })
        );
        assert_eq!(
            parse_text("{ \"a\" : 1 } extra"),
            Err(ParseError::TrailingCharacters { pos: 12 })
        );
        assert_eq!(
            parse_text("{ \"a\" : 1, }"),
            Err(ParseError::UnexpectedToken {
                expected: "element name",
                found: "'}'".to_string(),
                pos: 11,
            })
        );
        assert_eq!(
            parse_text("{ \"a\" 1 }"),
            Err(ParseError::UnexpectedToken {
                expected: "':'",
                found: "number 1".to_string(),
                pos: 6,
            })
        );
        assert_eq!(
            parse_text("{ \"a\" : 1"),
            Err(ParseError::UnexpectedEnd { pos: 9 })
        );
        assert_eq!(
            parse_text("{ v : Frobnicate(1) }"),
            Err(ParseError::UnknownConstructor {
                name: "Frobnicate".to_string(),
                pos: 6,
            })
        );
        // `Date` only constructs behind `new`
        assert_eq!(
            parse_text(r#"{ v : Date(0) }"#),
            Err(ParseError::UnknownConstructor {
                name: "Date".to_string(),
                pos: 6,
            })
        );
        assert_eq!(
            parse_text(r#"{ v : ObjectId("xyz") }"#),
            Err(ParseError::InvalidLiteral {
                kind: "object id",
                literal: "xyz".to_string(),
                pos: 15,
            })
        );
        assert_eq!(
            parse_text("{ v : Timestamp(-1, 0) }"),
            Err(ParseError::InvalidNumber {
                literal: "-1".to_string(),
                pos: 16,
            })
        );
    }

    // The root body runs at depth zero, so `levels` opening braces put the
    // innermost body at depth `levels - 1`.
    fn nested_input(levels: usize) -> String {
        let mut input = String::new();
        for _ in 0..levels {
            input.push_str("{\"a\":");
        }
        input.push('1');
        for _ in 0..levels {
            input.push('}');
        }
        input
    }

    #[test]
    fn test_depth_limit() {
        assert!(parse_text(&nested_input(DEFAULT_MAX_DEPTH + 1)).is_ok());
        match parse_text(&nested_input(DEFAULT_MAX_DEPTH + 2)) {
            Err(ParseError::NestingDepthExceeded { max, .. }) => {
                assert_eq!(max, DEFAULT_MAX_DEPTH)
            }
            other => panic!("expected depth error, got {:?}", other),
        }
    }

    #[test]
    fn test_shell_roundtrip() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let document = doc! {
            "int32" => 42,
            "int64" => 3_000_000_000i64,
            "double" => 1.5,
            "text" => "hi \"there\"",
            "id" => Value::ObjectId(id),
            "when" => Value::DateTime(DateTime::from_millis(1_710_513_000_123)),
            "stamp" => Value::Timestamp(Timestamp { seconds: 1, increment: 2 }),
            "blob" => Value::Binary(Binary::new(BinarySubtype::Generic, vec![1, 2, 3])),
            "pattern" => Value::Regex(Regex::new("^a.*b$", "im")),
            "truthy" => true,
            "nothing" => Value::Null,
            "gone" => Value::Undefined,
            "low" => Value::MinKey,
            "high" => Value::MaxKey,
            "list" => array![1, "two", 3.5],
            "inner" => doc! { "nested" => Value::Int64(-9) },
        };
        assert_eq!(parsed(&to_shell_string(&document)), document);
    }

    #[test]
    fn test_strict_roundtrip() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let document = doc! {
            "id" => Value::ObjectId(id),
            "when" => Value::DateTime(DateTime::from_millis(1_710_513_000_123)),
            "stamp" => Value::Timestamp(Timestamp { seconds: 1, increment: 2 }),
            "blob" => Value::Binary(Binary::new(BinarySubtype::Function, vec![1, 2, 3])),
            "pattern" => Value::Regex(Regex::new("^a.*b$", "im")),
            "gone" => Value::Undefined,
            "sym" => Value::Symbol("sym".to_string()),
            "code" => Value::JavaScript("f()".to_string()),
            "scoped" => Value::JavaScriptWithScope(JavaScriptWithScope {
                code: "g()".to_string(),
                scope: doc! { "x" => 1 },
            }),
            "dec" => Value::Decimal128("1.5".parse().unwrap()),
            "ptr" => Value::DbPointer(DbPointer {
                namespace: "db.coll".to_string(),
                id,
            }),
            "low" => Value::MinKey,
            "high" => Value::MaxKey,
        };
        assert_eq!(parsed(&to_strict_string(&document)), document);
    }
}
