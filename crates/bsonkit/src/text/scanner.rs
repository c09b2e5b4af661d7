//! Token scanner for the textual parser.
//!
//! Produces one token per call with the byte offset where it began; the
//! parser owns all grammar decisions. Number literals are classified here:
//! int32 when the value fits, then int64, then double; a decimal point or
//! exponent forces double.

use crate::error::ParseError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Comma,
    Colon,
    /// Quoted string (single or double quotes), unescaped.
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// A `/pattern/options` literal. Only the delimiter unescapes.
    Regex { pattern: String, options: String },
    /// A bare identifier: keyword, constant or constructor name.
    Word(String),
    EndOfInput,
}

impl Token {
    /// Short description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::LeftBrace => "'{'".to_string(),
            Token::RightBrace => "'}'".to_string(),
            Token::LeftBracket => "'['".to_string(),
            Token::RightBracket => "']'".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Colon => "':'".to_string(),
            Token::String(value) => format!("string {:?}", value),
            Token::Int32(value) => format!("number {}", value),
            Token::Int64(value) => format!("number {}", value),
            Token::Double(value) => format!("number {}", value),
            Token::Regex { pattern, .. } => format!("regex /{}/", pattern),
            Token::Word(word) => format!("word {:?}", word),
            Token::EndOfInput => "end of input".to_string(),
        }
    }
}

/// A token plus the byte offset where it began.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpannedToken {
    pub(crate) token: Token,
    pub(crate) pos: usize,
}

pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    pushed_back: Option<SpannedToken>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Scanner<'a> {
        Scanner {
            input,
            pos: 0,
            pushed_back: None,
        }
    }

    /// Returns the next token. The end of input is a regular token, not an
    /// error.
    pub(crate) fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        match self.pushed_back.take() {
            Some(spanned) => Ok(spanned),
            None => self.scan(),
        }
    }

    /// Returns a token to the stream; the next [`next_token`](Self::next_token)
    /// yields it again. Holds at most one token.
    pub(crate) fn put_back(&mut self, spanned: SpannedToken) {
        debug_assert!(self.pushed_back.is_none());
        self.pushed_back = Some(spanned);
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ' ' || ch == '\t' || ch == '\r' || ch == '\n' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan(&mut self) -> Result<SpannedToken, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.current_char() else {
            return Ok(SpannedToken {
                token: Token::EndOfInput,
                pos: start,
            });
        };
        let token = match ch {
            '{' => {
                self.pos += 1;
                Token::LeftBrace
            }
            '}' => {
                self.pos += 1;
                Token::RightBrace
            }
            '[' => {
                self.pos += 1;
                Token::LeftBracket
            }
            ']' => {
                self.pos += 1;
                Token::RightBracket
            }
            '(' => {
                self.pos += 1;
                Token::LeftParen
            }
            ')' => {
                self.pos += 1;
                Token::RightParen
            }
            ',' => {
                self.pos += 1;
                Token::Comma
            }
            ':' => {
                self.pos += 1;
                Token::Colon
            }
            '"' | '\'' => self.scan_string(ch)?,
            '/' => self.scan_regex()?,
            '-' | '0'..='9' => self.scan_number()?,
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => Token::Word(self.scan_word()),
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    found: other,
                    pos: start,
                })
            }
        };
        Ok(SpannedToken { token, pos: start })
    }

    fn scan_word(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn consume_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn scan_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        if self.current_char() == Some('-') {
            self.pos += 1;
            // The one signed word literal
            if self.current_char().is_some_and(|c| c.is_ascii_alphabetic()) {
                let word = self.scan_word();
                if word == "Infinity" {
                    return Ok(Token::Double(f64::NEG_INFINITY));
                }
                return Err(ParseError::InvalidNumber {
                    literal: self.input[start..self.pos].to_string(),
                    pos: start,
                });
            }
        }
        let mut is_double = false;
        self.consume_digits();
        if self.current_char() == Some('.') {
            is_double = true;
            self.pos += 1;
            self.consume_digits();
        }
        if matches!(self.current_char(), Some('e') | Some('E')) {
            is_double = true;
            self.pos += 1;
            if matches!(self.current_char(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            self.consume_digits();
        }

        let literal = &self.input[start..self.pos];
        if !is_double {
            if let Ok(value) = literal.parse::<i32>() {
                return Ok(Token::Int32(value));
            }
            if let Ok(value) = literal.parse::<i64>() {
                return Ok(Token::Int64(value));
            }
        }
        match literal.parse::<f64>() {
            Ok(value) => Ok(Token::Double(value)),
            Err(_) => Err(ParseError::InvalidNumber {
                literal: literal.to_string(),
                pos: start,
            }),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(ch) = self.current_char() else {
                return Err(ParseError::UnterminatedString { pos: start });
            };
            if ch == quote {
                self.pos += 1;
                return Ok(Token::String(value));
            }
            if ch == '\\' {
                let escape_pos = self.pos;
                self.pos += 1;
                let Some(escaped) = self.current_char() else {
                    return Err(ParseError::UnterminatedString { pos: start });
                };
                self.pos += escaped.len_utf8();
                match escaped {
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    '\\' => value.push('\\'),
                    '/' => value.push('/'),
                    'b' => value.push('\x08'),
                    'f' => value.push('\x0c'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'u' => value.push(self.read_unicode_escape(escape_pos)?),
                    _ => return Err(ParseError::InvalidEscape { pos: escape_pos }),
                }
                continue;
            }
            self.pos += ch.len_utf8();
            value.push(ch);
        }
    }

    /// Reads four hex digits at the cursor.
    fn read_hex4(&mut self, escape_pos: usize) -> Result<u16, ParseError> {
        let end = self.pos + 4;
        let digits = self
            .input
            .get(self.pos..end)
            .ok_or(ParseError::InvalidEscape { pos: escape_pos })?;
        // from_str_radix would also accept a sign
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidEscape { pos: escape_pos });
        }
        let value = u16::from_str_radix(digits, 16)
            .map_err(|_| ParseError::InvalidEscape { pos: escape_pos })?;
        self.pos = end;
        Ok(value)
    }

    /// Decodes `\uXXXX` after the `u`, consuming a second escape for
    /// surrogate pairs.
    fn read_unicode_escape(&mut self, escape_pos: usize) -> Result<char, ParseError> {
        let first = self.read_hex4(escape_pos)?;
        if (0xD800..0xDC00).contains(&first) {
            // High surrogate: the low half must follow immediately
            if !self.input[self.pos..].starts_with("\\u") {
                return Err(ParseError::InvalidEscape { pos: escape_pos });
            }
            self.pos += 2;
            let second = self.read_hex4(escape_pos)?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err(ParseError::InvalidEscape { pos: escape_pos });
            }
            let combined =
                0x10000 + (((first as u32) - 0xD800) << 10) + ((second as u32) - 0xDC00);
            return char::from_u32(combined).ok_or(ParseError::InvalidEscape { pos: escape_pos });
        }
        if (0xDC00..0xE000).contains(&first) {
            return Err(ParseError::InvalidEscape { pos: escape_pos });
        }
        char::from_u32(first as u32).ok_or(ParseError::InvalidEscape { pos: escape_pos })
    }

    fn scan_regex(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut pattern = String::new();
        loop {
            let Some(ch) = self.current_char() else {
                return Err(ParseError::UnterminatedString { pos: start });
            };
            if ch == '/' {
                self.pos += 1;
                break;
            }
            if ch == '\\' {
                self.pos += 1;
                match self.current_char() {
                    // Only the delimiter unescapes; every other backslash
                    // stays part of the pattern verbatim
                    Some('/') => {
                        pattern.push('/');
                        self.pos += 1;
                    }
                    Some(other) => {
                        pattern.push('\\');
                        pattern.push(other);
                        self.pos += other.len_utf8();
                    }
                    None => return Err(ParseError::UnterminatedString { pos: start }),
                }
                continue;
            }
            pattern.push(ch);
            self.pos += ch.len_utf8();
        }
        let mut options = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphabetic() {
                options.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(Token::Regex { pattern, options })
    }
}
