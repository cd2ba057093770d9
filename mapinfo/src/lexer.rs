use serde::Deserialize;
use tracing::debug;

use crate::parser::error::ParseError;
use crate::token::{TextLoc, Token, TokenKind};

const BOM: char = '\u{feff}';

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Lexical extensions that vary between MAPINFO dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LexOptions {
    /// Skip `// ...` to the end of the line.
    pub line_comments: bool,
    /// Skip `/* ... */` (non-nesting).
    pub block_comments: bool,
    /// Accept `0x` prefixed hexadecimal integers.
    pub hex_numbers: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        LexOptions {
            line_comments: true,
            block_comments: true,
            hex_numbers: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Tokenize MAPINFO text with the default options.
/// The terminal `Null` token is not included in the result.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    tokenize_with(source, &LexOptions::default())
}

/// Tokenize MAPINFO text with explicit lexical options.
pub fn tokenize_with(source: &str, options: &LexOptions) -> Result<Vec<Token>, ParseError> {
    let (tokens, _eof) = lex_all(source, options, 0)?;
    Ok(tokens)
}

/// Lex the whole buffer, returning the tokens and the location of the terminal `Null` token.
pub(crate) fn lex_all(
    source: &str,
    options: &LexOptions,
    file_id: usize,
) -> Result<(Vec<Token>, TextLoc), ParseError> {
    let mut lexer = Lexer::new(source, *options, file_id);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        if token.kind == TokenKind::Null {
            debug!(count = tokens.len(), "tokenized MAPINFO");
            return Ok((tokens, token.begin));
        }
        tokens.push(token);
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Scans a complete MAPINFO buffer one token at a time.
///
/// Line and column are advanced as each byte is consumed, never recomputed.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    loc: TextLoc,
    options: LexOptions,
    file_id: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, options: LexOptions, file_id: usize) -> Self {
        // A leading byte order mark is skipped without counting as a column.
        let offset = if source.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        Lexer {
            source,
            bytes: source.as_bytes(),
            loc: TextLoc::new(0, 0, offset),
            options,
            file_id,
        }
    }

    /// Produce the next token. Once the input is exhausted this keeps returning `Null`.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let begin = self.loc;

        let Some(c) = self.peek() else {
            return Ok(self.finish(begin, TokenKind::Null, 0.0));
        };

        match c {
            b'=' => Ok(self.single(TokenKind::Equals)),
            b'{' => Ok(self.single(TokenKind::OpenBlock)),
            b'}' => Ok(self.single(TokenKind::CloseBlock)),
            b',' => Ok(self.single(TokenKind::NextValue)),
            b'"' => self.lex_string(),
            c if is_ident_start(c) => Ok(self.lex_identifier()),
            c if self.starts_number(c) => self.lex_number(),
            _ => Err(self.unexpected_character(begin)),
        }
    }

    // -- scanning primitives ------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.loc.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.loc.offset + ahead).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.loc.offset += 1;
            if c == b'\n' {
                self.loc.line += 1;
                self.loc.column = 0;
            } else {
                self.loc.column += 1;
            }
        }
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn finish(&self, begin: TextLoc, kind: TokenKind, number: f32) -> Token {
        Token {
            begin,
            end: self.loc,
            kind,
            number,
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let begin = self.loc;
        self.advance();
        self.finish(begin, kind, 0.0)
    }

    fn error(&self, loc: TextLoc, message: impl Into<String>) -> ParseError {
        ParseError::at(loc, message, self.file_id)
    }

    fn unexpected_character(&self, loc: TextLoc) -> ParseError {
        let c = self.source[loc.offset..].chars().next().unwrap_or('?');
        let width = c.len_utf8();
        self.error(loc, format!("Unexpected character '{}'!", c.escape_debug()))
            .with_span(loc.offset..loc.offset + width)
    }

    // -- trivia -------------------------------------------------------------

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if is_whitespace(c) => self.advance(),
                (Some(b'/'), Some(b'/')) if self.options.line_comments => {
                    self.advance_while(|c| c != b'\n');
                }
                (Some(b'/'), Some(b'*')) if self.options.block_comments => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.loc;
        self.advance();
        self.advance();

        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b'*'), Some(b'/')) => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                (Some(_), _) => self.advance(),
                (None, _) => {
                    return Err(self
                        .error(start, "Unterminated block comment!")
                        .with_span(start.offset..start.offset + 2));
                }
            }
        }
    }

    // -- literals -----------------------------------------------------------

    fn lex_identifier(&mut self) -> Token {
        let begin = self.loc;
        self.advance_while(is_ident_continue);
        let text = &self.source[begin.offset..self.loc.offset];

        let kind = if text.eq_ignore_ascii_case("true") {
            TokenKind::True
        } else if text.eq_ignore_ascii_case("false") {
            TokenKind::False
        } else {
            TokenKind::Identifier
        };

        self.finish(begin, kind, 0.0)
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let begin = self.loc;
        self.advance();

        loop {
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return Ok(self.finish(begin, TokenKind::String, 0.0));
                }
                Some(b'\n') | None => {
                    return Err(self
                        .error(begin, "Unterminated string!")
                        .with_span(begin.offset..self.loc.offset));
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// A number starts with a digit, `.digit`, or a sign followed by either.
    fn starts_number(&self, c: u8) -> bool {
        let digit_at = |ahead: usize| self.peek_at(ahead).is_some_and(|c| c.is_ascii_digit());
        match c {
            b'0'..=b'9' => true,
            b'.' => digit_at(1),
            b'+' | b'-' => digit_at(1) || (self.peek_at(1) == Some(b'.') && digit_at(2)),
            _ => false,
        }
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let begin = self.loc;
        let negative = self.peek() == Some(b'-');
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.advance();
        }

        let is_hex = self.options.hex_numbers
            && self.peek() == Some(b'0')
            && matches!(self.peek_at(1), Some(b'x' | b'X'))
            && self.peek_at(2).is_some_and(|c| c.is_ascii_hexdigit());

        let value = if is_hex {
            self.advance();
            self.advance();
            let digits_start = self.loc.offset;
            self.advance_while(|c| c.is_ascii_hexdigit());
            let digits = &self.source[digits_start..self.loc.offset];
            let magnitude = u64::from_str_radix(digits, 16).map_err(|_| {
                self.error(begin, "Hex number is too large!")
                    .with_span(begin.offset..self.loc.offset)
            })?;
            let magnitude = magnitude as f32;
            if negative { -magnitude } else { magnitude }
        } else {
            self.advance_while(|c| c.is_ascii_digit());
            if self.peek() == Some(b'.') {
                self.advance();
                self.advance_while(|c| c.is_ascii_digit());
            }
            if self.at_exponent() {
                self.advance();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
            let text = &self.source[begin.offset..self.loc.offset];
            match text.parse::<f32>() {
                Ok(value) if value.is_finite() => value,
                _ => return Err(self.invalid_number(begin)),
            }
        };

        // A literal running into more number or identifier characters is one bad token,
        // not two adjacent ones.
        if self.peek().is_some_and(is_number_continue) {
            self.advance_while(is_number_continue);
            return Err(self.invalid_number(begin));
        }

        Ok(self.finish(begin, TokenKind::Number, value))
    }

    /// "Invalid number" covering everything from `begin` to the current position.
    fn invalid_number(&self, begin: TextLoc) -> ParseError {
        let text = &self.source[begin.offset..self.loc.offset];
        self.error(begin, format!("Invalid number '{}'!", text))
            .with_span(begin.offset..self.loc.offset)
    }

    /// `e`/`E`, optionally signed, followed by at least one digit.
    fn at_exponent(&self) -> bool {
        if !matches!(self.peek(), Some(b'e' | b'E')) {
            return false;
        }
        let digits_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) { 2 } else { 1 };
        self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit())
    }
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C)
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_number_continue(c: u8) -> bool {
    is_ident_continue(c) || c == b'.'
}
