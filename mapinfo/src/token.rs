use std::fmt;
use std::ops::Range;

/// A location in MAPINFO source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextLoc {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based column number, counted in bytes from the start of the line.
    pub column: u32,
    /// Byte offset into the source text.
    pub offset: usize,
}

impl TextLoc {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        TextLoc {
            line,
            column,
            offset,
        }
    }
}

/// Formats as `line L column C` using 1-based numbers.
impl fmt::Display for TextLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// Tells what kind of lexical unit a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Returned when there are no more tokens in the text.
    Null,
    /// An unquoted identifier like `Map` or `NoIntermission`.
    Identifier,
    /// A quoted string like `"Hangar"`.
    String,
    /// An integer, hex or floating point number.
    Number,
    /// The `true` literal (coerces to 1).
    True,
    /// The `false` literal (coerces to 0).
    False,
    /// `=`
    Equals,
    /// `{`
    OpenBlock,
    /// `}`
    CloseBlock,
    /// `,` (separates the entries of a multi-valued assignment)
    NextValue,
}

impl TokenKind {
    /// True for the kinds that may appear as header or data tokens.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// True for the kinds that may name a value inside a block.
    pub fn is_value_name(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::String)
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Null => "end of input",
            TokenKind::Identifier => "an identifier",
            TokenKind::String => "a string",
            TokenKind::Number => "a number",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Equals => "'='",
            TokenKind::OpenBlock => "'{'",
            TokenKind::CloseBlock => "'}'",
            TokenKind::NextValue => "','",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Null => "Null",
            TokenKind::Identifier => "Identifier",
            TokenKind::String => "String",
            TokenKind::Number => "Number",
            TokenKind::True => "True",
            TokenKind::False => "False",
            TokenKind::Equals => "Equals",
            TokenKind::OpenBlock => "OpenBlock",
            TokenKind::CloseBlock => "CloseBlock",
            TokenKind::NextValue => "NextValue",
        };
        f.write_str(name)
    }
}

/// A single token extracted from MAPINFO text.
///
/// Tokens do not own any text; the `begin`/`end` offsets index into the
/// source they were lexed from. `end` is one past the last character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub begin: TextLoc,
    pub end: TextLoc,
    pub kind: TokenKind,
    /// The numeric value for `Number` tokens, `0.0` for every other kind.
    pub number: f32,
}

impl Token {
    /// Number of source bytes covered by the token, including string quotes.
    pub fn size(&self) -> usize {
        self.end.offset - self.begin.offset
    }

    /// The raw byte range of the token in its source.
    pub fn span(&self) -> Range<usize> {
        self.begin.offset..self.end.offset
    }

    /// The byte range of the token's text. For strings this excludes the quotes.
    pub fn text_range(&self) -> Range<usize> {
        if self.kind == TokenKind::String && self.size() >= 2 {
            self.begin.offset + 1..self.end.offset - 1
        } else {
            self.span()
        }
    }

    /// The token's text within `source`, with string quotes stripped.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.text_range()).unwrap_or_default()
    }

    /// Case-insensitive (ASCII) comparison of the token text against `other`.
    /// Strings of different length never compare equal.
    pub fn text_eq_ignore_case(&self, source: &str, other: &str) -> bool {
        self.text(source).eq_ignore_ascii_case(other)
    }

    /// Numeric coercion shared by the header and value accessors:
    /// numbers yield their value, `true`/`false` yield 1/0.
    pub fn as_number(&self) -> Option<f32> {
        match self.kind {
            TokenKind::Number => Some(self.number),
            TokenKind::True => Some(1.0),
            TokenKind::False => Some(0.0),
            _ => None,
        }
    }
}
