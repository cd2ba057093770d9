mod values;

use std::fmt;

use crate::arena::TokenId;
use crate::document::{Document, Links, TokenRef};
use crate::parser::ParseError;
use crate::small_string::SmallString;

/// One top-level declaration, e.g. `Map 1 "Hangar" { Music = 1 }`.
/// A block holds no text; everything is reached through token ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// The block's type name (`Map`, `Episode`, ...).
    pub type_token: TokenId,
    /// First header token (between the type name and `{`), linked via `next`.
    pub header: Option<TokenId>,
    /// First value name inside the braces, linked via `next`.
    pub values: Option<TokenId>,
}

/// Read-only query view over a [`Block`] of a [`Document`].
///
/// Header fields are positional and required: the `required_*` accessors fail
/// loudly. Named values are optional: the `single_*` accessors fall back to
/// the caller's default.
#[derive(Clone, Copy)]
pub struct BlockRef<'a> {
    document: &'a Document,
    block: &'a Block,
    index: usize,
}

impl<'a> BlockRef<'a> {
    pub(crate) fn new(document: &'a Document, block: &'a Block, index: usize) -> Self {
        BlockRef {
            document,
            block,
            index,
        }
    }

    /// Position of the block in the document.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    pub fn type_token(&self) -> TokenRef<'a> {
        TokenRef::new(self.document, self.block.type_token)
    }

    pub fn type_name(&self) -> &'a str {
        self.type_token().text()
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.type_token().text_eq_ignore_case(name)
    }

    /// An error located at the start of the block.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        let token = self.type_token().token();
        ParseError::at(token.begin, message, self.document.source_id()).with_span(token.span())
    }

    fn invalid_header(&self, detail: impl fmt::Display) -> ParseError {
        let token = self.type_token().token();
        ParseError::at(
            token.end,
            format!("'{}' block has an invalid header! {}", self.type_name(), detail),
            self.document.source_id(),
        )
        .with_span(token.span())
    }

    // -- headers ------------------------------------------------------------

    pub fn header_tokens(&self) -> Links<'a> {
        Links::chain(self.block.header.map(|id| TokenRef::new(self.document, id)))
    }

    pub fn header_token_count(&self) -> usize {
        self.block
            .header
            .map_or(0, |id| 1 + TokenRef::new(self.document, id).num_tokens_ahead())
    }

    /// The header token at `index`, or `None` if there are not that many.
    pub fn header_token(&self, index: usize) -> Option<TokenRef<'a>> {
        self.header_tokens().nth(index)
    }

    pub fn ensure_min_header_token_count(&self, count: usize) -> Result<(), ParseError> {
        let actual = self.header_token_count();
        if actual < count {
            return Err(self.invalid_header(format_args!(
                "Expected at least {} header value(s) but found {}.",
                count, actual
            )));
        }
        Ok(())
    }

    pub fn required_header_token(&self, index: usize) -> Result<TokenRef<'a>, ParseError> {
        self.header_token(index).ok_or_else(|| {
            self.invalid_header(format_args!("Missing header value {}.", index + 1))
        })
    }

    /// Numbers yield their value, `true`/`false` yield 1/0; anything else is an error.
    pub fn required_header_number(&self, index: usize) -> Result<f32, ParseError> {
        let token = self.required_header_token(index)?;
        token.as_number().ok_or_else(|| {
            self.invalid_header(format_args!(
                "Header value {} must be a number but found {}.",
                index + 1,
                token.kind().describe()
            ))
        })
    }

    /// [`Self::required_header_number`] truncated toward zero.
    pub fn required_header_int(&self, index: usize) -> Result<i32, ParseError> {
        Ok(self.required_header_number(index)? as i32)
    }

    /// Header text; identifiers and numbers are accepted as well as strings.
    pub fn required_header_str(&self, index: usize) -> Result<&'a str, ParseError> {
        Ok(self.required_header_token(index)?.text())
    }

    pub fn required_header_small_string<const N: usize>(
        &self,
        index: usize,
    ) -> Result<SmallString<N>, ParseError> {
        Ok(SmallString::new(self.required_header_str(index)?))
    }
}

impl fmt::Debug for BlockRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRef")
            .field("index", &self.index)
            .field("type", &self.type_name())
            .field("header", &self.header_tokens().map(|t| t.text()).collect::<Vec<_>>())
            .field("values", &self.values().map(|t| t.text()).collect::<Vec<_>>())
            .finish()
    }
}
