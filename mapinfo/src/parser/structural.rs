use tracing::trace;

use crate::arena::{TokenArena, TokenId};
use crate::block::Block;
use crate::parser::error::ParseError;
use crate::token::{TextLoc, Token, TokenKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group the lexed tokens into blocks, linking header, value and data chains
/// inside `arena`. `eof` is where the terminal `Null` token sits.
pub fn build_blocks(
    arena: &mut TokenArena,
    eof: TextLoc,
    file_id: usize,
) -> Result<Vec<Block>, ParseError> {
    let mut builder = BlockBuilder {
        arena,
        eof,
        file_id,
        pos: 0,
    };

    let mut blocks = Vec::new();
    while builder.peek().1.kind != TokenKind::Null {
        let block = builder.parse_block()?;
        trace!(
            index = blocks.len(),
            type_token = %block.type_token,
            has_header = block.header.is_some(),
            has_values = block.values.is_some(),
            "built block"
        );
        blocks.push(block);
    }

    Ok(blocks)
}

// ---------------------------------------------------------------------------
// Builder state
// ---------------------------------------------------------------------------

struct BlockBuilder<'a> {
    arena: &'a mut TokenArena,
    eof: TextLoc,
    file_id: usize,
    /// Index of the lookahead token.
    pos: usize,
}

/// Appends to a singly linked chain while remembering its head.
#[derive(Default)]
struct ChainBuilder {
    head: Option<TokenId>,
    tail: Option<TokenId>,
}

impl ChainBuilder {
    fn append(&mut self, arena: &mut TokenArena, id: TokenId) {
        match self.tail {
            Some(tail) => arena.link_next(tail, id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }
}

impl BlockBuilder<'_> {
    /// The lookahead token, or a `Null` token at end of input.
    fn peek(&self) -> (Option<TokenId>, Token) {
        match self.arena.id(self.pos) {
            Some(id) => (Some(id), *self.arena.token(id)),
            None => (
                None,
                Token {
                    begin: self.eof,
                    end: self.eof,
                    kind: TokenKind::Null,
                    number: 0.0,
                },
            ),
        }
    }

    fn error(&self, loc: TextLoc, message: impl Into<String>) -> ParseError {
        ParseError::at(loc, message, self.file_id)
    }

    fn error_at_token(&self, token: &Token, message: impl Into<String>) -> ParseError {
        self.error(token.begin, message).with_span(token.span())
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let (type_id, type_token) = self.peek();
        let Some(type_id) = type_id.filter(|_| type_token.kind == TokenKind::Identifier) else {
            return Err(self.error_at_token(
                &type_token,
                format!(
                    "Expected a block type identifier but found {}!",
                    type_token.kind.describe()
                ),
            ));
        };
        self.pos += 1;

        let header = self.parse_header(&type_token)?;
        let values = self.parse_body(&type_token)?;

        Ok(Block {
            type_token: type_id,
            header,
            values,
        })
    }

    /// Header tokens up to and including the `{`, which is consumed but not linked.
    fn parse_header(&mut self, type_token: &Token) -> Result<Option<TokenId>, ParseError> {
        let mut chain = ChainBuilder::default();

        loop {
            let (id, token) = self.peek();
            match (id, token.kind) {
                (_, TokenKind::OpenBlock) => {
                    self.pos += 1;
                    return Ok(chain.head);
                }
                (Some(id), kind) if kind.is_literal() => {
                    self.pos += 1;
                    chain.append(self.arena, id);
                }
                (_, TokenKind::Null) => {
                    return Err(self
                        .error(
                            type_token.end,
                            "Unexpected end of MAPINFO while reading a block header! Expected '{'.",
                        )
                        .with_span(type_token.span()));
                }
                (_, kind) => {
                    return Err(self.error_at_token(
                        &token,
                        format!(
                            "Unexpected {} in block header! Expected a header value or '{{'.",
                            kind.describe()
                        ),
                    ));
                }
            }
        }
    }

    /// Named values up to and including the closing `}`.
    fn parse_body(&mut self, type_token: &Token) -> Result<Option<TokenId>, ParseError> {
        let mut chain = ChainBuilder::default();

        loop {
            let (id, token) = self.peek();
            match (id, token.kind) {
                (_, TokenKind::CloseBlock) => {
                    self.pos += 1;
                    return Ok(chain.head);
                }
                (Some(id), kind) if kind.is_value_name() => {
                    self.pos += 1;
                    chain.append(self.arena, id);
                    self.parse_value_data(id, &token)?;
                }
                (_, TokenKind::Null) => {
                    return Err(self
                        .error(
                            type_token.end,
                            "Unexpected end of MAPINFO inside a block! Expected '}'.",
                        )
                        .with_span(type_token.span()));
                }
                (_, TokenKind::OpenBlock) => {
                    return Err(self.error_at_token(&token, "Nested blocks are not supported!"));
                }
                (_, kind) => {
                    return Err(self.error_at_token(
                        &token,
                        format!("Expected a value name or '}}' but found {}!", kind.describe()),
                    ));
                }
            }
        }
    }

    /// An optional `= data (, data)*` after a value name. No `=` makes the value a flag.
    fn parse_value_data(&mut self, name_id: TokenId, name: &Token) -> Result<(), ParseError> {
        let (_, next) = self.peek();
        match next.kind {
            TokenKind::Equals => {}
            TokenKind::NextValue => {
                return Err(self.error_at_token(
                    &next,
                    "Unexpected ',' after a value with no '='! Expected '=' before a list of values.",
                ));
            }
            _ => {
                trace!(name = %name_id, "flag value");
                return Ok(());
            }
        }
        self.pos += 1;

        let mut prev = name_id;
        let mut separator = next;

        loop {
            let (id, data) = self.peek();
            let Some(id) = id.filter(|_| data.kind.is_literal()) else {
                let symbol = if separator.kind == TokenKind::Equals { '=' } else { ',' };
                return Err(self
                    .error(
                        separator.end,
                        format!(
                            "Expected a value after '{}' but found {}!",
                            symbol,
                            data.kind.describe()
                        ),
                    )
                    .with_span(name.begin.offset..separator.end.offset));
            };
            self.pos += 1;
            self.arena.link_data(prev, id);
            prev = id;

            let (_, after) = self.peek();
            if after.kind != TokenKind::NextValue {
                return Ok(());
            }
            self.pos += 1;
            separator = after;
        }
    }
}
