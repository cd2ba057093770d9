pub mod linked;

pub use linked::{Links, TokenRef};

use crate::arena::{TokenArena, TokenId};
use crate::block::{Block, BlockRef};
use crate::parser::{ParseError, Parser};
use crate::token::Token;

/// The result of parsing MAPINFO: the source text, every token, and the blocks
/// referencing them. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    source_id: usize,
    arena: TokenArena,
    blocks: Vec<Block>,
}

impl Document {
    pub(crate) fn new(source: String, source_id: usize, arena: TokenArena, blocks: Vec<Block>) -> Self {
        Document {
            source,
            source_id,
            arena,
            blocks,
        }
    }

    /// Parse `source` with the default lexical options.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        Parser::new(source.into(), 0).parse()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The file ID (for error reporting with codespan-reporting).
    pub fn source_id(&self) -> usize {
        self.source_id
    }

    pub fn arena(&self) -> &TokenArena {
        &self.arena
    }

    /// Every token in document order, punctuation included.
    pub fn tokens(&self) -> &[Token] {
        self.arena.tokens()
    }

    /// The linked view of `id`, or `None` if `id` is out of range for this document.
    pub fn token(&self, id: TokenId) -> Option<TokenRef<'_>> {
        self.arena.get(id).map(|_| TokenRef::new(self, id))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> Option<BlockRef<'_>> {
        self.blocks
            .get(index)
            .map(|block| BlockRef::new(self, block, index))
    }

    pub fn blocks(&self) -> impl ExactSizeIterator<Item = BlockRef<'_>> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockRef::new(self, block, index))
    }

    /// Blocks whose type name matches `name` (case-insensitive), in document order.
    pub fn blocks_of_type<'a>(&'a self, name: &'a str) -> impl Iterator<Item = BlockRef<'a>> {
        self.blocks().filter(move |block| block.is_type(name))
    }
}
