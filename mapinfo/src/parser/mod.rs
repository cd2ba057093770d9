pub mod error;
mod structural;

pub use error::ParseError;

use tracing::debug;

use crate::arena::TokenArena;
use crate::document::Document;
use crate::lexer::{self, LexOptions};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: LexOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            options: LexOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LexOptions) -> Self {
        self.options = options;
        self
    }

    /// Lex and build the complete Document. The first error aborts the parse.
    pub fn parse(self) -> Result<Document, ParseError> {
        debug!(file_id = self.file_id, bytes = self.source.len(), "parsing MAPINFO");

        let (tokens, eof) = lexer::lex_all(&self.source, &self.options, self.file_id)?;
        let mut arena = TokenArena::from_tokens(tokens);
        let blocks = structural::build_blocks(&mut arena, eof, self.file_id)?;

        debug!(
            tokens = arena.len(),
            blocks = blocks.len(),
            "parsed MAPINFO"
        );
        Ok(Document::new(self.source, self.file_id, arena, blocks))
    }
}
