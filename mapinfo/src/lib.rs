//! Lexer, parser and query layer for MAPINFO, the block-structured text
//! format describing maps, episodes and related game data.
//!
//! ```text
//! Map 1 "Hangar" {
//!     Music = 1
//!     NoIntermission
//! }
//! ```

pub mod arena;
pub mod block;
pub mod document;
pub mod lexer;
pub mod parser;
pub mod small_string;
pub mod token;

pub use arena::{TokenArena, TokenId};
pub use block::{Block, BlockRef};
pub use document::{Document, Links, TokenRef};
pub use lexer::{LexOptions, Lexer, tokenize, tokenize_with};
pub use parser::{ParseError, Parser};
pub use small_string::SmallString;
pub use token::{TextLoc, Token, TokenKind};

/// Lex and build a Document from MAPINFO text with the default options.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Document::parse(source)
}
