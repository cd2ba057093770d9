use std::fmt;

use crate::arena::TokenId;
use crate::document::Document;
use crate::token::{Token, TokenKind};

/// A token viewed together with its chain and data links.
#[derive(Clone, Copy)]
pub struct TokenRef<'a> {
    document: &'a Document,
    id: TokenId,
}

impl<'a> TokenRef<'a> {
    pub(crate) fn new(document: &'a Document, id: TokenId) -> Self {
        TokenRef { document, id }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn token(&self) -> &'a Token {
        self.document.arena().token(self.id)
    }

    pub fn kind(&self) -> TokenKind {
        self.token().kind
    }

    /// Token text with string quotes stripped.
    pub fn text(&self) -> &'a str {
        self.token().text(self.document.source())
    }

    pub fn text_eq_ignore_case(&self, other: &str) -> bool {
        self.token().text_eq_ignore_case(self.document.source(), other)
    }

    /// See [`Token::as_number`].
    pub fn as_number(&self) -> Option<f32> {
        self.token().as_number()
    }

    /// The next header token, or the next value name.
    pub fn next(&self) -> Option<TokenRef<'a>> {
        self.document
            .arena()
            .next(self.id)
            .map(|id| TokenRef::new(self.document, id))
    }

    /// The first (or next) data token of a value.
    pub fn next_data(&self) -> Option<TokenRef<'a>> {
        self.document
            .arena()
            .next_data(self.id)
            .map(|id| TokenRef::new(self.document, id))
    }

    /// Iterates the data tokens assigned to this value name.
    pub fn data(&self) -> Links<'a> {
        Links {
            current: self.next_data(),
            relation: Relation::Data,
        }
    }

    /// How many tokens follow this one along the chain link.
    pub fn num_tokens_ahead(&self) -> usize {
        Links::chain(self.next()).count()
    }

    /// How many tokens follow this one along the data link.
    pub fn num_data_tokens_ahead(&self) -> usize {
        self.data().count()
    }
}

impl fmt::Debug for TokenRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("text", &self.text())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Chain,
    Data,
}

/// Walks one of the two link relations starting at a given token.
#[derive(Debug, Clone)]
pub struct Links<'a> {
    current: Option<TokenRef<'a>>,
    relation: Relation,
}

impl<'a> Links<'a> {
    pub(crate) fn chain(start: Option<TokenRef<'a>>) -> Self {
        Links {
            current: start,
            relation: Relation::Chain,
        }
    }
}

impl<'a> Iterator for Links<'a> {
    type Item = TokenRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = match self.relation {
            Relation::Chain => current.next(),
            Relation::Data => current.next_data(),
        };
        Some(current)
    }
}
