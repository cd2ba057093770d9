use std::fmt;

use crate::token::Token;

/// Index of a token within a [`TokenArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(usize);

impl TokenId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only token storage with two independent forward relations.
///
/// `next` chains header tokens (or value-name tokens) of a block, `next_data`
/// chains the data tokens assigned to a value. Links always point forward in
/// the arena, so walking either chain terminates.
#[derive(Debug, Clone, Default)]
pub struct TokenArena {
    tokens: Vec<Token>,
    next: Vec<Option<TokenId>>,
    next_data: Vec<Option<TokenId>>,
}

impl TokenArena {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let len = tokens.len();
        TokenArena {
            tokens,
            next: vec![None; len],
            next_data: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The id of the token at `index`, if it is in range.
    pub fn id(&self, index: usize) -> Option<TokenId> {
        (index < self.tokens.len()).then_some(TokenId(index))
    }

    /// `None` for an id that belongs to a larger arena.
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.0)
    }

    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.next.get(id.0).copied().flatten()
    }

    pub fn next_data(&self, id: TokenId) -> Option<TokenId> {
        self.next_data.get(id.0).copied().flatten()
    }

    /// Lookup for ids produced by this arena's own chains.
    pub(crate) fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.0]
    }

    pub(crate) fn link_next(&mut self, from: TokenId, to: TokenId) {
        debug_assert!(from < to, "chain links must point forward");
        self.next[from.0] = Some(to);
    }

    pub(crate) fn link_data(&mut self, from: TokenId, to: TokenId) {
        debug_assert!(from < to, "data links must point forward");
        self.next_data[from.0] = Some(to);
    }
}
