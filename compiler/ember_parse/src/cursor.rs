//! Token cursor for navigating the token stream.

use ember_ir::{Name, Span, StringInterner, Token, TokenKind, TokenList};
use ember_lexer::LexError;
use tracing::trace;

use crate::ParseError;

/// Position in a token stream whose last token is always `Eof`.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    pos: usize,
    /// For each opening bracket, the index of its closing partner.
    closers: Vec<usize>,
}

const UNMATCHED: usize = usize::MAX;

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        Cursor {
            tokens,
            interner,
            pos: 0,
            closers: match_brackets(tokens),
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Restore a position saved with [`Cursor::position`].
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos < self.tokens.len(), "cursor position out of bounds");
        self.pos = pos;
    }

    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    #[inline]
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Whether the current token is the same variant as `kind`.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_kind().same_kind(&kind)
    }

    /// Move to the next token. Never moves past `Eof`.
    #[inline]
    pub fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            trace!(expected = ?kind, found = ?self.current_kind(), "expect failed");
            Err(ParseError::unexpected(
                self.current_kind(),
                &format!("`{}`", kind.symbol()),
                self.current_span(),
            ))
        }
    }

    /// Consume an identifier.
    pub fn expect_ident(&mut self) -> Result<(Name, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let span = self.current_span();
                self.advance();
                Ok((name, span))
            }
            other => Err(ParseError::new(
                crate::ParseErrorKind::ExpectedIdentifier,
                format!("expected identifier, found {}", other.describe()),
                self.current_span(),
            )),
        }
    }

    /// Intern `text` into this parse's table.
    pub fn intern(&self, text: &str) -> Result<Name, ParseError> {
        self.interner
            .try_intern(text)
            .map_err(|_| LexError::too_many_names(self.current_span()).into())
    }

    /// Consume a member name after `.`: identifiers and keywords alike.
    pub fn expect_member_name(&mut self) -> Result<(Name, Span), ParseError> {
        let kind = self.current_kind();
        let name = match kind {
            TokenKind::Ident(name) => name,
            _ if !kind.symbol().is_empty() && kind.symbol().chars().all(char::is_alphabetic) => {
                self.intern(kind.symbol())?
            }
            other => {
                return Err(ParseError::new(
                    crate::ParseErrorKind::ExpectedIdentifier,
                    format!("expected member name, found {}", other.describe()),
                    self.current_span(),
                ))
            }
        };
        let span = self.current_span();
        self.advance();
        Ok((name, span))
    }

    /// Index of the `)` matching the `(` at the current position.
    pub fn matching_paren(&self) -> Option<usize> {
        if self.current_kind() == TokenKind::LParen {
            self.matching_close(self.pos)
        } else {
            None
        }
    }

    /// Index of the bracket closing the one at `index`, if that token opens
    /// a balanced group.
    pub fn matching_close(&self, index: usize) -> Option<usize> {
        self.closers
            .get(index)
            .copied()
            .filter(|&close| close != UNMATCHED)
    }

    /// Kind of the token at an absolute index.
    pub fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens.get(index).map_or(TokenKind::Eof, |t| t.kind)
    }
}

/// Pair every `(`, `[` and `{` with its closing bracket in one pass.
fn match_brackets(tokens: &TokenList) -> Vec<usize> {
    let mut closers = vec![UNMATCHED; tokens.len()];
    let mut open: Vec<(usize, TokenKind)> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        let opener = match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                open.push((index, token.kind));
                continue;
            }
            TokenKind::RParen => TokenKind::LParen,
            TokenKind::RBracket => TokenKind::LBracket,
            TokenKind::RBrace => TokenKind::LBrace,
            _ => continue,
        };
        // A stray closer leaves the enclosing groups unmatched.
        match open.pop() {
            Some((start, kind)) if kind == opener => closers[start] = index,
            Some(_) => open.clear(),
            None => {}
        }
    }
    closers
}
