//! Recursive descent parser for Ember.
//!
//! Produces a flat AST in an `ExprArena`. Entry points:
//!
//! - [`parse_script`]: a statement sequence (the script form)
//! - [`parse_expression`]: a single expression, no statements
//!
//! Both fail with a [`ParseError`]; parsing never succeeds partially.

mod cursor;
mod error;
mod grammar;

pub use cursor::Cursor;
pub use error::{ParseError, ParseErrorKind};

use ember_ir::ast::{Expr, ExprKind, Pragma};
use ember_ir::{ArenaMark, ExprArena, ExprId, Span, StringInterner, TokenKind, TokenList};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Output of a successful parse.
#[derive(Debug)]
pub struct ParsedScript {
    pub arena: ExprArena,
    /// Root node: a `Sequence` for scripts, the expression itself otherwise.
    pub root: ExprId,
    pub pragmas: Vec<Pragma>,
}

/// Parse source text as a script.
pub fn parse_script(source: &str, interner: &StringInterner) -> Result<ParsedScript, ParseError> {
    let tokens = ember_lexer::lex(source, interner)?;
    let mut parser = Parser::new(&tokens, interner, ExprArena::with_capacity(source.len()));
    let root = parser.parse_program()?;
    debug!(
        nodes = parser.arena.expr_count(),
        pragmas = parser.pragmas.len(),
        "parsed script"
    );
    Ok(parser.finish(root))
}

/// Parse source text as a single expression.
pub fn parse_expression(
    source: &str,
    interner: &StringInterner,
) -> Result<ParsedScript, ParseError> {
    let tokens = ember_lexer::lex(source, interner)?;
    let mut parser = Parser::new(&tokens, interner, ExprArena::with_capacity(source.len()));
    let root = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(parser.finish(root))
}

/// Saved parser state for speculative parsing.
///
/// Unlike a bare cursor position this also captures the arena, so a failed
/// speculation leaves no orphan nodes behind.
#[derive(Clone, Copy, Debug)]
struct ParserSnapshot {
    cursor_pos: usize,
    arena: ArenaMark,
    loop_depth: u32,
}

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: ExprArena,
    pragmas: Vec<Pragma>,
    /// Enclosing loops in the current function body.
    loop_depth: u32,
    /// Positions of `{` groups already found not to parse as literals.
    failed_literals: FxHashSet<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner, arena: ExprArena) -> Self {
        Parser {
            cursor: Cursor::new(tokens, interner),
            arena,
            pragmas: Vec::new(),
            loop_depth: 0,
            failed_literals: FxHashSet::default(),
        }
    }

    fn finish(self, root: ExprId) -> ParsedScript {
        ParsedScript {
            arena: self.arena,
            root,
            pragmas: self.pragmas,
        }
    }

    // ===== Cursor delegation =====

    #[inline]
    fn current_kind(&self) -> TokenKind {
        self.cursor.current_kind()
    }

    #[inline]
    fn current_span(&self) -> Span {
        self.cursor.current_span()
    }

    #[inline]
    fn previous_span(&self) -> Span {
        self.cursor.previous_span()
    }

    #[inline]
    fn check(&self, kind: TokenKind) -> bool {
        self.cursor.check(kind)
    }

    #[inline]
    fn advance(&mut self) {
        self.cursor.advance();
    }

    #[inline]
    fn eat(&mut self, kind: TokenKind) -> bool {
        self.cursor.eat(kind)
    }

    #[inline]
    fn expect(&mut self, kind: TokenKind) -> Result<Span, ParseError> {
        self.cursor.expect(kind)
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.cursor.is_at_end() {
            Ok(())
        } else {
            Err(ParseError::unexpected(
                self.current_kind(),
                "end of input",
                self.current_span(),
            ))
        }
    }

    // ===== Arena helpers =====

    #[inline]
    fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, span))
    }

    #[inline]
    fn span_of(&self, id: ExprId) -> Span {
        self.arena.get_expr(id).span
    }

    // ===== Speculation =====

    fn snapshot(&self) -> ParserSnapshot {
        ParserSnapshot {
            cursor_pos: self.cursor.position(),
            arena: self.arena.mark(),
            loop_depth: self.loop_depth,
        }
    }

    fn restore(&mut self, snapshot: ParserSnapshot) {
        self.cursor.set_position(snapshot.cursor_pos);
        self.arena.truncate(snapshot.arena);
        self.loop_depth = snapshot.loop_depth;
    }

    /// Run `f`; on failure, rewind to where it started and return `None`.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Option<T> {
        let snapshot = self.snapshot();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.restore(snapshot);
                None
            }
        }
    }

    /// Parse a fragment lexed separately (template interpolation) into this
    /// parser's arena.
    fn parse_embedded(&mut self, tokens: &TokenList) -> Result<ExprId, ParseError> {
        let arena = std::mem::take(&mut self.arena);
        let mut sub = Parser::new(tokens, self.cursor.interner(), arena);
        let result = sub.parse_expr().and_then(|id| sub.expect_end().map(|()| id));
        self.arena = sub.arena;
        result
    }
}
