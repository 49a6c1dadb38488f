//! Parse errors.

use std::fmt;

use ember_ir::{Span, TokenKind};
use ember_lexer::{LexError, LexErrorKind};

/// What went wrong while parsing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParseErrorKind {
    /// The lexer rejected the source.
    Lex(LexErrorKind),
    UnexpectedToken,
    ExpectedExpression,
    ExpectedIdentifier,
    InvalidAssignmentTarget,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    /// Parameter type annotation that is not a primitive type.
    UnknownType,
    /// `...` on a parameter other than the last.
    VariadicNotLast,
    /// `try` without `catch` or `finally`.
    TryWithoutHandler,
    /// `@name` other than `@synchronized`.
    UnknownAnnotation,
    InvalidPragma,
}

/// Parse failure with location.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[cold]
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
        }
    }

    #[cold]
    pub fn unexpected(found: TokenKind, expected: &str, span: Span) -> Self {
        ParseError::new(
            ParseErrorKind::UnexpectedToken,
            format!("expected {expected}, found {}", found.describe()),
            span,
        )
    }

    #[cold]
    pub fn expected_expression(found: TokenKind, span: Span) -> Self {
        ParseError::new(
            ParseErrorKind::ExpectedExpression,
            format!("expected expression, found {}", found.describe()),
            span,
        )
    }

    #[cold]
    pub fn invalid_assignment_target(span: Span) -> Self {
        ParseError::new(
            ParseErrorKind::InvalidAssignmentTarget,
            "invalid assignment target",
            span,
        )
    }

    #[cold]
    pub fn outside_loop(keyword: TokenKind, span: Span) -> Self {
        let kind = if keyword == TokenKind::Break {
            ParseErrorKind::BreakOutsideLoop
        } else {
            ParseErrorKind::ContinueOutsideLoop
        };
        ParseError::new(kind, format!("`{}` outside of a loop", keyword.symbol()), span)
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message(),
            span: err.span,
            kind: ParseErrorKind::Lex(err.kind),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}
