//! Lexer error types.

use std::fmt;

use ember_ir::Span;

/// A lexer error: what went wrong and where.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

/// What kind of lexer error occurred.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LexErrorKind {
    /// A character that starts no token.
    UnexpectedCharacter(char),
    UnterminatedString,
    UnterminatedTemplate,
    UnterminatedComment,
    /// Unknown escape such as `\q`.
    InvalidEscape { escape_char: char },
    /// `\u` not followed by four hex digits naming a scalar value.
    InvalidUnicodeEscape,
    /// `${` without a matching `}` inside a template.
    UnterminatedInterpolation,
    /// Integer literal does not fit in 64 bits.
    IntOverflow,
    FloatParseError,
    /// Source longer than `u32::MAX` bytes.
    SourceTooLarge,
    /// More distinct names than one interner shard can number.
    TooManyNames,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError { span, kind }
    }

    #[cold]
    pub fn invalid_escape(span: Span, escape_char: char) -> Self {
        LexError::new(LexErrorKind::InvalidEscape { escape_char }, span)
    }

    #[cold]
    pub fn too_many_names(span: Span) -> Self {
        LexError::new(LexErrorKind::TooManyNames, span)
    }

    /// Human-readable message, without location.
    pub fn message(&self) -> String {
        match &self.kind {
            LexErrorKind::UnexpectedCharacter(c) => format!("unexpected character '{c}'"),
            LexErrorKind::UnterminatedString => "unterminated string literal".to_owned(),
            LexErrorKind::UnterminatedTemplate => "unterminated template literal".to_owned(),
            LexErrorKind::UnterminatedComment => "unterminated block comment".to_owned(),
            LexErrorKind::InvalidEscape { escape_char } => {
                format!("invalid escape sequence '\\{escape_char}'")
            }
            LexErrorKind::InvalidUnicodeEscape => "invalid unicode escape".to_owned(),
            LexErrorKind::UnterminatedInterpolation => {
                "unterminated '${' interpolation in template".to_owned()
            }
            LexErrorKind::IntOverflow => "integer literal out of range".to_owned(),
            LexErrorKind::FloatParseError => "malformed float literal".to_owned(),
            LexErrorKind::SourceTooLarge => "source exceeds 4 GiB".to_owned(),
            LexErrorKind::TooManyNames => "too many distinct names in source".to_owned(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message(), self.span)
    }
}

impl std::error::Error for LexError {}
