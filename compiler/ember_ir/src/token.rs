//! Tokens produced by the lexer and consumed by the parser.

use std::fmt;
use std::ops::Index;

use crate::{Name, Span};

/// A token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Token kinds.
///
/// String literals are unescaped and interned; float literals are stored as
/// bits so the type stays `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(u64),
    Str(Name),
    /// Raw template body between backticks; escapes and `${...}` are
    /// resolved by the parser. The second field is the byte offset of the
    /// body in the source.
    Template(Name, u32),
    Ident(Name),

    // Keywords
    Var,
    Let,
    Const,
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,
    Function,
    Try,
    Catch,
    Finally,
    Throw,
    Assert,
    New,
    Null,
    True,
    False,
    Empty,
    Size,
    // Word operators
    And,
    Or,
    Not,
    EqWord,
    NeWord,
    LtWord,
    LeWord,
    GtWord,
    GeWord,
    DivWord,
    ModWord,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Colon,
    Dot,
    QuestionDot,
    Question,
    Elvis,
    NullCoalesce,
    At,
    /// `#pragma`
    Pragma,
    Arrow,
    FatArrow,
    DotDot,
    Ellipsis,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    UshrAssign,

    // Operators
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Match,
    NotMatch,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AmpAmp,
    PipePipe,
    Shl,
    Shr,
    Ushr,
    PlusPlus,
    MinusMinus,

    Eof,
}

impl TokenKind {
    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::Template(..) => "template literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Eof => "end of input",
            other => other.symbol(),
        }
    }

    /// Source text of fixed tokens.
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Function => "function",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Throw => "throw",
            TokenKind::Assert => "assert",
            TokenKind::New => "new",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Empty => "empty",
            TokenKind::Size => "size",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::EqWord => "eq",
            TokenKind::NeWord => "ne",
            TokenKind::LtWord => "lt",
            TokenKind::LeWord => "le",
            TokenKind::GtWord => "gt",
            TokenKind::GeWord => "ge",
            TokenKind::DivWord => "div",
            TokenKind::ModWord => "mod",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::QuestionDot => "?.",
            TokenKind::Question => "?",
            TokenKind::Elvis => "?:",
            TokenKind::NullCoalesce => "??",
            TokenKind::At => "@",
            TokenKind::Pragma => "#pragma",
            TokenKind::Arrow => "->",
            TokenKind::FatArrow => "=>",
            TokenKind::DotDot => "..",
            TokenKind::Ellipsis => "...",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::AmpAssign => "&=",
            TokenKind::PipeAssign => "|=",
            TokenKind::CaretAssign => "^=",
            TokenKind::ShlAssign => "<<=",
            TokenKind::ShrAssign => ">>=",
            TokenKind::UshrAssign => ">>>=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::EqEqEq => "===",
            TokenKind::NotEqEq => "!==",
            TokenKind::Match => "=~",
            TokenKind::NotMatch => "!~",
            TokenKind::StartsWith => "=^",
            TokenKind::NotStartsWith => "!^",
            TokenKind::EndsWith => "=$",
            TokenKind::NotEndsWith => "!$",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Ushr => ">>>",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Template(..)
            | TokenKind::Ident(_)
            | TokenKind::Eof => "",
        }
    }

    /// Whether two kinds are the same variant, ignoring payloads.
    #[inline]
    pub fn same_kind(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Token stream. The last token is always `Eof`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TokenList {
            tokens: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl Index<usize> for TokenList {
    type Output = Token;

    #[inline]
    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_ignores_payload() {
        assert!(TokenKind::Int(1).same_kind(&TokenKind::Int(2)));
        assert!(!TokenKind::Int(1).same_kind(&TokenKind::Plus));
    }

    #[test]
    fn test_describe() {
        assert_eq!(TokenKind::UshrAssign.describe(), ">>>=");
        assert_eq!(TokenKind::Eof.describe(), "end of input");
    }
}
