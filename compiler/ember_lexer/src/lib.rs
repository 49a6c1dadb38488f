//! Lexer for Ember using logos with string interning.
//!
//! Produces a `TokenList` terminated by `Eof`. Whitespace and comments
//! (`// ...`, `## ...`, `/* ... */`) are skipped. String literals are cooked
//! and interned here; template bodies are passed through raw and split by the
//! parser with [`split_template`].

mod cook_escape;
mod lex_error;
mod template;

use logos::Logos;

use ember_ir::{Name, Span, StringInterner, Token, TokenKind, TokenList};

pub use cook_escape::cook;
pub use lex_error::{LexError, LexErrorKind};
pub use template::{split_template, TemplateSegment};

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"##[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,

    #[token("/*")]
    UnterminatedComment,

    // === Keywords ===
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("function")]
    Function,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("assert")]
    Assert,
    #[token("new")]
    New,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("empty")]
    Empty,
    #[token("size")]
    Size,

    // === Word operators ===
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("eq")]
    EqWord,
    #[token("ne")]
    NeWord,
    #[token("lt")]
    LtWord,
    #[token("le")]
    LeWord,
    #[token("gt")]
    GtWord,
    #[token("ge")]
    GeWord,
    #[token("div")]
    DivWord,
    #[token("mod")]
    ModWord,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?.")]
    QuestionDot,
    #[token("?")]
    Question,
    #[token("?:")]
    Elvis,
    #[token("??")]
    NullCoalesce,
    #[token("@")]
    At,
    #[token("#pragma")]
    Pragma,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,

    // === Assignment ===
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("&=")]
    AmpAssign,
    #[token("|=")]
    PipeAssign,
    #[token("^=")]
    CaretAssign,
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token(">>>=")]
    UshrAssign,

    // === Operators ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("=~")]
    Match,
    #[token("!~")]
    NotMatch,
    #[token("=^")]
    StartsWith,
    #[token("!^")]
    NotStartsWith,
    #[token("=$")]
    EndsWith,
    #[token("!$")]
    NotEndsWith,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    Ushr,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F]+[lL]?")]
    HexInt,

    #[regex(r"[0-9]+[lL]?")]
    Int,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[dDfF]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[dDfF]?")]
    #[regex(r"[0-9]+[dDfF]")]
    Float,

    #[regex(r#"'([^'\\]|\\(.|\n))*'"#)]
    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    Str,

    #[token("`", lex_template)]
    Template,

    #[token("'")]
    #[token("\"")]
    UnterminatedString,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
}

/// Consume a template after its opening backtick, up to and including the
/// closing one. Interpolations may hold strings and further templates.
fn lex_template(lex: &mut logos::Lexer<RawToken>) -> bool {
    match template::template_len(lex.remainder().as_bytes()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Lex source text into a `TokenList`.
pub fn lex(source: &str, interner: &StringInterner) -> Result<TokenList, LexError> {
    lex_at(source, interner, 0)
}

/// Lex a fragment whose first byte sits at `base_offset` in the enclosing
/// source (template interpolations).
pub fn lex_at(
    source: &str,
    interner: &StringInterner,
    base_offset: u32,
) -> Result<TokenList, LexError> {
    let end = u32::try_from(source.len())
        .ok()
        .and_then(|len| base_offset.checked_add(len))
        .ok_or(LexError::new(LexErrorKind::SourceTooLarge, Span::DUMMY))?;

    let mut result = TokenList::with_capacity(source.len() / 3 + 1);
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let range = logos.span();
        let span = Span::rebased(range, base_offset)
            .ok_or(LexError::new(LexErrorKind::SourceTooLarge, Span::DUMMY))?;
        let slice = logos.slice();

        let raw = match token_result {
            Ok(raw) => raw,
            Err(()) if slice.starts_with('`') => {
                return Err(LexError::new(LexErrorKind::UnterminatedTemplate, span));
            }
            Err(()) => {
                let c = slice.chars().next().unwrap_or('\0');
                return Err(LexError::new(LexErrorKind::UnexpectedCharacter(c), span));
            }
        };
        let kind = convert_token(raw, slice, span, interner)?;
        result.push(Token::new(kind, span));
    }

    result.push(Token::new(TokenKind::Eof, Span::new(end, end)));
    Ok(result)
}

fn intern(interner: &StringInterner, text: &str, span: Span) -> Result<Name, LexError> {
    interner
        .try_intern(text)
        .map_err(|_| LexError::too_many_names(span))
}

fn strip_suffix(slice: &str, suffixes: &[char]) -> String {
    slice
        .trim_end_matches(|c| suffixes.contains(&c))
        .replace('_', "")
}

/// Convert a raw token to a `TokenKind`, interning strings.
fn convert_token(
    raw: RawToken,
    slice: &str,
    span: Span,
    interner: &StringInterner,
) -> Result<TokenKind, LexError> {
    Ok(match raw {
        RawToken::Int => strip_suffix(slice, &['l', 'L'])
            .parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| LexError::new(LexErrorKind::IntOverflow, span))?,
        RawToken::HexInt => {
            let digits = strip_suffix(&slice[2..], &['l', 'L']);
            i64::from_str_radix(&digits, 16)
                .map(TokenKind::Int)
                .map_err(|_| LexError::new(LexErrorKind::IntOverflow, span))?
        }
        RawToken::Float => strip_suffix(slice, &['d', 'D', 'f', 'F'])
            .parse::<f64>()
            .map(|f| TokenKind::Float(f.to_bits()))
            .map_err(|_| LexError::new(LexErrorKind::FloatParseError, span))?,
        RawToken::Str => {
            let content = &slice[1..slice.len() - 1];
            let cooked = cook(content, span.start + 1)?;
            TokenKind::Str(intern(interner, cooked.as_deref().unwrap_or(content), span)?)
        }
        RawToken::Template => {
            let content = &slice[1..slice.len() - 1];
            TokenKind::Template(intern(interner, content, span)?, span.start + 1)
        }
        RawToken::Ident => TokenKind::Ident(intern(interner, slice, span)?),

        RawToken::UnterminatedString => {
            return Err(LexError::new(LexErrorKind::UnterminatedString, span))
        }
        RawToken::UnterminatedComment => {
            return Err(LexError::new(LexErrorKind::UnterminatedComment, span))
        }
        // Skipped by logos callbacks.
        RawToken::LineComment | RawToken::BlockComment => {
            return Err(LexError::new(LexErrorKind::UnexpectedCharacter('/'), span))
        }

        // Keywords
        RawToken::Var => TokenKind::Var,
        RawToken::Let => TokenKind::Let,
        RawToken::Const => TokenKind::Const,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::While => TokenKind::While,
        RawToken::Do => TokenKind::Do,
        RawToken::For => TokenKind::For,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Return => TokenKind::Return,
        RawToken::Function => TokenKind::Function,
        RawToken::Try => TokenKind::Try,
        RawToken::Catch => TokenKind::Catch,
        RawToken::Finally => TokenKind::Finally,
        RawToken::Throw => TokenKind::Throw,
        RawToken::Assert => TokenKind::Assert,
        RawToken::New => TokenKind::New,
        RawToken::Null => TokenKind::Null,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Empty => TokenKind::Empty,
        RawToken::Size => TokenKind::Size,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,
        RawToken::Not => TokenKind::Not,
        RawToken::EqWord => TokenKind::EqWord,
        RawToken::NeWord => TokenKind::NeWord,
        RawToken::LtWord => TokenKind::LtWord,
        RawToken::LeWord => TokenKind::LeWord,
        RawToken::GtWord => TokenKind::GtWord,
        RawToken::GeWord => TokenKind::GeWord,
        RawToken::DivWord => TokenKind::DivWord,
        RawToken::ModWord => TokenKind::ModWord,

        // Delimiters
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Dot => TokenKind::Dot,
        RawToken::QuestionDot => TokenKind::QuestionDot,
        RawToken::Question => TokenKind::Question,
        RawToken::Elvis => TokenKind::Elvis,
        RawToken::NullCoalesce => TokenKind::NullCoalesce,
        RawToken::At => TokenKind::At,
        RawToken::Pragma => TokenKind::Pragma,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::FatArrow => TokenKind::FatArrow,
        RawToken::DotDot => TokenKind::DotDot,
        RawToken::Ellipsis => TokenKind::Ellipsis,

        // Assignment
        RawToken::Assign => TokenKind::Assign,
        RawToken::PlusAssign => TokenKind::PlusAssign,
        RawToken::MinusAssign => TokenKind::MinusAssign,
        RawToken::StarAssign => TokenKind::StarAssign,
        RawToken::SlashAssign => TokenKind::SlashAssign,
        RawToken::PercentAssign => TokenKind::PercentAssign,
        RawToken::AmpAssign => TokenKind::AmpAssign,
        RawToken::PipeAssign => TokenKind::PipeAssign,
        RawToken::CaretAssign => TokenKind::CaretAssign,
        RawToken::ShlAssign => TokenKind::ShlAssign,
        RawToken::ShrAssign => TokenKind::ShrAssign,
        RawToken::UshrAssign => TokenKind::UshrAssign,

        // Operators
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::EqEqEq => TokenKind::EqEqEq,
        RawToken::NotEqEq => TokenKind::NotEqEq,
        RawToken::Match => TokenKind::Match,
        RawToken::NotMatch => TokenKind::NotMatch,
        RawToken::StartsWith => TokenKind::StartsWith,
        RawToken::NotStartsWith => TokenKind::NotStartsWith,
        RawToken::EndsWith => TokenKind::EndsWith,
        RawToken::NotEndsWith => TokenKind::NotEndsWith,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Amp => TokenKind::Amp,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Tilde => TokenKind::Tilde,
        RawToken::Bang => TokenKind::Bang,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::Shl => TokenKind::Shl,
        RawToken::Shr => TokenKind::Shr,
        RawToken::Ushr => TokenKind::Ushr,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::MinusMinus => TokenKind::MinusMinus,
    })
}
