//! Ember IR: shared front-end and AST types.
//!
//! - `Span`: byte range into source text
//! - `Name` / `StringInterner`: sharded string interning
//! - `Token` / `TokenKind`: lexer output
//! - `ast`: flat node model (`Expr`, `ExprKind`, functions, try clauses)
//! - `ExprArena`: node storage
//! - `printer`: source reconstruction

mod arena;
pub mod ast;
mod expr_id;
mod interner;
mod name;
pub mod printer;
mod span;
mod token;

pub use arena::{ArenaMark, ExprArena};
pub use expr_id::{ExprId, ExprRange};
pub use interner::{InternError, StringInterner, Symbols};
pub use name::Name;
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
