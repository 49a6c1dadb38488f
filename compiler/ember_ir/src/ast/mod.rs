//! Flat AST types using arena allocation.
//!
//! - `expr`: node kinds, functions, try clauses, map entries, templates
//! - `operators`: binary, unary and update operators, declaration keywords

mod expr;
mod operators;

pub use expr::{
    Expr, ExprKind, FunctionDef, FunctionId, FunctionStyle, MapEntry, Param, ParamType, Pragma,
    PragmaValue, TemplatePart, TryClause, TryId,
};
pub use operators::{BinaryOp, DeclKind, UnaryOp, UpdateOp};
