//! Expression and statement nodes.
//!
//! The language does not separate statements from expressions at the node
//! level: every statement evaluates to a value (loops to null, blocks to their
//! last executed statement), so both live in one `ExprKind`.

use std::fmt;

use super::operators::{BinaryOp, DeclKind, UnaryOp, UpdateOp};
use crate::{ExprId, ExprRange, Name, Span};

/// AST node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Index into the arena's function table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionId(pub(crate) u32);

impl FunctionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the arena's try table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TryId(pub(crate) u32);

impl TryId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds.
///
/// Optional children use `ExprId::INVALID`. Ranges index the arena table
/// named in each variant's doc.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    // Literals
    Null,
    Bool(bool),
    Int(i64),
    /// Float literal, stored as bits.
    Float(u64),
    /// String literal. One value per distinct text per script.
    Str(Name),
    /// Template string; range into template parts.
    Template(ExprRange),
    Ident(Name),
    /// `[a, b, ...]`; range into expression lists.
    Array(ExprRange),
    /// `{a, b, ...}`; range into expression lists.
    Set(ExprRange),
    /// `{k: v, ...}` / `{:}`; range into map entries.
    Map(ExprRange),
    /// `a .. b`
    Range { start: ExprId, end: ExprId },

    // Operators
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `===` / `!==`
    Identity {
        negated: bool,
        left: ExprId,
        right: ExprId,
    },
    /// `++x`, `x--`, ...
    Update {
        op: UpdateOp,
        prefix: bool,
        target: ExprId,
    },
    Ternary {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
    /// `a ?: b`
    Elvis { left: ExprId, right: ExprId },
    /// `a ?? b`
    Coalesce { left: ExprId, right: ExprId },
    Empty(ExprId),
    Size(ExprId),
    /// `*x`
    Deref(ExprId),

    // Assignment
    Assign { target: ExprId, value: ExprId },
    CompoundAssign {
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    },

    // Access
    Member {
        receiver: ExprId,
        name: Name,
        safe: bool,
    },
    Index {
        receiver: ExprId,
        index: ExprId,
        safe: bool,
    },
    /// Range into expression lists.
    Call { callee: ExprId, args: ExprRange },
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
        safe: bool,
    },
    /// `new(type, args...)`; range into expression lists, type first.
    New(ExprRange),
    Lambda(FunctionId),

    // Statements
    /// Statements evaluated in the current frame (script and function bodies).
    Sequence(ExprRange),
    /// `{ ... }` statement block; opens a child frame.
    Block(ExprRange),
    /// Empty statement.
    Nop,
    Declare {
        kind: DeclKind,
        name: Name,
        init: ExprId,
    },
    /// `function name(...) { ... }`
    FunctionDecl { name: Name, func: FunctionId },
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
    While { cond: ExprId, body: ExprId },
    DoWhile { body: ExprId, cond: ExprId },
    For {
        init: ExprId,
        cond: ExprId,
        step: ExprId,
        body: ExprId,
    },
    /// `for (var x : it)`, `for (let x : it)`, `for (x : it)`
    ForEach {
        decl: Option<DeclKind>,
        var: Name,
        iterable: ExprId,
        body: ExprId,
    },
    Break,
    Continue,
    Return(ExprId),
    Try(TryId),
    Throw(ExprId),
    Assert { cond: ExprId, message: ExprId },
    /// `@synchronized [(monitor)] body`
    Synchronized { monitor: ExprId, body: ExprId },
}

impl ExprKind {
    /// Whether the node denotes an assignable location.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            ExprKind::Ident(_)
                | ExprKind::Member { safe: false, .. }
                | ExprKind::Index { safe: false, .. }
                | ExprKind::Deref(_)
        )
    }
}

/// Primitive type annotation on a parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ParamType {
    #[default]
    Any,
    Int,
    Long,
    Short,
    Byte,
    Double,
    Float,
    Boolean,
    Char,
}

impl ParamType {
    pub fn from_keyword(word: &str) -> Option<ParamType> {
        Some(match word {
            "int" => ParamType::Int,
            "long" => ParamType::Long,
            "short" => ParamType::Short,
            "byte" => ParamType::Byte,
            "double" => ParamType::Double,
            "float" => ParamType::Float,
            "boolean" => ParamType::Boolean,
            "char" => ParamType::Char,
            _ => return None,
        })
    }

    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            ParamType::Any => None,
            ParamType::Int => Some("int"),
            ParamType::Long => Some("long"),
            ParamType::Short => Some("short"),
            ParamType::Byte => Some("byte"),
            ParamType::Double => Some("double"),
            ParamType::Float => Some("float"),
            ParamType::Boolean => Some("boolean"),
            ParamType::Char => Some("char"),
        }
    }
}

/// Function or lambda parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: ParamType,
    /// Only valid on the last parameter.
    pub variadic: bool,
}

/// Function body shape, kept for printing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionStyle {
    /// `function (a) { ... }`
    Keyword,
    /// `(a) -> body`
    Arrow,
    /// `(a) => body`
    FatArrow,
}

/// Function or lambda definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionDef {
    pub name: Option<Name>,
    /// Range into parameters.
    pub params: ExprRange,
    pub body: ExprId,
    pub style: FunctionStyle,
    pub span: Span,
}

/// `try` statement parts.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TryClause {
    pub body: ExprId,
    /// Name bound in the catch frame; `e` for a bare `catch { }`.
    pub catch_binding: Name,
    pub catch_body: ExprId,
    pub finally_body: ExprId,
}

/// Map literal entry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MapEntry {
    pub key: ExprId,
    pub value: ExprId,
}

/// Template string part.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TemplatePart {
    Text(Name),
    Expr(ExprId),
}

/// `#pragma key value`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Pragma {
    pub key: Name,
    pub value: PragmaValue,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PragmaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Name),
    /// Dotted identifier path.
    Ident(Name),
}
