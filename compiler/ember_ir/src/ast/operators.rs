//! Binary, unary and update operators.

/// Binary operators.
///
/// Short-circuiting (`&&`, `||`) is handled by the evaluator; the operator
/// itself only records which form was written.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Ushr,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // Matching
    Match,
    NotMatch,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Ushr => ">>>",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Match => "=~",
            Self::NotMatch => "!~",
            Self::StartsWith => "=^",
            Self::NotStartsWith => "!^",
            Self::EndsWith => "=$",
            Self::NotEndsWith => "!$",
        }
    }

    /// Binding strength: higher binds tighter.
    ///
    /// - 1: `||`
    /// - 2: `&&`
    /// - 3: `|`
    /// - 4: `^`
    /// - 5: `&`
    /// - 6: equality and matching
    /// - 7: relational
    /// - 9: shifts (8 is the range operator)
    /// - 10: additive
    /// - 11: multiplicative
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::BitOr => 3,
            Self::BitXor => 4,
            Self::BitAnd => 5,
            Self::Eq
            | Self::NotEq
            | Self::Match
            | Self::NotMatch
            | Self::StartsWith
            | Self::NotStartsWith
            | Self::EndsWith
            | Self::NotEndsWith => 6,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 7,
            Self::Shl | Self::Shr | Self::Ushr => 9,
            Self::Add | Self::Sub => 10,
            Self::Mul | Self::Div | Self::Mod => 11,
        }
    }

    /// Whether this operator may appear in a compound assignment (`op=`).
    pub const fn is_compound_assignable(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Mod
                | Self::BitAnd
                | Self::BitOr
                | Self::BitXor
                | Self::Shl
                | Self::Shr
                | Self::Ushr
        )
    }
}

/// Unary prefix operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x` / `not x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "~",
        }
    }
}

/// Increment / decrement.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

/// Declaration keyword.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}
