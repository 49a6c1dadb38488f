//! Expression parsing: assignment, conditional, binary, unary, postfix.
//!
//! Binary operators use precedence climbing over `BinaryOp::precedence`;
//! identity comparison shares the equality level and ranges sit between
//! relational and shift operators.

use ember_ir::ast::{BinaryOp, ExprKind, UnaryOp, UpdateOp};
use ember_ir::{ExprId, TokenKind};
use ember_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

/// Precedence of `..`.
const RANGE_PRECEDENCE: u8 = 8;

/// Operator found in binary position.
#[derive(Copy, Clone)]
enum InfixOp {
    Binary(BinaryOp),
    Identity { negated: bool },
    Range,
}

impl InfixOp {
    fn precedence(self) -> u8 {
        match self {
            InfixOp::Binary(op) => op.precedence(),
            InfixOp::Identity { .. } => BinaryOp::Eq.precedence(),
            InfixOp::Range => RANGE_PRECEDENCE,
        }
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::PipePipe | TokenKind::Or => BinaryOp::Or,
        TokenKind::AmpAmp | TokenKind::And => BinaryOp::And,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::EqEq | TokenKind::EqWord => BinaryOp::Eq,
        TokenKind::NotEq | TokenKind::NeWord => BinaryOp::NotEq,
        TokenKind::Match => BinaryOp::Match,
        TokenKind::NotMatch => BinaryOp::NotMatch,
        TokenKind::StartsWith => BinaryOp::StartsWith,
        TokenKind::NotStartsWith => BinaryOp::NotStartsWith,
        TokenKind::EndsWith => BinaryOp::EndsWith,
        TokenKind::NotEndsWith => BinaryOp::NotEndsWith,
        TokenKind::Lt | TokenKind::LtWord => BinaryOp::Lt,
        TokenKind::LtEq | TokenKind::LeWord => BinaryOp::LtEq,
        TokenKind::Gt | TokenKind::GtWord => BinaryOp::Gt,
        TokenKind::GtEq | TokenKind::GeWord => BinaryOp::GtEq,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        TokenKind::Ushr => BinaryOp::Ushr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash | TokenKind::DivWord => BinaryOp::Div,
        TokenKind::Percent | TokenKind::ModWord => BinaryOp::Mod,
        TokenKind::EqEqEq => return Some(InfixOp::Identity { negated: false }),
        TokenKind::NotEqEq => return Some(InfixOp::Identity { negated: true }),
        TokenKind::DotDot => return Some(InfixOp::Range),
        _ => return None,
    };
    Some(InfixOp::Binary(op))
}

fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PlusAssign => BinaryOp::Add,
        TokenKind::MinusAssign => BinaryOp::Sub,
        TokenKind::StarAssign => BinaryOp::Mul,
        TokenKind::SlashAssign => BinaryOp::Div,
        TokenKind::PercentAssign => BinaryOp::Mod,
        TokenKind::AmpAssign => BinaryOp::BitAnd,
        TokenKind::PipeAssign => BinaryOp::BitOr,
        TokenKind::CaretAssign => BinaryOp::BitXor,
        TokenKind::ShlAssign => BinaryOp::Shl,
        TokenKind::ShrAssign => BinaryOp::Shr,
        TokenKind::UshrAssign => BinaryOp::Ushr,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parse an expression (assignment level).
    pub(crate) fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    fn parse_assignment(&mut self) -> Result<ExprId, ParseError> {
        let target = self.parse_conditional()?;
        let kind = self.current_kind();

        let compound = compound_op(kind);
        if kind != TokenKind::Assign && compound.is_none() {
            return Ok(target);
        }
        if !self.arena.get_expr(target).kind.is_assignable() {
            return Err(ParseError::invalid_assignment_target(self.span_of(target)));
        }
        self.advance();
        let value = self.parse_expr()?;
        let span = self.span_of(target).merge(self.span_of(value));
        let node = match compound {
            Some(op) => ExprKind::CompoundAssign { op, target, value },
            None => ExprKind::Assign { target, value },
        };
        Ok(self.alloc(node, span))
    }

    /// `c ? a : b`, `a ?: b`, `a ?? b` (right associative).
    fn parse_conditional(&mut self) -> Result<ExprId, ParseError> {
        let left = self.parse_binary(1)?;
        match self.current_kind() {
            TokenKind::Question => {
                self.advance();
                let then_branch = self.parse_conditional()?;
                self.expect(TokenKind::Colon)?;
                let else_branch = self.parse_conditional()?;
                let span = self.span_of(left).merge(self.span_of(else_branch));
                Ok(self.alloc(
                    ExprKind::Ternary {
                        cond: left,
                        then_branch,
                        else_branch,
                    },
                    span,
                ))
            }
            TokenKind::Elvis => {
                self.advance();
                let right = self.parse_conditional()?;
                let span = self.span_of(left).merge(self.span_of(right));
                Ok(self.alloc(ExprKind::Elvis { left, right }, span))
            }
            TokenKind::NullCoalesce => {
                self.advance();
                let right = self.parse_conditional()?;
                let span = self.span_of(left).merge(self.span_of(right));
                Ok(self.alloc(ExprKind::Coalesce { left, right }, span))
            }
            _ => Ok(left),
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<ExprId, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = infix_op(self.current_kind()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = ensure_sufficient_stack(|| self.parse_binary(precedence + 1))?;
            let span = self.span_of(left).merge(self.span_of(right));
            let node = match op {
                InfixOp::Binary(op) => ExprKind::Binary { op, left, right },
                InfixOp::Identity { negated } => ExprKind::Identity {
                    negated,
                    left,
                    right,
                },
                InfixOp::Range => ExprKind::Range {
                    start: left,
                    end: right,
                },
            };
            left = self.alloc(node, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_unary_inner())
    }

    fn parse_unary_inner(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        let unary = match self.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang | TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(self.span_of(operand));
            return Ok(self.alloc(ExprKind::Unary { op, operand }, span));
        }

        match self.current_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.current_kind() == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let target = self.parse_unary()?;
                if !self.arena.get_expr(target).kind.is_assignable() {
                    return Err(ParseError::invalid_assignment_target(self.span_of(target)));
                }
                let span = start.merge(self.span_of(target));
                Ok(self.alloc(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target,
                    },
                    span,
                ))
            }
            TokenKind::Star => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = start.merge(self.span_of(operand));
                Ok(self.alloc(ExprKind::Deref(operand), span))
            }
            TokenKind::Empty | TokenKind::Size
                if self.cursor.peek_kind(1) == TokenKind::LParen =>
            {
                let is_empty = self.current_kind() == TokenKind::Empty;
                self.advance();
                self.expect(TokenKind::LParen)?;
                let operand = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen)?;
                let kind = if is_empty {
                    ExprKind::Empty(operand)
                } else {
                    ExprKind::Size(operand)
                };
                let node = self.alloc(kind, start.merge(end));
                self.parse_postfix(node)
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    /// Member access, indexing, calls and postfix `++`/`--`.
    pub(crate) fn parse_postfix(&mut self, mut expr: ExprId) -> Result<ExprId, ParseError> {
        loop {
            let start = self.span_of(expr);
            match self.current_kind() {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let safe = self.current_kind() == TokenKind::QuestionDot;
                    self.advance();
                    if safe && self.check(TokenKind::LBracket) {
                        expr = self.parse_index(expr, true)?;
                        continue;
                    }
                    if let TokenKind::Int(n) = self.current_kind() {
                        // `list.0`
                        let index_span = self.current_span();
                        self.advance();
                        let index = self.alloc(ExprKind::Int(n), index_span);
                        expr = self.alloc(
                            ExprKind::Index {
                                receiver: expr,
                                index,
                                safe,
                            },
                            start.merge(index_span),
                        );
                        continue;
                    }
                    let (name, name_span) = self.cursor.expect_member_name()?;
                    if self.check(TokenKind::LParen) {
                        let (args, end) = self.parse_call_args()?;
                        expr = self.alloc(
                            ExprKind::MethodCall {
                                receiver: expr,
                                method: name,
                                args,
                                safe,
                            },
                            start.merge(end),
                        );
                    } else {
                        expr = self.alloc(
                            ExprKind::Member {
                                receiver: expr,
                                name,
                                safe,
                            },
                            start.merge(name_span),
                        );
                    }
                }
                TokenKind::LBracket => expr = self.parse_index(expr, false)?,
                TokenKind::LParen => {
                    let (args, end) = self.parse_call_args()?;
                    expr = self.alloc(ExprKind::Call { callee: expr, args }, start.merge(end));
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus
                    if self.arena.get_expr(expr).kind.is_assignable() =>
                {
                    let op = if self.current_kind() == TokenKind::PlusPlus {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    let end = self.current_span();
                    self.advance();
                    expr = self.alloc(
                        ExprKind::Update {
                            op,
                            prefix: false,
                            target: expr,
                        },
                        start.merge(end),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_index(&mut self, receiver: ExprId, safe: bool) -> Result<ExprId, ParseError> {
        let start = self.span_of(receiver);
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_expr()?;
        let end = self.expect(TokenKind::RBracket)?;
        Ok(self.alloc(
            ExprKind::Index {
                receiver,
                index,
                safe,
            },
            start.merge(end),
        ))
    }

    /// `( args )`, returning the argument list and the closing span.
    pub(crate) fn parse_call_args(
        &mut self,
    ) -> Result<(ember_ir::ExprRange, ember_ir::Span), ParseError> {
        self.expect(TokenKind::LParen)?;
        let args = self.parse_comma_list(TokenKind::RParen)?;
        let end = self.expect(TokenKind::RParen)?;
        Ok((self.arena.alloc_expr_list(args), end))
    }

    /// Comma separated expressions up to `end`, allowing a trailing comma.
    pub(crate) fn parse_comma_list(&mut self, end: TokenKind) -> Result<Vec<ExprId>, ParseError> {
        let mut items = Vec::new();
        while !self.check(end) {
            items.push(self.parse_expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}
