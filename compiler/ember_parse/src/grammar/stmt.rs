//! Statement parsing.
//!
//! Statements are nodes like any other; a statement sequence becomes a
//! `Sequence` (no new frame) or a `Block` (child frame). Semicolons separate
//! statements and may be omitted where the next token cannot continue the
//! previous statement.

use ember_ir::ast::{DeclKind, ExprKind, Pragma, PragmaValue, TryClause};
use ember_ir::{ExprId, Span, TokenKind};
use ember_stack::ensure_sufficient_stack;
use tracing::trace;

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    /// Parse a whole script.
    pub(crate) fn parse_program(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        let statements = self.parse_statements(TokenKind::Eof)?;
        let span = start.merge(self.current_span());
        let list = self.arena.alloc_expr_list(statements);
        Ok(self.alloc(ExprKind::Sequence(list), span))
    }

    /// Statements up to (not including) `end`.
    pub(crate) fn parse_statements(&mut self, end: TokenKind) -> Result<Vec<ExprId>, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.check(end) || self.cursor.is_at_end() {
                break;
            }
            let stmt = self.parse_statement()?;
            if !matches!(self.arena.get_expr(stmt).kind, ExprKind::Nop) {
                statements.push(stmt);
            }
        }
        Ok(statements)
    }

    /// `{ statements }` as a block or function body.
    pub(crate) fn parse_braced_statements(&mut self) -> Result<(Vec<ExprId>, Span), ParseError> {
        let start = self.expect(TokenKind::LBrace)?;
        let statements = self.parse_statements(TokenKind::RBrace)?;
        let end = self.expect(TokenKind::RBrace)?;
        Ok((statements, start.merge(end)))
    }

    /// `{ statements }` as a `Block` node.
    pub(crate) fn parse_block(&mut self) -> Result<ExprId, ParseError> {
        let (statements, span) = self.parse_braced_statements()?;
        let list = self.arena.alloc_expr_list(statements);
        Ok(self.alloc(ExprKind::Block(list), span))
    }

    pub(crate) fn parse_statement(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.alloc(ExprKind::Nop, start))
            }
            TokenKind::LBrace => self.parse_brace_statement(),
            TokenKind::Var => self.parse_declaration(DeclKind::Var),
            TokenKind::Let => self.parse_declaration(DeclKind::Let),
            TokenKind::Const => self.parse_declaration(DeclKind::Const),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break | TokenKind::Continue => {
                let keyword = self.current_kind();
                if self.loop_depth == 0 {
                    return Err(ParseError::outside_loop(keyword, start));
                }
                self.advance();
                let kind = if keyword == TokenKind::Break {
                    ExprKind::Break
                } else {
                    ExprKind::Continue
                };
                Ok(self.alloc(kind, start))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    ExprId::INVALID
                } else {
                    self.parse_expr()?
                };
                let span = start.merge(self.previous_span());
                Ok(self.alloc(ExprKind::Return(value), span))
            }
            TokenKind::Function if matches!(self.cursor.peek_kind(1), TokenKind::Ident(_)) => {
                self.parse_function_declaration()
            }
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expr()?;
                let span = start.merge(self.span_of(value));
                Ok(self.alloc(ExprKind::Throw(value), span))
            }
            TokenKind::Assert => {
                self.advance();
                let cond = self.parse_expr()?;
                let message = if self.eat(TokenKind::Colon) {
                    self.parse_expr()?
                } else {
                    ExprId::INVALID
                };
                let span = start.merge(self.previous_span());
                Ok(self.alloc(ExprKind::Assert { cond, message }, span))
            }
            TokenKind::At => self.parse_annotated(),
            TokenKind::Pragma => self.parse_pragma(),
            _ => self.parse_expr(),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    /// A brace group in statement position.
    ///
    /// When the group reads as a set or map literal (its content is a comma
    /// separated element list with no statement terminator) it is that
    /// literal, possibly continued as an expression statement; otherwise it
    /// is a block. `{ }` is an empty block.
    ///
    /// A `;` or statement keyword at the top level of the group settles it
    /// as a block without trying the literal reading.
    fn parse_brace_statement(&mut self) -> Result<ExprId, ParseError> {
        let open = self.cursor.position();
        if self.cursor.peek_kind(1) == TokenKind::RBrace
            || self.failed_literals.contains(&open)
            || self.group_holds_statements(open)
        {
            return self.parse_block();
        }
        if let Some(expr) = self.try_parse(Parser::parse_expr) {
            trace!("brace group read as literal");
            return Ok(expr);
        }
        self.parse_block()
    }

    /// Whether the group opened at `open` has a `;` or a statement keyword
    /// outside its nested groups.
    fn group_holds_statements(&self, open: usize) -> bool {
        let Some(close) = self.cursor.matching_close(open) else {
            return false;
        };
        let mut index = open + 1;
        while index < close {
            let kind = self.cursor.kind_at(index);
            if kind == TokenKind::Semicolon || starts_statement(kind) {
                return true;
            }
            index = self.cursor.matching_close(index).unwrap_or(index) + 1;
        }
        false
    }

    fn parse_declaration(&mut self, kind: DeclKind) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let (name, _) = self.cursor.expect_ident()?;
        let init = if self.eat(TokenKind::Assign) {
            self.parse_expr()?
        } else {
            ExprId::INVALID
        };
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::Declare { kind, name, init }, span))
    }

    fn parse_condition(&mut self) -> Result<ExprId, ParseError> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    fn parse_if(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let cond = self.parse_condition()?;
        let then_branch = self.parse_statement()?;
        // `if (c) x = 1; else ...`
        if self.check(TokenKind::Semicolon) && self.cursor.peek_kind(1) == TokenKind::Else {
            self.advance();
        }
        let else_branch = if self.eat(TokenKind::Else) {
            self.parse_statement()?
        } else {
            ExprId::INVALID
        };
        let span = start.merge(self.previous_span());
        Ok(self.alloc(
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_loop_body(&mut self) -> Result<ExprId, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    fn parse_while(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let cond = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::While { cond, body }, span))
    }

    fn parse_do_while(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let body = self.parse_loop_body()?;
        if self.check(TokenKind::Semicolon) && self.cursor.peek_kind(1) == TokenKind::While {
            self.advance();
        }
        self.expect(TokenKind::While)?;
        let cond = self.parse_condition()?;
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::DoWhile { body, cond }, span))
    }

    fn parse_for(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;

        // for ([var|let] name : iterable)
        let decl_offset = usize::from(matches!(
            self.current_kind(),
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ));
        if matches!(self.cursor.peek_kind(decl_offset), TokenKind::Ident(_))
            && self.cursor.peek_kind(decl_offset + 1) == TokenKind::Colon
        {
            let decl = match self.current_kind() {
                TokenKind::Var => Some(DeclKind::Var),
                TokenKind::Let => Some(DeclKind::Let),
                TokenKind::Const => Some(DeclKind::Const),
                _ => None,
            };
            if decl.is_some() {
                self.advance();
            }
            let (var, _) = self.cursor.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let iterable = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            let body = self.parse_loop_body()?;
            let span = start.merge(self.previous_span());
            return Ok(self.alloc(
                ExprKind::ForEach {
                    decl,
                    var,
                    iterable,
                    body,
                },
                span,
            ));
        }

        // for (init; cond; step)
        let init = if self.check(TokenKind::Semicolon) {
            ExprId::INVALID
        } else {
            match self.current_kind() {
                TokenKind::Var => self.parse_declaration(DeclKind::Var)?,
                TokenKind::Let => self.parse_declaration(DeclKind::Let)?,
                TokenKind::Const => self.parse_declaration(DeclKind::Const)?,
                _ => self.parse_expr()?,
            }
        };
        self.expect(TokenKind::Semicolon)?;
        let cond = if self.check(TokenKind::Semicolon) {
            ExprId::INVALID
        } else {
            self.parse_expr()?
        };
        self.expect(TokenKind::Semicolon)?;
        let step = if self.check(TokenKind::RParen) {
            ExprId::INVALID
        } else {
            self.parse_expr()?
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Ok(self.alloc(
            ExprKind::For {
                init,
                cond,
                step,
                body,
            },
            span,
        ))
    }

    fn parse_function_declaration(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let (name, _) = self.cursor.expect_ident()?;
        let func = self.parse_keyword_function_rest(start, Some(name))?;
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::FunctionDecl { name, func }, span))
    }

    fn parse_try(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let body = self.parse_block()?;

        let mut catch_binding = self.cursor.intern("e")?;
        let mut catch_body = ExprId::INVALID;
        if self.eat(TokenKind::Catch) {
            if self.eat(TokenKind::LParen) {
                // `catch (e)`, `catch (var e)`, `catch (let e)`
                if matches!(self.current_kind(), TokenKind::Var | TokenKind::Let) {
                    self.advance();
                }
                catch_binding = self.cursor.expect_ident()?.0;
                self.expect(TokenKind::RParen)?;
            }
            catch_body = self.parse_block()?;
        }

        let finally_body = if self.eat(TokenKind::Finally) {
            self.parse_block()?
        } else {
            ExprId::INVALID
        };

        if !catch_body.is_valid() && !finally_body.is_valid() {
            return Err(ParseError::new(
                ParseErrorKind::TryWithoutHandler,
                "`try` requires `catch` or `finally`",
                start,
            ));
        }

        let id = self.arena.alloc_try(TryClause {
            body,
            catch_binding,
            catch_body,
            finally_body,
        });
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::Try(id), span))
    }

    /// `@synchronized [(monitor)] statement`
    fn parse_annotated(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let (name, name_span) = self.cursor.expect_ident()?;
        if &*self.cursor.interner().lookup(name) != "synchronized" {
            return Err(ParseError::new(
                ParseErrorKind::UnknownAnnotation,
                format!("unknown annotation `@{}`", self.cursor.interner().lookup(name)),
                start.merge(name_span),
            ));
        }
        let monitor = if self.eat(TokenKind::LParen) {
            if self.eat(TokenKind::RParen) {
                ExprId::INVALID
            } else {
                let monitor = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                monitor
            }
        } else {
            ExprId::INVALID
        };
        let body = self.parse_statement()?;
        let span = start.merge(self.previous_span());
        Ok(self.alloc(ExprKind::Synchronized { monitor, body }, span))
    }

    /// `#pragma key value`; recorded on the script, leaves a `Nop` behind.
    fn parse_pragma(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        self.advance();
        let key = self.parse_dotted_path()?;
        let value = match self.current_kind() {
            TokenKind::Null => PragmaValue::Null,
            TokenKind::True => PragmaValue::Bool(true),
            TokenKind::False => PragmaValue::Bool(false),
            TokenKind::Int(n) => PragmaValue::Int(n),
            TokenKind::Float(bits) => PragmaValue::Float(bits),
            TokenKind::Str(s) => PragmaValue::Str(s),
            TokenKind::Minus => {
                self.advance();
                match self.current_kind() {
                    TokenKind::Int(n) => PragmaValue::Int(-n),
                    TokenKind::Float(bits) => PragmaValue::Float((-f64::from_bits(bits)).to_bits()),
                    other => {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidPragma,
                            format!("expected number after `-`, found {}", other.describe()),
                            self.current_span(),
                        ))
                    }
                }
            }
            TokenKind::Ident(_) => {
                let path = self.parse_dotted_path()?;
                let span = start.merge(self.previous_span());
                self.pragmas.push(Pragma {
                    key,
                    value: PragmaValue::Ident(path),
                });
                return Ok(self.alloc(ExprKind::Nop, span));
            }
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidPragma,
                    format!("expected pragma value, found {}", other.describe()),
                    self.current_span(),
                ))
            }
        };
        self.advance();
        let span = start.merge(self.previous_span());
        self.pragmas.push(Pragma { key, value });
        Ok(self.alloc(ExprKind::Nop, span))
    }

    /// `a.b.c`, interned as one name.
    fn parse_dotted_path(&mut self) -> Result<ember_ir::Name, ParseError> {
        let (first, _) = self.cursor.expect_member_name()?;
        let interner = self.cursor.interner();
        let mut path = String::from(&*interner.lookup(first));
        while self.eat(TokenKind::Dot) {
            let (segment, _) = self.cursor.expect_member_name()?;
            path.push('.');
            path.push_str(&interner.lookup(segment));
        }
        self.cursor.intern(&path)
    }
}

/// Keywords that only begin statements, never expressions.
fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Var
            | TokenKind::Let
            | TokenKind::Const
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Return
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Try
            | TokenKind::Throw
            | TokenKind::Assert
            | TokenKind::At
            | TokenKind::Pragma
    )
}
