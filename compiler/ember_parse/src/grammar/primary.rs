//! Primary expressions: literals, identifiers, parentheses, lambdas,
//! collection literals and `new`.

use ember_ir::ast::{
    ExprKind, FunctionDef, FunctionId, FunctionStyle, MapEntry, Param, ParamType, TemplatePart,
};
use ember_ir::{ExprId, ExprRange, Name, Span, TokenKind};
use ember_lexer::{split_template, TemplateSegment};

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    pub(crate) fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let span = self.current_span();
        let kind = self.current_kind();
        let literal = match kind {
            TokenKind::Null => Some(ExprKind::Null),
            TokenKind::True => Some(ExprKind::Bool(true)),
            TokenKind::False => Some(ExprKind::Bool(false)),
            TokenKind::Int(n) => Some(ExprKind::Int(n)),
            TokenKind::Float(bits) => Some(ExprKind::Float(bits)),
            TokenKind::Str(s) => Some(ExprKind::Str(s)),
            // `empty` / `size` not applied to an operand are plain names
            TokenKind::Empty | TokenKind::Size => {
                Some(ExprKind::Ident(self.cursor.intern(kind.symbol())?))
            }
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(self.alloc(literal, span));
        }

        match kind {
            TokenKind::Template(raw, offset) => {
                self.advance();
                self.parse_template(raw, offset, span)
            }
            TokenKind::Ident(name) => {
                if matches!(
                    self.cursor.peek_kind(1),
                    TokenKind::Arrow | TokenKind::FatArrow
                ) {
                    return self.parse_single_param_lambda(name, span);
                }
                self.advance();
                Ok(self.alloc(ExprKind::Ident(name), span))
            }
            TokenKind::LParen => self.parse_paren_or_lambda(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_set_or_map(),
            TokenKind::New => {
                self.advance();
                let (args, end) = self.parse_call_args()?;
                Ok(self.alloc(ExprKind::New(args), span.merge(end)))
            }
            TokenKind::Function => {
                self.advance();
                let name = match self.current_kind() {
                    TokenKind::Ident(name) => {
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                let func = self.parse_keyword_function_rest(span, name)?;
                let span = span.merge(self.previous_span());
                Ok(self.alloc(ExprKind::Lambda(func), span))
            }
            other => Err(ParseError::expected_expression(other, span)),
        }
    }

    fn parse_template(&mut self, raw: Name, offset: u32, span: Span) -> Result<ExprId, ParseError> {
        let interner = self.cursor.interner();
        let body = interner.lookup(raw);
        let mut parts = Vec::new();
        for segment in split_template(&body, offset)? {
            match segment {
                TemplateSegment::Text(text) => {
                    parts.push(TemplatePart::Text(self.cursor.intern(&text)?));
                }
                TemplateSegment::Expr { start, end } => {
                    let sub_offset = offset.saturating_add(u32::try_from(start).unwrap_or(u32::MAX));
                    let tokens = ember_lexer::lex_at(&body[start..end], interner, sub_offset)?;
                    let expr = self.parse_embedded(&tokens)?;
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        let range = self.arena.alloc_template_parts(parts);
        Ok(self.alloc(ExprKind::Template(range), span))
    }

    /// `x -> body`
    fn parse_single_param_lambda(&mut self, name: Name, start: Span) -> Result<ExprId, ParseError> {
        self.advance();
        let style = self.parse_arrow()?;
        let params = self.arena.alloc_params([Param {
            name,
            ty: ParamType::Any,
            variadic: false,
        }]);
        self.finish_arrow_lambda(start, params, style)
    }

    /// `( expr )` or `( params ) -> body`
    fn parse_paren_or_lambda(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        let is_lambda = self.cursor.matching_paren().is_some_and(|close| {
            matches!(
                self.cursor.kind_at(close + 1),
                TokenKind::Arrow | TokenKind::FatArrow
            )
        });
        if is_lambda {
            let params = self.parse_params()?;
            let style = self.parse_arrow()?;
            return self.finish_arrow_lambda(start, params, style);
        }
        self.advance();
        let inner = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(inner)
    }

    fn parse_arrow(&mut self) -> Result<FunctionStyle, ParseError> {
        match self.current_kind() {
            TokenKind::Arrow => {
                self.advance();
                Ok(FunctionStyle::Arrow)
            }
            TokenKind::FatArrow => {
                self.advance();
                Ok(FunctionStyle::FatArrow)
            }
            other => Err(ParseError::unexpected(other, "`->`", self.current_span())),
        }
    }

    fn finish_arrow_lambda(
        &mut self,
        start: Span,
        params: ExprRange,
        style: FunctionStyle,
    ) -> Result<ExprId, ParseError> {
        let body = self.parse_function_body(true)?;
        let span = start.merge(self.previous_span());
        let func = self.arena.alloc_function(FunctionDef {
            name: None,
            params,
            body,
            style,
            span,
        });
        Ok(self.alloc(ExprKind::Lambda(func), span))
    }

    /// After `function [name]`: `( params ) { body }`.
    pub(crate) fn parse_keyword_function_rest(
        &mut self,
        start: Span,
        name: Option<Name>,
    ) -> Result<FunctionId, ParseError> {
        let params = self.parse_params()?;
        if !self.check(TokenKind::LBrace) {
            return Err(ParseError::unexpected(
                self.current_kind(),
                "`{`",
                self.current_span(),
            ));
        }
        let body = self.parse_function_body(false)?;
        let span = start.merge(self.previous_span());
        Ok(self.arena.alloc_function(FunctionDef {
            name,
            params,
            body,
            style: FunctionStyle::Keyword,
            span,
        }))
    }

    /// Function body: braced statements become a `Sequence` run in the call
    /// frame. Arrow bodies may instead be a single expression, including a
    /// brace literal that does not parse as statements.
    fn parse_function_body(&mut self, allow_expression: bool) -> Result<ExprId, ParseError> {
        let outer_loops = std::mem::replace(&mut self.loop_depth, 0);
        let result = self.parse_function_body_inner(allow_expression);
        self.loop_depth = outer_loops;
        result
    }

    fn parse_function_body_inner(&mut self, allow_expression: bool) -> Result<ExprId, ParseError> {
        if !self.check(TokenKind::LBrace) {
            return self.parse_expr();
        }
        if !allow_expression {
            return self.parse_sequence_body();
        }
        let snapshot = self.snapshot();
        match self.parse_sequence_body() {
            Ok(body) => Ok(body),
            Err(err) => {
                // Report the statement error when the literal reading fails too.
                self.restore(snapshot);
                self.parse_expr().map_err(|_| err)
            }
        }
    }

    fn parse_sequence_body(&mut self) -> Result<ExprId, ParseError> {
        let (statements, span) = self.parse_braced_statements()?;
        let list = self.arena.alloc_expr_list(statements);
        Ok(self.alloc(ExprKind::Sequence(list), span))
    }

    /// `( [var|let] [type] name [...], ... )`
    fn parse_params(&mut self) -> Result<ExprRange, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<Param> = Vec::new();
        while !self.check(TokenKind::RParen) {
            if let Some(last) = params.last() {
                if last.variadic {
                    return Err(ParseError::new(
                        ParseErrorKind::VariadicNotLast,
                        "variadic parameter must be last",
                        self.previous_span(),
                    ));
                }
            }
            params.push(self.parse_param()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(self.arena.alloc_params(params))
    }

    /// One parameter: `name`, `type name`, or a variadic `name...`,
    /// `type name...`, `type... name` or `...name`.
    fn parse_param(&mut self) -> Result<Param, ParseError> {
        if matches!(self.current_kind(), TokenKind::Var | TokenKind::Let) {
            self.advance();
        }
        if self.eat(TokenKind::Ellipsis) {
            let (name, _) = self.cursor.expect_ident()?;
            return Ok(Param {
                name,
                ty: ParamType::Any,
                variadic: true,
            });
        }
        let (first, first_span) = self.cursor.expect_ident()?;
        if self.check(TokenKind::Ellipsis)
            && matches!(self.cursor.peek_kind(1), TokenKind::Ident(_))
        {
            self.advance();
            let ty = self.param_type(first, first_span)?;
            let (name, _) = self.cursor.expect_ident()?;
            return Ok(Param {
                name,
                ty,
                variadic: true,
            });
        }
        let (name, ty) = if let TokenKind::Ident(name) = self.current_kind() {
            let ty = self.param_type(first, first_span)?;
            self.advance();
            (name, ty)
        } else {
            (first, ParamType::Any)
        };
        let variadic = self.eat(TokenKind::Ellipsis);
        Ok(Param { name, ty, variadic })
    }

    fn param_type(&self, name: Name, span: Span) -> Result<ParamType, ParseError> {
        let type_name = self.cursor.interner().lookup(name);
        ParamType::from_keyword(&type_name).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnknownType,
                format!("unknown parameter type `{type_name}`"),
                span,
            )
        })
    }

    fn parse_array(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LBracket)?;
        let items = self.parse_comma_list(TokenKind::RBracket)?;
        let end = self.expect(TokenKind::RBracket)?;
        let list = self.arena.alloc_expr_list(items);
        Ok(self.alloc(ExprKind::Array(list), start.merge(end)))
    }

    /// `{}` empty set, `{:}` empty map, `{a, b}` set, `{k: v}` map.
    ///
    /// A group that fails here is remembered, so an enclosing block does not
    /// try the same literal reading again.
    fn parse_set_or_map(&mut self) -> Result<ExprId, ParseError> {
        let open = self.cursor.position();
        let result = self.parse_set_or_map_inner();
        if result.is_err() {
            self.failed_literals.insert(open);
        }
        result
    }

    fn parse_set_or_map_inner(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LBrace)?;
        if let Some(end) = self.eat_span(TokenKind::RBrace) {
            let list = self.arena.alloc_expr_list([]);
            return Ok(self.alloc(ExprKind::Set(list), start.merge(end)));
        }
        if self.check(TokenKind::Colon) && self.cursor.peek_kind(1) == TokenKind::RBrace {
            self.advance();
            let end = self.expect(TokenKind::RBrace)?;
            let entries = self.arena.alloc_map_entries([]);
            return Ok(self.alloc(ExprKind::Map(entries), start.merge(end)));
        }

        let first = self.parse_expr()?;
        if self.eat(TokenKind::Colon) {
            let value = self.parse_expr()?;
            let mut entries = vec![MapEntry { key: first, value }];
            while self.eat(TokenKind::Comma) {
                if self.check(TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_expr()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expr()?;
                entries.push(MapEntry { key, value });
            }
            let end = self.expect(TokenKind::RBrace)?;
            let entries = self.arena.alloc_map_entries(entries);
            return Ok(self.alloc(ExprKind::Map(entries), start.merge(end)));
        }

        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        let end = self.expect(TokenKind::RBrace)?;
        let list = self.arena.alloc_expr_list(items);
        Ok(self.alloc(ExprKind::Set(list), start.merge(end)))
    }

    fn eat_span(&mut self, kind: TokenKind) -> Option<Span> {
        let span = self.current_span();
        self.eat(kind).then_some(span)
    }
}
