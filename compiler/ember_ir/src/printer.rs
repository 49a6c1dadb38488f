//! Source reconstruction from the AST.
//!
//! Output is semantically equivalent to the parsed source: parsing it again
//! yields a tree that evaluates the same way. Layout, comments and redundant
//! parentheses are not preserved. Compound operands are always
//! parenthesized, and block statements are always terminated so the
//! set-literal reading of brace groups never applies to a printed block.

use std::fmt::Write;

use crate::ast::{
    ExprKind, FunctionDef, FunctionStyle, Param, Pragma, PragmaValue, TemplatePart,
};
use crate::{ExprArena, ExprId, ExprRange, Name, Symbols};

/// Print a whole script: pragmas, then the root statements.
pub fn print_script(
    arena: &ExprArena,
    symbols: &Symbols,
    pragmas: &[Pragma],
    root: ExprId,
) -> String {
    let mut printer = Printer::new(arena, symbols);
    for pragma in pragmas {
        printer.pragma(pragma);
    }
    printer.stmt(root);
    printer.finish()
}

/// Print a single node as an expression.
pub fn print_expr(arena: &ExprArena, symbols: &Symbols, id: ExprId) -> String {
    let mut printer = Printer::new(arena, symbols);
    printer.expr(id);
    printer.finish()
}

struct Printer<'a> {
    arena: &'a ExprArena,
    symbols: &'a Symbols,
    out: String,
}

impl<'a> Printer<'a> {
    fn new(arena: &'a ExprArena, symbols: &'a Symbols) -> Self {
        Printer {
            arena,
            symbols,
            out: String::new(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn name(&mut self, name: Name) {
        let symbols = self.symbols;
        self.out.push_str(symbols.lookup(name));
    }

    fn pragma(&mut self, pragma: &Pragma) {
        self.out.push_str("#pragma ");
        self.name(pragma.key);
        self.out.push(' ');
        match pragma.value {
            PragmaValue::Null => self.out.push_str("null"),
            PragmaValue::Bool(b) => {
                let _ = write!(self.out, "{b}");
            }
            PragmaValue::Int(n) => {
                let _ = write!(self.out, "{n}");
            }
            PragmaValue::Float(bits) => {
                let _ = write!(self.out, "{:?}", f64::from_bits(bits));
            }
            PragmaValue::Str(s) => self.string_literal(s),
            PragmaValue::Ident(path) => self.name(path),
        }
        self.out.push('\n');
    }

    // ===== Statements =====

    fn statements(&mut self, range: ExprRange) {
        let ids = self.arena.get_expr_list(range);
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            self.stmt(id);
            self.out.push(';');
        }
    }

    fn braced(&mut self, range: ExprRange) {
        if range.is_empty() {
            self.out.push_str("{ }");
            return;
        }
        self.out.push_str("{ ");
        self.statements(range);
        self.out.push_str(" }");
    }

    /// Print a statement body; non-block bodies are printed as-is.
    fn body(&mut self, id: ExprId) {
        self.stmt(id);
    }

    fn stmt(&mut self, id: ExprId) {
        let expr = *self.arena.get_expr(id);
        match expr.kind {
            ExprKind::Sequence(range) => self.statements(range),
            ExprKind::Block(range) => self.braced(range),
            ExprKind::Nop => {}
            ExprKind::Declare { kind, name, init } => {
                self.out.push_str(kind.keyword());
                self.out.push(' ');
                self.name(name);
                if let Some(init) = init.to_option() {
                    self.out.push_str(" = ");
                    self.expr(init);
                }
            }
            ExprKind::FunctionDecl { name, func } => {
                let def = *self.arena.get_function(func);
                self.out.push_str("function ");
                self.name(name);
                self.params(&def);
                self.out.push(' ');
                self.function_body(def.body);
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("if (");
                self.expr(cond);
                self.out.push_str(") ");
                self.body(then_branch);
                if let Some(else_branch) = else_branch.to_option() {
                    if !self.is_block(then_branch) {
                        self.out.push(';');
                    }
                    self.out.push_str(" else ");
                    self.body(else_branch);
                }
            }
            ExprKind::While { cond, body } => {
                self.out.push_str("while (");
                self.expr(cond);
                self.out.push_str(") ");
                self.body(body);
            }
            ExprKind::DoWhile { body, cond } => {
                self.out.push_str("do ");
                self.body(body);
                if !self.is_block(body) {
                    self.out.push(';');
                }
                self.out.push_str(" while (");
                self.expr(cond);
                self.out.push(')');
            }
            ExprKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.out.push_str("for (");
                if let Some(init) = init.to_option() {
                    self.stmt(init);
                }
                self.out.push_str("; ");
                if let Some(cond) = cond.to_option() {
                    self.expr(cond);
                }
                self.out.push_str("; ");
                if let Some(step) = step.to_option() {
                    self.expr(step);
                }
                self.out.push_str(") ");
                self.body(body);
            }
            ExprKind::ForEach {
                decl,
                var,
                iterable,
                body,
            } => {
                self.out.push_str("for (");
                if let Some(decl) = decl {
                    self.out.push_str(decl.keyword());
                    self.out.push(' ');
                }
                self.name(var);
                self.out.push_str(" : ");
                self.expr(iterable);
                self.out.push_str(") ");
                self.body(body);
            }
            ExprKind::Break => self.out.push_str("break"),
            ExprKind::Continue => self.out.push_str("continue"),
            ExprKind::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value.to_option() {
                    self.out.push(' ');
                    self.expr(value);
                }
            }
            ExprKind::Try(id) => {
                let clause = *self.arena.get_try(id);
                self.out.push_str("try ");
                self.body(clause.body);
                if let Some(catch_body) = clause.catch_body.to_option() {
                    self.out.push_str(" catch (");
                    self.name(clause.catch_binding);
                    self.out.push_str(") ");
                    self.body(catch_body);
                }
                if let Some(finally_body) = clause.finally_body.to_option() {
                    self.out.push_str(" finally ");
                    self.body(finally_body);
                }
            }
            ExprKind::Throw(value) => {
                self.out.push_str("throw ");
                self.expr(value);
            }
            ExprKind::Assert { cond, message } => {
                self.out.push_str("assert ");
                self.operand(cond);
                if let Some(message) = message.to_option() {
                    self.out.push_str(" : ");
                    self.operand(message);
                }
            }
            ExprKind::Synchronized { monitor, body } => {
                self.out.push_str("@synchronized");
                if let Some(monitor) = monitor.to_option() {
                    self.out.push('(');
                    self.expr(monitor);
                    self.out.push(')');
                }
                self.out.push(' ');
                self.body(body);
            }
            // An empty set in statement position would read back as a block.
            ExprKind::Set(range) if range.is_empty() => self.out.push_str("({})"),
            _ => self.expr(id),
        }
    }

    fn is_block(&self, id: ExprId) -> bool {
        matches!(self.arena.get_expr(id).kind, ExprKind::Block(_))
    }

    // ===== Functions =====

    fn params(&mut self, def: &FunctionDef) {
        self.out.push('(');
        let params: Vec<Param> = self.arena.get_params(def.params).to_vec();
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if let Some(kw) = param.ty.keyword() {
                self.out.push_str(kw);
                self.out.push(' ');
            }
            self.name(param.name);
            if param.variadic {
                self.out.push_str("...");
            }
        }
        self.out.push(')');
    }

    fn function_body(&mut self, body: ExprId) {
        match self.arena.get_expr(body).kind {
            ExprKind::Sequence(range) => self.braced(range),
            _ => self.operand(body),
        }
    }

    fn lambda(&mut self, def: &FunctionDef) {
        match def.style {
            FunctionStyle::Keyword => {
                self.out.push_str("function ");
                self.params(def);
                self.out.push(' ');
            }
            FunctionStyle::Arrow => {
                self.params(def);
                self.out.push_str(" -> ");
            }
            FunctionStyle::FatArrow => {
                self.params(def);
                self.out.push_str(" => ");
            }
        }
        self.function_body(def.body);
    }

    // ===== Expressions =====

    /// Print a node, parenthesized unless it is atomic.
    fn operand(&mut self, id: ExprId) {
        if self.is_atomic(id) {
            self.expr(id);
        } else {
            self.out.push('(');
            self.expr(id);
            self.out.push(')');
        }
    }

    fn is_atomic(&self, id: ExprId) -> bool {
        match self.arena.get_expr(id).kind {
            // A leading minus must not fuse with a preceding operator.
            ExprKind::Int(n) => return n >= 0,
            ExprKind::Float(bits) => return !f64::from_bits(bits).is_sign_negative(),
            _ => {}
        }
        matches!(
            self.arena.get_expr(id).kind,
            ExprKind::Null
                | ExprKind::Bool(_)
                | ExprKind::Str(_)
                | ExprKind::Template(_)
                | ExprKind::Ident(_)
                | ExprKind::Array(_)
                | ExprKind::Map(_)
                | ExprKind::Member { .. }
                | ExprKind::Index { .. }
                | ExprKind::Call { .. }
                | ExprKind::MethodCall { .. }
                | ExprKind::New(_)
                | ExprKind::Empty(_)
                | ExprKind::Size(_)
        )
    }

    fn list(&mut self, range: ExprRange) {
        let ids = self.arena.get_expr_list(range);
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(id);
        }
    }

    fn expr(&mut self, id: ExprId) {
        let expr = *self.arena.get_expr(id);
        match expr.kind {
            ExprKind::Null => self.out.push_str("null"),
            ExprKind::Bool(b) => {
                let _ = write!(self.out, "{b}");
            }
            ExprKind::Int(n) => {
                let _ = write!(self.out, "{n}");
            }
            ExprKind::Float(bits) => {
                let _ = write!(self.out, "{:?}", f64::from_bits(bits));
            }
            ExprKind::Str(s) => self.string_literal(s),
            ExprKind::Template(range) => {
                self.out.push('`');
                let parts: Vec<TemplatePart> = self.arena.get_template_parts(range).to_vec();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => {
                            let symbols = self.symbols;
                            let text = symbols.lookup(text);
                            for c in text.chars() {
                                match c {
                                    '`' | '\\' | '$' => {
                                        self.out.push('\\');
                                        self.out.push(c);
                                    }
                                    _ => self.out.push(c),
                                }
                            }
                        }
                        TemplatePart::Expr(e) => {
                            self.out.push_str("${");
                            self.expr(e);
                            self.out.push('}');
                        }
                    }
                }
                self.out.push('`');
            }
            ExprKind::Ident(name) => self.name(name),
            ExprKind::Array(range) => {
                self.out.push('[');
                self.list(range);
                self.out.push(']');
            }
            ExprKind::Set(range) => {
                self.out.push('{');
                self.list(range);
                self.out.push('}');
            }
            ExprKind::Map(range) => {
                let entries = self.arena.get_map_entries(range).to_vec();
                if entries.is_empty() {
                    self.out.push_str("{:}");
                    return;
                }
                self.out.push('{');
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.operand(entry.key);
                    self.out.push_str(" : ");
                    self.expr(entry.value);
                }
                self.out.push('}');
            }
            ExprKind::Range { start, end } => {
                self.operand(start);
                self.out.push_str(" .. ");
                self.operand(end);
            }
            ExprKind::Binary { op, left, right } => {
                self.operand(left);
                self.out.push(' ');
                self.out.push_str(op.as_symbol());
                self.out.push(' ');
                self.operand(right);
            }
            ExprKind::Unary { op, operand } => {
                self.out.push_str(op.as_symbol());
                self.operand(operand);
            }
            ExprKind::Identity {
                negated,
                left,
                right,
            } => {
                self.operand(left);
                self.out.push_str(if negated { " !== " } else { " === " });
                self.operand(right);
            }
            ExprKind::Update { op, prefix, target } => {
                if prefix {
                    self.out.push_str(op.as_symbol());
                    self.operand(target);
                } else {
                    self.operand(target);
                    self.out.push_str(op.as_symbol());
                }
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.operand(cond);
                self.out.push_str(" ? ");
                self.operand(then_branch);
                self.out.push_str(" : ");
                self.operand(else_branch);
            }
            ExprKind::Elvis { left, right } => {
                self.operand(left);
                self.out.push_str(" ?: ");
                self.operand(right);
            }
            ExprKind::Coalesce { left, right } => {
                self.operand(left);
                self.out.push_str(" ?? ");
                self.operand(right);
            }
            ExprKind::Empty(operand) => {
                self.out.push_str("empty(");
                self.expr(operand);
                self.out.push(')');
            }
            ExprKind::Size(operand) => {
                self.out.push_str("size(");
                self.expr(operand);
                self.out.push(')');
            }
            ExprKind::Deref(operand) => {
                self.out.push('*');
                self.operand(operand);
            }
            ExprKind::Assign { target, value } => {
                self.expr(target);
                self.out.push_str(" = ");
                self.expr(value);
            }
            ExprKind::CompoundAssign { op, target, value } => {
                self.expr(target);
                self.out.push(' ');
                self.out.push_str(op.as_symbol());
                self.out.push_str("= ");
                self.expr(value);
            }
            ExprKind::Member {
                receiver,
                name,
                safe,
            } => {
                self.operand(receiver);
                self.out.push_str(if safe { "?." } else { "." });
                self.name(name);
            }
            ExprKind::Index {
                receiver,
                index,
                safe,
            } => {
                self.operand(receiver);
                if safe {
                    self.out.push_str("?.");
                }
                self.out.push('[');
                self.expr(index);
                self.out.push(']');
            }
            ExprKind::Call { callee, args } => {
                self.operand(callee);
                self.out.push('(');
                self.list(args);
                self.out.push(')');
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                safe,
            } => {
                self.operand(receiver);
                self.out.push_str(if safe { "?." } else { "." });
                self.name(method);
                self.out.push('(');
                self.list(args);
                self.out.push(')');
            }
            ExprKind::New(args) => {
                self.out.push_str("new(");
                self.list(args);
                self.out.push(')');
            }
            ExprKind::Lambda(func) => {
                let def = *self.arena.get_function(func);
                self.lambda(&def);
            }
            // Statement kinds in expression position.
            ExprKind::Sequence(_)
            | ExprKind::Block(_)
            | ExprKind::Nop
            | ExprKind::Declare { .. }
            | ExprKind::FunctionDecl { .. }
            | ExprKind::If { .. }
            | ExprKind::While { .. }
            | ExprKind::DoWhile { .. }
            | ExprKind::For { .. }
            | ExprKind::ForEach { .. }
            | ExprKind::Break
            | ExprKind::Continue
            | ExprKind::Return(_)
            | ExprKind::Try(_)
            | ExprKind::Throw(_)
            | ExprKind::Assert { .. }
            | ExprKind::Synchronized { .. } => self.stmt(id),
        }
    }

    fn string_literal(&mut self, s: Name) {
        let symbols = self.symbols;
        let text = symbols.lookup(s);
        self.out.push('\'');
        for c in text.chars() {
            match c {
                '\'' => self.out.push_str("\\'"),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\0' => self.out.push_str("\\0"),
                _ => self.out.push(c),
            }
        }
        self.out.push('\'');
    }
}
