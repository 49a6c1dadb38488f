//! Tree-walking interpreter.
//!
//! Evaluation walks the flat AST of a [`Program`]. Every step returns an
//! [`EvalResult`]; `break`, `continue` and `return` travel on the error side
//! as [`ControlAction`]s until a loop, function or the script boundary
//! absorbs them.
//!
//! Frames are passed down explicitly. The interpreter itself carries the
//! state that is fixed for one evaluation: the program being executed, the
//! host context, options, the arithmetic delegate and the resolver.
//!
//! # Program threading
//!
//! Closures carry the program they were defined in. A call swaps
//! `self.program` to the callee's for the duration of the body, so a lambda
//! handed from one script to another still evaluates its own nodes.
//!
//! - `access`: member and index reads
//! - `assign`: assignable places, `*x`, `++`/`--`, compound assignment
//! - `call`: function and method calls, `new`
//! - `control`: blocks, conditionals, loops, `try`, `throw`, `assert`,
//!   `@synchronized`

mod access;
mod assign;
mod builder;
mod call;
mod control;

pub use builder::InterpreterBuilder;

use std::sync::Arc;

use ember_ir::ast::{BinaryOp, ExprKind, FunctionId, TemplatePart, UnaryOp};
use ember_ir::{ExprId, ExprRange, Name, Span};
use ember_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use crate::arithmetic::{Arithmetic, Overload};
use crate::cancel::CancelToken;
use crate::context::Context;
use crate::environment::{AssignError, Frame, FrameRegistry};
use crate::errors::{
    cancelled, immutable_binding, invalid_operand, not_callable, redeclaration,
    undefined_variable, ControlAction, EvalError, EvalErrorKind, EvalResult,
};
use crate::methods;
use crate::monitor::MonitorRegistry;
use crate::operators::{evaluate_binary, evaluate_unary, identical};
use crate::options::Options;
use crate::program::Program;
use crate::resolver::Resolver;
use crate::value::{FunctionValue, Value};

type ExprList = SmallVec<[ExprId; 8]>;

/// Evaluator for one script execution or host call.
pub struct Interpreter<'c> {
    program: Arc<Program>,
    context: &'c mut dyn Context,
    options: Options,
    arithmetic: Arc<dyn Arithmetic>,
    resolver: Arc<dyn Resolver>,
    monitors: Arc<MonitorRegistry>,
    cancel: Option<CancelToken>,
    /// Frames captured by closures made in this evaluation.
    frames: FrameRegistry,
    /// Nesting of script function calls.
    depth: usize,
}

impl Interpreter<'_> {
    /// Options in effect for this evaluation.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Evaluate the program with `bindings` defined in its top frame.
    pub fn run(&mut self, bindings: &[(&str, Value)]) -> Result<Value, EvalError> {
        let frame = Frame::root_in(self.frames.epoch());
        for (name, value) in bindings {
            // A name the source never mentions cannot be read.
            if let Some(name) = self.program.symbols().get(name) {
                frame.define(name, value.clone());
            }
        }
        let root = self.program.root();
        tracing::debug!(bindings = bindings.len(), "evaluating script");
        let result = self.eval(root, &frame);
        drop(frame);
        self.finish(result)
    }

    /// Call a function value from the host.
    pub fn call(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        let result = self.call_value(function, args);
        self.finish(result)
    }

    /// Turn the outcome of a top-level evaluation into a host result.
    ///
    /// Frames captured by closures that did not escape are cleared first;
    /// the result itself counts as escaping.
    fn finish(&mut self, result: EvalResult) -> Result<Value, EvalError> {
        self.frames.reclaim();
        match result {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Break | ControlAction::Continue) => Ok(Value::Null),
            Err(ControlAction::Error(err)) => {
                if err.kind == EvalErrorKind::Cancelled && !self.options.cancellable {
                    tracing::debug!("evaluation cancelled; yielding null");
                    return Ok(Value::Null);
                }
                Err(*err)
            }
        }
    }

    /// Evaluate a node in `frame`.
    pub(crate) fn eval(&mut self, id: ExprId, frame: &Frame) -> EvalResult {
        ensure_sufficient_stack(|| {
            let expr = *self.program.arena().get_expr(id);
            self.eval_kind(expr.kind, frame)
                .map_err(|action| attach_span(action, expr.span))
        })
    }

    /// Evaluate an optional child; invalid ids yield null.
    fn eval_opt(&mut self, id: ExprId, frame: &Frame) -> EvalResult {
        if id.is_valid() {
            self.eval(id, frame)
        } else {
            Ok(Value::Null)
        }
    }

    fn list(&self, range: ExprRange) -> ExprList {
        self.program.arena().get_expr_list(range).iter().copied().collect()
    }

    fn eval_list(&mut self, range: ExprRange, frame: &Frame) -> Result<Vec<Value>, ControlAction> {
        let ids = self.list(range);
        let mut values = Vec::with_capacity(ids.len());
        for id in ids {
            values.push(self.eval(id, frame)?);
        }
        Ok(values)
    }

    #[inline]
    fn name(&self, name: Name) -> Arc<str> {
        self.program.symbols().text(name)
    }

    fn eval_kind(&mut self, kind: ExprKind, frame: &Frame) -> EvalResult {
        match kind {
            // Literals
            ExprKind::Null | ExprKind::Nop => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Int(n) => Ok(Value::Int(n)),
            ExprKind::Float(bits) => Ok(Value::Float(f64::from_bits(bits))),
            ExprKind::Str(name) => Ok(self.program.literal(name)),
            ExprKind::Template(parts) => self.eval_template(parts, frame),
            ExprKind::Ident(name) => self.read_var(name, frame),
            ExprKind::Array(items) => Ok(Value::array(self.eval_list(items, frame)?)),
            ExprKind::Set(items) => Ok(Value::set(self.eval_list(items, frame)?)),
            ExprKind::Map(entries) => self.eval_map(entries, frame),
            ExprKind::Range { start, end } => {
                let start = self.eval(start, frame)?;
                let end = self.eval(end, frame)?;
                match (methods::as_index(&start), methods::as_index(&end)) {
                    (Some(a), Some(b)) => Ok(Value::range(a, b)),
                    (None, _) => Err(invalid_operand("..", &start).into()),
                    (_, None) => Err(invalid_operand("..", &end).into()),
                }
            }

            // Operators
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let left = self.eval(left, frame)?;
                Ok(Value::Bool(
                    left.is_truthy() && self.eval(right, frame)?.is_truthy(),
                ))
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                let left = self.eval(left, frame)?;
                Ok(Value::Bool(
                    left.is_truthy() || self.eval(right, frame)?.is_truthy(),
                ))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                self.binary(op, &left, &right)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(operand, frame)?;
                self.unary(op, &operand)
            }
            ExprKind::Identity {
                negated,
                left,
                right,
            } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                Ok(Value::Bool(identical(&left, &right) != negated))
            }
            ExprKind::Update { op, prefix, target } => self.eval_update(op, prefix, target, frame),
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, frame)?.is_truthy() {
                    self.eval(then_branch, frame)
                } else {
                    self.eval(else_branch, frame)
                }
            }
            ExprKind::Elvis { left, right } => {
                let left = self.eval(left, frame)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right, frame)
                }
            }
            ExprKind::Coalesce { left, right } => {
                let left = self.eval(left, frame)?;
                if left.is_null() {
                    self.eval(right, frame)
                } else {
                    Ok(left)
                }
            }
            ExprKind::Empty(operand) => {
                let operand = self.eval(operand, frame)?;
                self.eval_empty(&operand)
            }
            ExprKind::Size(operand) => {
                let operand = self.eval(operand, frame)?;
                self.eval_size(&operand)
            }
            ExprKind::Deref(operand) => {
                let operand = self.eval(operand, frame)?;
                self.read_deref(&operand)
            }

            // Assignment
            ExprKind::Assign { target, value } => self.eval_assign(target, value, frame),
            ExprKind::CompoundAssign { op, target, value } => {
                self.eval_compound_assign(op, target, value, frame)
            }

            // Access
            ExprKind::Member {
                receiver,
                name,
                safe,
            } => {
                let receiver = self.eval(receiver, frame)?;
                if safe && receiver.is_null() {
                    return Ok(Value::Null);
                }
                self.get_property(&receiver, &self.name(name))
            }
            ExprKind::Index {
                receiver,
                index,
                safe,
            } => {
                let receiver = self.eval(receiver, frame)?;
                if safe && receiver.is_null() {
                    return Ok(Value::Null);
                }
                let index = self.eval(index, frame)?;
                self.get_index(&receiver, &index)
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval(callee, frame)?;
                let args = self.eval_list(args, frame)?;
                self.call_value(&callee, args)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                safe,
            } => {
                let receiver = self.eval(receiver, frame)?;
                if safe && receiver.is_null() {
                    return Ok(Value::Null);
                }
                let args = self.eval_list(args, frame)?;
                self.call_method(&receiver, &self.name(method), args)
            }
            ExprKind::New(items) => {
                let mut values = self.eval_list(items, frame)?;
                let type_name = if values.is_empty() {
                    Value::Null
                } else {
                    values.remove(0)
                };
                self.construct(&type_name, values)
            }
            ExprKind::Lambda(func) => Ok(self.closure(func, frame)),

            // Statements
            ExprKind::Sequence(stmts) => self.eval_statements(stmts, frame),
            ExprKind::Block(stmts) => self.eval_statements(stmts, &frame.child()),
            ExprKind::Declare { kind, name, init } => {
                let value = self.eval_opt(init, frame)?;
                frame
                    .declare(name, value.clone(), kind)
                    .map_err(|err| self.binding_error(err, name))?;
                Ok(value)
            }
            ExprKind::FunctionDecl { name, func } => {
                let function = self.closure(func, frame);
                frame.define(name, function.clone());
                Ok(function)
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, frame)?.is_truthy() {
                    self.eval(then_branch, frame)
                } else {
                    self.eval_opt(else_branch, frame)
                }
            }
            ExprKind::While { cond, body } => self.eval_while(cond, body, frame),
            ExprKind::DoWhile { body, cond } => self.eval_do_while(body, cond, frame),
            ExprKind::For {
                init,
                cond,
                step,
                body,
            } => self.eval_for(init, cond, step, body, frame),
            ExprKind::ForEach {
                decl,
                var,
                iterable,
                body,
            } => self.eval_for_each(decl, var, iterable, body, frame),
            ExprKind::Break => Err(ControlAction::Break),
            ExprKind::Continue => Err(ControlAction::Continue),
            ExprKind::Return(value) => Err(ControlAction::Return(self.eval_opt(value, frame)?)),
            ExprKind::Try(clause) => self.eval_try(clause, frame),
            ExprKind::Throw(value) => {
                let value = self.eval(value, frame)?;
                Err(control::throw_value(value).into())
            }
            ExprKind::Assert { cond, message } => self.eval_assert(cond, message, frame),
            ExprKind::Synchronized { monitor, body } => self.eval_synchronized(monitor, body, frame),
        }
    }

    fn closure(&mut self, func: FunctionId, frame: &Frame) -> Value {
        self.frames.capture(frame);
        Value::function(FunctionValue::new(
            Arc::clone(&self.program),
            func,
            frame.clone(),
        ))
    }

    fn eval_template(&mut self, parts: ExprRange, frame: &Frame) -> EvalResult {
        let parts: SmallVec<[TemplatePart; 8]> = self
            .program
            .arena()
            .get_template_parts(parts)
            .iter()
            .copied()
            .collect();
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(self.program.lookup(text)),
                TemplatePart::Expr(id) => {
                    let value = self.eval(id, frame)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::owned_string(out))
    }

    fn eval_map(&mut self, entries: ExprRange, frame: &Frame) -> EvalResult {
        let entries: SmallVec<[_; 8]> = self
            .program
            .arena()
            .get_map_entries(entries)
            .iter()
            .copied()
            .collect();
        let mut pairs = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = self.eval(entry.key, frame)?;
            let value = self.eval(entry.value, frame)?;
            pairs.push((key, value));
        }
        Ok(Value::map(pairs))
    }

    /// Binary operator: delegate first, then built-ins.
    fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
        match self.arithmetic.binary(op, left, right, &self.options)? {
            Overload::Value(value) => Ok(value),
            Overload::Assigned => Ok(left.clone()),
            Overload::Unhandled => Ok(evaluate_binary(op, left, right, &self.options)?),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Value) -> EvalResult {
        match self.arithmetic.unary(op, operand, &self.options)? {
            Overload::Value(value) => Ok(value),
            Overload::Assigned => Ok(operand.clone()),
            Overload::Unhandled => Ok(evaluate_unary(op, operand, &self.options)?),
        }
    }

    fn eval_empty(&mut self, operand: &Value) -> EvalResult {
        if let Some(empty) = methods::is_empty(operand) {
            return Ok(Value::Bool(empty));
        }
        match self.resolver.invoke(operand, "isEmpty", &[]) {
            Some(result) => Ok(result?),
            None => Ok(Value::Bool(false)),
        }
    }

    fn eval_size(&mut self, operand: &Value) -> EvalResult {
        if let Some(size) = methods::size_of(operand) {
            return Ok(size?);
        }
        match self.resolver.invoke(operand, "size", &[]) {
            Some(result) => Ok(result?),
            None => Ok(Value::Int(0)),
        }
    }

    // Variables

    /// Read a variable: frames, then the context.
    fn read_var(&mut self, name: Name, frame: &Frame) -> EvalResult {
        if let Some(value) = frame.lookup(name) {
            return Ok(value);
        }
        let text = self.name(name);
        if let Some(value) = self.context.get(&text) {
            return Ok(value);
        }
        if self.context.has(&text) {
            return Ok(Value::Null);
        }
        self.unsolvable(undefined_variable(&text))
    }

    /// Assign to the nearest frame defining `name`, else to the context.
    fn assign_var(&mut self, name: Name, value: Value, frame: &Frame) -> Result<(), ControlAction> {
        match frame.assign(name, value.clone()) {
            Ok(()) => Ok(()),
            Err(AssignError::Undefined) => {
                let text = self.name(name);
                self.context.set(&text, value);
                Ok(())
            }
            Err(err) => Err(self.binding_error(err, name).into()),
        }
    }

    #[cold]
    fn binding_error(&self, err: AssignError, name: Name) -> EvalError {
        let text = self.name(name);
        match err {
            AssignError::Immutable => immutable_binding(&text),
            AssignError::Redeclared => redeclaration(&text),
            AssignError::Undefined => undefined_variable(&text),
        }
    }

    /// Failure of a lookup the options may downgrade to null.
    ///
    /// Lenient mode yields null. Strict mode fails, unless `silent` is also
    /// set, in which case it logs and yields null.
    fn unsolvable(&self, err: EvalError) -> EvalResult {
        if !self.options.strict {
            return Ok(Value::Null);
        }
        if self.options.silent {
            tracing::warn!(error = %err, "unsolvable reference evaluated as null");
            return Ok(Value::Null);
        }
        Err(err.into())
    }

    fn check_cancelled(&self) -> Result<(), ControlAction> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(cancelled().into()),
            _ => Ok(()),
        }
    }

    fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Null => Err(not_callable(callee).into()),
            _ => match self.resolver.invoke(callee, "call", &args) {
                Some(result) => Ok(result?),
                None => Err(not_callable(callee).into()),
            },
        }
    }
}

fn attach_span(action: ControlAction, span: Span) -> ControlAction {
    match action {
        ControlAction::Error(mut err) => {
            if err.span.is_none() {
                err.span = Some(span);
            }
            ControlAction::Error(err)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests;
