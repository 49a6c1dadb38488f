//! Statements and control flow.

use std::sync::Arc;

use ember_ir::ast::{DeclKind, ExprKind, TryId};
use ember_ir::{ExprId, ExprRange, Name};

use super::Interpreter;
use crate::environment::Frame;
use crate::errors::{assertion_failed, not_iterable, thrown, ControlAction, EvalError, EvalErrorKind, EvalResult};
use crate::methods;
use crate::monitor::MonitorKey;
use crate::value::{Value, SCRIPT_EXCEPTION};

/// Outcome of one loop-body iteration.
enum LoopStep {
    Next,
    Exit,
}

/// The failure `throw value` raises.
///
/// Exceptions are rethrown as they are; anything else is wrapped in a
/// script exception carrying the value.
pub(super) fn throw_value(value: Value) -> EvalError {
    match value {
        Value::Exception(_) => thrown(value),
        other => {
            let message = other.to_string();
            thrown(Value::exception(SCRIPT_EXCEPTION, message, other))
        }
    }
}

impl Interpreter<'_> {
    /// Statements of a block or body, in `frame`.
    ///
    /// The value is that of the last statement executed; empty statements
    /// leave it unchanged.
    pub(super) fn eval_statements(&mut self, stmts: ExprRange, frame: &Frame) -> EvalResult {
        let mut last = Value::Null;
        for id in self.list(stmts) {
            if matches!(self.program.arena().get_expr(id).kind, ExprKind::Nop) {
                continue;
            }
            last = self.eval(id, frame)?;
        }
        Ok(last)
    }

    /// Run a loop body, absorbing `break` and `continue`.
    fn loop_body(&mut self, body: ExprId, frame: &Frame) -> Result<LoopStep, ControlAction> {
        match self.eval(body, frame) {
            Ok(_) | Err(ControlAction::Continue) => Ok(LoopStep::Next),
            Err(ControlAction::Break) => Ok(LoopStep::Exit),
            Err(other) => Err(other),
        }
    }

    pub(super) fn eval_while(&mut self, cond: ExprId, body: ExprId, frame: &Frame) -> EvalResult {
        loop {
            self.check_cancelled()?;
            if !self.eval(cond, frame)?.is_truthy() {
                break;
            }
            if let LoopStep::Exit = self.loop_body(body, frame)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    pub(super) fn eval_do_while(&mut self, body: ExprId, cond: ExprId, frame: &Frame) -> EvalResult {
        loop {
            self.check_cancelled()?;
            if let LoopStep::Exit = self.loop_body(body, frame)? {
                break;
            }
            if !self.eval(cond, frame)?.is_truthy() {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// Classic `for`; a `let`/`const` initializer gets a loop-local frame.
    pub(super) fn eval_for(
        &mut self,
        init: ExprId,
        cond: ExprId,
        step: ExprId,
        body: ExprId,
        frame: &Frame,
    ) -> EvalResult {
        let scoped = init.is_valid()
            && matches!(
                self.program.arena().get_expr(init).kind,
                ExprKind::Declare {
                    kind: DeclKind::Let | DeclKind::Const,
                    ..
                }
            );
        let loop_frame = if scoped { frame.child() } else { frame.clone() };
        self.eval_opt(init, &loop_frame)?;
        loop {
            self.check_cancelled()?;
            if cond.is_valid() && !self.eval(cond, &loop_frame)?.is_truthy() {
                break;
            }
            if let LoopStep::Exit = self.loop_body(body, &loop_frame)? {
                break;
            }
            self.eval_opt(step, &loop_frame)?;
        }
        Ok(Value::Null)
    }

    /// `for (var x : it)`, `for (let x : it)`, `for (x : it)`
    pub(super) fn eval_for_each(
        &mut self,
        decl: Option<DeclKind>,
        var: Name,
        iterable: ExprId,
        body: ExprId,
        frame: &Frame,
    ) -> EvalResult {
        let subject = self.eval(iterable, frame)?;
        let items: Box<dyn Iterator<Item = Value>> = match &subject {
            Value::Range(range) => Box::new(range.iter().map(Value::Int)),
            other => match methods::iterate(other) {
                Some(items) => Box::new(items.into_iter()),
                None => return Err(not_iterable(other).into()),
            },
        };
        for item in items {
            self.check_cancelled()?;
            let body_frame = match decl {
                Some(DeclKind::Let | DeclKind::Const) => {
                    let child = frame.child();
                    child.define(var, item);
                    child
                }
                Some(DeclKind::Var) => {
                    frame
                        .declare(var, item, DeclKind::Var)
                        .map_err(|err| self.binding_error(err, var))?;
                    frame.clone()
                }
                None => {
                    self.assign_var(var, item, frame)?;
                    frame.clone()
                }
            };
            if let LoopStep::Exit = self.loop_body(body, &body_frame)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// `try`/`catch`/`finally`.
    ///
    /// `catch` sees every failure except cancellation. `finally` runs on
    /// every exit; if it exits abruptly itself, that exit wins, otherwise the
    /// pending outcome of the try/catch path is resumed.
    pub(super) fn eval_try(&mut self, clause: TryId, frame: &Frame) -> EvalResult {
        let clause = *self.program.arena().get_try(clause);
        let mut outcome = self.eval(clause.body, frame);

        if clause.catch_body.is_valid() {
            let caught = match &outcome {
                Err(ControlAction::Error(err)) if err.kind != EvalErrorKind::Cancelled => {
                    Some(err.to_exception())
                }
                _ => None,
            };
            if let Some(exception) = caught {
                tracing::trace!(exception = %exception, "caught");
                let catch_frame = frame.child();
                catch_frame.define(clause.catch_binding, exception);
                outcome = self.eval(clause.catch_body, &catch_frame);
            }
        }

        if clause.finally_body.is_valid() {
            self.eval(clause.finally_body, frame)?;
        }
        outcome
    }

    pub(super) fn eval_assert(&mut self, cond: ExprId, message: ExprId, frame: &Frame) -> EvalResult {
        if !self.options.assertions {
            return Ok(Value::Null);
        }
        if self.eval(cond, frame)?.is_truthy() {
            return Ok(Value::Null);
        }
        let message = if message.is_valid() {
            self.eval(message, frame)?.to_string()
        } else {
            "assertion failed".to_owned()
        };
        Err(assertion_failed(message).into())
    }

    /// `@synchronized [(monitor)] body`
    pub(super) fn eval_synchronized(
        &mut self,
        monitor: ExprId,
        body: ExprId,
        frame: &Frame,
    ) -> EvalResult {
        let key = if monitor.is_valid() {
            MonitorKey::of(&self.eval(monitor, frame)?)
        } else {
            MonitorKey::Default
        };
        let monitors = Arc::clone(&self.monitors);
        monitors.with_lock(key, || self.eval(body, frame))
    }
}
