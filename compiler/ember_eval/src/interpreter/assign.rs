//! Assignable places, dereference and read-modify-write operators.

use ember_ir::ast::{BinaryOp, ExprKind, UpdateOp};
use ember_ir::{ExprId, Name};

use super::Interpreter;
use crate::arithmetic::{Overload, OverloadResult};
use crate::environment::Frame;
use crate::errors::{null_dereference, undefined_property, ControlAction, EvalError, EvalErrorKind, EvalResult};
use crate::methods;
use crate::operators::step;
use crate::value::Value;

/// Evaluated assignment target.
///
/// Receiver and index subexpressions are evaluated once, when the place is
/// formed; reading and writing it afterwards has no further side effects.
enum Place {
    Var(Name),
    Member { receiver: Value, name: Name },
    Index { receiver: Value, index: Value },
    Deref(Value),
}

impl Interpreter<'_> {
    fn place(&mut self, target: ExprId, frame: &Frame) -> Result<Place, ControlAction> {
        let expr = *self.program.arena().get_expr(target);
        Ok(match expr.kind {
            ExprKind::Ident(name) => Place::Var(name),
            ExprKind::Member { receiver, name, .. } => Place::Member {
                receiver: self.eval(receiver, frame)?,
                name,
            },
            ExprKind::Index {
                receiver, index, ..
            } => Place::Index {
                receiver: self.eval(receiver, frame)?,
                index: self.eval(index, frame)?,
            },
            ExprKind::Deref(operand) => Place::Deref(self.eval(operand, frame)?),
            _ => {
                return Err(EvalError::new(EvalErrorKind::Custom, "invalid assignment target")
                    .with_span(expr.span)
                    .into())
            }
        })
    }

    fn read_place(&mut self, place: &Place, frame: &Frame) -> EvalResult {
        match place {
            Place::Var(name) => self.read_var(*name, frame),
            Place::Member { receiver, name } => self.get_property(receiver, &self.name(*name)),
            Place::Index { receiver, index } => self.get_index(receiver, index),
            Place::Deref(target) => self.read_deref(target),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, frame: &Frame) -> Result<(), ControlAction> {
        match place {
            Place::Var(name) => self.assign_var(*name, value, frame),
            Place::Member { receiver, name } => {
                let name = self.name(*name);
                if let Some(result) = methods::set_property(receiver, &name, &value) {
                    return Ok(result?);
                }
                let key = Value::string(&*name);
                self.write_resolved(receiver, &key, &value, &name)
            }
            Place::Index { receiver, index } => {
                if let Some(result) = methods::set_index(receiver, index, &value) {
                    return Ok(result?);
                }
                self.write_resolved(receiver, index, &value, &index.to_string())
            }
            Place::Deref(target) => self.write_deref(target, value),
        }
    }

    fn write_resolved(
        &mut self,
        receiver: &Value,
        key: &Value,
        value: &Value,
        label: &str,
    ) -> Result<(), ControlAction> {
        if !receiver.is_null() {
            if let Some(result) = self.resolver.set_property(receiver, key, value) {
                result?;
                return Ok(());
            }
        }
        self.unsolvable(undefined_property(label, receiver)).map(drop)
    }

    /// `*target` read: reference cell, arithmetic delegate, `get()`.
    pub(super) fn read_deref(&mut self, target: &Value) -> EvalResult {
        if let Some(cell) = target.as_indirect() {
            return Ok(cell.get());
        }
        match self.arithmetic.indirect(target)? {
            Overload::Value(value) => return Ok(value),
            Overload::Assigned => return Ok(target.clone()),
            Overload::Unhandled => {}
        }
        if !target.is_null() {
            if let Some(result) = self.resolver.invoke(target, "get", &[]) {
                return Ok(result?);
            }
        }
        self.unsolvable(null_dereference())
    }

    /// `*target = value`: reference cell, arithmetic delegate, `set(value)`.
    fn write_deref(&mut self, target: &Value, value: Value) -> Result<(), ControlAction> {
        if let Some(cell) = target.as_indirect() {
            cell.set(value);
            return Ok(());
        }
        match self.arithmetic.indirect_assign(target, &value)? {
            Overload::Value(_) | Overload::Assigned => return Ok(()),
            Overload::Unhandled => {}
        }
        if !target.is_null() {
            if let Some(result) = self.resolver.invoke(target, "set", std::slice::from_ref(&value)) {
                result?;
                return Ok(());
            }
        }
        self.unsolvable(null_dereference()).map(drop)
    }

    pub(super) fn eval_assign(&mut self, target: ExprId, value: ExprId, frame: &Frame) -> EvalResult {
        let place = self.place(target, frame)?;
        let value = self.eval(value, frame)?;
        self.write_place(&place, value.clone(), frame)?;
        Ok(value)
    }

    /// `target op= value`
    ///
    /// The delegate's `self_assign` runs first. `Assigned` means it updated
    /// the operand in place: the operand is the result and nothing is
    /// rebound. For `*x op= value` the delegate sees the reference `x`
    /// itself, so it can do the read-modify-write in one call.
    pub(super) fn eval_compound_assign(
        &mut self,
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
        frame: &Frame,
    ) -> EvalResult {
        let place = self.place(target, frame)?;
        if let Place::Deref(reference) = &place {
            let operand = self.eval(value, frame)?;
            match self
                .arithmetic
                .self_assign(op, reference, &operand, &self.options)?
            {
                Overload::Assigned => return self.read_deref(reference),
                Overload::Value(result) => {
                    self.write_deref(reference, result.clone())?;
                    return Ok(result);
                }
                Overload::Unhandled => {}
            }
            let current = self.read_deref(reference)?;
            return self.apply_compound(op, &place, current, &operand, frame);
        }
        let current = self.read_place(&place, frame)?;
        let operand = self.eval(value, frame)?;
        self.apply_compound(op, &place, current, &operand, frame)
    }

    fn apply_compound(
        &mut self,
        op: BinaryOp,
        place: &Place,
        current: Value,
        operand: &Value,
        frame: &Frame,
    ) -> EvalResult {
        let result = match self
            .arithmetic
            .self_assign(op, &current, operand, &self.options)?
        {
            Overload::Assigned => return Ok(current),
            Overload::Value(result) => result,
            Overload::Unhandled => self.binary(op, &current, operand)?,
        };
        self.write_place(place, result.clone(), frame)?;
        Ok(result)
    }

    /// `++x`, `x++`, `--x`, `x--`
    ///
    /// On `*x` the delegate is offered the reference first; an in-place
    /// update yields the referenced value as it is afterwards.
    pub(super) fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: ExprId,
        frame: &Frame,
    ) -> EvalResult {
        let place = self.place(target, frame)?;
        if let Place::Deref(reference) = &place {
            match self.update_overload(op, reference)? {
                Overload::Assigned => return self.read_deref(reference),
                Overload::Value(updated) => {
                    let result = if prefix {
                        updated.clone()
                    } else {
                        self.read_deref(reference)?
                    };
                    self.write_deref(reference, updated)?;
                    return Ok(result);
                }
                Overload::Unhandled => {}
            }
        }
        let current = self.read_place(&place, frame)?;
        let updated = match self.update_overload(op, &current)? {
            Overload::Assigned => return Ok(current),
            Overload::Value(value) => value,
            Overload::Unhandled => step(op, &current, &self.options)?,
        };
        self.write_place(&place, updated.clone(), frame)?;
        Ok(if prefix { updated } else { current })
    }

    fn update_overload(&self, op: UpdateOp, operand: &Value) -> OverloadResult {
        match op {
            UpdateOp::Increment => self.arithmetic.increment(operand),
            UpdateOp::Decrement => self.arithmetic.decrement(operand),
        }
    }
}
