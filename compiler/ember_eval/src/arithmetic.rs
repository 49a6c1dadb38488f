//! Operator overloading.
//!
//! The interpreter consults an [`Arithmetic`] delegate before applying its
//! built-in operator semantics. Each hook answers with an [`Overload`]:
//!
//! - `Value(v)`: use `v` as the result
//! - `Assigned`: the hook mutated its operand in place; the operand itself is
//!   the result and no variable is rebound
//! - `Unhandled`: no overload for these operands, use the built-ins
//!
//! [`OperatorTable`] is a delegate assembled from per-operator handlers keyed
//! by the operand's runtime type name.

use std::fmt;

use ember_ir::ast::{BinaryOp, UnaryOp};
use rustc_hash::FxHashMap;

use crate::errors::EvalError;
use crate::options::Options;
use crate::value::Value;

/// Answer of an overload hook.
#[derive(Clone, Debug, Default)]
pub enum Overload {
    Value(Value),
    /// The operand was updated in place.
    Assigned,
    #[default]
    Unhandled,
}

pub type OverloadResult = Result<Overload, EvalError>;

/// Operator overload delegate. Every hook defaults to `Unhandled`.
pub trait Arithmetic: Send + Sync {
    fn binary(&self, op: BinaryOp, left: &Value, right: &Value, options: &Options) -> OverloadResult {
        let _ = (op, left, right, options);
        Ok(Overload::Unhandled)
    }

    fn unary(&self, op: UnaryOp, operand: &Value, options: &Options) -> OverloadResult {
        let _ = (op, operand, options);
        Ok(Overload::Unhandled)
    }

    /// `++x` / `x++`
    fn increment(&self, operand: &Value) -> OverloadResult {
        let _ = operand;
        Ok(Overload::Unhandled)
    }

    /// `--x` / `x--`
    fn decrement(&self, operand: &Value) -> OverloadResult {
        let _ = operand;
        Ok(Overload::Unhandled)
    }

    /// `*x` read.
    fn indirect(&self, operand: &Value) -> OverloadResult {
        let _ = operand;
        Ok(Overload::Unhandled)
    }

    /// `*x = value`
    fn indirect_assign(&self, operand: &Value, value: &Value) -> OverloadResult {
        let _ = (operand, value);
        Ok(Overload::Unhandled)
    }

    /// `target op= value` as a single read-modify-write.
    fn self_assign(
        &self,
        op: BinaryOp,
        target: &Value,
        value: &Value,
        options: &Options,
    ) -> OverloadResult {
        let _ = (op, target, value, options);
        Ok(Overload::Unhandled)
    }
}

/// Delegate with no overloads.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultArithmetic;

impl Arithmetic for DefaultArithmetic {}

/// Handler for two-operand hooks.
pub trait BinaryHandler: Send + Sync {
    fn apply(&self, left: &Value, right: &Value) -> OverloadResult;
}

impl<F> BinaryHandler for F
where
    F: Fn(&Value, &Value) -> OverloadResult + Send + Sync,
{
    fn apply(&self, left: &Value, right: &Value) -> OverloadResult {
        self(left, right)
    }
}

/// Handler for one-operand hooks.
pub trait UnaryHandler: Send + Sync {
    fn apply(&self, operand: &Value) -> OverloadResult;
}

impl<F> UnaryHandler for F
where
    F: Fn(&Value) -> OverloadResult + Send + Sync,
{
    fn apply(&self, operand: &Value) -> OverloadResult {
        self(operand)
    }
}

/// Operator slot in an [`OperatorTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKey {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Increment,
    Decrement,
    Indirect,
    IndirectAssign,
    SelfAssign(BinaryOp),
}

enum Handler {
    Binary(Box<dyn BinaryHandler>),
    Unary(Box<dyn UnaryHandler>),
}

/// Dispatch table keyed by (operator, operand type name).
///
/// Binary operators are looked up by the left operand's type, then the
/// right's. All other hooks use the (first) operand's type.
#[derive(Default)]
pub struct OperatorTable {
    handlers: FxHashMap<OpKey, FxHashMap<String, Handler>>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: OpKey, type_name: &str, handler: Handler) {
        self.handlers
            .entry(key)
            .or_default()
            .insert(type_name.to_owned(), handler);
    }

    fn lookup(&self, key: OpKey, type_name: &str) -> Option<&Handler> {
        self.handlers.get(&key)?.get(type_name)
    }

    #[must_use]
    pub fn on_binary(
        mut self,
        op: BinaryOp,
        type_name: &str,
        handler: impl BinaryHandler + 'static,
    ) -> Self {
        self.insert(OpKey::Binary(op), type_name, Handler::Binary(Box::new(handler)));
        self
    }

    #[must_use]
    pub fn on_unary(
        mut self,
        op: UnaryOp,
        type_name: &str,
        handler: impl UnaryHandler + 'static,
    ) -> Self {
        self.insert(OpKey::Unary(op), type_name, Handler::Unary(Box::new(handler)));
        self
    }

    #[must_use]
    pub fn on_increment(mut self, type_name: &str, handler: impl UnaryHandler + 'static) -> Self {
        self.insert(OpKey::Increment, type_name, Handler::Unary(Box::new(handler)));
        self
    }

    #[must_use]
    pub fn on_decrement(mut self, type_name: &str, handler: impl UnaryHandler + 'static) -> Self {
        self.insert(OpKey::Decrement, type_name, Handler::Unary(Box::new(handler)));
        self
    }

    #[must_use]
    pub fn on_indirect(mut self, type_name: &str, handler: impl UnaryHandler + 'static) -> Self {
        self.insert(OpKey::Indirect, type_name, Handler::Unary(Box::new(handler)));
        self
    }

    #[must_use]
    pub fn on_indirect_assign(
        mut self,
        type_name: &str,
        handler: impl BinaryHandler + 'static,
    ) -> Self {
        self.insert(
            OpKey::IndirectAssign,
            type_name,
            Handler::Binary(Box::new(handler)),
        );
        self
    }

    #[must_use]
    pub fn on_self_assign(
        mut self,
        op: BinaryOp,
        type_name: &str,
        handler: impl BinaryHandler + 'static,
    ) -> Self {
        self.insert(
            OpKey::SelfAssign(op),
            type_name,
            Handler::Binary(Box::new(handler)),
        );
        self
    }

    fn dispatch_unary(&self, key: OpKey, operand: &Value) -> OverloadResult {
        match self.lookup(key, operand.type_name()) {
            Some(Handler::Unary(handler)) => handler.apply(operand),
            _ => Ok(Overload::Unhandled),
        }
    }

    fn dispatch_binary(&self, key: OpKey, left: &Value, right: &Value) -> OverloadResult {
        match self.lookup(key, left.type_name()) {
            Some(Handler::Binary(handler)) => handler.apply(left, right),
            _ => Ok(Overload::Unhandled),
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Arithmetic for OperatorTable {
    fn binary(&self, op: BinaryOp, left: &Value, right: &Value, _: &Options) -> OverloadResult {
        let key = OpKey::Binary(op);
        match self.dispatch_binary(key, left, right)? {
            Overload::Unhandled if left.type_name() != right.type_name() => {
                match self.lookup(key, right.type_name()) {
                    Some(Handler::Binary(handler)) => handler.apply(left, right),
                    _ => Ok(Overload::Unhandled),
                }
            }
            handled => Ok(handled),
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Value, _: &Options) -> OverloadResult {
        self.dispatch_unary(OpKey::Unary(op), operand)
    }

    fn increment(&self, operand: &Value) -> OverloadResult {
        self.dispatch_unary(OpKey::Increment, operand)
    }

    fn decrement(&self, operand: &Value) -> OverloadResult {
        self.dispatch_unary(OpKey::Decrement, operand)
    }

    fn indirect(&self, operand: &Value) -> OverloadResult {
        self.dispatch_unary(OpKey::Indirect, operand)
    }

    fn indirect_assign(&self, operand: &Value, value: &Value) -> OverloadResult {
        self.dispatch_binary(OpKey::IndirectAssign, operand, value)
    }

    fn self_assign(
        &self,
        op: BinaryOp,
        target: &Value,
        value: &Value,
        _: &Options,
    ) -> OverloadResult {
        self.dispatch_binary(OpKey::SelfAssign(op), target, value)
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .iter()
            .flat_map(|(op, types)| types.keys().map(move |ty| format!("{op:?}/{ty}")))
            .collect();
        keys.sort();
        f.debug_struct("OperatorTable").field("handlers", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use super::*;

    #[test]
    fn test_default_is_unhandled() {
        let result = DefaultArithmetic.increment(&Value::Int(1)).unwrap();
        assert!(matches!(result, Overload::Unhandled));
    }

    #[test]
    fn test_table_dispatches_on_type_name() {
        let concat = |l: &Value, r: &Value| -> OverloadResult {
            Ok(Overload::Value(Value::owned_string(format!("{l}|{r}"))))
        };
        let table = OperatorTable::new().on_binary(BinaryOp::Add, "string", concat);
        let options = Options::default();
        let hit = table
            .binary(BinaryOp::Add, &Value::string("a"), &Value::Int(1), &options)
            .unwrap();
        assert!(matches!(hit, Overload::Value(v) if v == Value::string("a|1")));

        // Falls back to the right operand's type.
        let right = table
            .binary(BinaryOp::Add, &Value::Int(1), &Value::string("b"), &options)
            .unwrap();
        assert!(matches!(right, Overload::Value(v) if v == Value::string("1|b")));

        let miss = table
            .binary(BinaryOp::Sub, &Value::string("a"), &Value::Int(1), &options)
            .unwrap();
        assert!(matches!(miss, Overload::Unhandled));
    }

    #[test]
    fn test_assigned_sentinel_passes_through() {
        let table = OperatorTable::new().on_increment("integer", |_: &Value| -> OverloadResult {
            Ok(Overload::Assigned)
        });
        assert!(matches!(
            table.increment(&Value::Int(3)).unwrap(),
            Overload::Assigned
        ));
        assert!(matches!(
            table.decrement(&Value::Int(3)).unwrap(),
            Overload::Unhandled
        ));
        assert_eq!(table.len(), 1);
    }
}
