//! Function calls, method calls and `new`.

use std::sync::Arc;

use super::Interpreter;
use crate::coerce::{coerce_param, collect_variadic};
use crate::errors::{stack_overflow, undefined_method, unknown_type, ControlAction, EvalResult};
use crate::methods;
use crate::value::{FunctionValue, Value};

impl Interpreter<'_> {
    /// Call a closure with `args` after its curried prefix.
    #[tracing::instrument(level = "trace", skip_all, fields(function = function.name()))]
    pub(super) fn call_function(&mut self, function: &FunctionValue, args: Vec<Value>) -> EvalResult {
        self.check_cancelled()?;
        if self.depth >= self.options.max_depth {
            return Err(stack_overflow(self.options.max_depth).into());
        }

        let mut args: Vec<Value> = function.curried().iter().cloned().chain(args).collect();
        let frame = function.captured().child_in(self.frames.epoch());
        let strict = self.options.strict;
        for (i, param) in function.params().iter().enumerate() {
            let name = function.program().lookup(param.name);
            let value = if param.variadic {
                let rest = if i < args.len() { args.split_off(i) } else { Vec::new() };
                collect_variadic(rest, param.ty, name, strict)?
            } else {
                let arg = args.get(i).cloned().unwrap_or_default();
                coerce_param(arg, param.ty, name, strict)?
            };
            frame.define(param.name, value);
        }

        let caller = std::mem::replace(&mut self.program, Arc::clone(function.program()));
        self.depth += 1;
        let result = self.eval(function.def().body, &frame);
        self.depth -= 1;
        self.program = caller;

        match result {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Break | ControlAction::Continue) => Ok(Value::Null),
            Err(err) => Err(err),
        }
    }

    /// `receiver.method(args)`: built-ins, map-held functions, then the
    /// resolver.
    pub(super) fn call_method(&mut self, receiver: &Value, method: &str, args: Vec<Value>) -> EvalResult {
        if let Value::Function(function) = receiver {
            match method {
                "curry" => return Ok(Value::function(function.curry(&args))),
                "call" => return self.call_function(function, args),
                _ => {}
            }
        }
        if let Some(result) = methods::method(receiver, method, &args) {
            return Ok(result?);
        }
        if let Value::Map(map) = receiver {
            if let Some(Value::Function(function)) = map.get(&Value::string(method)) {
                return self.call_function(&function, args);
            }
        }
        if !receiver.is_null() {
            if let Some(result) = self.resolver.invoke(receiver, method, &args) {
                return Ok(result?);
            }
        }
        self.unsolvable(undefined_method(method, receiver))
    }

    /// `new(type, args...)`
    ///
    /// The resolver constructs host types. Without it, names ending in
    /// `Exception` or `Error` build exceptions (message, then payload) and
    /// `Reference` builds a reference cell.
    pub(super) fn construct(&mut self, type_name: &Value, args: Vec<Value>) -> EvalResult {
        let name = type_name.to_string();
        if let Some(result) = self.resolver.construct(&name, &args) {
            return Ok(result?);
        }
        let mut args = args.into_iter();
        if name.ends_with("Exception") || name.ends_with("Error") {
            let message = args.next().map(|m| m.to_string()).unwrap_or_default();
            let payload = args.next().unwrap_or_default();
            return Ok(Value::exception(&name, message, payload));
        }
        if name == "Reference" {
            return Ok(Value::reference(args.next().unwrap_or_default()));
        }
        self.unsolvable(unknown_type(&name))
    }
}
