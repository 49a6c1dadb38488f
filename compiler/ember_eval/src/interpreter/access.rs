//! Member and index reads.

use super::Interpreter;
use crate::errors::{undefined_property, EvalResult};
use crate::methods;
use crate::value::Value;

impl Interpreter<'_> {
    /// `receiver.name`: built-ins first, then the resolver.
    pub(super) fn get_property(&mut self, receiver: &Value, name: &str) -> EvalResult {
        if let Some(result) = methods::property(receiver, name) {
            return Ok(result?);
        }
        if !receiver.is_null() {
            if let Some(result) = self.resolver.get_property(receiver, &Value::string(name)) {
                return Ok(result?);
            }
        }
        self.unsolvable(undefined_property(name, receiver))
    }

    /// `receiver[index]`
    pub(super) fn get_index(&mut self, receiver: &Value, index: &Value) -> EvalResult {
        if let Some(result) = methods::index(receiver, index) {
            return Ok(result?);
        }
        if !receiver.is_null() {
            if let Some(result) = self.resolver.get_property(receiver, index) {
                return Ok(result?);
            }
        }
        self.unsolvable(undefined_property(&index.to_string(), receiver))
    }
}
