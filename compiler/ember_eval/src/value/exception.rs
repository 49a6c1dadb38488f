//! Exception values: thrown by `throw`, bound by `catch`.

use std::sync::Arc;

use super::Value;

/// Type name of exceptions wrapping a thrown non-exception value.
pub const SCRIPT_EXCEPTION: &str = "ScriptException";

#[derive(Debug)]
pub struct ExceptionValue {
    type_name: Arc<str>,
    message: String,
    payload: Value,
}

impl ExceptionValue {
    pub(crate) fn new(type_name: &str, message: impl Into<String>, payload: Value) -> Self {
        ExceptionValue {
            type_name: Arc::from(type_name),
            message: message.into(),
            payload,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Thrown value for wrapped throws; null otherwise.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
