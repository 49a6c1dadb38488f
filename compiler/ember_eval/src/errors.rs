//! Evaluation errors and control-flow signals.
//!
//! `EvalErrorKind` carries the structured category; factory functions build
//! both kind and message. Every evaluation step returns [`EvalResult`], whose
//! error side is a [`ControlAction`]: a genuine failure or one of the
//! non-local exits (`break`, `continue`, `return`).

use std::fmt;

use ember_ir::Span;

use crate::value::{Value, SCRIPT_EXCEPTION};

/// Result of evaluating a node.
pub type EvalResult = Result<Value, ControlAction>;

/// Non-local exit threaded through evaluation.
#[derive(Clone, Debug)]
pub enum ControlAction {
    Error(Box<EvalError>),
    Break,
    Continue,
    Return(Value),
}

impl ControlAction {
    /// The failure carried, if this is one.
    pub fn into_error(self) -> Option<EvalError> {
        match self {
            ControlAction::Error(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<EvalError> for ControlAction {
    #[inline]
    fn from(err: EvalError) -> Self {
        ControlAction::Error(Box::new(err))
    }
}

/// Structured error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Arithmetic
    DivisionByZero,
    IntegerOverflow { operation: String },
    /// Null operand under strict arithmetic.
    NullOperand { operation: String },
    InvalidOperand { operation: String, type_name: String },
    InvalidRegex { pattern: String },

    // Bindings
    UndefinedVariable { name: String },
    ImmutableBinding { name: String },
    Redeclaration { name: String },

    // Access
    UndefinedProperty { name: String, type_name: String },
    UndefinedMethod { method: String, type_name: String },
    UnknownType { name: String },
    IndexOutOfBounds { index: i64, len: usize },
    NullDereference,
    NotIterable { type_name: String },

    // Calls
    NotCallable { type_name: String },
    NullPrimitive { param: String },
    Coercion { from: String, to: String },
    StackOverflow { depth: usize },

    // Script-raised
    Thrown,
    AssertionFailed,
    Cancelled,

    Custom,
}

impl EvalErrorKind {
    /// Exception type name a `catch` clause sees for this failure.
    pub fn exception_type(&self) -> &'static str {
        match self {
            Self::DivisionByZero
            | Self::IntegerOverflow { .. }
            | Self::NullOperand { .. }
            | Self::InvalidOperand { .. } => "ArithmeticException",
            Self::UndefinedVariable { .. }
            | Self::UndefinedProperty { .. }
            | Self::UndefinedMethod { .. }
            | Self::UnknownType { .. } => "UnsolvableException",
            Self::NullDereference | Self::NullPrimitive { .. } => "NullPointerException",
            Self::IndexOutOfBounds { .. } => "IndexOutOfBoundsException",
            Self::Coercion { .. } => "CoercionException",
            Self::StackOverflow { .. } => "StackOverflowError",
            Self::AssertionFailed => "AssertionError",
            Self::Cancelled => "CancellationException",
            Self::InvalidRegex { .. }
            | Self::ImmutableBinding { .. }
            | Self::Redeclaration { .. }
            | Self::NotIterable { .. }
            | Self::NotCallable { .. }
            | Self::Thrown
            | Self::Custom => SCRIPT_EXCEPTION,
        }
    }

    /// Failures that `silent` mode turns into null.
    pub fn is_unsolvable(&self) -> bool {
        matches!(
            self,
            Self::UndefinedVariable { .. }
                | Self::UndefinedProperty { .. }
                | Self::UndefinedMethod { .. }
                | Self::UnknownType { .. }
                | Self::NullDereference
        )
    }
}

/// Evaluation failure.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    pub span: Option<Span>,
    /// Thrown value for `Thrown` (always an exception value).
    pub value: Option<Value>,
}

impl EvalError {
    #[cold]
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            span: None,
            value: None,
        }
    }

    /// Attach a span unless one is already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// The exception value a `catch` clause binds for this failure.
    pub fn to_exception(&self) -> Value {
        if let Some(value @ Value::Exception(_)) = &self.value {
            return value.clone();
        }
        Value::exception(self.kind.exception_type(), self.message.clone(), Value::Null)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

// Factories

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero, "division by zero")
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::IntegerOverflow {
            operation: operation.to_owned(),
        },
        format!("integer overflow in `{operation}`"),
    )
}

#[cold]
pub fn null_operand(operation: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NullOperand {
            operation: operation.to_owned(),
        },
        format!("null operand for `{operation}`"),
    )
}

#[cold]
pub fn invalid_operand(operation: &str, value: &Value) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidOperand {
            operation: operation.to_owned(),
            type_name: value.type_name().to_owned(),
        },
        format!("`{operation}` cannot be applied to {}", value.type_name()),
    )
}

#[cold]
pub fn invalid_regex(pattern: &str, reason: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidRegex {
            pattern: pattern.to_owned(),
        },
        format!("invalid pattern `{pattern}`: {reason}"),
    )
}

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::UndefinedVariable {
            name: name.to_owned(),
        },
        format!("undefined variable `{name}`"),
    )
}

#[cold]
pub fn immutable_binding(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::ImmutableBinding {
            name: name.to_owned(),
        },
        format!("cannot assign to constant `{name}`"),
    )
}

#[cold]
pub fn redeclaration(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Redeclaration {
            name: name.to_owned(),
        },
        format!("`{name}` is already declared in this scope"),
    )
}

#[cold]
pub fn undefined_property(name: &str, receiver: &Value) -> EvalError {
    EvalError::new(
        EvalErrorKind::UndefinedProperty {
            name: name.to_owned(),
            type_name: receiver.type_name().to_owned(),
        },
        format!("unsolvable property `{name}` on {}", receiver.type_name()),
    )
}

#[cold]
pub fn undefined_method(method: &str, receiver: &Value) -> EvalError {
    EvalError::new(
        EvalErrorKind::UndefinedMethod {
            method: method.to_owned(),
            type_name: receiver.type_name().to_owned(),
        },
        format!("unsolvable method `{method}` on {}", receiver.type_name()),
    )
}

#[cold]
pub fn unknown_type(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::UnknownType {
            name: name.to_owned(),
        },
        format!("cannot instantiate `{name}`"),
    )
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::IndexOutOfBounds { index, len },
        format!("index {index} out of bounds for length {len}"),
    )
}

#[cold]
pub fn null_dereference() -> EvalError {
    EvalError::new(EvalErrorKind::NullDereference, "null dereference")
}

#[cold]
pub fn not_iterable(value: &Value) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotIterable {
            type_name: value.type_name().to_owned(),
        },
        format!("{} is not iterable", value.type_name()),
    )
}

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotCallable {
            type_name: value.type_name().to_owned(),
        },
        format!("{} is not callable", value.type_name()),
    )
}

#[cold]
pub fn null_primitive(param: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NullPrimitive {
            param: param.to_owned(),
        },
        format!("null passed to primitive parameter `{param}`"),
    )
}

#[cold]
pub fn coercion(value: &Value, to: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Coercion {
            from: value.type_name().to_owned(),
            to: to.to_owned(),
        },
        format!("cannot convert {} `{value}` to {to}", value.type_name()),
    )
}

#[cold]
pub fn stack_overflow(depth: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::StackOverflow { depth },
        format!("maximum call depth exceeded (limit: {depth})"),
    )
}

/// Failure raised by `throw`; `exception` must be an exception value.
#[cold]
pub fn thrown(exception: Value) -> EvalError {
    let message = match &exception {
        Value::Exception(e) => e.message().to_owned(),
        other => other.to_string(),
    };
    EvalError {
        kind: EvalErrorKind::Thrown,
        message,
        span: None,
        value: Some(exception),
    }
}

#[cold]
pub fn assertion_failed(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::AssertionFailed, message)
}

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::new(EvalErrorKind::Cancelled, "evaluation cancelled")
}
