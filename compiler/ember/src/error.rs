//! Public error taxonomy.

use ember_eval::{EvalError, EvalErrorKind, Value};
use ember_ir::Span;
use ember_parse::ParseError;

/// Failure of compiling or executing a script.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// Malformed source; only raised when a script is created.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Engine failure during evaluation.
    #[error("{0}")]
    Runtime(EvalError),

    /// Uncaught `throw`.
    #[error("{message}")]
    Thrown {
        message: String,
        /// The thrown exception value.
        value: Value,
        span: Option<Span>,
    },

    /// Failed `assert` with assertions enabled.
    #[error("assertion failed: {message}")]
    Assertion { message: String, span: Option<Span> },

    #[error("evaluation cancelled")]
    Cancelled,
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        match err.kind {
            EvalErrorKind::Thrown => Error::Thrown {
                message: err.message,
                value: err.value.unwrap_or_default(),
                span: err.span,
            },
            EvalErrorKind::AssertionFailed => Error::Assertion {
                message: err.message,
                span: err.span,
            },
            EvalErrorKind::Cancelled => Error::Cancelled,
            _ => Error::Runtime(err),
        }
    }
}

impl Error {
    /// The bare message, without the category prefix `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            Error::Parse(err) => &err.message,
            Error::Runtime(err) => &err.message,
            Error::Thrown { message, .. } | Error::Assertion { message, .. } => message,
            Error::Cancelled => "evaluation cancelled",
        }
    }

    /// Short category name: `parse`, `runtime`, `thrown`, `assertion` or
    /// `cancelled`.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parse",
            Error::Runtime(_) => "runtime",
            Error::Thrown { .. } => "thrown",
            Error::Assertion { .. } => "assertion",
            Error::Cancelled => "cancelled",
        }
    }

    /// Source location, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Parse(err) => Some(err.span),
            Error::Runtime(err) => err.span,
            Error::Thrown { span, .. } | Error::Assertion { span, .. } => *span,
            Error::Cancelled => None,
        }
    }

    /// Structured runtime category, for `Runtime` errors.
    pub fn runtime_kind(&self) -> Option<&EvalErrorKind> {
        match self {
            Error::Runtime(err) => Some(&err.kind),
            _ => None,
        }
    }
}
