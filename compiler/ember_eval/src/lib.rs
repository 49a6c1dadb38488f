//! Tree-walking interpreter for Ember scripts.
//!
//! - `value`: runtime values (`Value`, collections, closures, exceptions)
//! - `environment`: lexical frames shared by closures
//! - `interpreter`: evaluation of a [`Program`] against a [`Context`]
//! - `arithmetic`: operator overloading hooks and the default delegate
//! - `resolver`: host object access (properties, methods, construction)
//! - `errors`: runtime failures and non-local control flow
//!
//! Built-in operator semantics live in `operators`, built-in methods on
//! values in `methods`, and parameter coercion in `coerce`.

mod arithmetic;
mod cancel;
mod coerce;
mod context;
mod environment;
pub mod errors;
mod interpreter;
mod methods;
mod monitor;
pub mod operators;
mod options;
mod program;
mod resolver;
pub mod value;

pub use arithmetic::{
    Arithmetic, BinaryHandler, DefaultArithmetic, OpKey, OperatorTable, Overload, OverloadResult,
    UnaryHandler,
};
pub use cancel::CancelToken;
pub use context::{Context, MapContext, SharedContext};
pub use environment::{AssignError, Frame};
pub use errors::{ControlAction, EvalError, EvalErrorKind, EvalResult};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use monitor::{MonitorKey, MonitorRegistry};
pub use options::Options;
pub use program::Program;
pub use resolver::{HostValue, Indirect, NoResolver, Resolution, Resolver};
pub use value::{
    ArrayValue, ExceptionValue, FunctionValue, MapValue, RangeValue, SetValue, Value,
    SCRIPT_EXCEPTION,
};
