//! Host introspection capability.
//!
//! The interpreter knows nothing about host types. Property access, method
//! calls and `new` on values it does not understand natively are delegated
//! to a [`Resolver`]; each hook returns `None` when it declines the request.

use std::any::Any;
use std::fmt;

use crate::errors::EvalError;
use crate::value::Value;

/// Readable and writable indirection, the capability behind `*x`.
pub trait Indirect: Send + Sync {
    fn get(&self) -> Value;
    fn set(&self, value: Value);
}

/// Opaque host object stored in a `Value::Host`.
pub trait HostValue: Send + Sync + fmt::Debug {
    /// Type name used for operator dispatch and error messages.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// Reference-cell capability, if this object is one.
    fn as_reference(&self) -> Option<&dyn Indirect> {
        None
    }

    /// String form used by concatenation and templates.
    fn display(&self) -> String {
        format!("{self:?}")
    }
}

/// Result of a resolver hook: `None` declines, `Some` handles.
pub type Resolution = Option<Result<Value, EvalError>>;

/// Host-side property, method and constructor resolution.
pub trait Resolver: Send + Sync {
    fn get_property(&self, target: &Value, key: &Value) -> Resolution {
        let _ = (target, key);
        None
    }

    fn set_property(&self, target: &Value, key: &Value, value: &Value) -> Resolution {
        let _ = (target, key, value);
        None
    }

    fn invoke(&self, target: &Value, method: &str, args: &[Value]) -> Resolution {
        let _ = (target, method, args);
        None
    }

    fn construct(&self, type_name: &str, args: &[Value]) -> Resolution {
        let _ = (type_name, args);
        None
    }
}

/// Resolver that handles nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoResolver;

impl Resolver for NoResolver {}
