//! Runtime values.
//!
//! Scalars are stored inline. Heap variants go through [`Heap`], an `Arc`
//! wrapper with a crate-private constructor, so copying a value aliases it
//! and identity comparison is pointer equality.

mod collections;
mod exception;
mod function;
mod heap;

use std::fmt;
use std::sync::Arc;

use ember_ir::ast::ParamType;
use parking_lot::RwLock;

pub use collections::{ArrayValue, MapValue, OrderedMap, RangeValue, SetValue, ValueKey};
pub use exception::{ExceptionValue, SCRIPT_EXCEPTION};
pub use function::FunctionValue;
pub use heap::Heap;

use crate::resolver::{HostValue, Indirect};

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(Heap<str>),
    Array(Heap<ArrayValue>),
    Map(Heap<MapValue>),
    Set(Heap<SetValue>),
    Range(RangeValue),
    Function(Heap<FunctionValue>),
    Exception(Heap<ExceptionValue>),
    /// Engine reference cell, read and written through `*x`.
    Reference(Heap<ReferenceCell>),
    /// Opaque host object.
    Host(Arc<dyn HostValue>),
}

/// Mutable cell behind a `Value::Reference`.
#[derive(Debug, Default)]
pub struct ReferenceCell(RwLock<Value>);

impl Indirect for ReferenceCell {
    fn get(&self) -> Value {
        self.0.read().clone()
    }

    fn set(&self, value: Value) {
        *self.0.write() = value;
    }
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Heap::from_str(s.as_ref()))
    }

    #[inline]
    pub fn owned_string(s: String) -> Self {
        Value::Str(Heap::from_string(s))
    }

    /// Untyped array.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Heap::new(ArrayValue::new(ParamType::Any, items)))
    }

    /// Array tagged with an element type.
    pub fn typed_array(elem: ParamType, items: Vec<Value>) -> Self {
        Value::Array(Heap::new(ArrayValue::new(elem, items)))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in entries {
            map.insert(k, v);
        }
        Value::Map(Heap::new(MapValue::new(map)))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut set = OrderedMap::new();
        for item in items {
            set.insert(item, ());
        }
        Value::Set(Heap::new(SetValue::new(set)))
    }

    pub fn range(start: i64, end: i64) -> Self {
        Value::Range(RangeValue::new(start, end))
    }

    /// Exception value with the given type name, message and payload.
    pub fn exception(type_name: &str, message: impl Into<String>, payload: Value) -> Self {
        Value::Exception(Heap::new(ExceptionValue::new(type_name, message, payload)))
    }

    /// Fresh reference cell holding `initial`.
    pub fn reference(initial: Value) -> Self {
        Value::Reference(Heap::new(ReferenceCell(RwLock::new(initial))))
    }

    pub fn host(value: impl HostValue + 'static) -> Self {
        Value::Host(Arc::new(value))
    }

    pub(crate) fn function(function: FunctionValue) -> Self {
        Value::Function(Heap::new(function))
    }
}

// Inspection

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truth value: null, `false`, zero, `'\0'`, empty strings and empty
    /// collections are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Char(c) => *c != '\0',
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::Range(_)
            | Value::Function(_)
            | Value::Exception(_)
            | Value::Reference(_)
            | Value::Host(_) => true,
        }
    }

    /// Type name used for errors and operator dispatch.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Exception(e) => e.type_name(),
            Value::Reference(_) => "reference",
            Value::Host(h) => h.type_name(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&Arc<dyn HostValue>> {
        match self {
            Value::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Address of the heap allocation; `None` for inline scalars.
    pub fn address(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.address()),
            Value::Array(a) => Some(a.address()),
            Value::Map(m) => Some(m.address()),
            Value::Set(s) => Some(s.address()),
            Value::Function(f) => Some(f.address()),
            Value::Exception(e) => Some(e.address()),
            Value::Reference(r) => Some(r.address()),
            Value::Host(h) => Some(Arc::as_ptr(h).cast::<u8>() as usize),
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Char(_)
            | Value::Range(_) => None,
        }
    }

    /// Strong count of heap values that can hold other values.
    pub(crate) fn strong_count(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.strong_count()),
            Value::Map(m) => Some(m.strong_count()),
            Value::Set(s) => Some(s.strong_count()),
            Value::Function(f) => Some(f.strong_count()),
            Value::Exception(e) => Some(e.strong_count()),
            Value::Reference(r) => Some(r.strong_count()),
            _ => None,
        }
    }

    /// Visit the values this one holds directly.
    ///
    /// Host objects are opaque and a function's captured frame is not a
    /// value; neither is visited.
    pub(crate) fn visit_children(&self, f: &mut dyn FnMut(&Value)) {
        match self {
            Value::Array(a) => a.visit(f),
            Value::Map(m) => m.visit(f),
            Value::Set(s) => s.visit(f),
            Value::Function(function) => function.curried().iter().for_each(f),
            Value::Exception(e) => f(e.payload()),
            Value::Reference(cell) => f(&*cell.0.read()),
            _ => {}
        }
    }

    /// Built-in or host reference capability behind `*x`.
    pub fn as_indirect(&self) -> Option<&dyn Indirect> {
        match self {
            Value::Reference(cell) => Some(&**cell),
            Value::Host(h) => h.as_reference(),
            _ => None,
        }
    }
}

/// Float text: integral values keep a trailing `.0`.
pub(crate) fn format_float(f: f64) -> String {
    format!("{f:?}")
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// String form, as produced by concatenation and templates.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(a) => {
                f.write_str("[")?;
                write_joined(f, &a.snapshot())?;
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.snapshot().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Set(s) => {
                f.write_str("{")?;
                write_joined(f, &s.snapshot())?;
                f.write_str("}")
            }
            Value::Range(r) => write!(f, "{} .. {}", r.start, r.end),
            Value::Function(func) => match func.name() {
                Some(name) => write!(f, "<function {name}>"),
                None => f.write_str("<lambda>"),
            },
            Value::Exception(e) => f.write_str(e.message()),
            Value::Reference(r) => write!(f, "{}", r.get()),
            Value::Host(h) => f.write_str(&h.display()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Exception(e) => write!(f, "{}({:?})", e.type_name(), e.message()),
            Value::Host(h) => write!(f, "<{}: {}>", h.type_name(), h.display()),
            other => write!(f, "{other}"),
        }
    }
}

/// Structural equality for host code and tests.
///
/// Numbers compare across integer and float; collections by contents;
/// functions, exceptions, references and host values by identity. The
/// script-level `==` adds string/number coercion on top (see
/// `operators::loose_equals`).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                crate::operators::int_to_float(*a) == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || a.snapshot() == b.snapshot(),
            (Value::Set(a), Value::Set(b)) => {
                a.ptr_eq(b)
                    || (a.len() == b.len() && a.snapshot().iter().all(|item| b.contains(item)))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.ptr_eq(b)
                    || (a.len() == b.len()
                        && a
                            .snapshot()
                            .iter()
                            .all(|(k, v)| b.get(k).is_some_and(|bv| *v == bv)))
            }
            _ => match (self.address(), other.address()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::owned_string(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
