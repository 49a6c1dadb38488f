//! Argument coercion for typed parameters.

use ember_ir::ast::ParamType;

use crate::errors::{coercion, null_primitive, EvalError};
use crate::operators::int_to_float;
use crate::value::{ArrayValue, Value};

fn type_label(ty: ParamType) -> &'static str {
    ty.keyword().unwrap_or("any")
}

/// Zero value of a primitive type.
pub fn zero_value(ty: ParamType) -> Value {
    match ty {
        ParamType::Any => Value::Null,
        ParamType::Int | ParamType::Long | ParamType::Short | ParamType::Byte => Value::Int(0),
        ParamType::Double | ParamType::Float => Value::Float(0.0),
        ParamType::Boolean => Value::Bool(false),
        ParamType::Char => Value::Char('\0'),
    }
}

/// Convert an argument for a parameter of type `ty`.
///
/// Null becomes the zero value, or a `NullPrimitive` failure when `strict`.
pub fn coerce_param(value: Value, ty: ParamType, param: &str, strict: bool) -> Result<Value, EvalError> {
    if ty == ParamType::Any {
        return Ok(value);
    }
    match (ty, &value) {
        (_, Value::Null) if strict => Err(null_primitive(param)),
        (_, Value::Null) => Ok(zero_value(ty)),
        (ParamType::Int | ParamType::Long | ParamType::Short | ParamType::Byte, _) => {
            integral(&value, ty).map(Value::Int)
        }
        (ParamType::Double | ParamType::Float, _) => floating(&value, ty).map(Value::Float),
        (ParamType::Boolean, _) => boolean(&value).map(Value::Bool),
        (ParamType::Char, _) => character(&value).map(Value::Char),
        (ParamType::Any, _) => Ok(value.clone()),
    }
}

/// Narrow with two's-complement wrap.
#[expect(
    clippy::cast_possible_truncation,
    reason = "integral narrowing wraps by definition"
)]
fn wrap(n: i64, ty: ParamType) -> i64 {
    match ty {
        ParamType::Int => i64::from(n as i32),
        ParamType::Short => i64::from(n as i16),
        ParamType::Byte => i64::from(n as i8),
        _ => n,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to integer conversion truncates toward zero and saturates"
)]
fn integral(value: &Value, ty: ParamType) -> Result<i64, EvalError> {
    let n = match value {
        Value::Int(n) => *n,
        Value::Float(f) => *f as i64,
        Value::Char(c) => i64::from(u32::from(*c)),
        Value::Bool(b) => i64::from(*b),
        Value::Str(s) => match s.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => match s.trim().parse::<f64>() {
                Ok(f) => f as i64,
                Err(_) => return Err(coercion(value, type_label(ty))),
            },
        },
        _ => return Err(coercion(value, type_label(ty))),
    };
    Ok(wrap(n, ty))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "single precision parameters round through f32"
)]
fn floating(value: &Value, ty: ParamType) -> Result<f64, EvalError> {
    let f = match value {
        Value::Int(n) => int_to_float(*n),
        Value::Float(f) => *f,
        Value::Char(c) => f64::from(u32::from(*c)),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| coercion(value, type_label(ty)))?,
        _ => return Err(coercion(value, type_label(ty))),
    };
    Ok(if ty == ParamType::Float {
        f64::from(f as f32)
    } else {
        f
    })
}

fn boolean(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(*n != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Str(s) => match s.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(coercion(value, "boolean")),
        },
        _ => Err(coercion(value, "boolean")),
    }
}

fn character(value: &Value) -> Result<char, EvalError> {
    match value {
        Value::Char(c) => Ok(*c),
        Value::Int(n) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| coercion(value, "char")),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(coercion(value, "char")),
            }
        }
        _ => Err(coercion(value, "char")),
    }
}

/// Whether `array` can stand in for the variadic tail of element type `elem`.
pub fn array_compatible(array: &ArrayValue, elem: ParamType) -> bool {
    elem == ParamType::Any
        || array.elem() == elem
        || (array.elem() == ParamType::Any
            && array
                .snapshot()
                .into_iter()
                .all(|item| coerce_param(item, elem, "", true).is_ok()))
}

/// Collect variadic arguments into an array of element type `elem`.
pub fn collect_variadic(
    args: Vec<Value>,
    elem: ParamType,
    param: &str,
    strict: bool,
) -> Result<Value, EvalError> {
    let array = match args.as_slice() {
        [Value::Array(array)] if array_compatible(array, elem) => Some(array.clone()),
        _ => None,
    };
    if let Some(array) = array {
        if elem == ParamType::Any || array.elem() == elem {
            return Ok(Value::Array(array));
        }
        let items = array
            .snapshot()
            .into_iter()
            .map(|item| coerce_param(item, elem, param, strict))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::typed_array(elem, items));
    }
    let items = args
        .into_iter()
        .map(|arg| coerce_param(arg, elem, param, strict))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::typed_array(elem, items))
}
