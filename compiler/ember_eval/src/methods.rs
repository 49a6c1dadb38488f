//! Built-in members of engine values.
//!
//! Properties, indexing and methods on strings, collections, ranges,
//! exceptions, references and functions. Every entry point returns `None`
//! when the receiver has no such built-in, so the interpreter can fall back
//! to the resolver.

use crate::errors::{index_out_of_bounds, integer_overflow, EvalError};
use crate::operators::loose_equals;
use crate::resolver::Indirect;
use crate::value::{Value, ValueKey};

pub type Builtin = Option<Result<Value, EvalError>>;

fn len_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Integer view of an index value.
pub fn as_index(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Char(c) => Some(i64::from(u32::from(*c))),
        Value::Float(f) => match ValueKey::of(&Value::Float(*f)) {
            ValueKey::Int(n) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

fn checked_index(index: i64, len: usize) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_bounds(index, len))
}

/// `size(x)`
///
/// A range with more elements than an `i64` can count fails with an
/// integer overflow.
pub fn size_of(value: &Value) -> Builtin {
    let size = match value {
        Value::Null => Value::Int(0),
        Value::Str(s) => len_value(s.chars().count()),
        Value::Array(a) => len_value(a.len()),
        Value::Map(m) => len_value(m.len()),
        Value::Set(s) => len_value(s.len()),
        Value::Range(r) => {
            return Some(
                i64::try_from(r.len())
                    .map(Value::Int)
                    .map_err(|_| integer_overflow("size")),
            )
        }
        _ => return None,
    };
    Some(Ok(size))
}

/// `empty(x)`
pub fn is_empty(value: &Value) -> Option<bool> {
    Some(match value {
        Value::Null => true,
        Value::Str(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Map(m) => m.is_empty(),
        Value::Set(s) => s.is_empty(),
        Value::Range(_) => false,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Char(_) => false,
        _ => return None,
    })
}

/// `receiver.name`
pub fn property(receiver: &Value, name: &str) -> Builtin {
    let value = match (receiver, name) {
        (Value::Map(map), _) => map.get(&Value::string(name)).unwrap_or_default(),
        (Value::Str(_) | Value::Array(_) | Value::Set(_) | Value::Range(_), "length" | "size") => {
            return size_of(receiver)
        }
        (Value::Range(r), "from" | "start") => Value::Int(r.start),
        (Value::Range(r), "to" | "end") => Value::Int(r.end),
        (Value::Exception(e), "message") => Value::string(e.message()),
        (Value::Exception(e), "type") => Value::string(e.type_name()),
        (Value::Exception(e), "value") => e.payload().clone(),
        (Value::Function(f), "name") => f.name().map_or(Value::Null, Value::string),
        (Value::Function(f), "arity") => len_value(f.arity()),
        (Value::Reference(r), "value") => r.get(),
        _ => return None,
    };
    Some(Ok(value))
}

/// `receiver.name = value`
pub fn set_property(receiver: &Value, name: &str, value: &Value) -> Option<Result<(), EvalError>> {
    match (receiver, name) {
        (Value::Map(map), _) => {
            map.insert(Value::string(name), value.clone());
            Some(Ok(()))
        }
        (Value::Reference(r), "value") => {
            r.set(value.clone());
            Some(Ok(()))
        }
        _ => None,
    }
}

/// `receiver[index]`
pub fn index(receiver: &Value, index: &Value) -> Builtin {
    match (receiver, index) {
        (Value::Map(map), key) => Some(Ok(map.get(key).unwrap_or_default())),
        (_, Value::Str(name)) => property(receiver, name),
        (Value::Array(array), _) => {
            let i = as_index(index)?;
            Some(checked_index(i, array.len()).map(|i| array.get(i).unwrap_or_default()))
        }
        (Value::Str(s), _) => {
            let i = as_index(index)?;
            let len = s.chars().count();
            Some(checked_index(i, len).map(|i| s.chars().nth(i).map_or(Value::Null, Value::Char)))
        }
        (Value::Range(range), _) => {
            let i = as_index(index)?;
            let len = usize::try_from(range.len()).unwrap_or(usize::MAX);
            Some(range.get(i).map(Value::Int).ok_or_else(|| index_out_of_bounds(i, len)))
        }
        _ => None,
    }
}

/// `receiver[index] = value`
pub fn set_index(receiver: &Value, index: &Value, value: &Value) -> Option<Result<(), EvalError>> {
    match (receiver, index) {
        (Value::Map(map), key) => {
            map.insert(key.clone(), value.clone());
            Some(Ok(()))
        }
        (_, Value::Str(name)) => set_property(receiver, name, value),
        (Value::Array(array), _) => {
            let i = as_index(index)?;
            Some(checked_index(i, array.len()).map(|i| {
                array.set(i, value.clone());
            }))
        }
        _ => None,
    }
}

/// `receiver.method(args)`; functions' `curry` is handled by the interpreter.
pub fn method(receiver: &Value, method: &str, args: &[Value]) -> Builtin {
    if method == "toString" && args.is_empty() {
        return Some(Ok(Value::owned_string(receiver.to_string())));
    }
    match receiver {
        Value::Str(s) => string_method(s, method, args),
        Value::Array(_) => array_method(receiver, method, args),
        Value::Map(_) => map_method(receiver, method, args),
        Value::Set(set) => match method {
            "size" => size_of(receiver),
            "isEmpty" => Some(Ok(Value::Bool(set.is_empty()))),
            "contains" => Some(Ok(Value::Bool(set.contains(&arg(args, 0))))),
            "add" => Some(Ok(Value::Bool(set.insert(arg(args, 0))))),
            "remove" => Some(Ok(Value::Bool(set.remove(&arg(args, 0))))),
            _ => None,
        },
        Value::Range(range) => match method {
            "size" => size_of(receiver),
            "contains" => Some(Ok(Value::Bool(
                as_index(&arg(args, 0)).is_some_and(|n| range.contains(n)),
            ))),
            _ => None,
        },
        Value::Exception(e) => match method {
            "getMessage" => Some(Ok(Value::string(e.message()))),
            "getValue" => Some(Ok(e.payload().clone())),
            "getType" => Some(Ok(Value::string(e.type_name()))),
            _ => None,
        },
        Value::Reference(r) => match method {
            "get" => Some(Ok(r.get())),
            "set" => {
                r.set(arg(args, 0));
                Some(Ok(Value::Null))
            }
            _ => None,
        },
        _ => None,
    }
}

fn string_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_string()
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Builtin {
    let value = match method {
        "length" | "size" => len_value(s.chars().count()),
        "isEmpty" => Value::Bool(s.is_empty()),
        "toUpperCase" => Value::owned_string(s.to_uppercase()),
        "toLowerCase" => Value::owned_string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "contains" => Value::Bool(s.contains(string_arg(args, 0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(string_arg(args, 0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(string_arg(args, 0).as_str())),
        "equals" => Value::Bool(s == string_arg(args, 0)),
        "indexOf" => {
            let needle = string_arg(args, 0);
            s.find(needle.as_str())
                .map_or(Value::Int(-1), |byte| len_value(s[..byte].chars().count()))
        }
        "charAt" => {
            let len = s.chars().count();
            let i = as_index(&arg(args, 0)).unwrap_or(-1);
            return Some(checked_index(i, len).map(|i| s.chars().nth(i).map_or(Value::Null, Value::Char)));
        }
        "substring" => {
            let len = s.chars().count();
            let start = as_index(&arg(args, 0)).unwrap_or(0);
            let end = match args.get(1) {
                Some(end) => as_index(end).unwrap_or(-1),
                None => i64::try_from(len).unwrap_or(i64::MAX),
            };
            let (Ok(start), Ok(end)) = (usize::try_from(start), usize::try_from(end)) else {
                return Some(Err(index_out_of_bounds(start.min(end), len)));
            };
            if start > end || end > len {
                return Some(Err(index_out_of_bounds(i64::try_from(end).unwrap_or(i64::MAX), len)));
            }
            Value::owned_string(char_slice(s, start, end))
        }
        "split" => {
            let sep = string_arg(args, 0);
            Value::array(s.split(sep.as_str()).map(Value::string).collect())
        }
        "replace" => Value::owned_string(s.replace(string_arg(args, 0).as_str(), &string_arg(args, 1))),
        _ => return None,
    };
    Some(Ok(value))
}

fn array_method(receiver: &Value, method: &str, args: &[Value]) -> Builtin {
    let Value::Array(array) = receiver else {
        return None;
    };
    let value = match method {
        "size" | "length" => len_value(array.len()),
        "isEmpty" => Value::Bool(array.is_empty()),
        "get" => return index(receiver, &arg(args, 0)),
        "set" => {
            let i = as_index(&arg(args, 0))?;
            let previous = match checked_index(i, array.len()) {
                Ok(i) => array.get(i).unwrap_or_default(),
                Err(err) => return Some(Err(err)),
            };
            return set_index(receiver, &arg(args, 0), &arg(args, 1)).map(|r| r.map(|()| previous));
        }
        "add" => {
            array.push(arg(args, 0));
            Value::Bool(true)
        }
        "remove" => {
            let i = as_index(&arg(args, 0))?;
            return Some(
                checked_index(i, array.len())
                    .map(|i| array.remove(i).unwrap_or_default()),
            );
        }
        "contains" => {
            let needle = arg(args, 0);
            Value::Bool(array.snapshot().iter().any(|item| loose_equals(item, &needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            array
                .snapshot()
                .iter()
                .position(|item| loose_equals(item, &needle))
                .map_or(Value::Int(-1), len_value)
        }
        "join" => {
            let sep = if args.is_empty() { ",".to_owned() } else { string_arg(args, 0) };
            let parts: Vec<String> = array.snapshot().iter().map(ToString::to_string).collect();
            Value::owned_string(parts.join(&sep))
        }
        _ => return None,
    };
    Some(Ok(value))
}

fn map_method(receiver: &Value, method: &str, args: &[Value]) -> Builtin {
    let Value::Map(map) = receiver else {
        return None;
    };
    let value = match method {
        "size" => len_value(map.len()),
        "isEmpty" => Value::Bool(map.is_empty()),
        "get" => map.get(&arg(args, 0)).unwrap_or_default(),
        "put" => map.insert(arg(args, 0), arg(args, 1)).unwrap_or_default(),
        "containsKey" => Value::Bool(map.contains_key(&arg(args, 0))),
        "remove" => map.remove(&arg(args, 0)).unwrap_or_default(),
        "keySet" | "keys" => Value::set(map.snapshot().into_iter().map(|(k, _)| k)),
        "values" => Value::array(map.snapshot().into_iter().map(|(_, v)| v).collect()),
        _ => return None,
    };
    Some(Ok(value))
}

/// Iteration items of a for-each subject.
pub fn iterate(value: &Value) -> Option<Vec<Value>> {
    Some(match value {
        Value::Null => Vec::new(),
        Value::Array(a) => a.snapshot(),
        Value::Set(s) => s.snapshot(),
        Value::Map(m) => m.snapshot().into_iter().map(|(_, v)| v).collect(),
        Value::Str(s) => s.chars().map(Value::Char).collect(),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use super::*;
    use crate::errors::EvalErrorKind;

    fn call(receiver: &Value, name: &str, args: &[Value]) -> Value {
        method(receiver, name, args).unwrap().unwrap()
    }

    mod strings {
        use super::*;

        #[test]
        fn basic_methods() {
            let s = Value::string("Hello");
            assert_eq!(call(&s, "length", &[]), Value::Int(5));
            assert_eq!(call(&s, "toUpperCase", &[]), Value::string("HELLO"));
            assert_eq!(call(&s, "indexOf", &[Value::string("l")]), Value::Int(2));
            assert_eq!(
                call(&s, "substring", &[Value::Int(1), Value::Int(3)]),
                Value::string("el")
            );
        }

        #[test]
        fn char_index() {
            let s = Value::string("abc");
            assert_eq!(index(&s, &Value::Int(1)).unwrap().unwrap(), Value::Char('b'));
            let err = index(&s, &Value::Int(3)).unwrap().unwrap_err();
            assert!(matches!(err.kind, EvalErrorKind::IndexOutOfBounds { .. }));
        }
    }

    mod collections {
        use super::*;

        #[test]
        fn array_add_and_get() {
            let a = Value::array(vec![Value::Int(1)]);
            assert_eq!(call(&a, "add", &[Value::Int(2)]), Value::Bool(true));
            assert_eq!(call(&a, "get", &[Value::Int(1)]), Value::Int(2));
            assert_eq!(size_of(&a).unwrap().unwrap(), Value::Int(2));
        }

        #[test]
        fn map_property_reads_key() {
            let m = Value::map([(Value::string("a"), Value::Int(1))]);
            assert_eq!(property(&m, "a").unwrap().unwrap(), Value::Int(1));
            assert_eq!(property(&m, "missing").unwrap().unwrap(), Value::Null);
            set_property(&m, "b", &Value::Int(2)).unwrap().unwrap();
            assert_eq!(call(&m, "get", &[Value::string("b")]), Value::Int(2));
        }

        #[test]
        fn set_index_bounds() {
            let a = Value::array(vec![Value::Int(1)]);
            assert!(set_index(&a, &Value::Int(0), &Value::Int(5)).unwrap().is_ok());
            assert!(set_index(&a, &Value::Int(4), &Value::Int(5)).unwrap().is_err());
        }

        #[test]
        fn empty_and_iterate() {
            assert_eq!(is_empty(&Value::Null), Some(true));
            assert_eq!(is_empty(&Value::array(vec![])), Some(true));
            assert_eq!(is_empty(&Value::string("x")), Some(false));
            let m = Value::map([(Value::string("k"), Value::Int(7))]);
            assert_eq!(iterate(&m).unwrap(), vec![Value::Int(7)]);
            assert_eq!(iterate(&Value::Null).unwrap(), vec![]);
        }
    }

    #[test]
    fn test_exception_members() {
        let e = Value::exception("ScriptException", "boom", Value::Int(3));
        assert_eq!(property(&e, "message").unwrap().unwrap(), Value::string("boom"));
        assert_eq!(call(&e, "getValue", &[]), Value::Int(3));
    }

    #[test]
    fn test_range_size_must_fit() {
        assert_eq!(size_of(&Value::range(3, 1)).unwrap().unwrap(), Value::Int(3));
        let err = size_of(&Value::range(-i64::MAX, i64::MAX)).unwrap().unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
        let err = property(&Value::range(i64::MIN, 0), "length").unwrap().unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
    }

    #[test]
    fn test_unknown_member_declines() {
        assert!(method(&Value::Int(1), "frobnicate", &[]).is_none());
        assert!(property(&Value::Bool(true), "x").is_none());
    }
}
