//! Built-in operator semantics.
//!
//! Direct enum-based dispatch over the fixed set of engine value types. The
//! interpreter only gets here after the arithmetic delegate declined the
//! operation. `&&` and `||` short-circuit in the interpreter and never reach
//! `evaluate_binary`.

use std::cmp::Ordering;

use ember_ir::ast::{BinaryOp, UnaryOp, UpdateOp};

use crate::errors::{
    coercion, division_by_zero, integer_overflow, invalid_operand, invalid_regex, null_operand,
    EvalError,
};
use crate::options::Options;
use crate::value::{Value, ValueKey};

type OpResult = Result<Value, EvalError>;

/// Numeric view of an operand.
#[derive(Copy, Clone, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

#[expect(clippy::cast_precision_loss, reason = "i64 to f64 widening is the language rule")]
#[inline]
pub(crate) fn int_to_float(n: i64) -> f64 {
    n as f64
}

fn parse_number(s: &str) -> Option<Num> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Num::Int(n));
    }
    s.parse::<f64>().ok().map(Num::Float)
}

/// Numeric view of `value`, or the reason it has none.
fn to_num(value: &Value, op: &str, options: &Options) -> Result<Num, EvalError> {
    match value {
        Value::Int(n) => Ok(Num::Int(*n)),
        Value::Float(f) => Ok(Num::Float(*f)),
        Value::Char(c) => Ok(Num::Int(i64::from(u32::from(*c)))),
        Value::Null if options.strict_arithmetic => Err(null_operand(op)),
        Value::Null => Ok(Num::Int(0)),
        Value::Str(s) => parse_number(s).ok_or_else(|| coercion(value, "number")),
        _ => Err(invalid_operand(op, value)),
    }
}

fn to_integer(value: &Value, op: &str, options: &Options) -> Result<i64, EvalError> {
    match to_num(value, op, options)? {
        Num::Int(n) => Ok(n),
        Num::Float(_) => Err(invalid_operand(op, value)),
    }
}

/// Digits past the point that an `f64` can still distinguish.
const MAX_FLOAT_SCALE: i32 = 17;

fn round_scaled(x: f64, scale: i32) -> f64 {
    if !(0..=MAX_FLOAT_SCALE).contains(&scale) || !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(scale);
    let scaled = x * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        x
    }
}

/// Apply a built-in binary operator.
pub fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value, options: &Options) -> OpResult {
    match op {
        BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            Ok(Value::owned_string(format!("{left}{right}")))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let symbol = op.as_symbol();
            let a = to_num(left, symbol, options)?;
            let b = to_num(right, symbol, options)?;
            numeric(op, a, b, options)
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => bitwise(op, left, right, options),
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ushr => shift(op, left, right, options),
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equals(left, right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(left, right, op.as_symbol())?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOp::Match => matches_value(left, right).map(Value::Bool),
        BinaryOp::NotMatch => matches_value(left, right).map(|m| Value::Bool(!m)),
        BinaryOp::StartsWith => Ok(Value::Bool(starts_with(left, right))),
        BinaryOp::NotStartsWith => Ok(Value::Bool(!starts_with(left, right))),
        BinaryOp::EndsWith => Ok(Value::Bool(ends_with(left, right))),
        BinaryOp::NotEndsWith => Ok(Value::Bool(!ends_with(left, right))),
    }
}

fn numeric(op: BinaryOp, a: Num, b: Num, options: &Options) -> OpResult {
    let symbol = op.as_symbol();
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(division_by_zero()),
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(|| integer_overflow(symbol))
        }
        (a, b) => {
            let a = as_float(a);
            let b = as_float(b);
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Err(division_by_zero()),
                BinaryOp::Div => round_scaled(a / b, options.math_scale),
                _ => a % b,
            };
            Ok(Value::Float(result))
        }
    }
}

fn as_float(n: Num) -> f64 {
    match n {
        Num::Int(n) => int_to_float(n),
        Num::Float(f) => f,
    }
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value, options: &Options) -> OpResult {
    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        return Ok(Value::Bool(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            _ => a ^ b,
        }));
    }
    let symbol = op.as_symbol();
    let a = to_integer(left, symbol, options)?;
    let b = to_integer(right, symbol, options)?;
    Ok(Value::Int(match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        _ => a ^ b,
    }))
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    reason = "shifts reinterpret the bit pattern and mask the distance to 0..63"
)]
fn shift(op: BinaryOp, left: &Value, right: &Value, options: &Options) -> OpResult {
    let symbol = op.as_symbol();
    let a = to_integer(left, symbol, options)?;
    let distance = (to_integer(right, symbol, options)? & 63) as u32;
    Ok(Value::Int(match op {
        BinaryOp::Shl => a.wrapping_shl(distance),
        BinaryOp::Shr => a.wrapping_shr(distance),
        _ => ((a as u64) >> distance) as i64,
    }))
}

/// Apply a built-in unary operator.
pub fn evaluate_unary(op: UnaryOp, operand: &Value, options: &Options) -> OpResult {
    let symbol = op.as_symbol();
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match to_num(operand, symbol, options)? {
            Num::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| integer_overflow(symbol)),
            Num::Float(f) => Ok(Value::Float(-f)),
        },
        UnaryOp::Plus => match to_num(operand, symbol, options)? {
            Num::Int(n) => Ok(Value::Int(n)),
            Num::Float(f) => Ok(Value::Float(f)),
        },
        UnaryOp::BitNot => match operand {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => to_integer(operand, symbol, options).map(|n| Value::Int(!n)),
        },
    }
}

/// Built-in `++`/`--` step.
pub fn step(op: UpdateOp, operand: &Value, options: &Options) -> OpResult {
    let symbol = op.as_symbol();
    let delta: i64 = match op {
        UpdateOp::Increment => 1,
        UpdateOp::Decrement => -1,
    };
    match operand {
        Value::Char(c) => {
            let code = i64::from(u32::from(*c)) + delta;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| invalid_operand(symbol, operand))
        }
        _ => match to_num(operand, symbol, options)? {
            Num::Int(n) => n
                .checked_add(delta)
                .map(Value::Int)
                .ok_or_else(|| integer_overflow(symbol)),
            Num::Float(f) => Ok(Value::Float(f + int_to_float(delta))),
        },
    }
}

/// Script-level `==`: value equality with numeric coercion.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Char(c), Value::Str(s)) | (Value::Str(s), Value::Char(c)) => {
            let mut chars = s.chars();
            chars.next() == Some(*c) && chars.next().is_none()
        }
        (Value::Str(s), number @ (Value::Int(_) | Value::Float(_)))
        | (number @ (Value::Int(_) | Value::Float(_)), Value::Str(s)) => match parse_number(s) {
            Some(Num::Int(n)) => *number == Value::Int(n),
            Some(Num::Float(f)) => *number == Value::Float(f),
            None => false,
        },
        _ => left == right,
    }
}

/// `===`: heap values by allocation, scalars by type and value.
pub fn identical(left: &Value, right: &Value) -> bool {
    match (left.address(), right.address()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}

/// Ordering for the relational operators.
pub fn compare(left: &Value, right: &Value, op: &str) -> Result<Ordering, EvalError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some((**a).cmp(&**b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Str(s), other) | (other, Value::Str(s))
            if matches!(other, Value::Int(_) | Value::Float(_)) =>
        {
            let parsed = parse_number(s).ok_or_else(|| coercion(&Value::Str(s.clone()), "number"))?;
            let (a, b) = if matches!(left, Value::Str(_)) {
                (parsed, num_of(other))
            } else {
                (num_of(other), parsed)
            };
            compare_num(a, b)
        }
        _ => {
            let lenient = Options::default();
            let a = to_num(left, op, &lenient).map_err(|_| invalid_operand(op, left))?;
            let b = to_num(right, op, &lenient).map_err(|_| invalid_operand(op, right))?;
            compare_num(a, b)
        }
    };
    ordering.ok_or_else(|| invalid_operand(op, left))
}

fn num_of(value: &Value) -> Num {
    match value {
        Value::Float(f) => Num::Float(*f),
        other => Num::Int(other.as_int().unwrap_or_default()),
    }
}

fn compare_num(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
        (a, b) => as_float(a).partial_cmp(&as_float(b)),
    }
}

/// `x =~ y`: membership in a collection or range, key of a map, or full
/// regular-expression match against a string pattern.
pub fn matches_value(left: &Value, right: &Value) -> Result<bool, EvalError> {
    Ok(match right {
        Value::Null => left.is_null(),
        Value::Array(items) => items.snapshot().iter().any(|item| loose_equals(left, item)),
        Value::Set(set) => {
            set.contains(left) || set.snapshot().iter().any(|item| loose_equals(left, item))
        }
        Value::Map(map) => map.contains_key(left),
        Value::Range(range) => match left {
            Value::Int(n) => range.contains(*n),
            Value::Float(f) => matches!(ValueKey::of(&Value::Float(*f)), ValueKey::Int(n) if range.contains(n)),
            _ => false,
        },
        Value::Str(pattern) => {
            let anchored = format!("^(?:{})$", &**pattern);
            let regex = regex::Regex::new(&anchored)
                .map_err(|err| invalid_regex(pattern, &err.to_string()))?;
            regex.is_match(&left.to_string())
        }
        other => loose_equals(left, other),
    })
}

fn starts_with(left: &Value, right: &Value) -> bool {
    !left.is_null() && left.to_string().starts_with(&right.to_string())
}

fn ends_with(left: &Value, right: &Value) -> bool {
    !left.is_null() && left.to_string().ends_with(&right.to_string())
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use super::*;
    use crate::errors::EvalErrorKind;

    fn binary(op: BinaryOp, left: impl Into<Value>, right: impl Into<Value>) -> OpResult {
        evaluate_binary(op, &left.into(), &right.into(), &Options::default())
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn integers_stay_integral() {
            assert_eq!(binary(BinaryOp::Add, 2, 3).unwrap(), Value::Int(5));
            assert_eq!(binary(BinaryOp::Div, 7, 2).unwrap(), Value::Int(3));
            assert_eq!(binary(BinaryOp::Mod, -7, 3).unwrap(), Value::Int(-1));
        }

        #[test]
        fn mixed_operands_widen() {
            assert_eq!(binary(BinaryOp::Mul, 2, 1.5).unwrap(), Value::Float(3.0));
        }

        #[test]
        fn division_by_zero_fails() {
            let err = binary(BinaryOp::Div, 1, 0).unwrap_err();
            assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
            let err = binary(BinaryOp::Mod, 1.0, 0.0).unwrap_err();
            assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
        }

        #[test]
        fn overflow_fails() {
            let err = binary(BinaryOp::Add, i64::MAX, 1).unwrap_err();
            assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
        }

        #[test]
        fn string_concatenation() {
            assert_eq!(binary(BinaryOp::Add, "a", 1).unwrap(), Value::string("a1"));
            assert_eq!(binary(BinaryOp::Add, 1.5, "x").unwrap(), Value::string("1.5x"));
        }

        #[test]
        fn null_operands() {
            assert_eq!(binary(BinaryOp::Add, Value::Null, 2).unwrap(), Value::Int(2));
            let strict = Options::default().with_strict_arithmetic(true);
            let err = evaluate_binary(BinaryOp::Add, &Value::Null, &Value::Int(2), &strict)
                .unwrap_err();
            assert!(matches!(err.kind, EvalErrorKind::NullOperand { .. }));
        }

        #[test]
        fn math_scale_rounds_division() {
            let scaled = Options::default().with_math_scale(2);
            let v = evaluate_binary(BinaryOp::Div, &Value::Float(1.0), &Value::Int(3), &scaled)
                .unwrap();
            assert_eq!(v, Value::Float(0.33));
        }

        #[test]
        fn huge_math_scale_leaves_quotient_unrounded() {
            for scale in [18, 400, i32::MAX] {
                let options = Options::default().with_math_scale(scale);
                let v = evaluate_binary(BinaryOp::Div, &Value::Float(10.0), &Value::Int(3), &options)
                    .unwrap();
                assert_eq!(v, Value::Float(10.0 / 3.0));
            }
            let options = Options::default().with_math_scale(17);
            let v = evaluate_binary(BinaryOp::Div, &Value::Float(1e300), &Value::Float(0.5), &options)
                .unwrap();
            assert_eq!(v, Value::Float(2e300));
        }

        #[test]
        fn unsigned_shift() {
            assert_eq!(binary(BinaryOp::Ushr, -1, 60).unwrap(), Value::Int(15));
            assert_eq!(binary(BinaryOp::Shl, 1, 4).unwrap(), Value::Int(16));
        }
    }

    mod equality {
        use super::*;

        #[test]
        fn numeric_coercion() {
            assert!(loose_equals(&Value::Int(1), &Value::Float(1.0)));
            assert!(loose_equals(&Value::string("1"), &Value::Int(1)));
            assert!(!loose_equals(&Value::string("x"), &Value::Int(1)));
            assert!(!loose_equals(&Value::Null, &Value::Int(0)));
        }

        #[test]
        fn identity_of_strings() {
            let a = Value::string("abc");
            let b = Value::string("abc");
            assert!(loose_equals(&a, &b));
            assert!(!identical(&a, &b));
            assert!(identical(&a, &a.clone()));
        }

        #[test]
        fn identity_of_scalars() {
            assert!(identical(&Value::Int(3), &Value::Int(3)));
            assert!(!identical(&Value::Int(1), &Value::Float(1.0)));
            assert!(identical(&Value::Null, &Value::Null));
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn regex_is_anchored() {
            assert!(matches_value(&Value::string("abc"), &Value::string("a.c")).unwrap());
            assert!(!matches_value(&Value::string("xabc"), &Value::string("a.c")).unwrap());
        }

        #[test]
        fn membership() {
            let list = Value::array(vec![Value::Int(1), Value::Int(2)]);
            assert!(matches_value(&Value::Int(2), &list).unwrap());
            assert!(matches_value(&Value::Int(5), &Value::range(1, 10)).unwrap());
            let map = Value::map([(Value::string("k"), Value::Int(1))]);
            assert!(matches_value(&Value::string("k"), &map).unwrap());
        }

        #[test]
        fn invalid_pattern() {
            let err = matches_value(&Value::string("a"), &Value::string("(")).unwrap_err();
            assert!(matches!(err.kind, EvalErrorKind::InvalidRegex { .. }));
        }

        #[test]
        fn prefix_and_suffix() {
            assert_eq!(binary(BinaryOp::StartsWith, "hello", "he").unwrap(), Value::Bool(true));
            assert_eq!(binary(BinaryOp::NotEndsWith, "hello", "lo").unwrap(), Value::Bool(false));
        }
    }

    #[test]
    fn test_compare_strings_and_numbers() {
        assert_eq!(
            compare(&Value::string("a"), &Value::string("b"), "<").unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::Int(2), &Value::Float(1.5), ">").unwrap(),
            Ordering::Greater
        );
        assert!(compare(&Value::array(vec![]), &Value::Int(1), "<").is_err());
    }

    #[test]
    fn test_step() {
        let options = Options::default();
        assert_eq!(step(UpdateOp::Increment, &Value::Int(1), &options).unwrap(), Value::Int(2));
        assert_eq!(
            step(UpdateOp::Decrement, &Value::Float(1.5), &options).unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(step(UpdateOp::Increment, &Value::Char('a'), &options).unwrap(), Value::Char('b'));
    }

    #[test]
    fn test_unary() {
        let options = Options::default();
        assert_eq!(
            evaluate_unary(UnaryOp::Neg, &Value::Int(3), &options).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            evaluate_unary(UnaryOp::Not, &Value::string(""), &options).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            evaluate_unary(UnaryOp::BitNot, &Value::Int(0), &options).unwrap(),
            Value::Int(-1)
        );
    }
}
