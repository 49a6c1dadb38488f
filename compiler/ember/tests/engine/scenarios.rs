//! Reference scripts.

use ember::{Context, Engine, Error, MapContext, Value};
use pretty_assertions::assert_eq;

use crate::common::{eval, eval_err};

#[test]
fn if_block_writes_context() {
    let engine = Engine::new();
    let script = engine
        .create_script("if (true) { x = 'Hello'; y = 'World';}")
        .unwrap();
    let mut ctx = MapContext::new();
    assert_eq!(script.execute(&mut ctx).unwrap(), Value::string("World"));
    assert_eq!(ctx.get("x"), Some(Value::string("Hello")));
    assert_eq!(ctx.get("y"), Some(Value::string("World")));
}

#[test]
fn prefix_increment_of_local() {
    assert_eq!(eval("var x = 1; ++x"), Value::Int(2));
}

#[test]
fn uncaught_throw_carries_message() {
    let err = eval_err(&Engine::new(), "throw 'Error'");
    assert_eq!(err.category(), "thrown");
    assert_eq!(err.message(), "Error");
    let Error::Thrown { value, .. } = err else {
        panic!("expected a thrown error");
    };
    assert_eq!(value.to_string(), "Error");
}

#[test]
fn break_in_try_leaves_loop() {
    assert_eq!(
        eval("for (var i : 42..43) try {break} finally {}; i"),
        Value::Int(42)
    );
}
