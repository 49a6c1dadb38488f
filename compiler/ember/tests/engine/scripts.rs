//! Script handles: parameters, currying, pragmas and printing.

use ember::{Engine, MapContext, Value};
use pretty_assertions::assert_eq;

#[test]
fn parameters_bind_in_order() {
    let engine = Engine::new();
    let script = engine
        .create_script_with("a * 10 + b", &["a", "b"])
        .unwrap();
    assert_eq!(script.parameters(), ["a", "b"]);
    let result = script.execute_with(&mut MapContext::new(), &[Value::Int(4), Value::Int(2)]);
    assert_eq!(result.unwrap(), Value::Int(42));
}

#[test]
fn missing_arguments_are_null() {
    let engine = Engine::new();
    let script = engine.create_script_with("b == null", &["a", "b"]).unwrap();
    let result = script.execute_with(&mut MapContext::new(), &[Value::Int(1)]);
    assert_eq!(result.unwrap(), Value::Bool(true));
}

#[test]
fn parameters_shadow_context() {
    let engine = Engine::new();
    let script = engine.create_script_with("x", &["x"]).unwrap();
    let mut ctx = MapContext::new().with("x", "context");
    let result = script.execute_with(&mut ctx, &[Value::string("argument")]);
    assert_eq!(result.unwrap(), Value::string("argument"));
}

#[test]
fn curry_binds_leading_parameters() {
    let engine = Engine::new();
    let script = engine
        .create_script_with("a + b + c", &["a", "b", "c"])
        .unwrap();
    let partial = script.curry(&[Value::Int(1)]);
    assert_eq!(partial.unbound_parameters(), ["b", "c"]);

    let partial = partial.curry(&[Value::Int(2)]);
    assert_eq!(partial.unbound_parameters(), ["c"]);
    assert_eq!(script.unbound_parameters(), ["a", "b", "c"]);

    let result = partial.execute_with(&mut MapContext::new(), &[Value::Int(3)]);
    assert_eq!(result.unwrap(), Value::Int(6));
}

#[test]
fn pragmas_are_exposed() {
    let engine = Engine::new();
    let script = engine
        .create_script("#pragma ember.mode 'fast'\n#pragma limit 10\n1")
        .unwrap();
    assert_eq!(
        script.pragmas(),
        vec![
            ("ember.mode".to_owned(), Value::string("fast")),
            ("limit".to_owned(), Value::Int(10)),
        ]
    );
}

#[test]
fn source_is_trimmed() {
    let engine = Engine::new();
    let script = engine.create_script("  1 + 1\n").unwrap();
    assert_eq!(script.source(), "1 + 1");
}

#[test]
fn printed_source_evaluates_the_same() {
    let sources = [
        "var x = 3; x * (2 + 4)",
        "var s = 0; for (var i : 1..4) { s += i; } s",
        "function fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); } fact(6)",
        "var m = {'a' : 1, 'b' : 2}; m.a + m['b']",
        "var r = ''; try { throw 'boom' } catch (e) { r = e.message } finally { r = r + '!' } r",
        "var f = (a, b) -> a > b ? a : b; f(7, 3) ?: 0",
        "var n = 0; while (n < 10) { n++; if (n == 5) break; } n",
        "`${1 + 1} items`",
    ];
    let engine = Engine::builder().cache(0).build();
    for source in sources {
        let script = engine.create_script(source).unwrap();
        let expected = script.execute(&mut MapContext::new()).unwrap();

        let printed = script.to_source();
        let reparsed = engine
            .create_script(&printed)
            .unwrap_or_else(|err| panic!("`{printed}` does not reparse: {err}"));
        let actual = reparsed.execute(&mut MapContext::new()).unwrap();
        assert_eq!(actual, expected, "printed as `{printed}`");
    }
}
