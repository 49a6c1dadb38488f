//! Language behavior as seen through the engine.

use ember::{Context, Engine, Error, EvalErrorKind, MapContext, Options, ParseErrorKind, Value};
use pretty_assertions::assert_eq;

use crate::common::{eval, eval_err};

mod assertions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_by_default() {
        let mut ctx = MapContext::new().with("n", 0);
        let result = Engine::new().evaluate("assert (n = 1) == 2; n", &mut ctx);
        assert_eq!(result.unwrap(), Value::Int(0));
        assert_eq!(eval("assert false"), Value::Null);
    }

    #[test]
    fn enabled_by_builder() {
        let engine = Engine::builder().assertions(true).build();
        let err = eval_err(&engine, "assert false");
        assert_eq!(err.category(), "assertion");

        let err = eval_err(&engine, "assert false : 'check'");
        assert!(matches!(err, Error::Assertion { .. }));
        assert_eq!(err.message(), "check");
    }

    #[test]
    fn context_options_override_engine() {
        let enabled = Options::new().with_assertions(true);
        let disabled = Options::new().with_assertions(false);

        let engine = Engine::new();
        let mut ctx = MapContext::with_options(enabled);
        let err = engine.evaluate("assert false", &mut ctx).unwrap_err();
        assert_eq!(err.category(), "assertion");

        let engine = Engine::builder().assertions(true).build();
        let mut ctx = MapContext::with_options(disabled);
        assert_eq!(engine.evaluate("assert false", &mut ctx).unwrap(), Value::Null);
    }
}

mod blocks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn statement_terminated_block_yields_value() {
        assert_eq!(eval("{ n = 42; }"), Value::Int(42));
    }

    #[test]
    fn bare_expression_braces_are_a_set() {
        assert_eq!(eval("{ n = 42 }"), Value::set([Value::Int(42)]));
    }

    #[test]
    fn const_and_let_redeclaration_fail() {
        let engine = Engine::new();
        let err = eval_err(&engine, "const x = 1; x = 2");
        assert!(matches!(
            err.runtime_kind(),
            Some(EvalErrorKind::ImmutableBinding { .. })
        ));

        let err = eval_err(&engine, "let x = 1; let x = 2");
        assert!(matches!(
            err.runtime_kind(),
            Some(EvalErrorKind::Redeclaration { .. })
        ));
    }
}

mod exceptions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finally_return_overrides_try() {
        assert_eq!(eval("try { return 1 } finally { return 42 }"), Value::Int(42));
    }

    #[test]
    fn finally_fall_through_keeps_try_value() {
        let mut ctx = MapContext::new();
        let result = Engine::new().evaluate("try { x = 1 } finally { x = 2 }", &mut ctx);
        assert_eq!(result.unwrap(), Value::Int(1));
        assert_eq!(ctx.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn catch_sees_engine_failure() {
        let result = eval("var m = ''; try { 1 / 0 } catch (e) { m = e.message } m");
        let message = result.as_str().unwrap().to_owned();
        assert!(message.contains("division by zero"), "got {message}");
    }

    #[test]
    fn uncaught_division_is_runtime_error() {
        let err = eval_err(&Engine::new(), "1 / 0");
        assert_eq!(err.category(), "runtime");
        assert_eq!(err.runtime_kind(), Some(&EvalErrorKind::DivisionByZero));
        assert!(err.span().is_some());
    }
}

mod identity {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn independent_equal_strings_are_distinct() {
        let source = "var x = 'a' + 'bc'; var y = 'ab' + 'c';";
        assert_eq!(eval(&format!("{source} x === y")), Value::Bool(false));
        assert_eq!(eval(&format!("{source} x !== y")), Value::Bool(true));
        assert_eq!(eval(&format!("{source} x == y")), Value::Bool(true));
    }

    #[test]
    fn same_reference_is_identical() {
        assert_eq!(eval("var x = 'abc'; var y = x; x === y"), Value::Bool(true));
    }
}

mod loop_exits {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn break_outside_loop_is_parse_error() {
        let Err(Error::Parse(err)) = Engine::new().create_script("x = 1; break") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::BreakOutsideLoop);
    }

    #[test]
    fn continue_outside_loop_is_parse_error() {
        let Err(Error::Parse(err)) = Engine::new().create_script("continue") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::ContinueOutsideLoop);
    }
}

mod strictness {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lenient_unknown_variable_is_null() {
        assert_eq!(eval("missing"), Value::Null);
    }

    #[test]
    fn strict_unknown_variable_fails() {
        let engine = Engine::builder().strict(true).build();
        let err = eval_err(&engine, "missing");
        assert!(matches!(
            err.runtime_kind(),
            Some(EvalErrorKind::UndefinedVariable { name }) if name == "missing"
        ));
    }

    #[test]
    fn strict_silent_unknown_variable_is_null() {
        let engine = Engine::builder().strict(true).silent(true).build();
        let result = engine.evaluate("missing", &mut MapContext::new());
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn strict_arithmetic_rejects_null() {
        let engine = Engine::builder().strict_arithmetic(true).build();
        let err = eval_err(&engine, "null + 1");
        assert!(matches!(
            err.runtime_kind(),
            Some(EvalErrorKind::NullOperand { .. })
        ));
        assert_eq!(eval("null + 1"), Value::Int(1));
    }

    #[test]
    fn depth_limit_is_configurable() {
        let engine = Engine::builder().max_depth(16).build();
        let err = eval_err(&engine, "function f(n) { f(n + 1) } f(0)");
        assert_eq!(
            err.runtime_kind(),
            Some(&EvalErrorKind::StackOverflow { depth: 16 })
        );
    }
}

mod memory {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ember::HostValue;

    use super::*;
    use pretty_assertions::assert_eq;

    /// Host object that counts live instances.
    #[derive(Debug)]
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl HostValue for Tracked {
        fn type_name(&self) -> &str {
            "Tracked"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn live_after(source: &str, runs: usize) -> usize {
        let engine = Engine::new();
        let live = Arc::new(AtomicUsize::new(0));
        for _ in 0..runs {
            live.fetch_add(1, Ordering::SeqCst);
            let mut ctx = MapContext::new().with("t", Value::host(Tracked(Arc::clone(&live))));
            engine.evaluate(source, &mut ctx).unwrap();
        }
        live.load(Ordering::SeqCst)
    }

    #[test]
    fn plain_script_frees_bindings() {
        assert_eq!(live_after("var keep = t; 1", 1000), 0);
    }

    #[test]
    fn declared_function_does_not_pin_its_frame() {
        assert_eq!(live_after("var keep = t; function f(n) { n } f(1)", 1000), 0);
    }
}

#[test]
fn expression_mode_rejects_statements() {
    let engine = Engine::new();
    assert!(matches!(
        engine.create_expression("var x = 1"),
        Err(Error::Parse(_))
    ));
    let script = engine.create_expression("a * 2").unwrap();
    let mut ctx = MapContext::new().with("a", 21);
    assert_eq!(script.execute(&mut ctx).unwrap(), Value::Int(42));
}
