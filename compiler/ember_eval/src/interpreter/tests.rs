#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::any::Any;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use ember_ir::ast::BinaryOp;
use ember_ir::StringInterner;
use ember_parse::parse_script;
use pretty_assertions::assert_eq;

use crate::arithmetic::{Overload, OperatorTable, OverloadResult};
use crate::cancel::CancelToken;
use crate::context::{Context, MapContext, SharedContext};
use crate::errors::{EvalError, EvalErrorKind};
use crate::monitor::MonitorRegistry;
use crate::options::Options;
use crate::program::Program;
use crate::resolver::{HostValue, Indirect, Resolution, Resolver};
use crate::value::Value;

use super::InterpreterBuilder;

fn compile(source: &str) -> Arc<Program> {
    let interner = StringInterner::new();
    let parsed = parse_script(source, &interner).unwrap();
    Program::new(parsed.arena, parsed.root, parsed.pragmas, interner.into_symbols())
}

fn run_in(source: &str, options: Options, context: &mut MapContext) -> Result<Value, EvalError> {
    InterpreterBuilder::new(compile(source), context)
        .options(options)
        .build()
        .run(&[])
}

fn eval(source: &str) -> Value {
    run_in(source, Options::default(), &mut MapContext::new()).unwrap()
}

fn eval_err(source: &str, options: Options) -> EvalError {
    run_in(source, options, &mut MapContext::new()).unwrap_err()
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_block_assigns_context() {
        let mut ctx = MapContext::new();
        let result = run_in(
            "if (true) { x = 'Hello'; y = 'World';}",
            Options::default(),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(result, Value::string("World"));
        assert_eq!(ctx.get("x"), Some(Value::string("Hello")));
        assert_eq!(ctx.get("y"), Some(Value::string("World")));
    }

    #[test]
    fn prefix_increment() {
        assert_eq!(eval("var x = 1; ++x"), Value::Int(2));
    }

    #[test]
    fn throw_string_message() {
        let err = eval_err("throw 'Error'", Options::default());
        assert_eq!(err.kind, EvalErrorKind::Thrown);
        assert_eq!(err.message, "Error");
    }

    #[test]
    fn break_inside_try_exits_loop() {
        assert_eq!(
            eval("for (var i : 42..43) try {break} finally {}; i"),
            Value::Int(42)
        );
    }
}

mod assertions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_skips_condition() {
        let source = "var n = 0; assert (n = 1) == 2; n";
        assert_eq!(eval(source), Value::Int(0));
        assert_eq!(eval("assert false"), Value::Null);
    }

    #[test]
    fn enabled_fails() {
        let options = Options::new().with_assertions(true);
        let err = eval_err("assert false", options.clone());
        assert_eq!(err.kind, EvalErrorKind::AssertionFailed);
        let err = eval_err("assert false : 'check'", options);
        assert_eq!(err.message, "check");
    }

    #[test]
    fn context_options_win() {
        let mut ctx = MapContext::with_options(Options::new().with_assertions(true));
        let err = run_in("assert false", Options::default(), &mut ctx).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::AssertionFailed);

        let mut ctx = MapContext::with_options(Options::new().with_assertions(false));
        let enabled = Options::new().with_assertions(true);
        assert_eq!(run_in("assert false", enabled, &mut ctx).unwrap(), Value::Null);
    }
}

mod blocks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn terminated_statement_is_block() {
        assert_eq!(eval("{ n = 42; }"), Value::Int(42));
    }

    #[test]
    fn bare_expression_is_set() {
        assert_eq!(eval("{ n = 42 }"), Value::set([Value::Int(42)]));
    }

    #[test]
    fn let_is_block_scoped() {
        let mut ctx = MapContext::new();
        let result = run_in("let x = 1; { let x = 2; } x", Options::default(), &mut ctx);
        assert_eq!(result.unwrap(), Value::Int(1));
    }

    #[test]
    fn const_rejects_assignment() {
        let err = eval_err("const x = 1; x = 2", Options::default());
        assert!(matches!(err.kind, EvalErrorKind::ImmutableBinding { .. }));
    }

    #[test]
    fn let_redeclaration_fails() {
        let err = eval_err("let x = 1; let x = 2", Options::default());
        assert!(matches!(err.kind, EvalErrorKind::Redeclaration { .. }));
    }
}

mod try_finally {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finally_return_overrides() {
        assert_eq!(eval("try { return 1 } finally { return 42 }"), Value::Int(42));
    }

    #[test]
    fn finally_fall_through_keeps_value() {
        let mut ctx = MapContext::new();
        let result = run_in("try { x = 1 } finally { x = 2 }", Options::default(), &mut ctx);
        assert_eq!(result.unwrap(), Value::Int(1));
        assert_eq!(ctx.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn catch_sees_engine_failure() {
        assert_eq!(
            eval("try { 1 / 0 } catch (e) { e.type + ': ' + e.message }"),
            Value::string("ArithmeticException: division by zero")
        );
    }

    #[test]
    fn catch_exposes_thrown_payload() {
        assert_eq!(eval("try { throw 42 } catch (e) { e.value }"), Value::Int(42));
    }

    #[test]
    fn finally_runs_when_catch_rethrows() {
        let mut ctx = MapContext::new();
        let err = run_in(
            "try { throw 'a' } catch (e) { throw 'b' } finally { done = true }",
            Options::default(),
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(err.message, "b");
        assert_eq!(ctx.get("done"), Some(Value::Bool(true)));
    }

    #[test]
    fn thrown_exception_keeps_type() {
        assert_eq!(
            eval("try { throw new('IllegalStateException', 'bad') } catch (e) { e.type }"),
            Value::string("IllegalStateException")
        );
    }
}

mod operators {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn precedence_and_concatenation() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("'a' + 1"), Value::string("a1"));
        assert_eq!(eval("7 / 2"), Value::Int(3));
        assert_eq!(eval("7.0 / 2"), Value::Float(3.5));
    }

    #[test]
    fn identity_is_by_reference() {
        assert_eq!(eval("var x = 'a' + 'bc'; var y = 'ab' + 'c'; x === y"), Value::Bool(false));
        assert_eq!(eval("var x = 'a' + 'bc'; var y = 'ab' + 'c'; x !== y"), Value::Bool(true));
        assert_eq!(eval("var x = 'a' + 'bc'; var y = 'ab' + 'c'; x == y"), Value::Bool(true));
        assert_eq!(eval("var x = 'a' + 'bc'; var y = x; x === y"), Value::Bool(true));
    }

    #[test]
    fn overflow_and_division_fail() {
        let err = eval_err("9223372036854775807 + 1", Options::default());
        assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
        let err = eval_err("1 % 0", Options::default());
        assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    }

    #[test]
    fn null_safe_operators() {
        assert_eq!(eval("null ?? 'd'"), Value::string("d"));
        assert_eq!(eval("'' ?: 'e'"), Value::string("e"));
        assert_eq!(eval("var m = null; m?.x"), Value::Null);
    }

    #[test]
    fn matching() {
        assert_eq!(eval("'abc' =~ 'a.c'"), Value::Bool(true));
        assert_eq!(eval("3 =~ [1, 2, 3]"), Value::Bool(true));
        assert_eq!(eval("'abc' =^ 'ab'"), Value::Bool(true));
    }

    #[test]
    fn empty_and_size() {
        assert_eq!(eval("empty('') && size([1, 2]) == 2"), Value::Bool(true));
        assert_eq!(eval("size({'a' : 1})"), Value::Int(1));
    }

    #[test]
    fn size_of_unbounded_range_overflows() {
        let err = eval_err("size(-9223372036854775807..9223372036854775807)", Options::default());
        assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
    }

    #[test]
    fn template() {
        assert_eq!(eval("var n = 2; `${n} apples`"), Value::string("2 apples"));
    }

    #[test]
    fn template_inside_interpolation() {
        assert_eq!(eval("`x${`y${1}`}`"), Value::string("xy1"));
        assert_eq!(eval("var s = 'b'; `a${`[${s + '}'}]`}c`"), Value::string("a[b}]c"));
    }
}

mod functions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recursion() {
        let source = "function fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); } fact(5)";
        assert_eq!(eval(source), Value::Int(120));
    }

    #[test]
    fn closures_capture_frames() {
        let source = "var make = (n) -> { var c = n; var next = () -> ++c; next }; \
                      var f = make(10); f(); f()";
        assert_eq!(eval(source), Value::Int(12));
    }

    #[test]
    fn curry() {
        let source = "var add = (a, b, c) -> a + b + c; var f = add.curry(1, 2); f(3)";
        assert_eq!(eval(source), Value::Int(6));
    }

    #[test]
    fn variadic() {
        let source = "function sum(xs...) { var t = 0; for (var x : xs) t += x; t } sum(1, 2, 3)";
        assert_eq!(eval(source), Value::Int(6));
        assert_eq!(eval("function count(xs...) { size(xs) } count()"), Value::Int(0));
    }

    #[test]
    fn variadic_marker_before_name() {
        assert_eq!(eval("function f(int... xs) { size(xs) } f(4, 5)"), Value::Int(2));
        assert_eq!(eval("var g = (...xs) -> xs[1]; g('a', 'b')"), Value::string("b"));
    }

    #[test]
    fn typed_null_parameter() {
        let source = "function f(int x) { x } f(null)";
        assert_eq!(eval(source), Value::Int(0));
        let err = eval_err(source, Options::new().with_strict(true));
        assert!(matches!(err.kind, EvalErrorKind::NullPrimitive { .. }));
    }

    #[test]
    fn map_held_function_is_a_method() {
        assert_eq!(eval("var o = {'f' : (x) -> x * 2}; o.f(4)"), Value::Int(8));
    }

    #[test]
    fn depth_limit() {
        let err = eval_err(
            "function f(n) { f(n + 1) } f(0)",
            Options::new().with_max_depth(64),
        );
        assert_eq!(err.kind, EvalErrorKind::StackOverflow { depth: 64 });
    }

    #[test]
    fn host_calls_script_function() {
        let mut ctx = MapContext::new();
        let function = run_in("(a, b) -> a * b", Options::default(), &mut ctx).unwrap();
        let program = compile("null");
        let result = InterpreterBuilder::new(program, &mut ctx)
            .build()
            .call(&function, vec![Value::Int(6), Value::Int(7)]);
        assert_eq!(result.unwrap(), Value::Int(42));
    }
}

mod frames {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Host value that tracks how many instances are alive.
    #[derive(Debug)]
    struct Tracked(Arc<AtomicUsize>);

    impl Tracked {
        fn value(live: &Arc<AtomicUsize>) -> Value {
            live.fetch_add(1, Ordering::SeqCst);
            Value::host(Tracked(Arc::clone(live)))
        }
    }

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

    fn run_tracked(source: &str, live: &Arc<AtomicUsize>, ctx: &mut MapContext) -> Value {
        InterpreterBuilder::new(compile(source), ctx)
            .build()
            .run(&[("t", Tracked::value(live))])
            .unwrap()
    }

    fn live_after_runs(source: &str) -> usize {
        let live = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            run_tracked(source, &live, &mut MapContext::new());
        }
        live.load(Ordering::SeqCst)
    }

    #[test]
    fn function_declared_in_its_frame_is_freed() {
        assert_eq!(live_after_runs("var keep = t; function f(n) { n } f(1)"), 0);
    }

    #[test]
    fn self_referencing_lambdas_are_freed() {
        assert_eq!(live_after_runs("var keep = t; var g = () -> keep; g()"), 0);
        assert_eq!(
            live_after_runs("function outer() { var held = t; var inner = () -> held; inner() } outer()"),
            0
        );
        assert_eq!(
            live_after_runs("for (var i : 1..3) { let h = t; let g = () -> h; } 1"),
            0
        );
        assert_eq!(live_after_runs("var m = {'t' : t}; m.f = () -> m; 1"), 0);
    }

    #[test]
    fn returned_closure_keeps_its_frame() {
        let live = Arc::new(AtomicUsize::new(0));
        let mut ctx = MapContext::new();
        let function = run_tracked("var keep = t; var get = () -> keep; get", &live, &mut ctx);
        assert_eq!(live.load(Ordering::SeqCst), 1);

        let held = InterpreterBuilder::new(compile("null"), &mut ctx)
            .build()
            .call(&function, vec![])
            .unwrap();
        assert_eq!(held.type_name(), "Tracked");
        drop(held);
        assert_eq!(live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closure_stored_in_context_keeps_its_frame() {
        let live = Arc::new(AtomicUsize::new(0));
        let mut ctx = MapContext::new();
        run_tracked("var keep = t; handler = () -> keep; 1", &live, &mut ctx);
        assert_eq!(live.load(Ordering::SeqCst), 1);

        let handler = ctx.get("handler").unwrap();
        let held = InterpreterBuilder::new(compile("null"), &mut ctx)
            .build()
            .call(&handler, vec![])
            .unwrap();
        assert_eq!(held.type_name(), "Tracked");
    }

    #[test]
    fn closures_keep_working_during_the_run() {
        let source = "var fs = []; for (var i : 0..2) { let j = i; fs.add(() -> j * 10); } \
                      fs[0]() + fs[1]() + fs[2]()";
        assert_eq!(eval(source), Value::Int(30));
    }
}

mod loops {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn break_and_continue() {
        let source = "var s = 0; for (var i = 0; i < 10; ++i) { \
                      if (i % 2 == 0) continue; if (i > 7) break; s += i; } s";
        assert_eq!(eval(source), Value::Int(16));
    }

    #[test]
    fn while_and_do_while() {
        assert_eq!(eval("var n = 0; while (n < 5) n++; n"), Value::Int(5));
        assert_eq!(eval("var n = 10; do n++; while (n < 5); n"), Value::Int(11));
    }

    #[test]
    fn for_each_over_map_values() {
        assert_eq!(
            eval("var t = 0; for (let v : {'a' : 1, 'b' : 2}) t += v; t"),
            Value::Int(3)
        );
    }
}

mod lookup {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lenient_undefined_is_null() {
        assert_eq!(eval("missing"), Value::Null);
        assert_eq!(eval("'x'.nope()"), Value::Null);
    }

    #[test]
    fn strict_undefined_fails() {
        let err = eval_err("missing", Options::new().with_strict(true));
        assert!(matches!(err.kind, EvalErrorKind::UndefinedVariable { .. }));
    }

    #[test]
    fn strict_silent_undefined_is_null() {
        let options = Options::new().with_strict(true).with_silent(true);
        let result = run_in("missing", options, &mut MapContext::new());
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn context_null_is_defined() {
        let mut ctx = MapContext::new().with("x", Value::Null);
        let result = run_in("x", Options::new().with_strict(true), &mut ctx);
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn map_member_access() {
        assert_eq!(eval("var m = {'a' : 1}; m.a + m['a']"), Value::Int(2));
    }
}

mod references {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deref_reads_and_writes() {
        assert_eq!(eval("var r = new('Reference', 1); *r = *r + 1; *r"), Value::Int(2));
    }

    #[test]
    fn deref_null_is_unsolvable() {
        assert_eq!(eval("*null"), Value::Null);
        let err = eval_err("*null", Options::new().with_strict(true));
        assert_eq!(err.kind, EvalErrorKind::NullDereference);
    }

    #[test]
    fn deref_update_on_reference_cell() {
        let source = "var r = new('Reference', 5); *r += 2; r2 = (*r)++; ++*r";
        let mut ctx = MapContext::new();
        assert_eq!(run_in(source, Options::default(), &mut ctx).unwrap(), Value::Int(9));
        assert_eq!(ctx.get("r2"), Some(Value::Int(7)));
    }

    /// Host cell dereferenced through the arithmetic delegate.
    #[derive(Debug, Default)]
    struct Cell(AtomicI64);

    impl HostValue for Cell {
        fn type_name(&self) -> &str {
            "Cell"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn cell(value: &Value) -> Option<&Cell> {
        value.as_host()?.as_any().downcast_ref::<Cell>()
    }

    #[derive(Default)]
    struct Calls {
        read: AtomicUsize,
        write: AtomicUsize,
        self_assign: AtomicUsize,
    }

    fn cell_table(calls: &Arc<Calls>) -> OperatorTable {
        let (read, write, add) = (Arc::clone(calls), Arc::clone(calls), Arc::clone(calls));
        OperatorTable::new()
            .on_indirect("Cell", move |v: &Value| -> OverloadResult {
                read.read.fetch_add(1, Ordering::SeqCst);
                let Some(c) = cell(v) else { return Ok(Overload::Unhandled) };
                Ok(Overload::Value(Value::Int(c.0.load(Ordering::SeqCst))))
            })
            .on_indirect_assign("Cell", move |v: &Value, x: &Value| -> OverloadResult {
                write.write.fetch_add(1, Ordering::SeqCst);
                let Some(c) = cell(v) else { return Ok(Overload::Unhandled) };
                c.0.store(x.as_int().unwrap_or(0), Ordering::SeqCst);
                Ok(Overload::Assigned)
            })
            .on_self_assign(BinaryOp::Add, "Cell", move |v: &Value, by: &Value| -> OverloadResult {
                add.self_assign.fetch_add(1, Ordering::SeqCst);
                let Some(c) = cell(v) else { return Ok(Overload::Unhandled) };
                c.0.fetch_add(by.as_int().unwrap_or(0), Ordering::SeqCst);
                Ok(Overload::Assigned)
            })
    }

    fn run_cell(source: &str, calls: &Arc<Calls>) -> Value {
        let mut ctx = MapContext::new().with("c", Value::host(Cell::default()));
        InterpreterBuilder::new(compile(source), &mut ctx)
            .arithmetic(Arc::new(cell_table(calls)))
            .build()
            .run(&[])
            .unwrap()
    }

    #[test]
    fn delegate_reads_and_writes_through_reference() {
        let calls = Arc::new(Calls::default());
        assert_eq!(run_cell("*c = 5; *c", &calls), Value::Int(5));
        assert_eq!(calls.write.load(Ordering::SeqCst), 1);
        assert_eq!(calls.read.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn compound_assign_reaches_reference_overload() {
        let calls = Arc::new(Calls::default());
        assert_eq!(run_cell("*c = 5; *c += 2; *c", &calls), Value::Int(7));
        assert_eq!(calls.self_assign.load(Ordering::SeqCst), 1);
        assert_eq!(calls.write.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn compound_assign_without_overload_reads_then_writes() {
        let calls = Arc::new(Calls::default());
        assert_eq!(run_cell("*c = 5; *c -= 2; *c", &calls), Value::Int(3));
        assert_eq!(calls.self_assign.load(Ordering::SeqCst), 0);
        assert_eq!(calls.write.load(Ordering::SeqCst), 2);
        assert_eq!(calls.read.load(Ordering::SeqCst), 2);
    }

    /// Host holder exposing `get()`/`set(v)` through the resolver only.
    #[derive(Debug, Default)]
    struct Slot(parking_lot::RwLock<Value>);

    impl HostValue for Slot {
        fn type_name(&self) -> &str {
            "Slot"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct SlotResolver;

    impl Resolver for SlotResolver {
        fn invoke(&self, target: &Value, method: &str, args: &[Value]) -> Resolution {
            let slot = target.as_host()?.as_any().downcast_ref::<Slot>()?;
            match method {
                "get" => Some(Ok(slot.0.read().clone())),
                "set" => {
                    *slot.0.write() = args.first().cloned().unwrap_or_default();
                    Some(Ok(Value::Null))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn resolver_get_and_set_back_deref() {
        let slot = Value::host(Slot::default());
        let mut ctx = MapContext::new().with("s", slot.clone());
        let result = InterpreterBuilder::new(compile("*s = 3; *s += 4; (*s)++; *s"), &mut ctx)
            .resolver(Arc::new(SlotResolver))
            .build()
            .run(&[]);
        assert_eq!(result.unwrap(), Value::Int(8));
        let held = slot.as_host().unwrap().as_any().downcast_ref::<Slot>().unwrap();
        assert_eq!(*held.0.read(), Value::Int(8));
    }

    /// Host object that is itself a reference cell.
    #[derive(Debug, Default)]
    struct Mailbox(parking_lot::RwLock<Value>);

    impl Indirect for Mailbox {
        fn get(&self) -> Value {
            self.0.read().clone()
        }

        fn set(&self, value: Value) {
            *self.0.write() = value;
        }
    }

    impl HostValue for Mailbox {
        fn type_name(&self) -> &str {
            "Mailbox"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_reference(&self) -> Option<&dyn Indirect> {
            Some(self)
        }
    }

    #[test]
    fn host_reference_capability_backs_deref() {
        let mut ctx = MapContext::new().with("m", Value::host(Mailbox::default()));
        let result = run_in("*m = 'a'; *m += 'b'; *m", Options::default(), &mut ctx);
        assert_eq!(result.unwrap(), Value::string("ab"));
    }
}

/// Host counter mutated in place by the arithmetic delegate.
#[derive(Debug, Default)]
struct Counter(AtomicI64);

impl HostValue for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn count(value: &Value) -> i64 {
    let counter = value.as_host().unwrap().as_any().downcast_ref::<Counter>().unwrap();
    counter.0.load(Ordering::SeqCst)
}

fn bump(value: &Value, by: i64) -> OverloadResult {
    let Some(counter) = value.as_host().and_then(|h| h.as_any().downcast_ref::<Counter>()) else {
        return Ok(Overload::Unhandled);
    };
    counter.0.fetch_add(by, Ordering::SeqCst);
    Ok(Overload::Assigned)
}

mod delegate {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counter_table() -> Arc<OperatorTable> {
        Arc::new(
            OperatorTable::new()
                .on_increment("Counter", |v: &Value| -> OverloadResult { bump(v, 1) })
                .on_decrement("Counter", |v: &Value| -> OverloadResult { bump(v, -1) })
                .on_self_assign(
                    BinaryOp::Add,
                    "Counter",
                    |v: &Value, by: &Value| -> OverloadResult { bump(v, by.as_int().unwrap_or(0)) },
                ),
        )
    }

    fn run_counter(source: &str, counter: &Value) -> Value {
        let mut ctx = MapContext::new().with("c", counter.clone());
        InterpreterBuilder::new(compile(source), &mut ctx)
            .arithmetic(counter_table())
            .build()
            .run(&[])
            .unwrap()
    }

    #[test]
    fn increment_assigned_returns_operand() {
        let counter = Value::host(Counter::default());
        let result = run_counter("++c", &counter);
        assert_eq!(result.address(), counter.address());
        assert_eq!(count(&result), 1);
    }

    #[test]
    fn decrement_and_self_assign_mutate_in_place() {
        let counter = Value::host(Counter::default());
        let result = run_counter("c += 5; c--; c", &counter);
        assert_eq!(result.address(), counter.address());
        assert_eq!(count(&counter), 4);
    }

    #[test]
    fn binary_overload_by_right_operand() {
        let table = OperatorTable::new().on_binary(
            BinaryOp::Add,
            "Counter",
            |_: &Value, _: &Value| -> OverloadResult { Ok(Overload::Value(Value::string("counted"))) },
        );
        let mut ctx = MapContext::new().with("c", Value::host(Counter::default()));
        let result = InterpreterBuilder::new(compile("1 + c"), &mut ctx)
            .arithmetic(Arc::new(table))
            .build()
            .run(&[]);
        assert_eq!(result.unwrap(), Value::string("counted"));
    }
}

#[derive(Debug)]
struct Point {
    x: i64,
    y: i64,
}

impl HostValue for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct PointResolver;

impl Resolver for PointResolver {
    fn get_property(&self, target: &Value, key: &Value) -> Resolution {
        let point = target.as_host()?.as_any().downcast_ref::<Point>()?;
        match key.as_str()? {
            "x" => Some(Ok(Value::Int(point.x))),
            "y" => Some(Ok(Value::Int(point.y))),
            _ => None,
        }
    }

    fn invoke(&self, target: &Value, method: &str, _: &[Value]) -> Resolution {
        let point = target.as_host()?.as_any().downcast_ref::<Point>()?;
        (method == "sum").then(|| Ok(Value::Int(point.x + point.y)))
    }

    fn construct(&self, type_name: &str, args: &[Value]) -> Resolution {
        (type_name == "Point").then(|| {
            Ok(Value::host(Point {
                x: args.first().and_then(Value::as_int).unwrap_or(0),
                y: args.get(1).and_then(Value::as_int).unwrap_or(0),
            }))
        })
    }
}

#[test]
fn test_resolver_handles_host_objects() {
    let mut ctx = MapContext::new();
    let result = InterpreterBuilder::new(
        compile("var p = new('Point', 3, 4); p.x * 10 + p.y + p.sum()"),
        &mut ctx,
    )
    .resolver(Arc::new(PointResolver))
    .build()
    .run(&[]);
    assert_eq!(result.unwrap(), Value::Int(41));
}

#[test]
fn test_bindings_are_visible() {
    let mut ctx = MapContext::new();
    let result = InterpreterBuilder::new(compile("a + b"), &mut ctx)
        .build()
        .run(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
    assert_eq!(result.unwrap(), Value::Int(3));
}

mod cancellation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cancelled_loop_fails() {
        let token = CancelToken::new();
        token.cancel();
        let mut ctx = MapContext::new();
        let err = InterpreterBuilder::new(compile("while (true) {}"), &mut ctx)
            .cancel(token)
            .build()
            .run(&[])
            .unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::Cancelled);
    }

    #[test]
    fn not_cancellable_yields_null() {
        let token = CancelToken::new();
        let mut ctx = MapContext::new();
        let program = compile("while (true) {}");
        std::thread::scope(|s| {
            let remote = token.clone();
            s.spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                remote.cancel();
            });
            let result = InterpreterBuilder::new(program, &mut ctx)
                .options(Options::new().with_cancellable(false))
                .cancel(token)
                .build()
                .run(&[]);
            assert_eq!(result.unwrap(), Value::Null);
        });
    }
}

#[test]
fn test_synchronized_counter_across_threads() {
    let program = compile("for (var i : 1..250) { @synchronized { n = n + 1; } }");
    let ctx = SharedContext::new();
    ctx.insert("n", 0);
    let monitors = Arc::new(MonitorRegistry::new());
    std::thread::scope(|s| {
        for _ in 0..4 {
            let mut ctx = ctx.clone();
            let program = Arc::clone(&program);
            let monitors = Arc::clone(&monitors);
            s.spawn(move || {
                InterpreterBuilder::new(program, &mut ctx)
                    .monitors(monitors)
                    .build()
                    .run(&[])
                    .unwrap();
            });
        }
    });
    assert_eq!(ctx.get("n"), Some(Value::Int(1000)));
    assert!(monitors.is_empty());
}
