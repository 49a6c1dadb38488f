//! Shared engines, monitors and cancellation across threads.

use std::thread;
use std::time::Duration;

use ember::{Callable, Context, Engine, Error, MapContext, Script, SharedContext, Value};
use pretty_assertions::assert_eq;
use rayon::prelude::*;

#[test]
fn engine_and_scripts_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
    assert_send_sync::<Script>();
    assert_send_sync::<Callable>();
}

#[test]
fn parallel_evaluation_shares_cache() {
    let engine = Engine::builder().cache(16).build();
    let results: Vec<Value> = (0..512i64)
        .into_par_iter()
        .map(|i| {
            let source = format!("var x = {}; x * x + y", i % 32);
            let mut ctx = MapContext::new().with("y", i);
            engine.evaluate(&source, &mut ctx).unwrap()
        })
        .collect();

    for (i, value) in (0..512i64).zip(&results) {
        let x = i % 32;
        assert_eq!(*value, Value::Int(x * x + i));
    }
    let stats = engine.cache_stats();
    assert!(stats.len <= 16);
    assert_eq!(stats.hits + stats.misses, 512);
}

#[test]
fn one_script_runs_concurrently() {
    let engine = Engine::new();
    let script = engine
        .create_script_with("var total = 0; for (var i : 1..n) { total += i; } total", &["n"])
        .unwrap();
    let totals: Vec<Value> = (1..=64i64)
        .into_par_iter()
        .map(|n| {
            script
                .execute_with(&mut MapContext::new(), &[Value::Int(n)])
                .unwrap()
        })
        .collect();
    for (n, total) in (1..=64i64).zip(totals) {
        assert_eq!(total, Value::Int(n * (n + 1) / 2));
    }
}

#[test]
fn synchronized_blocks_lose_no_updates() {
    let engine = Engine::new();
    let script = engine
        .create_script("for (var i : 1..500) { @synchronized(lock) { n = n + 1; } }")
        .unwrap();
    let ctx = SharedContext::new();
    ctx.insert("n", 0);
    ctx.insert("lock", Value::array(Vec::new()));

    thread::scope(|s| {
        for _ in 0..2 {
            let mut ctx = ctx.clone();
            let script = script.clone();
            s.spawn(move || script.execute(&mut ctx).unwrap());
        }
    });
    assert_eq!(ctx.get("n"), Some(Value::Int(1000)));
}

fn cancel_later(callable: &Callable) -> thread::JoinHandle<()> {
    let remote = callable.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(25));
        remote.cancel();
    })
}

#[test]
fn cancelled_callable_fails() {
    let engine = Engine::new();
    let callable = engine.create_script("while (true) {}").unwrap().callable();
    let canceller = cancel_later(&callable);

    let err = callable.call(&mut MapContext::new(), &[]).unwrap_err();
    canceller.join().unwrap();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(err.category(), "cancelled");
    assert!(callable.is_cancelled());

    let err = callable.call(&mut MapContext::new(), &[]).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn non_cancellable_callable_yields_null() {
    let engine = Engine::builder().cancellable(false).build();
    let callable = engine.create_script("while (true) {}").unwrap().callable();
    let canceller = cancel_later(&callable);

    let result = callable.call(&mut MapContext::new(), &[]);
    canceller.join().unwrap();
    assert_eq!(result.unwrap(), Value::Null);
}

#[test]
fn uncancelled_callable_completes() {
    let engine = Engine::new();
    let script = engine.create_script_with("a + 1", &["a"]).unwrap();
    let callable = script.callable();
    let result = callable.call(&mut MapContext::new(), &[Value::Int(41)]);
    assert_eq!(result.unwrap(), Value::Int(42));
    assert_eq!(callable.script().parameters(), ["a"]);
}
