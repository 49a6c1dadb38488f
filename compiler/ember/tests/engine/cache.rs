//! Script cache behavior observed through engine statistics.

use ember::{Engine, MapContext, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn repeated_source_hits() {
    let engine = Engine::builder().cache(8).build();
    engine.create_script("1 + 2").unwrap();
    engine.create_script("  1 + 2  ").unwrap();
    let stats = engine.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.len), (1, 1, 1));
}

#[test]
fn mode_and_parameters_are_part_of_the_key() {
    let engine = Engine::builder().cache(8).build();
    engine.create_script("x").unwrap();
    engine.create_expression("x").unwrap();
    engine.create_script_with("x", &["x"]).unwrap();
    let stats = engine.cache_stats();
    assert_eq!((stats.hits, stats.misses), (0, 3));
}

#[test]
fn evicted_script_is_recompiled() {
    let engine = Engine::builder().cache(1).build();
    engine.create_script("'first'").unwrap();
    engine.create_script("'second'").unwrap();
    let script = engine.create_script("'first'").unwrap();

    let stats = engine.cache_stats();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.len, 1);
    assert_eq!(
        script.execute(&mut MapContext::new()).unwrap(),
        Value::string("first")
    );
}

#[test]
fn disabled_cache_always_compiles() {
    let engine = Engine::builder().cache(0).build();
    for _ in 0..3 {
        engine.create_script("42").unwrap();
    }
    let stats = engine.cache_stats();
    assert_eq!((stats.len, stats.misses, stats.hits), (0, 3, 0));
}

#[test]
fn parse_failures_are_not_cached() {
    let engine = Engine::builder().cache(4).build();
    assert!(engine.create_script("1 +").is_err());
    assert!(engine.create_script("1 +").is_err());
    assert_eq!(engine.cache_stats().len, 0);
}

#[test]
fn clear_empties_cache() {
    let engine = Engine::new();
    engine.create_script("1").unwrap();
    engine.clear_cache();
    assert_eq!(engine.cache_stats().len, 0);
}

proptest! {
    #[test]
    fn cache_never_exceeds_capacity(
        capacity in 0usize..16,
        picks in prop::collection::vec(0u32..64, 1..200),
    ) {
        let engine = Engine::builder().cache(capacity).build();
        for n in &picks {
            let script = engine.create_script(&format!("{n} + 1")).unwrap();
            let value = script.execute(&mut MapContext::new()).unwrap();
            prop_assert_eq!(value, Value::Int(i64::from(*n) + 1));
            let stats = engine.cache_stats();
            prop_assert!(stats.len <= capacity);
        }
        let stats = engine.cache_stats();
        prop_assert_eq!(stats.hits + stats.misses, picks.len() as u64);
        prop_assert_eq!(stats.capacity, capacity);
    }
}
