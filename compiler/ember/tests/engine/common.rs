//! Shared test helpers.

use ember::{Engine, Error, MapContext, Value};

/// Evaluate with a default engine and an empty context.
pub fn eval(source: &str) -> Value {
    Engine::new()
        .evaluate(source, &mut MapContext::new())
        .unwrap_or_else(|err| panic!("`{source}` failed: {err}"))
}

/// Evaluate with `engine`, expecting failure.
pub fn eval_err(engine: &Engine, source: &str) -> Error {
    match engine.evaluate(source, &mut MapContext::new()) {
        Ok(value) => panic!("`{source}` evaluated to {value}, expected an error"),
        Err(err) => err,
    }
}
