//! Stack growth for deeply nested scripts.
//!
//! The parser and the interpreter are both recursive over the AST, so a
//! script such as `((((...))))` or a long chain of nested blocks recurses once
//! per level. Hosts evaluate scripts on their own threads, whose stacks may be
//! small, so every recursive entry point goes through
//! [`ensure_sufficient_stack`], which moves onto a fresh stack segment when
//! the current one runs low.
//!
//! On `wasm32` the guard is a passthrough.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a new stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
