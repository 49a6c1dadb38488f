//! Ember: an embeddable expression and scripting engine.
//!
//! An [`Engine`] compiles source text into [`Script`]s, caching them by
//! normalized source. A script executes against a host [`Context`] that
//! supplies free variables:
//!
//! ```
//! use ember::{Engine, MapContext, Value};
//!
//! let engine = Engine::new();
//! let script = engine.create_script("var x = 1; x + y").unwrap();
//! let mut ctx = MapContext::new().with("y", 41);
//! assert_eq!(script.execute(&mut ctx).unwrap(), Value::Int(42));
//! ```
//!
//! Operator overloading is supplied through an [`Arithmetic`] delegate,
//! host object access through a [`Resolver`].

mod cache;
mod engine;
mod error;
mod render;
mod script;

use std::sync::Once;

pub use cache::CacheStats;
pub use engine::{Engine, EngineBuilder, DEFAULT_CACHE_CAPACITY};
pub use error::Error;
pub use render::{render_error_to, render_error_to_string};
pub use script::{Callable, Script};

pub use ember_eval::{
    Arithmetic, CancelToken, Context, DefaultArithmetic, EvalError, EvalErrorKind, HostValue,
    Indirect, MapContext, NoResolver, OperatorTable, Options, Overload, OverloadResult,
    Resolution, Resolver, SharedContext, Value, SCRIPT_EXCEPTION,
};
pub use ember_parse::{ParseError, ParseErrorKind};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
/// Enable with `RUST_LOG=ember=debug` or `RUST_LOG=ember_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
