//! Engine construction and script compilation.

use std::sync::Arc;

use ember_eval::{
    Arithmetic, Context, DefaultArithmetic, MonitorRegistry, NoResolver, Options, Program,
    Resolver, Value,
};
use ember_ir::StringInterner;
use ember_parse::{parse_expression, parse_script};
use tracing::debug;

use crate::cache::{CacheKey, CacheStats, ScriptCache};
use crate::error::Error;
use crate::script::Script;

/// Default number of cached scripts.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Evaluation state shared by an engine and every script it compiled.
pub(crate) struct Runtime {
    pub(crate) options: Options,
    pub(crate) arithmetic: Arc<dyn Arithmetic>,
    pub(crate) resolver: Arc<dyn Resolver>,
    pub(crate) monitors: Arc<MonitorRegistry>,
}

/// Compiles source text into [`Script`]s.
///
/// `Engine` is `Send + Sync`; one instance is meant to be shared by every
/// thread of a host. Scripts are cached by normalized source text.
pub struct Engine {
    runtime: Arc<Runtime>,
    cache: ScriptCache,
}

impl Engine {
    /// Engine with default options.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine-wide option defaults.
    pub fn options(&self) -> &Options {
        &self.runtime.options
    }

    /// Compile a script: a sequence of statements.
    pub fn create_script(&self, source: &str) -> Result<Script, Error> {
        self.compile(source, &[], false)
    }

    /// Compile a script whose first arguments bind to `params`.
    pub fn create_script_with(&self, source: &str, params: &[&str]) -> Result<Script, Error> {
        self.compile(source, params, false)
    }

    /// Compile a single expression; statements are rejected.
    pub fn create_expression(&self, source: &str) -> Result<Script, Error> {
        self.compile(source, &[], true)
    }

    /// Compile (or fetch) and execute in one step.
    pub fn evaluate(&self, source: &str, context: &mut dyn Context) -> Result<Value, Error> {
        self.create_script(source)?.execute(context)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn compile(&self, source: &str, params: &[&str], expression: bool) -> Result<Script, Error> {
        let text = source.trim();
        let key = CacheKey::new(text, params, expression);
        self.cache
            .get_or_compile(key, || self.parse(text, params, expression))
    }

    fn parse(&self, text: &str, params: &[&str], expression: bool) -> Result<Script, Error> {
        let interner = StringInterner::new();
        let parsed = if expression {
            parse_expression(text, &interner)?
        } else {
            parse_script(text, &interner)?
        };
        debug!(
            len = text.len(),
            nodes = parsed.arena.expr_count(),
            params = params.len(),
            names = interner.len(),
            "compiled script"
        );
        let program = Program::new(
            parsed.arena,
            parsed.root,
            parsed.pragmas,
            interner.into_symbols(),
        );
        Ok(Script::new(
            Arc::clone(&self.runtime),
            text.to_owned(),
            program,
            params.iter().map(|p| (*p).to_owned()).collect(),
        ))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.runtime.options)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

/// Builder for an [`Engine`].
pub struct EngineBuilder {
    options: Options,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    resolver: Option<Arc<dyn Resolver>>,
    cache_capacity: usize,
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder {
            options: Options::default(),
            arithmetic: None,
            resolver: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Replace every option at once.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.options.silent = silent;
        self
    }

    #[must_use]
    pub fn assertions(mut self, assertions: bool) -> Self {
        self.options.assertions = assertions;
        self
    }

    #[must_use]
    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.options.cancellable = cancellable;
        self
    }

    #[must_use]
    pub fn strict_arithmetic(mut self, strict_arithmetic: bool) -> Self {
        self.options.strict_arithmetic = strict_arithmetic;
        self
    }

    #[must_use]
    pub fn math_precision(mut self, precision: Option<u32>) -> Self {
        self.options.math_precision = precision;
        self
    }

    #[must_use]
    pub fn math_scale(mut self, scale: i32) -> Self {
        self.options.math_scale = scale;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.options.charset = charset.into();
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Number of compiled scripts kept; 0 disables the cache.
    #[must_use]
    pub fn cache(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn arithmetic(mut self, arithmetic: impl Arithmetic + 'static) -> Self {
        self.arithmetic = Some(Arc::new(arithmetic));
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Engine {
        debug!(
            cache = self.cache_capacity,
            strict = self.options.strict,
            "building engine"
        );
        Engine {
            runtime: Arc::new(Runtime {
                options: self.options,
                arithmetic: self
                    .arithmetic
                    .unwrap_or_else(|| Arc::new(DefaultArithmetic)),
                resolver: self.resolver.unwrap_or_else(|| Arc::new(NoResolver)),
                monitors: Arc::new(MonitorRegistry::new()),
            }),
            cache: ScriptCache::new(self.cache_capacity),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use super::*;

    #[test]
    fn test_each_program_owns_its_names() {
        let engine = Engine::builder().cache(16).build();
        let first = engine.create_script("x == 'user0'").unwrap();
        let baseline = first.program().symbols().len();
        for n in 1..2000 {
            engine.create_script(&format!("x == 'user{n}'")).unwrap();
        }
        let last = engine.create_script("x == 'user2000'").unwrap();
        assert_eq!(last.program().symbols().len(), baseline);
        assert_eq!(first.program().symbols().get("user1999"), None);
        assert!(engine.cache_stats().len <= 16);
    }

    #[test]
    fn test_evicted_program_is_freed() {
        let engine = Engine::builder().cache(1).build();
        let program = Arc::downgrade(engine.create_script("a + 1").unwrap().program());
        assert!(program.upgrade().is_some());
        engine.create_script("b + 2").unwrap();
        assert!(program.upgrade().is_none());
    }
}
