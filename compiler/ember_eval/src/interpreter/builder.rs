//! `InterpreterBuilder` for assembling an evaluation.

use std::sync::Arc;

use super::Interpreter;
use crate::arithmetic::{Arithmetic, DefaultArithmetic};
use crate::cancel::CancelToken;
use crate::context::Context;
use crate::environment::FrameRegistry;
use crate::monitor::MonitorRegistry;
use crate::options::Options;
use crate::program::Program;
use crate::resolver::{NoResolver, Resolver};

/// Builder for an [`Interpreter`].
///
/// Options given here are the engine defaults; a context that returns
/// `Some` from [`Context::options`] replaces them when `build` runs.
pub struct InterpreterBuilder<'c> {
    program: Arc<Program>,
    context: &'c mut dyn Context,
    options: Options,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    resolver: Option<Arc<dyn Resolver>>,
    monitors: Option<Arc<MonitorRegistry>>,
    cancel: Option<CancelToken>,
}

impl<'c> InterpreterBuilder<'c> {
    pub fn new(program: Arc<Program>, context: &'c mut dyn Context) -> Self {
        InterpreterBuilder {
            program,
            context,
            options: Options::default(),
            arithmetic: None,
            resolver: None,
            monitors: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn arithmetic(mut self, arithmetic: Arc<dyn Arithmetic>) -> Self {
        self.arithmetic = Some(arithmetic);
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Share monitors with other evaluations; a private registry otherwise.
    #[must_use]
    pub fn monitors(mut self, monitors: Arc<MonitorRegistry>) -> Self {
        self.monitors = Some(monitors);
        self
    }

    #[must_use]
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Interpreter<'c> {
        let options = self.context.options().unwrap_or(self.options);
        Interpreter {
            program: self.program,
            context: self.context,
            options,
            arithmetic: self
                .arithmetic
                .unwrap_or_else(|| Arc::new(DefaultArithmetic)),
            resolver: self.resolver.unwrap_or_else(|| Arc::new(NoResolver)),
            monitors: self.monitors.unwrap_or_default(),
            cancel: self.cancel,
            frames: FrameRegistry::new(),
            depth: 0,
        }
    }
}
