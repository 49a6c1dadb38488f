//! Compiled scripts and cancellable invocations.

use std::fmt;
use std::sync::Arc;

use ember_eval::{CancelToken, Context, InterpreterBuilder, Program, Value};
use ember_ir::ast::PragmaValue;
use ember_ir::printer;

use crate::engine::Runtime;
use crate::error::Error;

struct ScriptData {
    runtime: Arc<Runtime>,
    source: String,
    program: Arc<Program>,
    parameters: Vec<String>,
}

/// A parsed script, ready to execute any number of times.
///
/// Immutable and cheap to clone. Every execution gets a fresh top frame, so
/// concurrent executions interact only through their contexts.
#[derive(Clone)]
pub struct Script {
    data: Arc<ScriptData>,
    /// Arguments bound to the leading parameters by `curry`.
    curried: Arc<[Value]>,
}

impl Script {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        source: String,
        program: Arc<Program>,
        parameters: Vec<String>,
    ) -> Self {
        Script {
            data: Arc::new(ScriptData {
                runtime,
                source,
                program,
                parameters,
            }),
            curried: Arc::from([]),
        }
    }

    pub(crate) fn program(&self) -> &Arc<Program> {
        &self.data.program
    }

    /// Normalized source text the script was compiled from.
    pub fn source(&self) -> &str {
        &self.data.source
    }

    /// Source reconstructed from the parsed form.
    pub fn to_source(&self) -> String {
        let program = &self.data.program;
        printer::print_script(
            program.arena(),
            program.symbols(),
            program.pragmas(),
            program.root(),
        )
    }

    /// Declared parameter names.
    pub fn parameters(&self) -> &[String] {
        &self.data.parameters
    }

    /// Parameters not yet bound by `curry`.
    pub fn unbound_parameters(&self) -> &[String] {
        let bound = self.curried.len().min(self.data.parameters.len());
        &self.data.parameters[bound..]
    }

    /// `#pragma` entries in source order.
    pub fn pragmas(&self) -> Vec<(String, Value)> {
        let program = &self.data.program;
        program
            .pragmas()
            .iter()
            .map(|pragma| {
                let value = match pragma.value {
                    PragmaValue::Null => Value::Null,
                    PragmaValue::Bool(b) => Value::Bool(b),
                    PragmaValue::Int(n) => Value::Int(n),
                    PragmaValue::Float(bits) => Value::Float(f64::from_bits(bits)),
                    PragmaValue::Str(name) | PragmaValue::Ident(name) => {
                        Value::string(program.lookup(name))
                    }
                };
                (program.lookup(pragma.key).to_owned(), value)
            })
            .collect()
    }

    /// Script with `args` bound to the next unbound parameters.
    #[must_use]
    pub fn curry(&self, args: &[Value]) -> Script {
        let curried: Vec<Value> = self.curried.iter().chain(args).cloned().collect();
        Script {
            data: Arc::clone(&self.data),
            curried: curried.into(),
        }
    }

    pub fn execute(&self, context: &mut dyn Context) -> Result<Value, Error> {
        self.run(context, &[], None)
    }

    /// Execute with `args` bound to the unbound parameters, in order.
    /// Missing arguments are null.
    pub fn execute_with(&self, context: &mut dyn Context, args: &[Value]) -> Result<Value, Error> {
        self.run(context, args, None)
    }

    /// Handle for a cancellable execution.
    pub fn callable(&self) -> Callable {
        Callable {
            script: self.clone(),
            token: CancelToken::new(),
        }
    }

    fn run(
        &self,
        context: &mut dyn Context,
        args: &[Value],
        cancel: Option<CancelToken>,
    ) -> Result<Value, Error> {
        let mut values = self.curried.iter().chain(args);
        let bindings: Vec<(&str, Value)> = self
            .data
            .parameters
            .iter()
            .map(|name| (name.as_str(), values.next().cloned().unwrap_or_default()))
            .collect();

        let runtime = &self.data.runtime;
        let mut builder = InterpreterBuilder::new(Arc::clone(&self.data.program), context)
            .options(runtime.options.clone())
            .arithmetic(Arc::clone(&runtime.arithmetic))
            .resolver(Arc::clone(&runtime.resolver))
            .monitors(Arc::clone(&runtime.monitors));
        if let Some(token) = cancel {
            builder = builder.cancel(token);
        }
        Ok(builder.build().run(&bindings)?)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("source", &self.data.source)
            .field("parameters", &self.data.parameters)
            .field("curried", &self.curried.len())
            .finish_non_exhaustive()
    }
}

/// A script bound to a cancellation token.
///
/// Clones share the token, so one thread can cancel an execution running
/// on another. Cancellation is sticky: once cancelled, every later call is
/// cancelled too.
#[derive(Clone, Debug)]
pub struct Callable {
    script: Script,
    token: CancelToken,
}

impl Callable {
    pub fn call(&self, context: &mut dyn Context, args: &[Value]) -> Result<Value, Error> {
        self.script.run(context, args, Some(self.token.clone()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn script(&self) -> &Script {
        &self.script
    }
}
