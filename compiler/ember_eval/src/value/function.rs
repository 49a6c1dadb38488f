//! Closures.

use std::fmt;
use std::sync::Arc;

use ember_ir::ast::{FunctionDef, FunctionId, Param};

use super::Value;
use crate::environment::Frame;
use crate::program::Program;

/// A function or lambda closed over its defining frame.
///
/// The program travels with the closure: its body ids index that program's
/// arena, whichever script ends up calling it.
#[derive(Clone)]
pub struct FunctionValue {
    program: Arc<Program>,
    func: FunctionId,
    captured: Frame,
    /// Arguments bound by `curry`, prepended at call time.
    curried: Vec<Value>,
}

impl FunctionValue {
    pub(crate) fn new(program: Arc<Program>, func: FunctionId, captured: Frame) -> Self {
        FunctionValue {
            program,
            func,
            captured,
            curried: Vec::new(),
        }
    }

    pub(crate) fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub(crate) fn captured(&self) -> &Frame {
        &self.captured
    }

    pub(crate) fn def(&self) -> &FunctionDef {
        self.program.arena().get_function(self.func)
    }

    pub fn name(&self) -> Option<&str> {
        self.def().name.map(|name| self.program.lookup(name))
    }

    pub fn params(&self) -> &[Param] {
        self.program.arena().get_params(self.def().params)
    }

    pub fn curried(&self) -> &[Value] {
        &self.curried
    }

    /// Declared parameters not yet bound by currying.
    pub fn arity(&self) -> usize {
        self.params().len().saturating_sub(self.curried.len())
    }

    /// Bind further leading arguments.
    pub fn curry(&self, args: &[Value]) -> FunctionValue {
        let mut curried = self.curried.clone();
        curried.extend_from_slice(args);
        FunctionValue {
            curried,
            ..self.clone()
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("curried", &self.curried.len())
            .finish_non_exhaustive()
    }
}
