//! Executable form of a parsed script.

use std::sync::Arc;

use ember_ir::ast::{ExprKind, Pragma};
use ember_ir::{ExprArena, ExprId, Name, Symbols};
use rustc_hash::FxHashMap;

use crate::value::{Heap, Value};

/// Parsed AST plus everything the interpreter needs to run it.
///
/// Immutable once built and shared through `Arc`; closures keep their
/// program alive. Names are private to the program: its symbol table is
/// freed with it.
pub struct Program {
    arena: ExprArena,
    root: ExprId,
    pragmas: Vec<Pragma>,
    symbols: Symbols,
    /// One shared string per distinct literal text, so equal literals in a
    /// script are identical.
    literals: FxHashMap<Name, Heap<str>>,
}

impl Program {
    pub fn new(
        arena: ExprArena,
        root: ExprId,
        pragmas: Vec<Pragma>,
        symbols: Symbols,
    ) -> Arc<Self> {
        let mut literals = FxHashMap::default();
        for (_, expr) in arena.exprs() {
            if let ExprKind::Str(name) = expr.kind {
                literals
                    .entry(name)
                    .or_insert_with(|| Heap::from_str(symbols.lookup(name)));
            }
        }
        Arc::new(Program {
            arena,
            root,
            pragmas,
            symbols,
            literals,
        })
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn root(&self) -> ExprId {
        self.root
    }

    pub fn pragmas(&self) -> &[Pragma] {
        &self.pragmas
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    #[inline]
    pub fn lookup(&self, name: Name) -> &str {
        self.symbols.lookup(name)
    }

    /// Value of a string literal.
    pub(crate) fn literal(&self, name: Name) -> Value {
        match self.literals.get(&name) {
            Some(s) => Value::Str(s.clone()),
            None => Value::string(self.lookup(name)),
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("nodes", &self.arena.expr_count())
            .field("root", &self.root)
            .field("pragmas", &self.pragmas.len())
            .field("names", &self.symbols.len())
            .finish_non_exhaustive()
    }
}
