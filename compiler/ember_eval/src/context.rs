//! Free-variable environments supplied by the host.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::options::Options;
use crate::value::Value;

/// Name-to-value mapping consulted for variables not bound in script frames.
pub trait Context {
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&mut self, name: &str, value: Value);

    fn has(&self, name: &str) -> bool;

    /// Per-evaluation override of the engine's options.
    fn options(&self) -> Option<Options> {
        None
    }
}

/// Owned map context.
#[derive(Clone, Debug, Default)]
pub struct MapContext {
    vars: FxHashMap<String, Value>,
    options: Option<Options>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose options replace the engine defaults.
    pub fn with_options(options: Options) -> Self {
        MapContext {
            vars: FxHashMap::default(),
            options: Some(options),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(name.to_owned(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }
}

impl Context for MapContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_owned(), value);
    }

    fn has(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn options(&self) -> Option<Options> {
        self.options.clone()
    }
}

/// Thread-safe context; clones share the same variables.
#[derive(Clone, Debug, Default)]
pub struct SharedContext {
    vars: Arc<RwLock<FxHashMap<String, Value>>>,
    options: Option<Options>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        SharedContext {
            vars: Arc::default(),
            options: Some(options),
        }
    }

    /// Set a variable through a shared handle.
    pub fn insert(&self, name: &str, value: impl Into<Value>) {
        self.vars.write().insert(name.to_owned(), value.into());
    }
}

impl Context for SharedContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.read().get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.insert(name, value);
    }

    fn has(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    fn options(&self) -> Option<Options> {
        self.options.clone()
    }
}
