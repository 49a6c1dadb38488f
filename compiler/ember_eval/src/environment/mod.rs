//! Variable frames.
//!
//! A frame holds the bindings of one block, loop body, catch clause or
//! function invocation and points at its parent. Frames are `Arc`-linked so
//! closures can keep their defining frame alive after it has been exited.
//!
//! Every frame is stamped with the [`Epoch`] of the evaluation that made it.
//! A closure stored in the frame it captures forms a reference cycle; the
//! evaluation's [`FrameRegistry`] breaks such cycles when it ends.

mod reclaim;

pub use reclaim::{Epoch, FrameRegistry};

use std::fmt;
use std::sync::Arc;

use ember_ir::ast::DeclKind;
use ember_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// Error returned by [`Frame::assign`] and [`Frame::declare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    /// The binding is `const`.
    Immutable,
    /// No frame in the chain defines the name.
    Undefined,
    /// A `let`/`const` name was declared twice in one frame.
    Redeclared,
}

#[derive(Clone, Debug)]
struct Binding {
    value: Value,
    kind: DeclKind,
}

struct FrameData {
    bindings: RwLock<FxHashMap<Name, Binding>>,
    parent: Option<Frame>,
    epoch: Epoch,
}

/// Handle to a frame; clones share it.
#[derive(Clone)]
pub struct Frame(Arc<FrameData>);

impl Frame {
    /// Root frame in a fresh epoch.
    pub fn root() -> Self {
        Frame::root_in(Epoch::next())
    }

    pub fn root_in(epoch: Epoch) -> Self {
        Frame(Arc::new(FrameData {
            bindings: RwLock::new(FxHashMap::default()),
            parent: None,
            epoch,
        }))
    }

    /// Frame nested in `self`, in the same epoch.
    #[must_use]
    pub fn child(&self) -> Self {
        self.child_in(self.0.epoch)
    }

    /// Frame nested in `self`, owned by the evaluation running in `epoch`.
    ///
    /// Calls use this: the callee's captured frame may belong to an earlier
    /// evaluation.
    #[must_use]
    pub fn child_in(&self, epoch: Epoch) -> Self {
        Frame(Arc::new(FrameData {
            bindings: RwLock::new(FxHashMap::default()),
            parent: Some(self.clone()),
            epoch,
        }))
    }

    pub fn epoch(&self) -> Epoch {
        self.0.epoch
    }

    pub fn parent(&self) -> Option<&Frame> {
        self.0.parent.as_ref()
    }

    /// Declare `name` in this frame.
    ///
    /// `var` may redeclare a `var`; `let` and `const` may not share a frame
    /// with any other declaration of the same name.
    pub fn declare(&self, name: Name, value: Value, kind: DeclKind) -> Result<(), AssignError> {
        let mut bindings = self.0.bindings.write();
        if let Some(existing) = bindings.get_mut(&name) {
            if kind != DeclKind::Var || existing.kind != DeclKind::Var {
                return Err(AssignError::Redeclared);
            }
            existing.value = value;
            return Ok(());
        }
        bindings.insert(name, Binding { value, kind });
        Ok(())
    }

    /// Bind a parameter or loop variable, replacing any earlier binding.
    pub fn define(&self, name: Name, value: Value) {
        self.0.bindings.write().insert(
            name,
            Binding {
                value,
                kind: DeclKind::Var,
            },
        );
    }

    /// Look `name` up through the chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(binding) = frame.0.bindings.read().get(&name) {
                return Some(binding.value.clone());
            }
            frame = frame.parent()?;
        }
    }

    /// Whether any frame in the chain defines `name`.
    pub fn contains(&self, name: Name) -> bool {
        let mut frame = self;
        loop {
            if frame.0.bindings.read().contains_key(&name) {
                return true;
            }
            match frame.parent() {
                Some(parent) => frame = parent,
                None => return false,
            }
        }
    }

    /// Assign to the nearest frame defining `name`.
    pub fn assign(&self, name: Name, value: Value) -> Result<(), AssignError> {
        let mut frame = self;
        loop {
            if let Some(binding) = frame.0.bindings.write().get_mut(&name) {
                if binding.kind == DeclKind::Const {
                    return Err(AssignError::Immutable);
                }
                binding.value = value;
                return Ok(());
            }
            match frame.parent() {
                Some(parent) => frame = parent,
                None => return Err(AssignError::Undefined),
            }
        }
    }

    /// Number of frames up to and including the root.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self;
        while let Some(parent) = frame.parent() {
            depth += 1;
            frame = parent;
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of bindings held directly by this frame.
    pub fn len(&self) -> usize {
        self.0.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Drop every binding; values are released after the lock is.
    fn clear(&self) {
        let bindings = std::mem::take(&mut *self.0.bindings.write());
        drop(bindings);
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("bindings", &self.len())
            .field("depth", &self.depth())
            .finish()
    }
}
