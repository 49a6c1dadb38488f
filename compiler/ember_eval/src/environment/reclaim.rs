//! Reclaiming frames kept alive by closure cycles.
//!
//! A function stored in the frame it captures keeps that frame alive
//! through its own binding, so reference counting alone never frees it.
//! When an evaluation ends, its registry looks at every frame a closure
//! captured. Frames that nothing outside the traced graph can still reach
//! have their bindings cleared, which breaks the cycle.
//!
//! Reachability is decided by trial deletion. References between traced
//! objects are counted; an object with more strong references than traced
//! ones is held from outside (the host, the result, another evaluation) and
//! everything reachable from it survives.

use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Frame, FrameData};
use crate::value::Value;

/// Identity of the evaluation that created a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Epoch(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Frames captured by closures during one evaluation.
#[derive(Debug)]
pub struct FrameRegistry {
    epoch: Epoch,
    frames: Vec<Weak<FrameData>>,
    seen: FxHashSet<usize>,
}

impl Default for FrameRegistry {
    fn default() -> Self {
        FrameRegistry::new()
    }
}

impl FrameRegistry {
    pub fn new() -> Self {
        FrameRegistry {
            epoch: Epoch::next(),
            frames: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Record that a closure captured `frame`.
    ///
    /// The frame and its ancestors from this epoch are registered; frames
    /// of earlier evaluations are left to the evaluation that made them.
    pub fn capture(&mut self, frame: &Frame) {
        let mut current = Some(frame);
        while let Some(frame) = current {
            if frame.epoch() != self.epoch || !self.seen.insert(frame.address()) {
                break;
            }
            self.frames.push(Arc::downgrade(&frame.0));
            current = frame.parent();
        }
    }

    /// Clear the registered frames no outside reference can reach.
    ///
    /// Returns the number of frames cleared. The registry is empty
    /// afterwards and can be reused.
    pub fn reclaim(&mut self) -> usize {
        self.seen.clear();
        let frames = std::mem::take(&mut self.frames);
        if frames.is_empty() {
            return 0;
        }

        let mut graph = Graph::new(self.epoch);
        for weak in frames {
            if let Some(data) = weak.upgrade() {
                graph.add_captured(Frame(data));
            }
        }
        graph.trace();
        let live = graph.live();

        let dead: Vec<Frame> = graph
            .nodes
            .iter()
            .filter(|(addr, _)| !live.contains(*addr))
            .filter_map(|(_, node)| match &node.object {
                Object::Frame(frame) => Some(frame.clone()),
                Object::Value(_) => None,
            })
            .collect();
        for frame in &dead {
            frame.clear();
        }
        tracing::trace!(traced = graph.nodes.len(), cleared = dead.len(), "reclaimed frames");
        dead.len()
    }
}

#[derive(Clone)]
enum Object {
    Frame(Frame),
    Value(Value),
}

struct Node {
    object: Object,
    /// Strong count when first seen, excluding the graph's own handle.
    strong: usize,
    /// References found from other traced objects.
    traced: usize,
}

struct Graph {
    epoch: Epoch,
    nodes: FxHashMap<usize, Node>,
    pending: Vec<usize>,
}

impl Graph {
    fn new(epoch: Epoch) -> Self {
        Graph {
            epoch,
            nodes: FxHashMap::default(),
            pending: Vec::new(),
        }
    }

    /// Add a registered frame; `frame` is the graph's own upgraded handle.
    fn add_captured(&mut self, frame: Frame) {
        let addr = frame.address();
        if let Entry::Vacant(slot) = self.nodes.entry(addr) {
            let strong = Arc::strong_count(&frame.0) - 1;
            slot.insert(Node {
                object: Object::Frame(frame),
                strong,
                traced: 0,
            });
            self.pending.push(addr);
        }
    }

    /// Count every reference between traced objects.
    fn trace(&mut self) {
        while let Some(addr) = self.pending.pop() {
            let Some(object) = self.nodes.get(&addr).map(|node| node.object.clone()) else {
                continue;
            };
            let epoch = self.epoch;
            visit(&object, epoch, &mut |child| self.edge(child));
        }
    }

    fn edge(&mut self, child: Child<'_>) {
        let (addr, strong) = match child {
            Child::Frame(frame) => (frame.address(), Arc::strong_count(&frame.0)),
            Child::Value { addr, strong, .. } => (addr, strong),
        };
        match self.nodes.entry(addr) {
            Entry::Occupied(mut slot) => slot.get_mut().traced += 1,
            Entry::Vacant(slot) => {
                let object = match child {
                    Child::Frame(frame) => Object::Frame(frame.clone()),
                    Child::Value { value, .. } => Object::Value(value.clone()),
                };
                slot.insert(Node {
                    object,
                    strong,
                    traced: 1,
                });
                self.pending.push(addr);
            }
        }
    }

    /// Addresses reachable from objects with outside references.
    fn live(&self) -> FxHashSet<usize> {
        let mut live = FxHashSet::default();
        let mut stack: Vec<usize> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.strong > node.traced)
            .map(|(addr, _)| *addr)
            .collect();
        while let Some(addr) = stack.pop() {
            if !live.insert(addr) {
                continue;
            }
            if let Some(node) = self.nodes.get(&addr) {
                visit(&node.object, self.epoch, &mut |child| {
                    let child = child.address();
                    if self.nodes.contains_key(&child) && !live.contains(&child) {
                        stack.push(child);
                    }
                });
            }
        }
        live
    }
}

/// Reference from a traced object to another traceable one.
enum Child<'a> {
    Frame(&'a Frame),
    Value {
        value: &'a Value,
        addr: usize,
        strong: usize,
    },
}

impl Child<'_> {
    fn address(&self) -> usize {
        match self {
            Child::Frame(frame) => frame.address(),
            Child::Value { addr, .. } => *addr,
        }
    }
}

/// Visit the traceable objects `object` refers to.
///
/// Frames from other epochs are not traced: this evaluation never clears
/// them, and a reference into one only keeps it alive.
fn visit(object: &Object, epoch: Epoch, f: &mut dyn FnMut(Child<'_>)) {
    match object {
        Object::Frame(frame) => {
            if let Some(parent) = frame.parent() {
                frame_edge(parent, epoch, f);
            }
            for binding in frame.0.bindings.read().values() {
                value_edge(&binding.value, f);
            }
        }
        Object::Value(value) => {
            if let Value::Function(function) = value {
                frame_edge(function.captured(), epoch, f);
            }
            value.visit_children(&mut |child| value_edge(child, f));
        }
    }
}

fn frame_edge(frame: &Frame, epoch: Epoch, f: &mut dyn FnMut(Child<'_>)) {
    if frame.epoch() == epoch {
        f(Child::Frame(frame));
    }
}

fn value_edge(value: &Value, f: &mut dyn FnMut(Child<'_>)) {
    if let (Some(addr), Some(strong)) = (value.address(), value.strong_count()) {
        f(Child::Value {
            value,
            addr,
            strong,
        });
    }
}
