//! Mutable shared collections: arrays, maps and sets.
//!
//! Collections are aliased by `Value` clones, so each one guards its
//! contents with a `parking_lot::RwLock`. Maps and sets keep insertion
//! order and hash their keys through [`ValueKey`].

use std::sync::Arc;

use ember_ir::ast::ParamType;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Value;

/// Hashable projection of a value used for map keys and set members.
///
/// Integral floats hash as integers so `{1: x}[1.0]` finds the entry.
/// Heap values other than strings key by identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Char(char),
    Str(Arc<str>),
    Identity(usize),
}

impl ValueKey {
    pub fn of(value: &Value) -> ValueKey {
        match value {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(n) => ValueKey::Int(*n),
            Value::Float(f) => float_key(*f),
            Value::Char(c) => ValueKey::Char(*c),
            Value::Str(s) => ValueKey::Str(s.arc()),
            Value::Range(r) => ValueKey::Identity(range_identity(r.start, r.end)),
            other => ValueKey::Identity(other.address().unwrap_or(0)),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "guarded by the integral range check"
)]
fn float_key(f: f64) -> ValueKey {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return ValueKey::Int(f as i64);
    }
    if f.is_nan() {
        return ValueKey::Float(f64::NAN.to_bits());
    }
    ValueKey::Float(f.to_bits())
}

fn range_identity(start: i64, end: i64) -> usize {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    (start, end).hash(&mut hasher);
    usize::try_from(hasher.finish()).unwrap_or_default()
}

/// Insertion-ordered hash map keyed by value.
#[derive(Clone, Debug, Default)]
pub struct OrderedMap<V> {
    entries: Vec<(Value, V)>,
    index: FxHashMap<ValueKey, usize>,
}

impl<V: Clone> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&V> {
        self.index
            .get(&ValueKey::of(key))
            .map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(&ValueKey::of(key))
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&mut self, key: Value, value: V) -> Option<V> {
        let hashed = ValueKey::of(&key);
        if let Some(&i) = self.index.get(&hashed) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(hashed, self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &Value) -> Option<V> {
        let i = self.index.remove(&ValueKey::of(key))?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }
}

/// Array with an element type tag.
#[derive(Debug)]
pub struct ArrayValue {
    elem: ParamType,
    items: RwLock<Vec<Value>>,
}

impl ArrayValue {
    pub(crate) fn new(elem: ParamType, items: Vec<Value>) -> Self {
        ArrayValue {
            elem,
            items: RwLock::new(items),
        }
    }

    /// Declared element type; `Any` for untyped arrays.
    pub fn elem(&self) -> ParamType {
        self.elem
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Replace the element at `index`; `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.items.write().push(value);
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.items.write();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    /// Visit the elements under the read lock.
    pub(crate) fn visit(&self, f: &mut dyn FnMut(&Value)) {
        self.items.read().iter().for_each(f);
    }
}

/// Insertion-ordered map.
#[derive(Debug, Default)]
pub struct MapValue(RwLock<OrderedMap<Value>>);

impl MapValue {
    pub(crate) fn new(entries: OrderedMap<Value>) -> Self {
        MapValue(RwLock::new(entries))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.read().contains_key(key)
    }

    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        self.0.write().insert(key, value)
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Copy of the current entries, in insertion order.
    pub fn snapshot(&self) -> Vec<(Value, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Visit keys and values under the read lock.
    pub(crate) fn visit(&self, f: &mut dyn FnMut(&Value)) {
        for (key, value) in self.0.read().iter() {
            f(key);
            f(value);
        }
    }
}

/// Insertion-ordered set.
#[derive(Debug, Default)]
pub struct SetValue(RwLock<OrderedMap<()>>);

impl SetValue {
    pub(crate) fn new(items: OrderedMap<()>) -> Self {
        SetValue(RwLock::new(items))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.read().contains_key(value)
    }

    /// Add a member; `true` if it was not present.
    pub fn insert(&self, value: Value) -> bool {
        self.0.write().insert(value, ()).is_none()
    }

    pub fn remove(&self, value: &Value) -> bool {
        self.0.write().remove(value).is_some()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().keys().cloned().collect()
    }

    pub(crate) fn visit(&self, f: &mut dyn FnMut(&Value)) {
        self.0.read().keys().for_each(f);
    }
}

/// Inclusive integer range `start .. end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
}

impl RangeValue {
    pub fn new(start: i64, end: i64) -> Self {
        RangeValue { start, end }
    }

    /// Number of elements; a descending range counts downwards.
    pub fn len(&self) -> u64 {
        self.start.abs_diff(self.end).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, n: i64) -> bool {
        let (lo, hi) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        (lo..=hi).contains(&n)
    }

    /// Element at `index`, counting from `start`.
    pub fn get(&self, index: i64) -> Option<i64> {
        if index < 0 || u64::try_from(index).ok()? >= self.len() {
            return None;
        }
        if self.start <= self.end {
            self.start.checked_add(index)
        } else {
            self.start.checked_sub(index)
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = i64> + Send> {
        if self.start <= self.end {
            Box::new(self.start..=self.end)
        } else {
            Box::new((self.end..=self.start).rev())
        }
    }
}
