//! Sharded LRU cache of compiled scripts.
//!
//! Keys are hashed to one of N shards, each behind its own lock and holding
//! an access-ordered bounded map. The total capacity is split across the
//! shards, so the cache never holds more than its capacity; eviction picks
//! the least recently used entry of the shard being inserted into.

use std::collections::BTreeMap;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::error::Error;
use crate::script::Script;

/// Normalized identity of a compilation request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    source: String,
    params: Vec<String>,
    expression: bool,
}

impl CacheKey {
    /// `source` is expected to be trimmed already.
    pub(crate) fn new(source: &str, params: &[&str], expression: bool) -> Self {
        CacheKey {
            source: source.to_owned(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            expression,
        }
    }
}

struct Entry {
    script: Script,
    stamp: u64,
}

/// One independently locked partition.
struct Shard {
    capacity: usize,
    entries: FxHashMap<CacheKey, Entry>,
    /// Access stamp to key, oldest first.
    recency: BTreeMap<u64, CacheKey>,
    clock: u64,
}

impl Shard {
    fn new(capacity: usize) -> Self {
        Shard {
            capacity,
            entries: FxHashMap::default(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: &CacheKey) -> Option<Script> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, key.clone());
        Some(entry.script.clone())
    }

    /// Insert unless present; returns the cached script and whether an
    /// entry was evicted to make room.
    fn insert(&mut self, key: CacheKey, script: Script) -> (Script, bool) {
        if let Some(existing) = self.get(&key) {
            return (existing, false);
        }
        let mut evicted = false;
        if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.recency.pop_first() {
                self.entries.remove(&oldest);
                evicted = true;
            }
        }
        let stamp = self.tick();
        self.recency.insert(stamp, key.clone());
        self.entries.insert(
            key,
            Entry {
                script: script.clone(),
                stamp,
            },
        );
        (script, evicted)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

/// Cache counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub(crate) struct ScriptCache {
    capacity: usize,
    shards: Vec<Mutex<Shard>>,
    hasher: FxBuildHasher,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ScriptCache {
    /// Cache holding at most `capacity` scripts; 0 disables caching.
    pub(crate) fn new(capacity: usize) -> Self {
        let parallelism = std::thread::available_parallelism().map_or(1, usize::from);
        Self::with_shards(capacity, parallelism.next_power_of_two())
    }

    pub(crate) fn with_shards(capacity: usize, shards: usize) -> Self {
        let count = shards.clamp(1, capacity.max(1));
        let shards = (0..count)
            .map(|i| {
                let extra = usize::from(i < capacity % count);
                Mutex::new(Shard::new(capacity / count + extra))
            })
            .collect();
        ScriptCache {
            capacity,
            shards,
            hasher: FxBuildHasher,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: &CacheKey) -> &Mutex<Shard> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the low bits select a shard"
        )]
        let hash = self.hasher.hash_one(key) as usize;
        &self.shards[hash % self.shards.len()]
    }

    /// Cached script for `key`, or the result of `compile`.
    ///
    /// The shard lock is not held while compiling. Two threads missing on
    /// the same key may both compile; the first insertion wins and both get
    /// that script.
    pub(crate) fn get_or_compile(
        &self,
        key: CacheKey,
        compile: impl FnOnce() -> Result<Script, Error>,
    ) -> Result<Script, Error> {
        if self.capacity == 0 {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return compile();
        }
        let shard = self.shard(&key);
        if let Some(script) = shard.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(script);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(len = key.source.len(), "script cache miss");
        let script = compile()?;
        let (script, evicted) = shard.lock().insert(key, script);
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("script cache evicted least recently used entry");
        }
        Ok(script)
    }

    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().entries.len()).sum()
    }

    pub(crate) fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity,
            len: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
