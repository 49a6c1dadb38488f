//! String interning for identifiers and literals.
//!
//! Each compile interns into its own [`StringInterner`]; once parsing is
//! done the table is frozen into [`Symbols`], which the compiled program
//! owns. Dropping the program frees its text. Strings are spread over
//! independently locked shards so template sub-parses can intern through a
//! shared reference.

use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::Name;

/// Names the lexer and interpreter ask for on nearly every script.
const PREINTERNED: &[&str] = &[
    "var", "let", "const", "function", "return", "size", "empty", "length", "message", "value",
    "type", "curry", "call", "e",
];

/// A shard ran out of index space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternError {
    pub shard: usize,
}

impl fmt::Display for InternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interner shard {} is full ({} strings)",
            self.shard,
            u64::from(Name::MAX_INDEX) + 1
        )
    }
}

impl std::error::Error for InternError {}

#[derive(Default)]
struct Shard {
    names: FxHashMap<Arc<str>, Name>,
    strings: Vec<Arc<str>>,
}

/// Concurrent string table filled while a source is lexed and parsed.
pub struct StringInterner {
    shards: [RwLock<Shard>; Name::SHARDS],
    count: AtomicUsize,
}

impl StringInterner {
    pub fn new() -> Self {
        let interner = StringInterner {
            shards: std::array::from_fn(|_| RwLock::new(Shard::default())),
            count: AtomicUsize::new(0),
        };
        {
            let mut first = interner.shards[0].write();
            let empty: Arc<str> = Arc::from("");
            first.names.insert(Arc::clone(&empty), Name::EMPTY);
            first.strings.push(empty);
        }
        interner.count.store(1, Ordering::Relaxed);
        for word in PREINTERNED {
            // A fresh shard always has room for the preinterned words.
            let _ = interner.try_intern(word);
        }
        interner
    }

    fn shard_of(text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the low bits select a shard"
        )]
        let hash = FxBuildHasher.hash_one(text) as usize;
        hash % Name::SHARDS
    }

    /// Intern `text`, failing when its shard is exhausted.
    pub fn try_intern(&self, text: &str) -> Result<Name, InternError> {
        let shard_index = Self::shard_of(text);
        let shard = self.shards[shard_index].upgradable_read();
        if let Some(&name) = shard.names.get(text) {
            return Ok(name);
        }

        let mut shard = RwLockUpgradableReadGuard::upgrade(shard);
        let index = u32::try_from(shard.strings.len())
            .ok()
            .filter(|index| *index <= Name::MAX_INDEX)
            .ok_or(InternError { shard: shard_index })?;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_index < Name::SHARDS"
        )]
        let name = Name::from_parts(shard_index as u32, index);

        let text: Arc<str> = Arc::from(text);
        shard.strings.push(Arc::clone(&text));
        shard.names.insert(text, name);
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(name)
    }

    /// Text of `name`; unknown names read as the empty string.
    pub fn lookup(&self, name: Name) -> Arc<str> {
        self.shards[name.shard()]
            .read()
            .strings
            .get(name.index())
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Number of distinct strings, including the empty string.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Whether only the empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Freeze the table for lock-free lookups.
    pub fn into_symbols(self) -> Symbols {
        let shards = self.shards.map(RwLock::into_inner);
        let mut names = FxHashMap::default();
        names.reserve(self.count.into_inner());
        let strings = shards.map(|shard| {
            names.extend(shard.names);
            shard.strings.into_boxed_slice()
        });
        Symbols { strings, names }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

/// Frozen name table of one compiled program.
pub struct Symbols {
    strings: [Box<[Arc<str>]>; Name::SHARDS],
    names: FxHashMap<Arc<str>, Name>,
}

impl Symbols {
    /// Text of `name`; unknown names read as the empty string.
    #[inline]
    pub fn lookup(&self, name: Name) -> &str {
        self.strings[name.shard()]
            .get(name.index())
            .map_or("", |text| &**text)
    }

    /// Shared handle to the text of `name`.
    pub fn text(&self, name: Name) -> Arc<str> {
        self.strings[name.shard()]
            .get(name.index())
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// The name interned for `text`, if the source used it.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.names.get(text).copied()
    }

    /// Number of distinct strings, including the empty string.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether only the empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl fmt::Debug for Symbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbols").field("len", &self.len()).finish()
    }
}
