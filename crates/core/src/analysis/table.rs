//! Recovery table: memoized fault-safety results keyed by callable identity.
//!
//! Every key moves through `unresolved -> resolving -> resolved(bool)` at most
//! once per run. A lookup that finds its key still `resolving` has re-entered
//! its own computation through a reference cycle; it gets `false` and the
//! outer computation settles the key.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

/// Which property of a callable an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Launching the callable is fault-safe: its body registers an exit-time
    /// callback that intercepts.
    Guards,
    /// Running the callable as an exit-time callback intercepts the fault.
    Intercepts,
}

/// Where a symbol was defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Defined in this file; used for local definitions.
    Unit(PathBuf),
    /// Defined somewhere in this module (import path).
    Module(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecoveryKey {
    pub facet: Facet,
    pub scope: Scope,
    pub symbol: String,
}

impl RecoveryKey {
    pub fn local(facet: Facet, file: impl Into<PathBuf>, symbol: impl Into<String>) -> Self {
        Self { facet, scope: Scope::Unit(file.into()), symbol: symbol.into() }
    }

    pub fn qualified(facet: Facet, module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self { facet, scope: Scope::Module(module.into()), symbol: symbol.into() }
    }
}

impl fmt::Display for RecoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facet = match self.facet {
            Facet::Guards => "guards",
            Facet::Intercepts => "intercepts",
        };
        match &self.scope {
            Scope::Unit(file) => write!(f, "{facet}:{}::{}", file.display(), self.symbol),
            Scope::Module(module) => write!(f, "{facet}:{module}.{}", self.symbol),
        }
    }
}

/// Memoizing store shared by the resolver and the cross-module loader.
pub trait RecoveryStore {
    /// Resolved value for `key`, if any.
    fn lookup(&self, key: &RecoveryKey) -> Option<bool>;

    /// Cached value for `key`, or run `compute` once and store its result.
    ///
    /// Returns `false` without calling `compute` when `key` is already being
    /// resolved further up the same resolution chain.
    fn lookup_or_compute(&self, key: RecoveryKey, compute: &mut dyn FnMut() -> bool) -> bool;

    /// Number of resolved entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Resolving,
    Resolved(bool),
}

/// Single-threaded table owned by one analysis run.
#[derive(Debug, Default)]
pub struct RecoveryTable {
    entries: RefCell<HashMap<RecoveryKey, Entry>>,
}

impl RecoveryTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for RecoveryTable {
    fn lookup(&self, key: &RecoveryKey) -> Option<bool> {
        match self.entries.borrow().get(key) {
            Some(Entry::Resolved(value)) => Some(*value),
            _ => None,
        }
    }

    fn lookup_or_compute(&self, key: RecoveryKey, compute: &mut dyn FnMut() -> bool) -> bool {
        let existing = self.entries.borrow().get(&key).copied();
        match existing {
            Some(Entry::Resolved(value)) => return value,
            Some(Entry::Resolving) => {
                tracing::debug!(%key, "reference cycle, treating as unsafe");
                return false;
            }
            None => {}
        }

        self.entries.borrow_mut().insert(key.clone(), Entry::Resolving);
        let value = compute();
        tracing::debug!(%key, value, "resolved");
        self.entries.borrow_mut().insert(key, Entry::Resolved(value));
        value
    }

    fn len(&self) -> usize {
        self.entries.borrow().values().filter(|e| matches!(e, Entry::Resolved(_))).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SharedEntry {
    Resolving(ThreadId),
    Resolved(bool),
}

#[derive(Debug, Default)]
struct SharedState {
    entries: HashMap<RecoveryKey, SharedEntry>,
    /// Keys that blocked threads are waiting on.
    waiting: HashMap<ThreadId, RecoveryKey>,
}

impl SharedState {
    /// Whether `from` is, directly or through other waiting threads, blocked
    /// on a key owned by `target`.
    fn waits_on(&self, from: ThreadId, target: ThreadId) -> bool {
        let mut current = from;
        for _ in 0..=self.waiting.len() {
            if current == target {
                return true;
            }
            let Some(key) = self.waiting.get(&current) else {
                return false;
            };
            match self.entries.get(key) {
                Some(SharedEntry::Resolving(owner)) => current = *owner,
                _ => return false,
            }
        }
        false
    }
}

/// Table shared by workers that analyze units concurrently.
///
/// Concurrent first lookups of one key compute once; the other callers block
/// until the value is stored. A caller whose wait would close a cycle of
/// waiting threads treats the key as a reference cycle instead.
#[derive(Debug, Default)]
pub struct SharedRecoveryTable {
    state: Mutex<SharedState>,
    settled: Condvar,
}

impl SharedRecoveryTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for SharedRecoveryTable {
    fn lookup(&self, key: &RecoveryKey) -> Option<bool> {
        match self.state.lock().entries.get(key) {
            Some(SharedEntry::Resolved(value)) => Some(*value),
            _ => None,
        }
    }

    fn lookup_or_compute(&self, key: RecoveryKey, compute: &mut dyn FnMut() -> bool) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let existing = state.entries.get(&key).copied();
            match existing {
                Some(SharedEntry::Resolved(value)) => return value,
                Some(SharedEntry::Resolving(owner)) => {
                    if state.waits_on(owner, me) {
                        tracing::debug!(%key, "reference cycle, treating as unsafe");
                        return false;
                    }
                    state.waiting.insert(me, key.clone());
                    self.settled.wait(&mut state);
                    state.waiting.remove(&me);
                }
                None => break,
            }
        }
        state.entries.insert(key.clone(), SharedEntry::Resolving(me));
        drop(state);

        let value = compute();
        tracing::debug!(%key, value, "resolved");
        self.state.lock().entries.insert(key, SharedEntry::Resolved(value));
        self.settled.notify_all();
        value
    }

    fn len(&self) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|e| matches!(e, SharedEntry::Resolved(_)))
            .count()
    }
}
