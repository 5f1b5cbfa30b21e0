//! [Transposition Table] mapping game states to their unique search nodes.
//!
//! [Transposition Table]: https://www.chessprogramming.org/Transposition_Table

use std::collections::HashMap;
use std::ptr;
use std::sync::{Arc, Weak};

use crate::environment::GameState;
use crate::search::SearchNode;

/// Everything guarded by the graph lock.
pub(super) struct TranspositionTable<S: GameState> {
    /// An entry exists while the node for the state is alive. Entries of
    /// destroyed nodes are erased by the node itself; stale ones can only be
    /// observed in the window between the last owner letting go and the node
    /// erasing its entry.
    pub(super) entries: HashMap<S, Weak<SearchNode<S>>>,
    /// Nodes without parents, owned here to keep them reachable.
    pub(super) roots: Vec<Arc<SearchNode<S>>>,
    pub(super) lookups: u64,
    pub(super) hits: u64,
    /// Number of destroyed nodes.
    pub(super) purges: u64,
}

impl<S: GameState> TranspositionTable<S> {
    pub(super) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            roots: vec![],
            lookups: 0,
            hits: 0,
            purges: 0,
        }
    }

    /// Accounts for the destruction of `node` and erases its entry. The entry
    /// is left alone if it already points to a newer node for the same state.
    pub(super) fn forget(&mut self, state: &S, node: *const SearchNode<S>) {
        self.purges += 1;
        let owned = self
            .entries
            .get(state)
            .is_some_and(|entry| ptr::eq(entry.as_ptr(), node));
        if owned {
            drop(self.entries.remove(state));
        }
    }

    /// Returns the fraction of lookups that found an existing node.
    pub(super) fn hit_rate(&self) -> f32 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.hits as f32 / self.lookups as f32
    }
}
