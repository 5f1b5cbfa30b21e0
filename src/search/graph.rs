use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use itertools::Itertools;
use log::{debug, info};
use rand::Rng;

use crate::environment::GameState;
use crate::search::transposition::TranspositionTable;
use crate::search::{rollout, Config, PruneRule, SearchNode};

/// State shared between the graph handle and its nodes. Nodes only hold a
/// weak reference to it.
pub(super) struct Shared<S: GameState> {
    config: Config,
    table: Mutex<TranspositionTable<S>>,
}

impl<S: GameState> Shared<S> {
    pub(super) fn lock(&self) -> MutexGuard<'_, TranspositionTable<S>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn get_or_create_node(
        self: &Arc<Self>,
        state: S,
        parent: Option<&Arc<SearchNode<S>>>,
    ) -> Arc<SearchNode<S>> {
        loop {
            let mut table = self.lock();
            table.lookups += 1;
            let existing = table.entries.get(&state).map(std::sync::Weak::upgrade);
            match existing {
                // The node is being destroyed right now and did not erase its
                // entry yet: treat it as a miss.
                Some(None) => {
                    debug!("Erasing stale transposition table entry");
                    drop(table.entries.remove(&state));
                    drop(table);
                },
                Some(Some(node)) => {
                    table.hits += 1;
                    if let Some(parent) = parent {
                        if node.attach(parent) {
                            if let Some(index) =
                                table.roots.iter().position(|root| Arc::ptr_eq(root, &node))
                            {
                                debug!("Unrooting node: it is reachable from a parent now");
                                drop(table.roots.remove(index));
                            }
                        }
                    }
                    return node;
                },
                None => {
                    let node = Arc::new(SearchNode::new(
                        state.clone(),
                        parent,
                        Arc::downgrade(self),
                        self.config,
                    ));
                    drop(table.entries.insert(state, Arc::downgrade(&node)));
                    if parent.is_none() {
                        debug!("Rooting node");
                        table.roots.push(Arc::clone(&node));
                    }
                    return node;
                },
            }
        }
    }
}

/// Owns the transposition table and the root nodes, and drives the search.
///
/// The graph is safe to share between threads: the table is guarded by a
/// single graph-wide lock and every node guards its own statistics. The graph
/// lock may be held while taking a node lock but never the other way around.
pub struct SearchGraph<S: GameState> {
    shared: Arc<Shared<S>>,
}

impl<S: GameState> SearchGraph<S> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                table: Mutex::new(TranspositionTable::new()),
            }),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the unique node for `state`, creating it if necessary.
    ///
    /// If `parent` is given, it becomes another (weak) parent of the node. A
    /// root that gains a parent stops being a root. Nodes created without a
    /// parent are roots and are owned by the graph.
    pub fn get_or_create_node(
        &self,
        state: S,
        parent: Option<&Arc<SearchNode<S>>>,
    ) -> Arc<SearchNode<S>> {
        self.shared.get_or_create_node(state, parent)
    }

    /// Returns the nodes that have no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<Arc<SearchNode<S>>> {
        self.shared.lock().roots.clone()
    }

    /// Returns the number of nodes in the transposition table.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Returns the number of [`SearchGraph::get_or_create_node`] lookups.
    #[must_use]
    pub fn lookup_count(&self) -> u64 {
        self.shared.lock().lookups
    }

    /// Returns the number of lookups that found an existing node.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.shared.lock().hits
    }

    /// Returns the number of destroyed nodes.
    #[must_use]
    pub fn purge_count(&self) -> u64 {
        self.shared.lock().purges
    }

    /// Returns the fraction of lookups answered by the transposition table,
    /// `0` if there were none.
    #[must_use]
    pub fn transposition_hit_rate(&self) -> f32 {
        self.shared.lock().hit_rate()
    }

    /// Discards less promising subtrees until the transposition table has at
    /// most `max_size` entries or no more progress can be made.
    ///
    /// The graph is traversed breadth-first from the roots. Which children
    /// survive is decided by [`PruneRule`]; the rest are filicided. Surviving
    /// children are traversed further.
    pub fn prune(&self, max_size: usize) {
        self.prune_with(max_size, || self.roots());
    }

    /// Same as [`SearchGraph::prune`], but the traversal starts at `node`
    /// instead of the roots, so `node` and its surviving line are kept.
    ///
    /// Meant for a committed move: call [`SearchNode::prune_ancestors`] on the
    /// played node first, then everything outside of its subgraph is already
    /// reduced to leaves.
    pub fn prune_from(&self, node: &Arc<SearchNode<S>>, max_size: usize) {
        self.prune_with(max_size, || vec![Arc::clone(node)]);
    }

    fn prune_with(&self, max_size: usize, start: impl Fn() -> Vec<Arc<SearchNode<S>>>) {
        let mut size = self.size();
        while size > max_size {
            // Destroying nodes takes the graph lock: work on a snapshot.
            self.prune_pass(start(), max_size);
            let pruned = self.size();
            debug!("Pruned {size} -> {pruned} nodes, the limit is {max_size}");
            if pruned >= size {
                break;
            }
            size = pruned;
        }
    }

    fn prune_pass(&self, start: Vec<Arc<SearchNode<S>>>, max_size: usize) {
        let mut queue = VecDeque::from(start);
        let mut seen = HashSet::new();
        while let Some(node) = queue.pop_front() {
            if self.size() <= max_size {
                return;
            }
            if !seen.insert(Arc::as_ptr(&node)) {
                continue;
            }
            let children = node.children();
            let visits = children.iter().map(|child| child.visits()).collect_vec();
            let most = visits.iter().max().copied();
            let most_visited = visits.iter().position(|&v| Some(v) == most);
            let parent_visits = node.visits();
            let survives = |index: usize| match self.config().prune_rule {
                PruneRule::MostVisitedSibling => most_visited == Some(index),
                PruneRule::ParentVisits => visits[index] > parent_visits,
            };
            for (index, child) in children.iter().enumerate() {
                if survives(index) {
                    queue.push_back(Arc::clone(child));
                } else {
                    child.filicide();
                }
            }
        }
    }

    /// Performs a single search iteration from `root`: selection, random
    /// rollout, backpropagation and expansion of the selected leaf unless it
    /// is terminal.
    ///
    /// Several threads can run iterations against the same graph.
    pub fn iterate<R: Rng + ?Sized>(&self, root: &Arc<SearchNode<S>>, rng: &mut R) {
        let path = root.select();
        if let Some(leaf) = path.last() {
            let terminal = rollout::simulate(leaf.state(), rng);
            SearchNode::backpropagate(&terminal, &path);
            if !leaf.state().is_terminal() {
                leaf.expand();
            }
        }
    }

    /// Runs `iterations` search iterations from `state` and returns its node.
    /// The best move can then be read with [`SearchNode::get_move`].
    pub fn run_search(&self, state: S, iterations: usize) -> Arc<SearchNode<S>> {
        self.run_search_with_rng(state, iterations, &mut rand::thread_rng())
    }

    /// Same as [`SearchGraph::run_search`] with a caller-provided source of
    /// randomness for the rollouts.
    pub fn run_search_with_rng<R: Rng + ?Sized>(
        &self,
        state: S,
        iterations: usize,
        rng: &mut R,
    ) -> Arc<SearchNode<S>> {
        let root = self.get_or_create_node(state, None);
        for _ in 0..iterations {
            self.iterate(&root, rng);
        }
        info!(
            "Searched {iterations} iterations: {} nodes, {:.1}% transposition hits, {} purged",
            self.size(),
            100.0 * self.transposition_hit_rate(),
            self.purge_count(),
        );
        root
    }
}

impl<S: GameState> Default for SearchGraph<S> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
