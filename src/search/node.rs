use std::fmt;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use itertools::Itertools;
use log::trace;

use crate::environment::{GameResult, GameState};
use crate::search::graph::Shared;
use crate::search::{Config, Policy};

/// A vertex of the search graph: a unique game state and the statistics of
/// all simulations that went through it.
///
/// Nodes are only created by [`crate::search::SearchGraph`], which guarantees
/// that there is at most one node per state. A node is owned by its parents
/// (or by the graph if it is a root) and refers back to them weakly. Once the
/// last owner releases it, the node is destroyed and removed from the
/// transposition table.
///
/// Wins are counted from the perspective of the player to move in this node.
/// The parent is interested in the opposite: it picks a child by
/// `1 - Q + U`, see [`SearchNode::select`].
pub struct SearchNode<S: GameState> {
    state: S,
    moves: Vec<S::Move>,
    config: Config,
    graph: Weak<Shared<S>>,
    stats: Mutex<Stats<S>>,
}

/// Everything mutable about a node, updated as one consistency unit.
struct Stats<S: GameState> {
    parents: Vec<Weak<SearchNode<S>>>,
    /// Aligned with `moves` once expanded, empty otherwise.
    children: Vec<Arc<SearchNode<S>>>,
    visits: u32,
    wins: u32,
    ties: u32,
    expanded: bool,
    /// Set while one thread creates the children.
    expanding: bool,
}

impl<S: GameState> SearchNode<S> {
    pub(super) fn new(
        state: S,
        parent: Option<&Arc<Self>>,
        graph: Weak<Shared<S>>,
        config: Config,
    ) -> Self {
        let moves = state.legal_moves();
        Self {
            state,
            moves,
            config,
            graph,
            stats: Mutex::new(Stats {
                parents: parent.map(Arc::downgrade).into_iter().collect(),
                children: vec![],
                visits: 0,
                wins: 0,
                ties: 0,
                expanded: false,
                expanding: false,
            }),
        }
    }

    // Statistics are plain counters: a panic in another thread can not leave
    // them in an inconsistent state, so the poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, Stats<S>> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the game state of this node.
    #[must_use]
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Returns the legal moves captured at construction. Once the node is
    /// expanded, `children()[i]` is the result of `moves()[i]`.
    #[must_use]
    pub fn moves(&self) -> &[S::Move] {
        &self.moves
    }

    /// Returns the number of times the node was selected or expanded.
    #[must_use]
    pub fn visits(&self) -> u32 {
        self.lock().visits
    }

    /// Returns the number of simulations won by the player to move here.
    #[must_use]
    pub fn wins(&self) -> u32 {
        self.lock().wins
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn ties(&self) -> u32 {
        self.lock().ties
    }

    /// Losses are not stored: every visit that is neither a win nor a tie
    /// counts as a loss.
    #[must_use]
    pub fn losses(&self) -> u32 {
        let stats = self.lock();
        stats.visits - stats.wins - stats.ties
    }

    /// Returns `true` if the children are materialized.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.lock().expanded
    }

    /// Returns a snapshot of the children. Empty if the node is not expanded.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.lock().children.clone()
    }

    /// Returns the child reached by `action`, if the node is expanded.
    #[must_use]
    pub fn child(&self, action: S::Move) -> Option<Arc<Self>> {
        let index = self.moves.iter().position(|&m| m == action)?;
        self.lock().children.get(index).cloned()
    }

    /// Returns all live parents. Parents that were destroyed are dropped from
    /// the parent list along the way.
    ///
    /// A node reached twice from the same parent lists it twice.
    #[must_use]
    pub fn parents(&self) -> Vec<Arc<Self>> {
        let mut stats = self.lock();
        Self::live_parents(&mut stats.parents)
    }

    fn live_parents(parents: &mut Vec<Weak<Self>>) -> Vec<Arc<Self>> {
        let mut live = Vec::with_capacity(parents.len());
        parents.retain(|parent| match parent.upgrade() {
            Some(parent) => {
                live.push(parent);
                true
            },
            None => false,
        });
        live
    }

    /// Registers another owner. Returns `true` if the node had no live
    /// parents before, i.e. it used to be a root.
    pub(super) fn attach(&self, parent: &Arc<Self>) -> bool {
        let mut stats = self.lock();
        let orphan = stats.parents.iter().all(|p| p.strong_count() == 0);
        stats.parents.push(Arc::downgrade(parent));
        orphan
    }

    fn expanded_children(&self) -> Option<Vec<Arc<Self>>> {
        let stats = self.lock();
        stats.expanded.then(|| stats.children.clone())
    }

    /// Value estimate from the perspective of the player to move:
    /// `(wins + TIE_REWARD * ties) / (1 + visits)`.
    ///
    /// The extra visit in the denominator keeps unvisited nodes at zero
    /// instead of dividing by zero. The result is always in `[0, 1]`.
    #[must_use]
    pub fn q(&self) -> f32 {
        let stats = self.lock();
        (stats.wins as f32 + self.config.tie_reward * stats.ties as f32)
            / (1.0 + stats.visits as f32)
    }

    /// Value estimate from the perspective of the opponent (the player who
    /// moved into this node): losses count as wins.
    #[must_use]
    pub fn parent_q(&self) -> f32 {
        let stats = self.lock();
        let losses = stats.visits - stats.wins - stats.ties;
        (losses as f32 + self.config.tie_reward * stats.ties as f32) / (1.0 + stats.visits as f32)
    }

    /// Exploration bonus: `C * sqrt(total parent visits) / (1 + visits)`.
    ///
    /// Visits of all live parents are summed up, so a transposed node is
    /// explored according to the popularity of every path leading to it.
    #[must_use]
    pub fn u(&self) -> f32 {
        let (visits, parents) = {
            let mut stats = self.lock();
            (stats.visits, Self::live_parents(&mut stats.parents))
        };
        // Parents are locked one at a time after our own lock is released:
        // locks are never taken upwards while holding a child lock.
        let parent_visits: u64 = parents.iter().map(|p| u64::from(p.visits())).sum();
        self.config.exploration * (parent_visits as f32).sqrt() / (1.0 + visits as f32)
    }

    /// Returns `Q + U`.
    #[must_use]
    pub fn puct(&self) -> f32 {
        self.q() + self.u()
    }

    /// Returns the child with the highest `(1 - Q) + U`. Children are scored
    /// from the perspective of this node's player, hence the complement. The
    /// first child wins ties.
    fn max_puct(children: &[Arc<Self>]) -> Option<Arc<Self>> {
        let mut best: Option<(f32, &Arc<Self>)> = None;
        for child in children {
            let score = (1.0 - child.q()) + child.u();
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, child));
            }
        }
        best.map(|(_, child)| Arc::clone(child))
    }

    /// Descends from this node to an unexpanded leaf following the highest
    /// PUCT score and returns the path, both ends included.
    ///
    /// Every node on the path gets its visit count incremented right away,
    /// before the simulation result is known. This acts as a virtual loss:
    /// concurrent selections see the updated counts and spread out.
    #[must_use]
    pub fn select(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut path = Vec::with_capacity(64);
        let mut current = Arc::clone(self);
        loop {
            let next = current
                .expanded_children()
                .and_then(|children| Self::max_puct(&children));
            current.lock().visits += 1;
            path.push(current);
            match next {
                Some(next) => current = next,
                None => return path,
            }
        }
    }

    /// Creates one child per legal move and counts a visit.
    ///
    /// A node is expanded at most once: calls on an expanded node (or one that
    /// another thread is currently expanding) only count the visit. Terminal
    /// nodes have no moves and never become expanded.
    pub fn expand(self: &Arc<Self>) {
        {
            let mut stats = self.lock();
            stats.visits += 1;
            if stats.expanded || stats.expanding || self.moves.is_empty() {
                return;
            }
            stats.expanding = true;
        }
        let Some(graph) = self.graph.upgrade() else {
            self.lock().expanding = false;
            return;
        };
        // The graph lock is acquired for every child, so the node lock must
        // not be held here.
        let children = self
            .moves
            .iter()
            .map(|&action| graph.get_or_create_node(self.state.apply(action), Some(self)))
            .collect_vec();
        trace!("Expanded node with {} children", children.len());
        let mut stats = self.lock();
        stats.children = children;
        stats.expanded = true;
        stats.expanding = false;
    }

    /// Records the outcome of a finished game in every node on `path`.
    ///
    /// Each node counts the result from the perspective of its own player to
    /// move: a win for it, a tie, or nothing for a loss.
    pub fn backpropagate(terminal: &S, path: &[Arc<Self>]) {
        let Some(outcome) = terminal.outcome() else {
            return;
        };
        for node in path {
            let result = outcome.relative_to(node.state.player());
            let mut stats = node.lock();
            match result {
                GameResult::Win => stats.wins += 1,
                GameResult::Tie => stats.ties += 1,
                GameResult::Loss => {},
            }
        }
    }

    /// Discards the whole subtree of this node and makes it a leaf again.
    /// Children that are not owned by any other parent are destroyed. No-op if
    /// the node is not expanded.
    pub fn filicide(&self) {
        let children = {
            let mut stats = self.lock();
            if !stats.expanded {
                return;
            }
            stats.expanded = false;
            std::mem::take(&mut stats.children)
        };
        // Destroying a child takes the graph lock, release ours first.
        drop(children);
    }

    /// Collapses the graph around this node: every ancestor keeps only the
    /// child leading here, all other children of the ancestors are filicided.
    pub fn prune_ancestors(self: &Arc<Self>) {
        self.prune_ancestors_keeping(self);
    }

    fn prune_ancestors_keeping(self: &Arc<Self>, keep: &Arc<Self>) {
        if !Arc::ptr_eq(self, keep) {
            for child in self.children() {
                if !Arc::ptr_eq(&child, keep) {
                    child.filicide();
                }
            }
        }
        for parent in self.parents() {
            parent.prune_ancestors_keeping(self);
        }
    }

    /// Filicides every child whose optimistic `Q + U` is below the plain `Q`
    /// of some sibling.
    ///
    /// This is a cheap heuristic, not a sound dominance rule: the optimistic
    /// score is compared against the siblings' estimates without their own
    /// exploration bonus.
    pub fn prune_children(&self) {
        let children = self.children();
        let estimates = children.iter().map(|child| child.q()).collect_vec();
        for (index, child) in children.iter().enumerate() {
            let optimistic = child.puct();
            let dominated = estimates
                .iter()
                .enumerate()
                .any(|(sibling, &q)| sibling != index && optimistic < q);
            if dominated {
                child.filicide();
            }
        }
    }

    /// Returns the best move: the one leading to the child with the lowest
    /// `Q` (the worst position for the opponent), preferring more visited
    /// children on ties. `None` if the node is not expanded.
    #[must_use]
    pub fn get_move(&self) -> Option<S::Move> {
        let children = self.expanded_children()?;
        let mut best: Option<(f32, u32, S::Move)> = None;
        for (&action, child) in self.moves.iter().zip(&children) {
            let (q, visits) = (child.q(), child.visits());
            trace!(
                "{action:?}: {visits} visits, valued by {} as {q}",
                child.state.player()
            );
            let better = best.map_or(true, |(best_q, best_visits, _)| {
                match q.total_cmp(&best_q) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Equal => visits > best_visits,
                    std::cmp::Ordering::Greater => false,
                }
            });
            if better {
                best = Some((q, visits, action));
            }
        }
        best.map(|(_, _, action)| action)
    }

    /// Returns `1 - Q + epsilon` of every child as a preference weight of the
    /// corresponding move. The weights are not normalized, see
    /// [`Policy::normalized`]. Empty if the node is not expanded.
    #[must_use]
    pub fn get_policy(&self) -> Policy<S::Move> {
        let Some(children) = self.expanded_children() else {
            return Policy::default();
        };
        self.moves
            .iter()
            .zip(&children)
            .map(|(&action, child)| (action, 1.0 - child.q() + self.config.policy_epsilon))
            .collect()
    }
}

impl<S: GameState> Drop for SearchNode<S> {
    fn drop(&mut self) {
        if let Some(graph) = self.graph.upgrade() {
            graph.lock().forget(&self.state, ptr::from_ref(self));
        }
    }
}

impl<S: GameState + fmt::Debug> fmt::Debug for SearchNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.lock();
        f.debug_struct("SearchNode")
            .field("state", &self.state)
            .field("visits", &stats.visits)
            .field("wins", &stats.wins)
            .field("ties", &stats.ties)
            .field("expanded", &stats.expanded)
            .field("children", &stats.children.len())
            .finish_non_exhaustive()
    }
}
