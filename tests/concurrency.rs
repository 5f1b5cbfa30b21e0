use std::thread;

use mcdag::environment::GameState;
use mcdag::games::tictactoe::Board;
use mcdag::search::SearchGraph;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod common;

use common::{check_invariants, reachable};

const THREADS: u64 = 4;
const ITERATIONS: usize = 500;

#[test_log::test]
fn parallel_iterations_share_the_graph() {
    let graph = SearchGraph::default();
    let root = graph.get_or_create_node(Board::starting(), None);

    thread::scope(|scope| {
        let workers = (0..THREADS)
            .map(|seed| {
                let (graph, root) = (&graph, &root);
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..ITERATIONS {
                        graph.iterate(root, &mut rng);
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().expect("search thread should not panic");
        }
    });

    // Every iteration visits the root at least once.
    assert!(root.visits() as usize >= THREADS as usize * ITERATIONS);
    assert!(root.is_expanded());
    assert_eq!(graph.roots().len(), 1);
    assert_eq!(reachable(&root).len(), graph.size());
    let hit_rate = graph.transposition_hit_rate();
    assert!((0.0..=1.0).contains(&hit_rate));
    check_invariants(&root);

    let best = root.get_move().expect("the root is expanded");
    assert!(root.state().legal_moves().contains(&best));
}

#[test_log::test]
fn parallel_search_and_prune() {
    let graph = SearchGraph::default();
    let mut rng = StdRng::seed_from_u64(42);
    let root = graph.run_search_with_rng(Board::starting(), 1_000, &mut rng);

    thread::scope(|scope| {
        let searcher = scope.spawn(|| {
            let mut rng = StdRng::seed_from_u64(1);
            for _ in 0..ITERATIONS {
                graph.iterate(&root, &mut rng);
            }
        });
        let pruner = scope.spawn(|| {
            for _ in 0..10 {
                graph.prune(100);
            }
        });
        searcher.join().expect("search thread should not panic");
        pruner.join().expect("prune thread should not panic");
    });

    graph.prune(100);
    assert!(graph.size() <= 100);
    assert_eq!(reachable(&root).len(), graph.size());
    check_invariants(&root);
}
