//! Criterion benchmarks measure time of the clearly separated pieces of code.

#![allow(unused_results)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mcdag::games::tictactoe::Board;
use mcdag::search::SearchGraph;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search from the starting position");
    for iterations in [1_000, 10_000] {
        group.throughput(Throughput::Elements(iterations as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{iterations} iterations")),
            &iterations,
            |b, &iterations| {
                b.iter(|| {
                    let graph = SearchGraph::default();
                    let mut rng = StdRng::seed_from_u64(42);
                    let root = graph.run_search_with_rng(Board::starting(), iterations, &mut rng);
                    criterion::black_box(root.get_move())
                });
            },
        );
    }
    group.finish();
}

fn prune(c: &mut Criterion) {
    c.bench_function("prune 10000 iterations to 100 nodes", |b| {
        b.iter_batched(
            || {
                let graph = SearchGraph::default();
                let mut rng = StdRng::seed_from_u64(42);
                let root = graph.run_search_with_rng(Board::starting(), 10_000, &mut rng);
                (graph, root)
            },
            |(graph, root)| {
                graph.prune(100);
                criterion::black_box(root.visits())
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group! {
    name = mcts;
    config = Criterion::default().sample_size(10);
    targets = search, prune
}

criterion_main!(mcts);
