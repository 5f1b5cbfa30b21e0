use std::io;

use clap::Parser;
use mcdag::search::{Config, PruneRule};
use mcdag::{Engine, Options};

/// Plays tic-tac-toe with Monte Carlo Tree Search over a transposition graph.
///
/// Commands are read from the standard input, one per line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Search iterations per `go` command.
    #[arg(long, default_value_t = 10_000)]
    iterations: usize,
    /// Maximum number of transposition table entries kept between moves.
    #[arg(long, default_value_t = 100_000)]
    max_table_size: usize,
    /// Exploration constant of the PUCT formula.
    #[arg(long, default_value_t = Config::EXPLORATION)]
    exploration: f32,
    /// Which children survive pruning: "sibling" or "parent".
    #[arg(long, default_value_t = PruneRule::default())]
    prune_rule: PruneRule,
    /// Seed for the random rollouts.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    mcdag::print_engine_info();
    mcdag::print_binary_info();

    let options = Options {
        iterations: cli.iterations,
        max_table_size: cli.max_table_size,
        seed: cli.seed,
        config: Config {
            exploration: cli.exploration,
            prune_rule: cli.prune_rule,
            ..Config::default()
        },
    };
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    Engine::new(options, &mut input, &mut output).run()
}
