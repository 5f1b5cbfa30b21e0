//! Reference game implementations used by the driver, tests and benchmarks.

pub mod tictactoe;
