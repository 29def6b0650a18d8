//! World Setup
//!
//! Initial food layout and the starting population.

pub mod board;
pub mod population;

pub use board::seed_food;
pub use population::{spawn_initial_animats, SpawnSummary};
