// Puzzle core: sparse grid, intersection frontier and the greedy placement engine.
// Everything here is synchronous and CPU-bound; callers run it inside
// tokio::task::spawn_blocking while holding the session lock.

pub mod engine;
pub mod frontier;
pub mod grid;

pub use engine::{Bounds, Puzzle};
pub use frontier::Candidate;
pub use grid::Placement;
