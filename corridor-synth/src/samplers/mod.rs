//! Point generators, one per output class.
//!
//! Every sampler reads the shared [`Corridor`](crate::corridor::Corridor)
//! and nothing else mutable, so they can run in any order or concurrently.
//! An empty corridor makes each of them return no points.

pub mod ground;
pub mod tower;
pub mod vegetation;
pub mod wire;

pub use ground::sample_ground;
pub use tower::sample_towers;
pub use vegetation::{VegetationOutcome, VegetationSample, sample_vegetation};
pub use wire::{WireParams, sample_wires};
