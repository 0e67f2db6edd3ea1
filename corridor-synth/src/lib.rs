//! Synthetic power-corridor point clouds.
//!
//! Buffers a power-line network into a corridor clipped to an area of
//! interest, fills it with classified ground, vegetation, conductor and
//! tower points, and writes the result as LAS (optionally LAZ).

pub mod bounds;
pub mod cancel;
pub mod compress;
pub mod config;
pub mod corridor;
pub mod crs;
pub mod error;
pub mod geometry;
pub mod laz;
pub mod loader;
pub mod manifest;
pub mod point_cloud;
pub mod projection;
pub mod samplers;
pub mod synthesizer;

pub use cancel::CancelToken;
pub use config::SynthesisParams;
pub use corridor::Corridor;
pub use error::{Result, SynthError};
pub use point_cloud::{PointCloud, PointRecord};
pub use synthesizer::{CorridorSynthesizer, InputPaths, Synthesis, synthesize};
