/// Arc-length spacing between densified conductor stations (m)
pub const WIRE_DENSIFY_STEP: f64 = 10.0;

/// Synthetic foliage height band, lower bound inclusive (m)
pub const VEGETATION_MIN_HEIGHT: f64 = 4.0;

/// Synthetic foliage height band, upper bound exclusive (m)
pub const VEGETATION_MAX_HEIGHT: f64 = 15.0;

/// Rejection sampling gives up after this many draws per requested point
pub const REJECTION_ATTEMPT_FACTOR: usize = 20;

/// Draws between cancellation checks in the rejection loop
pub const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Towers never come out shorter than this (m)
pub const MIN_TOWER_HEIGHT: f64 = 10.0;

/// Segments used to approximate the round joins of a line buffer
pub const BUFFER_JOIN_SEGMENTS: usize = 32;

/// Distance from a corridor ring still counted as inside (m)
pub const CONTAINMENT_TOLERANCE: f64 = 1e-6;

/// Points per rayon batch
pub const PARALLEL_CHUNK_SIZE: usize = 25_000;

/// LAS coordinate scale (centimetre precision)
pub const LAS_SCALE: f64 = 0.01;
