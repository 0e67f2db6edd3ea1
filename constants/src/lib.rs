/// Shared constants for power corridor point cloud synthesis
pub mod class;
pub mod coordinate_system;
pub mod synthesis;
