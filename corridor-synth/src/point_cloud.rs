/// Classified point records and the ordered point cloud assembled from them
use crate::bounds::PointCloudBounds;
use constants::class::{ASSEMBLY_ORDER, get_class_name};
use constants::synthesis::PARALLEL_CHUNK_SIZE;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One synthetic point in the working frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
}

impl PointRecord {
    pub fn new(x: f64, y: f64, z: f64, classification: u8) -> Self {
        Self {
            x,
            y,
            z,
            classification,
        }
    }
}

/// Per-class sampler outputs handed to the assembler.
#[derive(Debug, Default)]
pub struct ClassOutputs {
    pub ground: Vec<PointRecord>,
    pub vegetation: Vec<PointRecord>,
    pub wire: Vec<PointRecord>,
    pub towers: Vec<PointRecord>,
}

/// Ordered point set tagged with the working frame EPSG code.
/// Records are grouped ground, vegetation, wire, tower.
#[derive(Debug, Clone)]
pub struct PointCloud {
    epsg: u32,
    points: Vec<PointRecord>,
}

impl PointCloud {
    /// Zero-point cloud; still a valid output.
    pub fn empty(epsg: u32) -> Self {
        Self {
            epsg,
            points: Vec::new(),
        }
    }

    /// Concatenate sampler outputs in the fixed class order.
    pub fn assemble(epsg: u32, outputs: ClassOutputs) -> Self {
        let ClassOutputs {
            ground,
            vegetation,
            wire,
            towers,
        } = outputs;

        let mut points =
            Vec::with_capacity(ground.len() + vegetation.len() + wire.len() + towers.len());
        for part in [ground, vegetation, wire, towers] {
            if !part.is_empty() {
                points.extend(part);
            }
        }

        if points.is_empty() {
            log::warn!("No points generated (empty AOI/corridor?); emitting an empty point cloud");
        }
        Self { epsg, points }
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count_class(&self, classification: u8) -> usize {
        self.points
            .iter()
            .filter(|p| p.classification == classification)
            .count()
    }

    /// Point counts per emitted class, in assembly order.
    pub fn class_counts(&self) -> BTreeMap<u8, ClassCount> {
        ASSEMBLY_ORDER
            .iter()
            .map(|&id| {
                (
                    id,
                    ClassCount {
                        class_name: get_class_name(id),
                        points: self.count_class(id),
                    },
                )
            })
            .collect()
    }

    /// Coordinate bounds, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<PointCloudBounds> {
        if self.points.is_empty() {
            return None;
        }
        self.points
            .par_chunks(PARALLEL_CHUNK_SIZE)
            .map(|chunk| {
                let mut local_bounds = PointCloudBounds::new();
                for p in chunk {
                    local_bounds.update(p.x, p.y, p.z);
                }
                local_bounds
            })
            .reduce_with(PointCloudBounds::merge)
    }
}

#[cfg(test)]
impl PointCloud {
    /// True when classes appear in ground → vegetation → wire → tower order.
    pub(crate) fn is_class_ordered(&self) -> bool {
        let rank = |c: u8| {
            ASSEMBLY_ORDER
                .iter()
                .position(|&id| id == c)
                .unwrap_or(ASSEMBLY_ORDER.len())
        };
        self.points
            .windows(2)
            .all(|w| rank(w[0].classification) <= rank(w[1].classification))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class_name: String,
    pub points: usize,
}
