/// Corridor envelope: buffered line network clipped to the AOI
use crate::geometry::{Containment, PlanarOps};
use constants::synthesis::{CONTAINMENT_TOLERANCE, PARALLEL_CHUNK_SIZE};
use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Rect};
use rayon::prelude::*;
use std::sync::Arc;

/// Read-only working envelope shared by every sampler.
/// An empty corridor is valid and makes every sampler yield nothing.
#[derive(Clone)]
pub struct Corridor {
    shape: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
    area: f64,
    index: Arc<dyn Containment>,
}

impl Corridor {
    /// Wrap an already computed envelope.
    pub fn new(shape: MultiPolygon<f64>, ops: Arc<dyn PlanarOps>) -> Self {
        let bbox = shape.bounding_rect();
        let area = shape.unsigned_area();
        let index = ops.prepare(&shape);
        Self {
            shape,
            bbox,
            area,
            index,
        }
    }

    /// union(buffer(lines, half_width)) ∩ aoi, with flat caps.
    pub fn build(
        lines: &[LineString<f64>],
        aoi: &MultiPolygon<f64>,
        half_width: f64,
        ops: Arc<dyn PlanarOps>,
    ) -> Self {
        let buffers: Vec<MultiPolygon<f64>> = lines
            .par_iter()
            .map(|line| ops.buffer_line(line, half_width))
            .collect();
        let merged = ops.union_all(buffers);
        let shape = ops.intersection(&merged, aoi);

        let corridor = Self::new(shape, ops);
        log::debug!(
            "Corridor: {} part(s), {:.1} m² from {} line(s) at half-width {} m",
            corridor.shape.0.len(),
            corridor.area,
            lines.len(),
            half_width
        );
        corridor
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty() || self.bbox.is_none()
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Boundary-inclusive containment of a planar position.
    pub fn covers(&self, coord: Coord<f64>) -> bool {
        match self.bbox {
            Some(bbox) if in_rect(bbox, coord) => self.index.covers(coord),
            _ => false,
        }
    }

    /// Keep the items whose position lies in the corridor, preserving order.
    /// Containment runs over rayon batches.
    pub fn retain_covered<T, F>(&self, items: Vec<T>, position: F) -> Vec<T>
    where
        T: Send + Sync,
        F: Fn(&T) -> Coord<f64> + Sync,
    {
        if self.is_empty() {
            return Vec::new();
        }
        let mask: Vec<bool> = items
            .par_chunks(PARALLEL_CHUNK_SIZE)
            .flat_map_iter(|chunk| {
                chunk
                    .iter()
                    .map(|item| self.covers(position(item)))
                    .collect::<Vec<_>>()
            })
            .collect();

        items
            .into_iter()
            .zip(mask)
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect()
    }
}

impl std::fmt::Debug for Corridor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corridor")
            .field("parts", &self.shape.0.len())
            .field("area", &self.area)
            .field("bbox", &self.bbox)
            .finish()
    }
}

fn in_rect(rect: Rect<f64>, c: Coord<f64>) -> bool {
    let slack = CONTAINMENT_TOLERANCE;
    c.x >= rect.min().x - slack
        && c.x <= rect.max().x + slack
        && c.y >= rect.min().y - slack
        && c.y <= rect.max().y + slack
}
