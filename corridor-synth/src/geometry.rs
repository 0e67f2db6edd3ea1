//! Planar geometry capability used by the corridor core.
//!
//! Buffering, union, intersection and point containment go through
//! [`PlanarOps`] so the core never talks to a geometry engine directly.
//! [`GeoPlanarOps`] is the `geo` backed implementation. Repeated
//! containment queries against one area go through a [`Containment`]
//! prepared once with [`PlanarOps::prepare`].

use constants::synthesis::{BUFFER_JOIN_SEGMENTS, CONTAINMENT_TOLERANCE};
use geo::{
    BooleanOps, Coord, Distance, Euclidean, Intersects, Line, LineString, MultiPolygon, Point,
    Polygon,
};
use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use std::f64::consts::PI;
use std::sync::Arc;

pub trait PlanarOps: Send + Sync {
    /// Flat-capped buffer of a line at the given half-width.
    fn buffer_line(&self, line: &LineString<f64>, half_width: f64) -> MultiPolygon<f64>;

    /// Union of any number of polygon sets.
    fn union_all(&self, parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64>;

    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;

    /// Point-in-polygon test, boundary inclusive.
    fn covers(&self, area: &MultiPolygon<f64>, coord: Coord<f64>) -> bool;

    /// Containment index for many queries against the same area.
    fn prepare(&self, area: &MultiPolygon<f64>) -> Arc<dyn Containment>;
}

/// Boundary-inclusive containment against a fixed area.
pub trait Containment: Send + Sync {
    fn covers(&self, coord: Coord<f64>) -> bool;
}

/// `geo` backed planar operations.
#[derive(Debug, Clone)]
pub struct GeoPlanarOps {
    /// Segments approximating a full circle at round joins.
    pub join_segments: usize,
    /// Distance from a ring still treated as on the boundary.
    pub tolerance: f64,
}

impl Default for GeoPlanarOps {
    fn default() -> Self {
        Self {
            join_segments: BUFFER_JOIN_SEGMENTS,
            tolerance: CONTAINMENT_TOLERANCE,
        }
    }
}

impl PlanarOps for GeoPlanarOps {
    fn buffer_line(&self, line: &LineString<f64>, half_width: f64) -> MultiPolygon<f64> {
        // Segment rectangles give the butt caps; discs at interior vertices
        // fill the joins.
        let coords = &line.0;
        let mut pieces = Vec::new();

        for segment in line.lines() {
            if let Some(rect) = segment_rectangle(segment, half_width) {
                pieces.push(MultiPolygon::new(vec![rect]));
            }
        }
        if coords.len() > 2 {
            for vertex in &coords[1..coords.len() - 1] {
                pieces.push(MultiPolygon::new(vec![disc(
                    *vertex,
                    half_width,
                    self.join_segments,
                )]));
            }
        }

        self.union_all(pieces)
    }

    fn union_all(&self, parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
        parts
            .into_par_iter()
            .reduce(|| MultiPolygon::new(Vec::new()), |a, b| {
                if a.0.is_empty() {
                    b
                } else if b.0.is_empty() {
                    a
                } else {
                    a.union(&b)
                }
            })
    }

    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if a.0.is_empty() || b.0.is_empty() {
            return MultiPolygon::new(Vec::new());
        }
        a.intersection(b)
    }

    fn covers(&self, area: &MultiPolygon<f64>, coord: Coord<f64>) -> bool {
        let point = Point::from(coord);
        area.0.iter().any(|polygon| polygon.intersects(&coord))
            || rings(area).any(|segment| Euclidean::distance(&point, &segment) <= self.tolerance)
    }

    fn prepare(&self, area: &MultiPolygon<f64>) -> Arc<dyn Containment> {
        Arc::new(IndexedArea::new(area.clone(), self.tolerance))
    }
}

/// Area with its ring segments in an R-tree.
///
/// `Intersects` decides interior and exact boundary hits. The tolerance band
/// around the rings is only checked against segments the tree returns
/// within reach of the query.
pub struct IndexedArea {
    shape: MultiPolygon<f64>,
    segments: RTree<RingSegment>,
    tolerance: f64,
}

impl IndexedArea {
    pub fn new(shape: MultiPolygon<f64>, tolerance: f64) -> Self {
        let segments = RTree::bulk_load(rings(&shape).map(RingSegment).collect());
        Self {
            shape,
            segments,
            tolerance,
        }
    }
}

impl Containment for IndexedArea {
    fn covers(&self, coord: Coord<f64>) -> bool {
        self.shape.0.iter().any(|polygon| polygon.intersects(&coord))
            || self
                .segments
                .locate_within_distance([coord.x, coord.y], self.tolerance * self.tolerance)
                .next()
                .is_some()
    }
}

struct RingSegment(Line<f64>);

impl RTreeObject for RingSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let Line { start, end } = self.0;
        AABB::from_corners([start.x, start.y], [end.x, end.y])
    }
}

impl PointDistance for RingSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d = Euclidean::distance(&Point::new(point[0], point[1]), &self.0);
        d * d
    }
}

/// Every exterior and interior ring segment of the area.
fn rings(area: &MultiPolygon<f64>) -> impl Iterator<Item = Line<f64>> + '_ {
    area.0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.lines())
}

/// Rectangle swept by a segment at `half_width`, with flat ends.
fn segment_rectangle(segment: Line<f64>, half_width: f64) -> Option<Polygon<f64>> {
    let dx = segment.end.x - segment.start.x;
    let dy = segment.end.y - segment.start.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }
    let nx = -dy / length * half_width;
    let ny = dx / length * half_width;

    let ring = vec![
        (segment.start.x - nx, segment.start.y - ny),
        (segment.end.x - nx, segment.end.y - ny),
        (segment.end.x + nx, segment.end.y + ny),
        (segment.start.x + nx, segment.start.y + ny),
        (segment.start.x - nx, segment.start.y - ny),
    ];
    Some(Polygon::new(LineString::from(ring), vec![]))
}

/// Circle approximated by a regular polygon.
fn disc(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((center.x + radius * angle.cos(), center.y + radius * angle.sin()));
    }
    coords.push(coords[0]);
    Polygon::new(LineString::from(coords), vec![])
}
