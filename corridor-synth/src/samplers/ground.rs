/// Regular ground lattice clipped to the corridor
use crate::corridor::Corridor;
use crate::point_cloud::PointRecord;
use constants::class::GROUND;
use geo::Coord;

/// Lattice points at `step` spacing over the corridor bounding box that lie
/// inside the corridor, at z = 0. Deterministic for a given corridor and step.
pub fn sample_ground(corridor: &Corridor, step: f64) -> Vec<PointRecord> {
    let Some(bbox) = corridor.bounding_rect() else {
        return Vec::new();
    };
    if corridor.is_empty() || step.is_nan() || step <= 0.0 {
        return Vec::new();
    }

    let xs = lattice_axis(bbox.min().x, bbox.max().x, step);
    let ys = lattice_axis(bbox.min().y, bbox.max().y, step);

    let lattice: Vec<Coord<f64>> = xs
        .iter()
        .flat_map(|&x| ys.iter().map(move |&y| Coord { x, y }))
        .collect();
    let candidates = lattice.len();

    let points: Vec<PointRecord> = corridor
        .retain_covered(lattice, |c| *c)
        .into_iter()
        .map(|c| PointRecord::new(c.x, c.y, 0.0, GROUND))
        .collect();

    log::debug!(
        "Ground: {} of {} lattice points inside corridor (step {} m)",
        points.len(),
        candidates,
        step
    );
    points
}

/// Positions `min + i * step` up to and including `max`.
fn lattice_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let count = ((max - min) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| min + i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeoPlanarOps, PlanarOps};
    use geo::{MultiPolygon, polygon};
    use std::sync::Arc;

    fn corridor(shape: MultiPolygon<f64>) -> Corridor {
        let ops: Arc<dyn PlanarOps> = Arc::new(GeoPlanarOps::default());
        Corridor::new(shape, ops)
    }

    fn band() -> Corridor {
        corridor(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 40.0), (x: 100.0, y: 40.0), (x: 100.0, y: 60.0), (x: 0.0, y: 60.0)
        ]]))
    }

    #[test]
    fn lattice_axis_includes_max_when_on_grid() {
        assert_eq!(lattice_axis(0.0, 100.0, 50.0), vec![0.0, 50.0, 100.0]);
        assert_eq!(lattice_axis(40.0, 60.0, 50.0), vec![40.0]);
        assert_eq!(lattice_axis(0.0, 0.3, 0.1).len(), 4);
    }

    #[test]
    fn count_matches_lattice_points_inside() {
        let points = sample_ground(&band(), 10.0);
        // 11 columns x 3 rows (y = 40, 50, 60), boundary rows included.
        assert_eq!(points.len(), 33);
        assert!(points.iter().all(|p| p.z == 0.0 && p.classification == GROUND));
    }

    #[test]
    fn coarse_step_keeps_only_the_bottom_row() {
        let points = sample_ground(&band(), 50.0);
        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xy, vec![(0.0, 40.0), (50.0, 40.0), (100.0, 40.0)]);
    }

    #[test]
    fn deterministic_and_clipped_to_shape() {
        let triangle = corridor(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 30.0, y: 0.0), (x: 0.0, y: 30.0)
        ]]));
        let first = sample_ground(&triangle, 3.0);
        let second = sample_ground(&triangle, 3.0);
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.x + p.y <= 30.0 + 1e-9));
        // Lattice points with i + j <= 10 on a 11x11 grid.
        assert_eq!(first.len(), 66);
    }

    #[test]
    fn empty_corridor_gives_no_ground() {
        let empty = corridor(MultiPolygon::new(Vec::new()));
        assert!(sample_ground(&empty, 1.0).is_empty());
    }
}
