/// Tower points clipped to the corridor
use crate::corridor::Corridor;
use crate::point_cloud::PointRecord;
use constants::class::TOWER;
use constants::synthesis::MIN_TOWER_HEIGHT;
use geo::Point;

/// One point per tower inside the corridor, at max(10 m, `height`).
/// A missing or empty tower set yields nothing.
pub fn sample_towers(
    corridor: &Corridor,
    towers: Option<&[Point<f64>]>,
    height: f64,
) -> Vec<PointRecord> {
    let Some(towers) = towers.filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    let z = height.max(MIN_TOWER_HEIGHT);

    let records: Vec<PointRecord> = towers
        .iter()
        .map(|p| PointRecord::new(p.x(), p.y(), z, TOWER))
        .collect();
    corridor.retain_covered(records, |r| (r.x, r.y).into())
}
