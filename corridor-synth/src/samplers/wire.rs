/// Sagging multi-phase conductor points along each line
use crate::corridor::Corridor;
use crate::point_cloud::PointRecord;
use constants::class::WIRE;
use constants::synthesis::WIRE_DENSIFY_STEP;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

/// Conductor shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireParams {
    /// Attachment height at both span ends (m).
    pub height: f64,
    /// Drop at mid-span (m).
    pub sag: f64,
    /// Lateral spacing between phase conductors (m). Zero gives one conductor.
    pub phase_offset: f64,
}

impl WireParams {
    /// Lateral offsets of the emitted conductors, in emission order.
    pub fn conductor_offsets(&self) -> Vec<f64> {
        if self.phase_offset == 0.0 {
            vec![0.0]
        } else {
            vec![-self.phase_offset, 0.0, self.phase_offset]
        }
    }
}

/// Conductor points for every line, clipped to the corridor.
/// Points are grouped per line, then per conductor, in station order.
pub fn sample_wires(
    corridor: &Corridor,
    lines: &[LineString<f64>],
    params: &WireParams,
) -> Vec<PointRecord> {
    if corridor.is_empty() {
        return Vec::new();
    }

    let offsets = params.conductor_offsets();
    let records: Vec<PointRecord> = lines
        .iter()
        .flat_map(|line| conductor_points(line, params, &offsets))
        .collect();
    let candidates = records.len();

    let kept = corridor.retain_covered(records, |r| (r.x, r.y).into());
    log::debug!(
        "Wire: {} of {} conductor points inside corridor ({} conductor(s) per line)",
        kept.len(),
        candidates,
        offsets.len()
    );
    kept
}

/// Unfiltered conductor points for one line.
fn conductor_points(
    line: &LineString<f64>,
    params: &WireParams,
    offsets: &[f64],
) -> Vec<PointRecord> {
    let stations = densify(line, WIRE_DENSIFY_STEP);
    if stations.is_empty() {
        return Vec::new();
    }
    let heights = sag_profile(&stations, params.height, params.sag);
    let normals = lateral_normals(&stations);

    let mut points = Vec::with_capacity(stations.len() * offsets.len());
    for &offset in offsets {
        for ((station, normal), z) in stations.iter().zip(&normals).zip(&heights) {
            points.push(PointRecord::new(
                station.x + normal.x * offset,
                station.y + normal.y * offset,
                *z,
                WIRE,
            ));
        }
    }
    points
}

/// Evenly spaced stations along the line at roughly `step` spacing.
///
/// Uses `max(2, ceil(L / step) + 1)` stations from 0 to L inclusive, so both
/// ends are always present. Zero-length lines give no stations.
pub fn densify(line: &LineString<f64>, step: f64) -> Vec<Coord<f64>> {
    let coords = &line.0;
    if coords.len() < 2 {
        return Vec::new();
    }

    let mut cumulative = Vec::with_capacity(coords.len());
    cumulative.push(0.0);
    for pair in coords.windows(2) {
        let length = (pair[1].x - pair[0].x).hypot(pair[1].y - pair[0].y);
        cumulative.push(cumulative[cumulative.len() - 1] + length);
    }
    let total = cumulative[cumulative.len() - 1];
    if total.is_nan() || total <= 0.0 {
        return Vec::new();
    }

    let count = ((total / step).ceil() as usize + 1).max(2);
    let mut segment = 0;
    (0..count)
        .map(|i| {
            let distance = total * i as f64 / (count - 1) as f64;
            while segment + 2 < cumulative.len() && cumulative[segment + 1] < distance {
                segment += 1;
            }
            let start = coords[segment];
            let end = coords[segment + 1];
            let span = cumulative[segment + 1] - cumulative[segment];
            let f = if span > 0.0 {
                ((distance - cumulative[segment]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            Coord {
                x: start.x + (end.x - start.x) * f,
                y: start.y + (end.y - start.y) * f,
            }
        })
        .collect()
}

/// Parabolic sag `H - S * 4t(1 - t)` over normalised chord length.
pub fn sag_profile(stations: &[Coord<f64>], height: f64, sag: f64) -> Vec<f64> {
    let mut chord = Vec::with_capacity(stations.len());
    let mut running = 0.0;
    for (i, station) in stations.iter().enumerate() {
        if i > 0 {
            let prev = stations[i - 1];
            running += (station.x - prev.x).hypot(station.y - prev.y);
        }
        chord.push(running);
    }

    chord
        .into_iter()
        .map(|c| {
            let t = if running > 0.0 { c / running } else { 0.0 };
            height - sag * 4.0 * t * (1.0 - t)
        })
        .collect()
}

/// Unit normals `(ty, -tx)` to the station tangents.
///
/// Tangents are central differences inside and one-sided at the ends.
/// Stations with a zero tangent get a zero normal and stay on the centreline.
pub fn lateral_normals(stations: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let n = stations.len();
    (0..n)
        .map(|i| {
            let (a, b) = match (i, n) {
                (_, 0 | 1) => (stations[i], stations[i]),
                (0, _) => (stations[0], stations[1]),
                (i, n) if i == n - 1 => (stations[i - 1], stations[i]),
                (i, _) => (stations[i - 1], stations[i + 1]),
            };
            let tx = b.x - a.x;
            let ty = b.y - a.y;
            let norm = tx.hypot(ty);
            if norm > 0.0 {
                Coord {
                    x: ty / norm,
                    y: -tx / norm,
                }
            } else {
                Coord { x: 0.0, y: 0.0 }
            }
        })
        .collect()
}
