/// Rejection-sampled vegetation canopy points
use crate::cancel::CancelToken;
use crate::corridor::Corridor;
use crate::point_cloud::PointRecord;
use constants::class::VEGETATION;
use constants::synthesis::{
    CANCEL_CHECK_INTERVAL, PARALLEL_CHUNK_SIZE, REJECTION_ATTEMPT_FACTOR, VEGETATION_MAX_HEIGHT,
    VEGETATION_MIN_HEIGHT,
};
use geo::Coord;
use indicatif::ProgressBar;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What the rejection loop achieved against its target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VegetationOutcome {
    pub requested: usize,
    pub delivered: usize,
    pub attempts: usize,
    pub cancelled: bool,
}

impl VegetationOutcome {
    pub fn under_delivered(&self) -> bool {
        self.delivered < self.requested
    }
}

#[derive(Debug, Clone)]
pub struct VegetationSample {
    pub points: Vec<PointRecord>,
    pub outcome: VegetationOutcome,
}

/// Draw `floor(area * density)` uniform points inside the corridor.
///
/// Candidates come uniformly from the corridor bounding box and are kept
/// when the corridor covers them. The loop stops at the target, after
/// `target * 20` draws, or when `cancel` fires, whichever comes first.
/// Heights are uniform in [4, 15) m.
pub fn sample_vegetation<R: Rng>(
    corridor: &Corridor,
    density: f64,
    rng: &mut R,
    cancel: &CancelToken,
    progress: &ProgressBar,
) -> VegetationSample {
    let requested = if density > 0.0 {
        (corridor.area() * density).floor() as usize
    } else {
        0
    };
    let mut outcome = VegetationOutcome {
        requested,
        ..VegetationOutcome::default()
    };

    let bbox = match corridor.bounding_rect() {
        Some(bbox) if requested > 0 && !corridor.is_empty() => bbox,
        _ => {
            return VegetationSample {
                points: Vec::new(),
                outcome,
            };
        }
    };

    let budget = requested.saturating_mul(REJECTION_ATTEMPT_FACTOR);
    let (min, max) = (bbox.min(), bbox.max());
    // The target can exceed memory; grow as points are accepted.
    let mut points = Vec::with_capacity(requested.min(PARALLEL_CHUNK_SIZE));

    progress.set_length(requested as u64);
    progress.set_message("Sampling vegetation");

    while points.len() < requested && outcome.attempts < budget {
        if outcome.attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        outcome.attempts += 1;

        let candidate = Coord {
            x: rng.random_range(min.x..=max.x),
            y: rng.random_range(min.y..=max.y),
        };
        if corridor.covers(candidate) {
            let z = rng.random_range(VEGETATION_MIN_HEIGHT..VEGETATION_MAX_HEIGHT);
            points.push(PointRecord::new(candidate.x, candidate.y, z, VEGETATION));
            progress.inc(1);
        }
    }

    outcome.delivered = points.len();
    progress.finish_with_message("Vegetation sampled");

    if outcome.cancelled {
        log::warn!(
            "Vegetation sampling cancelled after {} draws: {} of {} points",
            outcome.attempts,
            outcome.delivered,
            outcome.requested
        );
    } else if outcome.under_delivered() {
        log::warn!(
            "Vegetation under-delivered: {} of {} points after {} draws",
            outcome.delivered,
            outcome.requested,
            outcome.attempts
        );
    }

    VegetationSample { points, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeoPlanarOps, PlanarOps};
    use geo::{MultiPolygon, polygon};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use std::time::Duration;

    fn corridor(shape: MultiPolygon<f64>) -> Corridor {
        let ops: Arc<dyn PlanarOps> = Arc::new(GeoPlanarOps::default());
        Corridor::new(shape, ops)
    }

    fn square(size: f64) -> Corridor {
        corridor(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: size)
        ]]))
    }

    fn run(corridor: &Corridor, density: f64, seed: u64) -> VegetationSample {
        let mut rng = StdRng::seed_from_u64(seed);
        sample_vegetation(
            corridor,
            density,
            &mut rng,
            &CancelToken::new(),
            &ProgressBar::hidden(),
        )
    }

    #[test]
    fn delivers_area_times_density_inside_the_corridor() {
        let area = square(100.0);
        let sample = run(&area, 0.15, 42);

        assert_eq!(sample.outcome.requested, 1500);
        assert_eq!(sample.points.len(), 1500);
        assert!(!sample.outcome.under_delivered());
        for p in &sample.points {
            assert!((0.0..=100.0).contains(&p.x) && (0.0..=100.0).contains(&p.y));
            assert!((VEGETATION_MIN_HEIGHT..VEGETATION_MAX_HEIGHT).contains(&p.z));
            assert_eq!(p.classification, VEGETATION);
        }
    }

    #[test]
    fn same_seed_reproduces_points() {
        let area = square(50.0);
        assert_eq!(run(&area, 0.2, 7).points, run(&area, 0.2, 7).points);
        assert_ne!(run(&area, 0.2, 7).points, run(&area, 0.2, 8).points);
    }

    #[test]
    fn acceptance_rate_tracks_area_fraction() {
        // Triangle covering half its bounding box: about two draws per point.
        let triangle = corridor(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 0.0, y: 100.0)
        ]]));
        let sample = run(&triangle, 0.4, 3);
        assert_eq!(sample.outcome.delivered, 2000);
        let rate = sample.outcome.delivered as f64 / sample.outcome.attempts as f64;
        assert!((0.45..0.55).contains(&rate), "acceptance rate {}", rate);
    }

    #[test]
    fn zero_area_or_zero_density_gives_nothing() {
        let empty = corridor(MultiPolygon::new(Vec::new()));
        let sample = run(&empty, 10.0, 1);
        assert!(sample.points.is_empty());
        assert_eq!(sample.outcome.requested, 0);

        let none = run(&square(100.0), 0.0, 1);
        assert!(none.points.is_empty());
        assert_eq!(none.outcome.attempts, 0);
    }

    #[test]
    fn thin_corridor_stops_at_attempt_budget() {
        // Two far-apart slivers: the bounding box is mostly empty.
        let slivers = corridor(MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            polygon![
                (x: 999.0, y: 999.0), (x: 1000.0, y: 999.0),
                (x: 1000.0, y: 1000.0), (x: 999.0, y: 1000.0)
            ],
        ]));
        let sample = run(&slivers, 5.0, 11);
        assert_eq!(sample.outcome.requested, 10);
        assert_eq!(sample.outcome.attempts, 200);
        assert!(sample.outcome.under_delivered());
    }

    #[test]
    fn cancelled_token_stops_before_drawing() {
        let token = CancelToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(0);
        let sample = sample_vegetation(
            &square(100.0),
            1.0,
            &mut rng,
            &token,
            &ProgressBar::hidden(),
        );
        assert!(sample.outcome.cancelled);
        assert!(sample.points.is_empty());
        assert_eq!(sample.outcome.attempts, 0);
    }

    #[test]
    fn huge_density_runs_until_the_deadline() {
        let band = corridor(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 20.0), (x: 0.0, y: 20.0)
        ]]));
        let mut rng = StdRng::seed_from_u64(0);
        let sample = sample_vegetation(
            &band,
            1e12,
            &mut rng,
            &CancelToken::with_deadline(Duration::from_millis(50)),
            &ProgressBar::hidden(),
        );

        assert!(sample.outcome.cancelled);
        assert_eq!(sample.outcome.requested, 2_000_000_000_000_000);
        assert!(!sample.points.is_empty());
        assert_eq!(sample.outcome.delivered, sample.points.len());
        assert!(sample.outcome.under_delivered());
    }
}
