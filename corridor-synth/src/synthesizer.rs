/// Corridor synthesizer orchestrating load, sampling, writing and reporting.
use crate::cancel::CancelToken;
use crate::compress::{CommandRunner, CompressionOutcome, SystemCommandRunner, write_output};
use crate::config::SynthesisParams;
use crate::corridor::Corridor;
use crate::error::Result;
use crate::geometry::{GeoPlanarOps, PlanarOps};
use crate::loader::{
    FeatureSet, FeatureSource, GeoJsonSource, NormalizedInputs, RawInputs, normalize_inputs,
};
use crate::manifest::{ReportWriter, RunReport};
use crate::point_cloud::{ClassOutputs, PointCloud};
use crate::projection::{Projector, TransverseMercator};
use crate::samplers::{
    VegetationOutcome, WireParams, sample_ground, sample_towers, sample_vegetation, sample_wires,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input files for one run.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub aoi: PathBuf,
    pub lines: PathBuf,
    /// Optional; a path that does not exist is treated as no towers.
    pub towers: Option<PathBuf>,
}

/// Result of the geometric core for one set of normalised inputs.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub cloud: PointCloud,
    pub corridor_area: f64,
    pub vegetation: VegetationOutcome,
}

/// Build the corridor and run all four samplers over it.
///
/// Ground, wire and tower sampling run alongside vegetation sampling; the
/// vegetation generator is seeded from `params.seed` inside its own branch,
/// so results do not depend on scheduling.
pub fn synthesize(
    inputs: &NormalizedInputs,
    params: &SynthesisParams,
    ops: Arc<dyn PlanarOps>,
    cancel: &CancelToken,
    progress: &ProgressBar,
) -> Synthesis {
    let corridor = Corridor::build(&inputs.lines, &inputs.aoi, params.width, ops);
    if corridor.is_empty() {
        log::warn!("Corridor is empty: lines do not reach the AOI");
    } else {
        log::info!(
            "Corridor: {:.1} m² from {} line(s)",
            corridor.area(),
            inputs.lines.len()
        );
    }

    let wire_params = WireParams {
        height: params.height,
        sag: params.sag,
        phase_offset: params.phase_offset,
    };

    let ((ground, (wire, towers)), vegetation) = rayon::join(
        || {
            (
                sample_ground(&corridor, params.ground_step),
                rayon::join(
                    || sample_wires(&corridor, &inputs.lines, &wire_params),
                    || sample_towers(&corridor, inputs.towers.as_deref(), params.height),
                ),
            )
        },
        || {
            let mut rng = StdRng::seed_from_u64(params.seed);
            sample_vegetation(&corridor, params.veg_density, &mut rng, cancel, progress)
        },
    );

    let cloud = PointCloud::assemble(
        inputs.epsg,
        ClassOutputs {
            ground,
            vegetation: vegetation.points,
            wire,
            towers,
        },
    );

    Synthesis {
        cloud,
        corridor_area: corridor.area(),
        vegetation: vegetation.outcome,
    }
}

/// End-to-end corridor synthesizer with injectable collaborators.
pub struct CorridorSynthesizer {
    params: SynthesisParams,
    source: Box<dyn FeatureSource>,
    projector: Box<dyn Projector>,
    ops: Arc<dyn PlanarOps>,
    runner: Box<dyn CommandRunner>,
    cancel: CancelToken,
    local_frame: Option<u32>,
    write_report: bool,
    show_progress: bool,
}

impl CorridorSynthesizer {
    /// Synthesizer reading GeoJSON and compressing with the system `pdal`.
    pub fn new(params: SynthesisParams) -> Self {
        Self {
            params,
            source: Box::new(GeoJsonSource),
            projector: Box::new(TransverseMercator::default()),
            ops: Arc::new(GeoPlanarOps::default()),
            runner: Box::new(SystemCommandRunner),
            cancel: CancelToken::new(),
            local_frame: None,
            write_report: true,
            show_progress: true,
        }
    }

    pub fn with_feature_source(mut self, source: Box<dyn FeatureSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_projector(mut self, projector: Box<dyn Projector>) -> Self {
        self.projector = projector;
        self
    }

    pub fn with_planar_ops(mut self, ops: Arc<dyn PlanarOps>) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_command_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Treat inputs as already metric in this EPSG frame.
    pub fn with_local_frame(mut self, epsg: Option<u32>) -> Self {
        self.local_frame = epsg;
        self
    }

    pub fn with_report(mut self, enabled: bool) -> Self {
        self.write_report = enabled;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Executes the complete pipeline and writes the point cloud to `out`.
    pub fn run(&self, paths: &InputPaths, out: &Path) -> Result<RunReport> {
        self.params.validate()?;
        log::info!(
            "Synthesizing corridor from {} and {}",
            paths.aoi.display(),
            paths.lines.display()
        );

        let mut warnings = Vec::new();
        let raw = RawInputs {
            aoi: self.source.read(&paths.aoi)?,
            lines: self.source.read(&paths.lines)?,
            towers: self.read_towers(paths.towers.as_deref(), &mut warnings)?,
        };

        let inputs = normalize_inputs(
            raw,
            self.local_frame,
            self.projector.as_ref(),
            self.ops.as_ref(),
        )?;
        let dropped = inputs.diagnostics.total_dropped();
        if dropped > 0 {
            warnings.push(format!("Dropped {} unusable input geometr(ies)", dropped));
        }

        let progress = self.progress_bar();
        let synthesis = synthesize(
            &inputs,
            &self.params,
            Arc::clone(&self.ops),
            &self.cancel,
            &progress,
        );

        let vegetation = &synthesis.vegetation;
        if vegetation.cancelled {
            warnings.push(format!(
                "Vegetation sampling cancelled: {} of {} points",
                vegetation.delivered, vegetation.requested
            ));
        } else if vegetation.under_delivered() {
            warnings.push(format!(
                "Vegetation under-delivered: {} of {} points after {} draws",
                vegetation.delivered, vegetation.requested, vegetation.attempts
            ));
        }
        if synthesis.cloud.is_empty() {
            warnings.push("No points generated (empty AOI/corridor?)".to_string());
        }

        let written = write_output(
            &synthesis.cloud,
            out,
            self.runner.as_ref(),
            &self.progress_bar(),
        )?;
        if let CompressionOutcome::FellBack { reason, las_path } = &written.compression {
            warnings.push(format!(
                "LAZ compression failed ({}); kept {}",
                reason,
                las_path.display()
            ));
        }

        let report = RunReport {
            epsg: synthesis.cloud.epsg(),
            point_count: synthesis.cloud.len(),
            classes: synthesis.cloud.class_counts(),
            bounds: synthesis.cloud.bounds(),
            corridor_area: synthesis.corridor_area,
            vegetation: synthesis.vegetation,
            inputs: inputs.diagnostics,
            params: self.params.clone(),
            output: Some(written),
            warnings,
        };

        if self.write_report {
            ReportWriter::for_output(out).write(&report)?;
        }
        report.log_summary();
        Ok(report)
    }

    fn read_towers(
        &self,
        path: Option<&Path>,
        warnings: &mut Vec<String>,
    ) -> Result<Option<FeatureSet>> {
        match path {
            Some(path) if path.exists() => self.source.read(path).map(Some),
            Some(path) => {
                log::warn!(
                    "Tower file {} not found; continuing without towers",
                    path.display()
                );
                warnings.push(format!("Tower file {} not found", path.display()));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.green/blue}] {pos}/{len} points ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadDiagnostics;
    use constants::class::{GROUND, TOWER, VEGETATION, WIRE};
    use geo::{MultiPolygon, line_string, point, polygon};

    fn inputs(towers: Option<Vec<geo::Point<f64>>>) -> NormalizedInputs {
        NormalizedInputs {
            epsg: 32631,
            aoi: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0), (x: 200.0, y: 0.0), (x: 200.0, y: 200.0), (x: 0.0, y: 200.0)
            ]]),
            lines: vec![line_string![(x: 0.0, y: 100.0), (x: 200.0, y: 100.0)]],
            towers,
            diagnostics: LoadDiagnostics::default(),
        }
    }

    fn params() -> SynthesisParams {
        SynthesisParams {
            width: 20.0,
            ground_step: 10.0,
            veg_density: 0.05,
            seed: 9,
            ..SynthesisParams::default()
        }
    }

    fn run(inputs: &NormalizedInputs, params: &SynthesisParams) -> Synthesis {
        synthesize(
            inputs,
            params,
            Arc::new(GeoPlanarOps::default()),
            &CancelToken::new(),
            &ProgressBar::hidden(),
        )
    }

    #[test]
    fn emits_every_class_in_assembly_order() {
        let towers = vec![point!(x: 0.0, y: 100.0), point!(x: 100.0, y: 190.0)];
        let synthesis = run(&inputs(Some(towers)), &params());
        let cloud = &synthesis.cloud;

        assert!(cloud.is_class_ordered());
        assert_eq!(cloud.epsg(), 32631);
        // 21 columns x 5 rows over the 40 m band.
        assert_eq!(cloud.count_class(GROUND), 105);
        assert_eq!(cloud.count_class(VEGETATION), 400);
        // 21 stations x 3 conductors.
        assert_eq!(cloud.count_class(WIRE), 63);
        assert_eq!(cloud.count_class(TOWER), 1);
        assert!((synthesis.corridor_area - 8000.0).abs() < 1e-6);
    }

    #[test]
    fn same_seed_gives_identical_clouds() {
        let a = run(&inputs(None), &params());
        let b = run(&inputs(None), &params());
        assert_eq!(a.cloud.points(), b.cloud.points());
    }

    #[test]
    fn disjoint_lines_give_an_empty_but_valid_cloud() {
        let mut far = inputs(None);
        far.lines = vec![line_string![(x: 1000.0, y: 1000.0), (x: 1100.0, y: 1000.0)]];
        let synthesis = run(&far, &params());
        assert!(synthesis.cloud.is_empty());
        assert_eq!(synthesis.corridor_area, 0.0);
        assert_eq!(synthesis.vegetation.requested, 0);
    }

    struct MissingSource;

    impl FeatureSource for MissingSource {
        fn read(&self, path: &Path) -> Result<FeatureSet> {
            let missing = std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string());
            Err(missing.into())
        }
    }

    #[test]
    fn invalid_parameters_fail_before_reading() {
        let synthesizer = CorridorSynthesizer::new(SynthesisParams {
            ground_step: 0.0,
            ..SynthesisParams::default()
        })
        .with_feature_source(Box::new(MissingSource))
        .with_progress(false);
        let paths = InputPaths {
            aoi: PathBuf::from("aoi.geojson"),
            lines: PathBuf::from("lines.geojson"),
            towers: None,
        };
        let err = synthesizer.run(&paths, Path::new("out.las")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SynthError::InvalidParameter {
                name: "ground_step",
                ..
            }
        ));
    }
}
