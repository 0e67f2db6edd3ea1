/// Power-corridor point cloud synthesizer entry point
use clap::Parser;
use corridor_synth::{CancelToken, CorridorSynthesizer, InputPaths, SynthesisParams};
use std::path::PathBuf;
use std::time::Duration;

/// Synthesize a classified power-corridor point cloud from GeoJSON inputs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AOI polygon (GeoJSON)
    #[arg(long)]
    aoi: PathBuf,

    /// Power lines (GeoJSON)
    #[arg(long)]
    lines: PathBuf,

    /// Power towers (GeoJSON, optional)
    #[arg(long)]
    towers: Option<PathBuf>,

    /// Output point cloud (.las, or .laz to compress with pdal)
    #[arg(long)]
    out: PathBuf,

    /// JSON file with synthesis parameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corridor half-width (m)
    #[arg(long)]
    width: Option<f64>,

    /// Ground grid step (m)
    #[arg(long)]
    ground_step: Option<f64>,

    /// Vegetation density (pts/m²)
    #[arg(long)]
    veg_density: Option<f64>,

    /// Typical wire/tower height above ground (m)
    #[arg(long)]
    height: Option<f64>,

    /// Sag amplitude (m)
    #[arg(long)]
    sag: Option<f64>,

    /// Phase lateral offset (m)
    #[arg(long)]
    phase_offset: Option<f64>,

    /// Seed for vegetation sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Inputs are already metric in this EPSG frame; skip reprojection
    #[arg(long, value_name = "EPSG")]
    local_frame: Option<u32>,

    /// Stop vegetation sampling after this many seconds
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Do not write the JSON run report
    #[arg(long)]
    no_report: bool,

    /// Hide progress bars and informational logging
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn params(&self) -> corridor_synth::Result<SynthesisParams> {
        let mut params = match &self.config {
            Some(path) => SynthesisParams::from_json_file(path)?,
            None => SynthesisParams::default(),
        };
        let overrides = [
            (&mut params.width, self.width),
            (&mut params.ground_step, self.ground_step),
            (&mut params.veg_density, self.veg_density),
            (&mut params.height, self.height),
            (&mut params.sag, self.sag),
            (&mut params.phase_offset, self.phase_offset),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        Ok(params)
    }

    fn cancel_token(&self) -> corridor_synth::Result<CancelToken> {
        match self.deadline_secs {
            None => Ok(CancelToken::new()),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(CancelToken::with_deadline)
                .map_err(|_| {
                    corridor_synth::SynthError::InvalidParameter {
                        name: "deadline_secs",
                        value: secs.to_string(),
                        reason: "must be a non-negative number of seconds".to_string(),
                    }
                }),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match (args.verbose, args.quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let synthesizer = CorridorSynthesizer::new(args.params()?)
        .with_cancel_token(args.cancel_token()?)
        .with_local_frame(args.local_frame)
        .with_report(!args.no_report)
        .with_progress(!args.quiet);

    let paths = InputPaths {
        aoi: args.aoi.clone(),
        lines: args.lines.clone(),
        towers: args.towers.clone(),
    };
    let report = synthesizer.run(&paths, &args.out)?;

    log::info!(
        "Synthesis complete: {} points, {} warning(s)",
        report.point_count,
        report.warnings.len()
    );
    Ok(())
}
