/// Run report summarising a synthesis run.
use crate::bounds::PointCloudBounds;
use crate::compress::WrittenOutput;
use crate::config::SynthesisParams;
use crate::error::Result;
use crate::loader::LoadDiagnostics;
use crate::point_cloud::ClassCount;
use crate::samplers::VegetationOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a run produced, plus every non-fatal diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Working frame of the output.
    pub epsg: u32,
    pub point_count: usize,
    /// Per-class counts keyed by classification code.
    pub classes: BTreeMap<u8, ClassCount>,
    /// Coordinate bounds; absent for an empty cloud.
    pub bounds: Option<PointCloudBounds>,
    /// Corridor area in square metres.
    pub corridor_area: f64,
    pub vegetation: VegetationOutcome,
    pub inputs: LoadDiagnostics,
    pub params: SynthesisParams,
    /// Final artefact; absent when nothing was written.
    pub output: Option<WrittenOutput>,
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Log a short summary of the run.
    pub fn log_summary(&self) {
        log::info!("Run summary:");
        log::info!("  Working frame: EPSG:{}", self.epsg);
        log::info!("  Corridor area: {:.1} m²", self.corridor_area);
        for (code, class) in &self.classes {
            log::info!("  Class {:>2} ({}): {} points", code, class.class_name, class.points);
        }
        if let Some(bounds) = &self.bounds {
            log::info!(
                "  Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
                bounds.min_x,
                bounds.min_y,
                bounds.min_z,
                bounds.max_x,
                bounds.max_y,
                bounds.max_z
            );
            let (dx, dy, dz) = bounds.dimensions();
            log::info!("  Extent: {:.2} x {:.2} x {:.2} m", dx, dy, dz);
        }
        if let Some(output) = &self.output {
            log::info!("  Output: {}", output.path.display());
        }
        if !self.warnings.is_empty() {
            log::info!("  {} warning(s) recorded", self.warnings.len());
        }
    }
}

/// Writes run reports next to the point cloud output.
pub struct ReportWriter {
    output_dir: PathBuf,
    output_name: String,
}

impl ReportWriter {
    /// Reports for `out` land at `<dir>/<stem>_report.json`.
    pub fn for_output(out: &Path) -> Self {
        let output_dir = out
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let output_name = out
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "corridor".to_string());
        Self {
            output_dir,
            output_name,
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", self.output_name))
    }

    pub fn write(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.report_path();
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;
        log::info!("Generated run report: {}", path.display());
        Ok(path)
    }
}
