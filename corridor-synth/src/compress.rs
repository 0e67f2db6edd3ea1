//! Output finalisation with optional external LAZ compression.
//!
//! The LAS is always written first. A `.laz` target is produced by running
//! `pdal translate` through a [`CommandRunner`]; when the tool is missing or
//! fails the LAS is kept and the run carries on.

use crate::error::Result;
use crate::laz::write_point_cloud;
use crate::point_cloud::PointCloud;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

const COMPRESSOR: &str = "pdal";

/// Exit status and diagnostics of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stderr: String,
}

/// Runs external programs.
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be found.
    fn is_available(&self, program: &str) -> bool;

    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs programs found on `PATH` with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn is_available(&self, program: &str) -> bool {
        let Some(paths) = env::var_os("PATH") else {
            return false;
        };
        env::split_paths(&paths).any(|dir| {
            let candidate = dir.join(program);
            candidate.is_file() || candidate.with_extension("exe").is_file()
        })
    }

    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        log::debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// What happened to the requested compressed artefact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressionOutcome {
    /// The output was plain LAS.
    NotRequested,
    Compressed { path: PathBuf },
    /// Compression failed; the uncompressed LAS is the output.
    FellBack { las_path: PathBuf, reason: String },
}

/// Final artefact of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenOutput {
    pub path: PathBuf,
    pub points: u64,
    pub compression: CompressionOutcome,
}

pub fn wants_compression(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("laz"))
}

/// Write the cloud to `out`, compressing when it names a `.laz` file.
pub fn write_output(
    cloud: &PointCloud,
    out: &Path,
    runner: &dyn CommandRunner,
    progress: &ProgressBar,
) -> Result<WrittenOutput> {
    if !wants_compression(out) {
        let points = write_point_cloud(cloud, out, progress)?;
        return Ok(WrittenOutput {
            path: out.to_path_buf(),
            points,
            compression: CompressionOutcome::NotRequested,
        });
    }

    let las_path = out.with_extension("las");
    let points = write_point_cloud(cloud, &las_path, progress)?;
    let compression = compress(&las_path, out, runner);
    let path = match &compression {
        CompressionOutcome::Compressed { path } => path.clone(),
        _ => las_path,
    };
    Ok(WrittenOutput {
        path,
        points,
        compression,
    })
}

/// Translate `las` into `laz`; on success the LAS is removed.
pub fn compress(las: &Path, laz: &Path, runner: &dyn CommandRunner) -> CompressionOutcome {
    let fall_back = |reason: String| {
        log::warn!(
            "LAZ compression failed: {}. Kept LAS at {}",
            reason,
            las.display()
        );
        CompressionOutcome::FellBack {
            las_path: las.to_path_buf(),
            reason,
        }
    };

    if !runner.is_available(COMPRESSOR) {
        return fall_back(format!("{COMPRESSOR} not found"));
    }

    let args = vec![
        "translate".to_string(),
        las.display().to_string(),
        laz.display().to_string(),
    ];
    match runner.run(COMPRESSOR, &args) {
        Ok(output) if output.success => {
            if let Err(err) = fs::remove_file(las) {
                log::warn!("Could not remove {}: {}", las.display(), err);
            }
            log::info!("Compressed output to {}", laz.display());
            CompressionOutcome::Compressed {
                path: laz.to_path_buf(),
            }
        }
        Ok(output) => fall_back(format!("{COMPRESSOR} exited with an error: {}", output.stderr)),
        Err(err) => fall_back(format!("could not run {COMPRESSOR}: {err}")),
    }
}
