/// Synthesis parameters with JSON loading and validation
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable values consumed by the corridor core.
/// Defaults match the corridor profile the tool was built around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    /// Corridor half-width around each line (m).
    pub width: f64,
    /// Ground lattice spacing (m).
    pub ground_step: f64,
    /// Vegetation density (points per m²).
    pub veg_density: f64,
    /// Nominal conductor and tower height above ground (m).
    pub height: f64,
    /// Sag amplitude at mid-span (m).
    pub sag: f64,
    /// Lateral offset between phase conductors (m).
    pub phase_offset: f64,
    /// Seed for the vegetation random source.
    pub seed: u64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            width: 50.0,
            ground_step: 4.0,
            veg_density: 0.15,
            height: 28.0,
            sag: 15.0,
            phase_offset: 1.5,
            seed: 0,
        }
    }
}

impl SynthesisParams {
    /// Load parameters from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let params: SynthesisParams = serde_json::from_str(&text)?;
        log::info!("Loaded synthesis parameters from {}", path.display());
        Ok(params)
    }

    /// Reject values the samplers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(SynthError::invalid("width", self.width, "must be > 0"));
        }
        if !(self.ground_step.is_finite() && self.ground_step > 0.0) {
            return Err(SynthError::invalid(
                "ground_step",
                self.ground_step,
                "must be > 0",
            ));
        }
        if !(self.veg_density.is_finite() && self.veg_density >= 0.0) {
            return Err(SynthError::invalid(
                "veg_density",
                self.veg_density,
                "must be >= 0",
            ));
        }
        for (name, value) in [
            ("height", self.height),
            ("sag", self.sag),
            ("phase_offset", self.phase_offset),
        ] {
            if !value.is_finite() {
                return Err(SynthError::invalid(name, value, "must be finite"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: SynthesisParams =
            serde_json::from_str(r#"{ "width": 10.0, "seed": 7 }"#).unwrap();
        assert_eq!(params.width, 10.0);
        assert_eq!(params.seed, 7);
        assert_eq!(params.ground_step, SynthesisParams::default().ground_step);
    }

    #[test]
    fn rejects_non_positive_width_and_step() {
        let mut params = SynthesisParams::default();
        params.width = 0.0;
        assert!(matches!(
            params.validate(),
            Err(SynthError::InvalidParameter { name: "width", .. })
        ));

        let mut params = SynthesisParams::default();
        params.ground_step = -1.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_density_and_phase_offset_are_valid() {
        let params = SynthesisParams {
            veg_density: 0.0,
            phase_offset: 0.0,
            ..SynthesisParams::default()
        };
        assert!(params.validate().is_ok());
    }
}
