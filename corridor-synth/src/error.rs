//! Error types for corridor synthesis.
//!
//! Only boundary failures live here: unreadable inputs, unknown coordinate
//! systems, bad parameters and writer errors. Empty corridors, empty point
//! clouds and sampling shortfalls are not errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LAS error: {0}")]
    Las(#[from] las::Error),

    #[error("Malformed GeoJSON in {source_name}: {reason}")]
    MalformedGeoJson { source_name: String, reason: String },

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("AOI is empty after unioning its parts")]
    EmptyAoi,
}

impl SynthError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: &str) -> Self {
        SynthError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        SynthError::MalformedGeoJson {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;
