//! Error types for loading, computing and exporting strength scores.

use crate::symbol::SymbolError;
use std::fmt;

/// Errors that abort a pipeline run.
///
/// Per-entity data problems (short histories, bad cells, non-positive
/// levels) are not errors; they only make an entity absent from the result.
#[derive(Debug)]
pub enum PipelineError {
    /// Input table has no usable time axis or is structurally malformed
    DataFormat(String),
    /// Configuration value out of range
    InvalidConfig(String),
    /// File system failure
    Io(std::io::Error),
    /// CSV read or write failure
    Csv(csv::Error),
    /// JSON serialization failure
    Json(serde_json::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::DataFormat(msg) => write!(f, "Data format error: {}", msg),
            PipelineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PipelineError::Io(err) => write!(f, "I/O error: {}", err),
            PipelineError::Csv(err) => write!(f, "CSV error: {}", err),
            PipelineError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(err) => Some(err),
            PipelineError::Csv(err) => Some(err),
            PipelineError::Json(err) => Some(err),
            _ => None,
        }
    }
}

// Conversions from other error types

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err)
    }
}

impl From<SymbolError> for PipelineError {
    fn from(err: SymbolError) -> Self {
        PipelineError::DataFormat(err.to_string())
    }
}
