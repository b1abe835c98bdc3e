use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the normalization pipeline and its persistence layer.
///
/// File-level problems during a batch are *not* reported through this type;
/// they are collected in a [`BatchSummary`](crate::data::loader::BatchSummary).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("curve collection is empty")]
    EmptyCollection,

    #[error("no common domain across curves: overlap [{min}, {max}] is empty")]
    NoOverlap { min: f64, max: f64 },

    #[error("cannot apply {contract} normalization to constant curve '{sample}'")]
    ConstantCurve { sample: String, contract: &'static str },

    #[error("{contract} normalization of '{sample}' produced non-finite values")]
    NonFiniteResult { sample: String, contract: &'static str },

    #[error("resample grid needs at least 1 point, got {0}")]
    InvalidPointCount(usize),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid artifact '{path}': {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
