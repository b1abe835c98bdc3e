//! Thermal-analysis curve normalization and pairwise comparison.
//!
//! Raw TGA/DSC instrument exports are parsed into curves, trimmed to a common
//! temperature domain, normalized and resampled onto one shared grid. The
//! resulting matrix is the input of an all-pairs difference analysis.
//!
//! ```no_run
//! use std::path::Path;
//! use thermal_panda::{config::PipelineConfig, data::format::Modality, pipeline};
//!
//! let config = PipelineConfig::default();
//! let output = pipeline::run_modality(Path::new("raw_data/TGA"), Modality::Tga, &config).unwrap();
//! println!("{} pairs", output.analysis.n_pairs());
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
