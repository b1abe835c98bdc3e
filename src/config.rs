//! Pipeline configuration, loadable from JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::format::Modality;
use crate::data::normalize::Normalization;
use crate::data::trim::TrimBounds;

/// Per-modality processing choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityConfig {
    /// Explicit trim applied before the automatic overlap trim.
    #[serde(default)]
    pub trim: TrimBounds,

    /// Normalization contract for this modality.
    #[serde(default)]
    pub normalization: Normalization,
}

fn default_tga() -> ModalityConfig {
    ModalityConfig {
        trim: TrimBounds::x_range(40.0, 600.0),
        normalization: Normalization::RatioToMax,
    }
}

fn default_dsc() -> ModalityConfig {
    ModalityConfig {
        trim: TrimBounds::default(),
        normalization: Normalization::MinMax,
    }
}

fn default_points() -> usize {
    3000
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Resample grid size.
    #[serde(default = "default_points")]
    pub points: usize,

    /// File extensions considered as instrument exports.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_tga")]
    pub tga: ModalityConfig,

    #[serde(default = "default_dsc")]
    pub dsc: ModalityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            extensions: default_extensions(),
            tga: default_tga(),
            dsc: default_dsc(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn modality(&self, modality: Modality) -> &ModalityConfig {
        match modality {
            Modality::Tga => &self.tga,
            Modality::Dsc => &self.dsc,
        }
    }
}
