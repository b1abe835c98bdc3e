//! End-to-end processing of one modality:
//! parse → explicit trim → auto-trim → normalize → sort → resample → pairwise.

use std::path::Path;

use log::info;

use crate::config::{ModalityConfig, PipelineConfig};
use crate::data::format::Modality;
use crate::data::loader::{load_modality_folder, BatchSummary};
use crate::data::model::{CurveCollection, ResampledMatrix};
use crate::data::normalize::normalize_all;
use crate::data::pairwise::{analyze, PairwiseAnalysis, PairwiseReport};
use crate::data::resample::resample;
use crate::data::trim::{auto_trim, trim};
use crate::data::writer;
use crate::error::Result;

/// Everything produced for one modality.
#[derive(Debug, Clone)]
pub struct ModalityOutput {
    pub modality: Modality,
    /// Trimmed, normalized curves sorted by sample.
    pub curves: CurveCollection,
    pub matrix: ResampledMatrix,
    pub analysis: PairwiseAnalysis,
    pub summary: BatchSummary,
}

/// Trim, normalize, sort and resample an already parsed collection.
pub fn process_curves(
    curves: &CurveCollection,
    config: &ModalityConfig,
    points: usize,
) -> Result<(CurveCollection, ResampledMatrix)> {
    let bounded: CurveCollection = if config.trim.is_unbounded() {
        curves.clone()
    } else {
        curves.iter().map(|c| trim(c, &config.trim)).collect()
    };
    let trimmed = auto_trim(&bounded);
    let normalized = normalize_all(&trimmed, config.normalization)?.sorted_by_sample();
    let matrix = resample(&normalized, points)?;
    Ok((normalized, matrix))
}

/// Run the whole chain over the exports in `dir`.
pub fn run_modality(
    dir: &Path,
    modality: Modality,
    config: &PipelineConfig,
) -> Result<ModalityOutput> {
    let (parsed, summary) = load_modality_folder(dir, modality, &config.extensions)?;
    let (processed, skipped, errors) = summary.counts();
    info!("{modality}: {processed} processed, {skipped} skipped, {errors} errors");

    let modality_config = config.modality(modality);
    let (curves, matrix) = process_curves(&parsed, modality_config, config.points)?;
    info!(
        "{modality}: {} normalization, resampled {matrix}",
        modality_config.normalization.label()
    );

    let analysis = analyze(&matrix);
    Ok(ModalityOutput {
        modality,
        curves,
        matrix,
        analysis,
        summary,
    })
}

/// Persist the boundary artifacts of one modality under `out_dir`.
pub fn write_outputs(out_dir: &Path, output: &ModalityOutput) -> Result<()> {
    writer::write_matrix_parquet(&out_dir.join("resampled.parquet"), &output.matrix)?;
    writer::write_sample_names(&out_dir.join("sample_names.txt"), output.matrix.sample_names())?;
    writer::write_curves_csv(&out_dir.join("curves.csv"), &output.curves)?;
    let report = PairwiseReport::new(&output.matrix, &output.analysis);
    writer::write_pairwise_report(&out_dir.join("pairwise.json"), &report)?;
    info!("{}: artifacts written to {}", output.modality, out_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Curve;
    use crate::data::normalize::Normalization;
    use crate::data::trim::TrimBounds;
    use crate::error::PipelineError;
    use std::fs;
    use tempfile::TempDir;

    fn tga_export(rows: &[(f64, f64)]) -> String {
        let mut text = String::from("Sample,HDPE\nMethod,Ramp 10\nIndex,Temp,Weight\n");
        for (i, (t, w)) in rows.iter().enumerate() {
            text.push_str(&format!("{i},{t},{w}\n"));
        }
        text
    }

    #[test]
    fn test_process_curves_sorts_and_normalizes() {
        let curves = CurveCollection::new(vec![
            Curve::new("b", vec![0.0, 5.0, 10.0], vec![10.0, 8.0, 6.0]),
            Curve::new("a", vec![2.0, 6.0, 12.0], vec![4.0, 3.0, 2.0]),
        ]);
        let config = ModalityConfig {
            trim: TrimBounds::default(),
            normalization: Normalization::RatioToMax,
        };
        let (out, matrix) = process_curves(&curves, &config, 5).unwrap();
        assert_eq!(out.sample_names(), vec!["a", "b"]);
        assert_eq!(matrix.sample_names(), &["a", "b"]);
        // auto-trim keeps b at x >= 5 and a at x <= 6
        assert_eq!(matrix.overlap(), Some((5.0, 6.0)));
        for curve in &out {
            assert_eq!(curve.y_range().unwrap().1, 1.0);
        }
    }

    #[test]
    fn test_process_constant_curve_is_hard_error() {
        let curves = CurveCollection::new(vec![
            Curve::new("flat", vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]),
            Curve::new("ok", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]),
        ]);
        let config = ModalityConfig {
            trim: TrimBounds::default(),
            normalization: Normalization::MinMax,
        };
        assert!(matches!(
            process_curves(&curves, &config, 10),
            Err(PipelineError::ConstantCurve { .. })
        ));
    }

    #[test]
    fn test_run_modality_end_to_end() {
        let data = TempDir::new().unwrap();
        let rows_a: Vec<(f64, f64)> = (0..=60)
            .map(|i| (20.0 + 10.0 * i as f64, 10.0 - 0.1 * i as f64))
            .collect();
        let rows_b: Vec<(f64, f64)> = (0..=50)
            .map(|i| (35.0 + 10.0 * i as f64, 12.0 - 0.1 * i as f64))
            .collect();
        fs::write(data.path().join("HDPE-02.csv"), tga_export(&rows_b)).unwrap();
        fs::write(data.path().join("HDPE-01.csv"), tga_export(&rows_a)).unwrap();
        fs::write(data.path().join("PP-01.csv"), tga_export(&rows_a)).unwrap();

        let config = PipelineConfig {
            points: 50,
            ..Default::default()
        };
        let output = run_modality(data.path(), Modality::Tga, &config).unwrap();
        assert_eq!(output.summary.counts(), (2, 1, 0));
        assert_eq!(output.matrix.shape(), (2, 50));
        assert_eq!(output.matrix.sample_names(), &["HDPE-01", "HDPE-02"]);
        // explicit 40..600, then overlap of 50..530 (a) and 45..535 (b)
        assert_eq!(output.matrix.overlap(), Some((50.0, 530.0)));
        assert_eq!(output.analysis.n_pairs(), 1);

        let out = TempDir::new().unwrap();
        write_outputs(out.path(), &output).unwrap();
        for name in ["resampled.parquet", "sample_names.txt", "curves.csv", "pairwise.json"] {
            assert!(out.path().join(name).exists(), "{name} missing");
        }
        let back = writer::read_matrix_with_names(
            &out.path().join("resampled.parquet"),
            &out.path().join("sample_names.txt"),
        )
        .unwrap();
        assert_eq!(back, output.matrix);
    }

    #[test]
    fn test_run_modality_without_usable_files() {
        let data = TempDir::new().unwrap();
        fs::write(data.path().join("PP-01.csv"), "1,2\n").unwrap();
        let config = PipelineConfig::default();
        assert!(matches!(
            run_modality(data.path(), Modality::Dsc, &config),
            Err(PipelineError::EmptyCollection)
        ));
    }
}
