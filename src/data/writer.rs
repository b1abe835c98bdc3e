//! Boundary artifacts: the resampled matrix, its sample index, trimmed curves,
//! averaged replicates and the pairwise report.
//!
//! ```text
//!  <out>/
//!    resampled.parquet    sample: Utf8, values: List<Float64?>
//!    sample_names.txt     "0: HDPE-01" ...
//!    curves.csv           X,Y,sample (long format)
//!    pairwise.json        PairwiseReport
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Float64Builder, ListArray, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use super::model::{CurveCollection, ResampledMatrix};
use super::pairwise::PairwiseReport;
use super::replicate::AveragedTable;
use super::resample::linspace;
use crate::error::{PipelineError, Result};

const META_OVERLAP_MIN: &str = "overlap_min";
const META_OVERLAP_MAX: &str = "overlap_max";

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn invalid(path: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Sample index
// ---------------------------------------------------------------------------

/// Write `row-index → sample` as one `"<i>: <name>"` line per row.
pub fn write_sample_names(path: &Path, names: &[String]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    for (i, name) in names.iter().enumerate() {
        writeln!(out, "{i}: {name}")?;
    }
    out.flush()?;
    Ok(())
}

/// Read an index written by [`write_sample_names`]. Lines without `": "`
/// are ignored; the name is everything after the first `": "`.
pub fn read_sample_names(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some((_, name)) = line.split_once(": ") {
            names.push(name.trim().to_string());
        }
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// Resampled matrix (Parquet)
// ---------------------------------------------------------------------------

fn matrix_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("sample", DataType::Utf8, false),
        Field::new(
            "values",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
    ]))
}

/// Persist the matrix; missing values become Parquet nulls and the grid
/// bounds go into the file's key/value metadata.
pub fn write_matrix_parquet(path: &Path, matrix: &ResampledMatrix) -> Result<()> {
    let (lo, hi) = matrix
        .overlap()
        .ok_or_else(|| invalid(path, "matrix has an empty grid"))?;

    let mut values_builder = ListBuilder::new(Float64Builder::new());
    for row in matrix.rows() {
        let values = values_builder.values();
        for v in row {
            values.append_option(*v);
        }
        values_builder.append(true);
    }
    let sample_array = StringArray::from(
        matrix
            .sample_names()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>(),
    );

    let schema = matrix_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(sample_array), Arc::new(values_builder.finish())],
    )?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue::new(META_OVERLAP_MIN.to_string(), lo.to_string()),
            KeyValue::new(META_OVERLAP_MAX.to_string(), hi.to_string()),
        ]))
        .build();

    ensure_parent_dirs(path)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    info!("Wrote {matrix} to {}", path.display());
    Ok(())
}

/// Read a matrix written by [`write_matrix_parquet`].
pub fn read_matrix_parquet(path: &Path) -> Result<ResampledMatrix> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let meta: HashMap<String, String> = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .filter_map(|kv| Some((kv.key.clone(), kv.value.clone()?)))
                .collect()
        })
        .unwrap_or_default();
    let bound = |key: &str| -> Result<f64> {
        meta.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| invalid(path, format!("missing or invalid '{key}' metadata")))
    };
    let (lo, hi) = (bound(META_OVERLAP_MIN)?, bound(META_OVERLAP_MAX)?);

    let mut samples = Vec::new();
    let mut rows = Vec::new();
    for batch in builder.build()? {
        let batch = batch?;
        let schema = batch.schema();
        let names = batch
            .column(schema.index_of("sample")?)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| invalid(path, "'sample' is not a string column"))?;
        let lists = batch
            .column(schema.index_of("values")?)
            .as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| invalid(path, "'values' is not a list column"))?;

        for row in 0..batch.num_rows() {
            let inner = lists.value(row);
            let values = inner
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| invalid(path, "'values' items are not Float64"))?;
            samples.push(names.value(row).to_string());
            rows.push(values.iter().collect::<Vec<Option<f64>>>());
        }
    }

    let n_points = rows.first().map_or(0, Vec::len);
    ResampledMatrix::from_rows(samples, linspace(lo, hi, n_points), rows)
}

/// Read the matrix and an external sample index, checking they line up.
/// The index file is authoritative for the names.
pub fn read_matrix_with_names(matrix_path: &Path, names_path: &Path) -> Result<ResampledMatrix> {
    let matrix = read_matrix_parquet(matrix_path)?;
    let names = read_sample_names(names_path)?;
    if names.len() != matrix.n_samples() {
        return Err(PipelineError::ShapeMismatch(format!(
            "sample count mismatch: {} names vs {} data rows",
            names.len(),
            matrix.n_samples()
        )));
    }
    let rows = matrix.rows().map(<[Option<f64>]>::to_vec).collect();
    ResampledMatrix::from_rows(names, matrix.grid().to_vec(), rows)
}

// ---------------------------------------------------------------------------
// CSV / JSON exports
// ---------------------------------------------------------------------------

/// Long-format `X,Y,sample` CSV of a curve collection.
pub fn write_curves_csv(path: &Path, curves: &CurveCollection) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["X", "Y", "sample"])?;
    for curve in curves {
        for (x, y) in curve.x.iter().zip(&curve.y) {
            writer.write_record([x.to_string(), y.to_string(), curve.sample.clone()])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write each averaged replicate table to `<dir>/averaged/<base>.csv`
/// (headerless). Returns the written paths.
pub fn write_averaged(dir: &Path, tables: &[AveragedTable]) -> Result<Vec<PathBuf>> {
    let out_dir = dir.join("averaged");
    fs::create_dir_all(&out_dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for averaged in tables {
        let path = out_dir.join(format!("{}.csv", averaged.base));
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        for row in &averaged.table.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        info!(
            "Averaged {} replicates into {}",
            averaged.members.len(),
            path.display()
        );
        written.push(path);
    }
    Ok(written)
}

/// Pretty-printed JSON pairwise report.
pub fn write_pairwise_report(path: &Path, report: &PairwiseReport) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, report)?;
    out.flush()?;
    Ok(())
}
