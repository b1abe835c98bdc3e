use std::fmt;

use serde::Serialize;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// RawTable – one instrument export before column selection
// ---------------------------------------------------------------------------

/// Untyped rows of a raw instrument export. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row; short rows are treated as padded with blanks.
    pub fn n_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Field at (`row`, `col`), or `None` when the row is shorter than `col`.
    pub fn field(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Curve – one measured sample
// ---------------------------------------------------------------------------

/// A single cleaned curve: temperature (x) against response (y).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    /// Sample identifier (source file name without extension).
    pub sample: String,
    /// Domain axis, usually temperature.
    pub x: Vec<f64>,
    /// Response axis (weight or heat flow) – same length as `x`.
    pub y: Vec<f64>,
}

impl Curve {
    pub fn new(sample: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self {
            sample: sample.into(),
            x,
            y,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(min, max)` of the x values, `None` for an empty curve.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        min_max(&self.x)
    }

    /// `(min, max)` of the y values, `None` for an empty curve.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        min_max(&self.y)
    }

    /// Build a new curve keeping only the points accepted by `keep`.
    pub fn retain_points(&self, mut keep: impl FnMut(f64, f64) -> bool) -> Curve {
        let (x, y) = self
            .x
            .iter()
            .zip(&self.y)
            .filter(|&(&xi, &yi)| keep(xi, yi))
            .map(|(&xi, &yi)| (xi, yi))
            .unzip();
        Curve {
            sample: self.sample.clone(),
            x,
            y,
        }
    }

    /// Build a new curve with the same x values and a transformed y.
    pub fn map_y(&self, f: impl Fn(f64) -> f64) -> Curve {
        Curve {
            sample: self.sample.clone(),
            x: self.x.clone(),
            y: self.y.iter().map(|&v| f(v)).collect(),
        }
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

// ---------------------------------------------------------------------------
// CurveCollection – curves of one modality
// ---------------------------------------------------------------------------

/// Ordered list of curves of one modality. Order is significant once sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveCollection {
    pub curves: Vec<Curve>,
}

impl CurveCollection {
    pub fn new(curves: Vec<Curve>) -> Self {
        Self { curves }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Curve> {
        self.curves.iter()
    }

    /// Sort curves by sample identifier (byte-wise, like a plain string sort).
    pub fn sorted_by_sample(mut self) -> Self {
        self.curves.sort_by(|a, b| a.sample.cmp(&b.sample));
        self
    }

    /// Sample identifiers in collection order.
    pub fn sample_names(&self) -> Vec<String> {
        self.curves.iter().map(|c| c.sample.clone()).collect()
    }
}

impl FromIterator<Curve> for CurveCollection {
    fn from_iter<I: IntoIterator<Item = Curve>>(iter: I) -> Self {
        Self {
            curves: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CurveCollection {
    type Item = &'a Curve;
    type IntoIter = std::slice::Iter<'a, Curve>;

    fn into_iter(self) -> Self::IntoIter {
        self.curves.iter()
    }
}

// ---------------------------------------------------------------------------
// ResampledMatrix – samples × grid, with its sample name mapping
// ---------------------------------------------------------------------------

/// Rectangular `samples × points` array on one shared grid.
///
/// Row `i` belongs to `sample_names()[i]`; the two are stored together so
/// they cannot drift apart. A `None` element marks a missing value (rows of
/// undersampled curves are entirely `None`). The matrix is immutable once
/// built; [`ResampledMatrix::reordered`] yields a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledMatrix {
    samples: Vec<String>,
    grid: Vec<f64>,
    values: Vec<Option<f64>>,
}

impl ResampledMatrix {
    /// Assemble a matrix from per-sample rows, each as long as `grid`.
    pub fn from_rows(
        samples: Vec<String>,
        grid: Vec<f64>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if samples.len() != rows.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} sample names for {} rows",
                samples.len(),
                rows.len()
            )));
        }
        let n_points = grid.len();
        let mut values = Vec::with_capacity(rows.len() * n_points);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_points {
                return Err(PipelineError::ShapeMismatch(format!(
                    "row {i} has {} values, grid has {n_points}",
                    row.len()
                )));
            }
            values.extend(row);
        }
        Ok(Self {
            samples,
            grid,
            values,
        })
    }

    /// `(samples, points)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.samples.len(), self.grid.len())
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_points(&self) -> usize {
        self.grid.len()
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn sample_names(&self) -> &[String] {
        &self.samples
    }

    pub fn row(&self, i: usize) -> &[Option<f64>] {
        let n = self.grid.len();
        &self.values[i * n..(i + 1) * n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<f64>]> + '_ {
        (0..self.samples.len()).map(move |i| self.row(i))
    }

    /// Whether row `i` is entirely missing.
    pub fn is_missing_row(&self, i: usize) -> bool {
        self.row(i).iter().all(Option::is_none)
    }

    /// First and last grid positions.
    pub fn overlap(&self) -> Option<(f64, f64)> {
        Some((*self.grid.first()?, *self.grid.last()?))
    }

    /// A new matrix with rows and names permuted identically by `order`.
    pub fn reordered(&self, order: &[usize]) -> Result<Self> {
        if order.len() != self.samples.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "ordering has {} entries for {} rows",
                order.len(),
                self.samples.len()
            )));
        }
        let mut samples = Vec::with_capacity(order.len());
        let mut rows = Vec::with_capacity(order.len());
        for &i in order {
            if i >= self.samples.len() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "row index {i} out of bounds"
                )));
            }
            samples.push(self.samples[i].clone());
            rows.push(self.row(i).to_vec());
        }
        Self::from_rows(samples, self.grid.clone(), rows)
    }
}

impl fmt::Display for ResampledMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, n) = self.shape();
        match self.overlap() {
            Some((lo, hi)) => write!(f, "{s} samples x {n} points over [{lo:.4}, {hi:.4}]"),
            None => write!(f, "{s} samples x {n} points"),
        }
    }
}
