//! All-pairs difference statistics over a [`ResampledMatrix`].
//!
//! Pairs are enumerated as `(i, j)` with `i < j`, ascending `i` then `j`.
//! Missing values are handled explicitly: a difference is missing where
//! either row is missing, and every reduction only looks at present values.

use serde::Serialize;

use super::model::ResampledMatrix;

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

/// Welford accumulator: mean and population standard deviation.
#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn push(&mut self, v: f64) {
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    fn std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).max(0.0).sqrt())
    }
}

/// Scalar summary of one curve of differences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveSummary {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub max_abs: f64,
    pub mean_abs: f64,
}

/// Summarise the present values of `values`; `None` if all are missing.
pub fn summarize(values: &[Option<f64>]) -> Option<CurveSummary> {
    let mut stats = RunningStats::default();
    let mut abs_sum = 0.0;
    let mut max_abs = f64::NEG_INFINITY;
    for v in values.iter().flatten() {
        stats.push(*v);
        abs_sum += v.abs();
        max_abs = max_abs.max(v.abs());
    }
    Some(CurveSummary {
        mean: stats.mean()?,
        std: stats.std()?,
        max_abs,
        mean_abs: abs_sum / stats.count as f64,
    })
}

// ---------------------------------------------------------------------------
// Per pair
// ---------------------------------------------------------------------------

/// Difference curves of one ordered pair of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PairStatistics {
    pub i: usize,
    pub j: usize,
    /// `row_i - row_j`.
    pub diff: Vec<Option<f64>>,
    /// `|row_i - row_j|`.
    pub abs_diff: Vec<Option<f64>>,
    pub summary: Option<CurveSummary>,
}

/// Element-wise `a - b`, missing where either side is missing.
pub fn difference(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| Some((*x)? - (*y)?))
        .collect()
}

/// Statistics for rows `i` and `j` of `matrix`. Any `i != j` is accepted, so
/// `(j, i)` gives the negated difference of `(i, j)`.
pub fn pair_statistics(matrix: &ResampledMatrix, i: usize, j: usize) -> PairStatistics {
    let diff = difference(matrix.row(i), matrix.row(j));
    let abs_diff = diff.iter().map(|d| d.map(f64::abs)).collect();
    let summary = summarize(&diff);
    PairStatistics {
        i,
        j,
        diff,
        abs_diff,
        summary,
    }
}

/// All unordered index pairs of `n` samples in combinatorial order.
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

// ---------------------------------------------------------------------------
// Across all pairs
// ---------------------------------------------------------------------------

/// Mean and standard deviation at each grid position, over all pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateCurve {
    pub mean: Vec<Option<f64>>,
    pub std: Vec<Option<f64>>,
}

impl AggregateCurve {
    fn from_stats(stats: &[RunningStats]) -> Self {
        Self {
            mean: stats.iter().map(RunningStats::mean).collect(),
            std: stats.iter().map(RunningStats::std).collect(),
        }
    }

    /// `(mean - k·σ, mean + k·σ)` at each position.
    pub fn band(&self, k: f64) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        self.mean
            .iter()
            .zip(&self.std)
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => (Some(m - k * s), Some(m + k * s)),
                _ => (None, None),
            })
            .unzip()
    }

    /// Summary of the mean curve itself.
    pub fn overall(&self) -> Option<CurveSummary> {
        summarize(&self.mean)
    }
}

/// Global extrema across every pair, for shared plot axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalRange {
    pub diff_min: f64,
    pub diff_max: f64,
    pub abs_max: f64,
}

/// Result of the all-pairs pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseAnalysis {
    pub pairs: Vec<(usize, usize)>,
    /// `None` when no pair has a single present difference value.
    pub global: Option<GlobalRange>,
    pub mean_difference: AggregateCurve,
    pub mean_abs_difference: AggregateCurve,
}

impl PairwiseAnalysis {
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }
}

/// One pass over all `S*(S-1)/2` pairs of `matrix`.
///
/// Fewer than two samples yields no pairs, all-missing aggregates and no
/// global range.
pub fn analyze(matrix: &ResampledMatrix) -> PairwiseAnalysis {
    let n = matrix.n_points();
    let pairs = pair_indices(matrix.n_samples());
    let mut diff_stats = vec![RunningStats::default(); n];
    let mut abs_stats = vec![RunningStats::default(); n];
    let mut global: Option<GlobalRange> = None;

    for &(i, j) in &pairs {
        let (a, b) = (matrix.row(i), matrix.row(j));
        for (k, (x, y)) in a.iter().zip(b).enumerate() {
            let (Some(x), Some(y)) = (x, y) else {
                continue;
            };
            let d = x - y;
            diff_stats[k].push(d);
            abs_stats[k].push(d.abs());
            global = Some(match global {
                None => GlobalRange {
                    diff_min: d,
                    diff_max: d,
                    abs_max: d.abs(),
                },
                Some(g) => GlobalRange {
                    diff_min: g.diff_min.min(d),
                    diff_max: g.diff_max.max(d),
                    abs_max: g.abs_max.max(d.abs()),
                },
            });
        }
    }

    PairwiseAnalysis {
        pairs,
        global,
        mean_difference: AggregateCurve::from_stats(&diff_stats),
        mean_abs_difference: AggregateCurve::from_stats(&abs_stats),
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairEntry {
    pub first: String,
    pub second: String,
    pub summary: Option<CurveSummary>,
}

/// Serializable digest of a pairwise analysis, named by sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseReport {
    pub samples: Vec<String>,
    pub n_points: usize,
    pub n_pairs: usize,
    pub global: Option<GlobalRange>,
    pub pairs: Vec<PairEntry>,
    pub mean_difference: AggregateCurve,
    pub mean_difference_overall: Option<CurveSummary>,
    pub mean_abs_difference: AggregateCurve,
    pub mean_abs_difference_overall: Option<CurveSummary>,
}

impl PairwiseReport {
    pub fn new(matrix: &ResampledMatrix, analysis: &PairwiseAnalysis) -> Self {
        let names = matrix.sample_names();
        let pairs = analysis
            .pairs
            .iter()
            .map(|&(i, j)| PairEntry {
                first: names[i].clone(),
                second: names[j].clone(),
                summary: pair_statistics(matrix, i, j).summary,
            })
            .collect();
        Self {
            samples: names.to_vec(),
            n_points: matrix.n_points(),
            n_pairs: analysis.n_pairs(),
            global: analysis.global,
            pairs,
            mean_difference: analysis.mean_difference.clone(),
            mean_difference_overall: analysis.mean_difference.overall(),
            mean_abs_difference: analysis.mean_abs_difference.clone(),
            mean_abs_difference_overall: analysis.mean_abs_difference.overall(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn matrix(rows: Vec<Vec<Option<f64>>>) -> ResampledMatrix {
        let n = rows[0].len();
        let names = (0..rows.len()).map(|i| format!("s{i}")).collect();
        let grid = (0..n).map(|i| i as f64).collect();
        ResampledMatrix::from_rows(names, grid, rows).unwrap()
    }

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_pair_enumeration() {
        assert_eq!(pair_indices(4), vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert!(pair_indices(1).is_empty());
        for s in 0..12 {
            let pairs = pair_indices(s);
            assert_eq!(pairs.len(), s * s.saturating_sub(1) / 2);
            let mut sorted = pairs.clone();
            sorted.dedup();
            assert_eq!(sorted.len(), pairs.len());
            assert!(pairs.iter().all(|&(i, j)| i < j && j < s));
        }
    }

    #[test]
    fn test_antisymmetry() {
        let m = matrix(vec![some(&[1.0, 4.0, 2.5]), some(&[0.5, 5.0, 2.0])]);
        let ij = pair_statistics(&m, 0, 1);
        let ji = pair_statistics(&m, 1, 0);
        for (a, b) in ij.diff.iter().zip(&ji.diff) {
            assert_eq!(a.unwrap(), -b.unwrap());
        }
        assert_eq!(ij.abs_diff, ji.abs_diff);
    }

    #[test]
    fn test_identical_rows_have_zero_difference() {
        let row = some(&[0.9, 0.7, 0.4, 0.1]);
        let m = matrix(vec![row.clone(), row]);
        let pair = pair_statistics(&m, 0, 1);
        assert!(pair.diff.iter().all(|d| *d == Some(0.0)));
        let summary = pair.summary.unwrap();
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.std, 0.0);

        let analysis = analyze(&m);
        assert_eq!(analysis.n_pairs(), 1);
        assert!(analysis.mean_difference.mean.iter().all(|v| *v == Some(0.0)));
        assert!(analysis.mean_difference.std.iter().all(|v| *v == Some(0.0)));
        assert_eq!(
            analysis.global,
            Some(GlobalRange {
                diff_min: 0.0,
                diff_max: 0.0,
                abs_max: 0.0
            })
        );
    }

    #[test]
    fn test_aggregates_and_global_range() {
        // pairs: (0,1) -> [-1, 2], (0,2) -> [-3, 0], (1,2) -> [-2, -2]
        let m = matrix(vec![some(&[0.0, 2.0]), some(&[1.0, 0.0]), some(&[3.0, 2.0])]);
        let a = analyze(&m);
        assert_eq!(a.pairs, vec![(0, 1), (0, 2), (1, 2)]);
        let g = a.global.unwrap();
        assert_eq!((g.diff_min, g.diff_max, g.abs_max), (-3.0, 2.0, 3.0));

        let mean = &a.mean_difference.mean;
        assert!((mean[0].unwrap() + 2.0).abs() < EPS);
        assert!(mean[1].unwrap().abs() < EPS);
        // population std of [-1, -3, -2]
        let std0 = a.mean_difference.std[0].unwrap();
        assert!((std0 - (2.0f64 / 3.0).sqrt()).abs() < EPS);
        // |d| at position 1: [2, 0, 2]
        assert!((a.mean_abs_difference.mean[1].unwrap() - 4.0 / 3.0).abs() < EPS);

        let (lo, hi) = a.mean_difference.band(2.0);
        assert!((lo[0].unwrap() - (-2.0 - 2.0 * std0)).abs() < EPS);
        assert!((hi[0].unwrap() - (-2.0 + 2.0 * std0)).abs() < EPS);
    }

    #[test]
    fn test_missing_rows_are_skipped_not_propagated() {
        let m = matrix(vec![some(&[1.0, 1.0]), vec![None, None], some(&[0.0, 3.0])]);
        let a = analyze(&m);
        assert_eq!(a.n_pairs(), 3);
        // only pair (0,2) contributes
        assert_eq!(a.mean_difference.mean, vec![Some(1.0), Some(-2.0)]);
        assert_eq!(a.mean_difference.std, vec![Some(0.0), Some(0.0)]);
        let p = pair_statistics(&m, 0, 1);
        assert!(p.diff.iter().all(Option::is_none));
        assert_eq!(p.summary, None);
    }

    #[test]
    fn test_single_sample_has_no_pairs() {
        let a = analyze(&matrix(vec![some(&[1.0, 2.0])]));
        assert_eq!(a.n_pairs(), 0);
        assert_eq!(a.global, None);
        assert!(a.mean_difference.mean.iter().all(Option::is_none));
        assert_eq!(a.mean_difference.overall(), None);
    }

    #[test]
    fn test_report_names_pairs() {
        let m = matrix(vec![some(&[1.0]), some(&[0.0]), some(&[0.5])]);
        let report = PairwiseReport::new(&m, &analyze(&m));
        assert_eq!(report.n_pairs, 3);
        assert_eq!(report.pairs[1].first, "s0");
        assert_eq!(report.pairs[1].second, "s2");
        assert_eq!(report.pairs[1].summary.unwrap().mean, 0.5);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"diff_min\":-0.5"));
    }

    #[test]
    fn test_summary_values() {
        let s = summarize(&[Some(1.0), None, Some(-3.0)]).unwrap();
        assert_eq!(s.mean, -1.0);
        assert_eq!(s.std, 2.0);
        assert_eq!(s.max_abs, 3.0);
        assert_eq!(s.mean_abs, 2.0);
    }
}
