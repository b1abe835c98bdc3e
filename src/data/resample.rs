use log::{debug, warn};

use super::model::{Curve, CurveCollection, ResampledMatrix};
use super::trim::overlap_domain;
use crate::error::{PipelineError, Result};

/// `n` evenly spaced points from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            grid[n - 1] = end;
            grid
        }
    }
}

/// Points of `curve` sorted by x, duplicates removed (first occurrence after
/// a stable sort wins), restricted to `[lo, hi]`.
fn prepare_points(curve: &Curve, lo: f64, hi: f64) -> (Vec<f64>, Vec<f64>) {
    let mut paired: Vec<(f64, f64)> = curve
        .x
        .iter()
        .copied()
        .zip(curve.y.iter().copied())
        .collect();
    paired.sort_by(|a, b| a.0.total_cmp(&b.0));
    paired.dedup_by(|later, earlier| later.0 == earlier.0);
    paired
        .into_iter()
        .filter(|&(x, _)| x >= lo && x <= hi)
        .unzip()
}

/// Piecewise-linear interpolation of sorted, unique `xs`/`ys` at `t`.
/// Outside `[xs[0], xs[last]]` the nearest end value is held.
fn interpolate(t: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if t <= xs[0] {
        return ys[0];
    }
    if t >= xs[last] {
        return ys[last];
    }
    // first index with xs[i] > t; 1 <= i <= last here
    let i = xs.partition_point(|&x| x <= t);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (t - x0) / (x1 - x0)
}

/// Resample one curve onto `grid`. Fewer than two points inside
/// `[grid[0], grid[last]]` yields an all-missing row.
pub fn resample_curve(curve: &Curve, grid: &[f64]) -> Vec<Option<f64>> {
    let (Some(&lo), Some(&hi)) = (grid.first(), grid.last()) else {
        return Vec::new();
    };
    resample_within(curve, grid, lo, hi)
}

/// Points restricted to the domain `[lo, hi]`, evaluated at `grid`.
fn resample_within(curve: &Curve, grid: &[f64], lo: f64, hi: f64) -> Vec<Option<f64>> {
    let (xs, ys) = prepare_points(curve, lo, hi);
    if xs.len() < 2 {
        warn!(
            "{}: only {} point(s) inside [{lo}, {hi}], row left missing",
            curve.sample,
            xs.len()
        );
        return vec![None; grid.len()];
    }
    grid.iter().map(|&t| Some(interpolate(t, &xs, &ys))).collect()
}

/// Resample every curve onto an `n_points` grid spanning the overlap domain.
///
/// Row order follows collection order. Fails when the collection is empty,
/// when `n_points` is zero, or when the curves share no domain. A single
/// point yields one column at the lower end of the overlap.
pub fn resample(curves: &CurveCollection, n_points: usize) -> Result<ResampledMatrix> {
    if curves.is_empty() {
        return Err(PipelineError::EmptyCollection);
    }
    if n_points == 0 {
        return Err(PipelineError::InvalidPointCount(n_points));
    }
    let (lo, hi) = overlap_domain(curves).ok_or(PipelineError::EmptyCollection)?;
    if hi <= lo {
        return Err(PipelineError::NoOverlap { min: lo, max: hi });
    }

    let grid = linspace(lo, hi, n_points);
    debug!(
        "Resampling {} curves onto {n_points} points over [{lo}, {hi}]",
        curves.len()
    );
    let rows = curves
        .iter()
        .map(|c| resample_within(c, &grid, lo, hi))
        .collect();
    ResampledMatrix::from_rows(curves.sample_names(), grid, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn line(name: &str, xs: &[f64], slope: f64) -> Curve {
        Curve::new(name, xs.to_vec(), xs.iter().map(|x| x * slope).collect())
    }

    #[test]
    fn test_linspace_endpoints() {
        let g = linspace(2.0, 9.0, 3000);
        assert_eq!(g.len(), 3000);
        assert!((g[0] - 2.0).abs() < EPS);
        assert_eq!(g[2999], 9.0);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_shape_and_grid() {
        let curves = CurveCollection::new(vec![
            line("a", &[0.0, 5.0, 10.0], 1.0),
            line("b", &[2.0, 7.0, 12.0], 2.0),
            line("c", &[1.0, 9.0], 3.0),
        ]);
        let m = resample(&curves, 8).unwrap();
        assert_eq!(m.shape(), (3, 8));
        assert_eq!(m.overlap(), Some((2.0, 9.0)));
        assert_eq!(m.sample_names(), &["a", "b", "c"]);
    }

    #[test]
    fn test_linear_curve_is_reproduced() {
        let xs: Vec<f64> = (0..=20).map(|i| i as f64 * 0.5).collect();
        let curves = CurveCollection::new(vec![line("a", &xs, 3.0), line("b", &xs, -1.0)]);
        let m = resample(&curves, 7).unwrap();
        for (t, v) in m.grid().iter().zip(m.row(0)) {
            assert!((v.unwrap() - 3.0 * t).abs() < EPS);
        }
        for (t, v) in m.grid().iter().zip(m.row(1)) {
            assert!((v.unwrap() + t).abs() < EPS);
        }
    }

    #[test]
    fn test_unsorted_input_with_duplicates() {
        let c = Curve::new("a", vec![2.0, 0.0, 1.0, 1.0], vec![20.0, 0.0, 10.0, 99.0]);
        let row = resample_curve(&c, &[0.0, 0.5, 1.5, 2.0]);
        assert_eq!(row, vec![Some(0.0), Some(5.0), Some(15.0), Some(20.0)]);
    }

    #[test]
    fn test_sparse_curve_row_is_missing() {
        // "wide" has a single point inside the overlap
        let curves = CurveCollection::new(vec![
            line("dense", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 1.0),
            line("sparse", &[1.0, 4.5, 20.0], 1.0),
            line("wide", &[-5.0, 0.0, 4.0, 6.0], 1.0),
        ]);
        let m = resample(&curves, 4).unwrap();
        assert_eq!(m.overlap(), Some((1.0, 5.0)));
        assert!(!m.is_missing_row(0));
        assert!(m.is_missing_row(2));
        // sparse keeps 1.0 and 4.5: two points, so it is interpolated and held
        assert!(!m.is_missing_row(1));
        assert_eq!(m.row(1)[3], Some(4.5));
    }

    #[test]
    fn test_missing_row_iff_fewer_than_two_points() {
        let curves = CurveCollection::new(vec![
            line("a", &[0.0, 10.0], 1.0),
            line("b", &[0.0, 3.0, 10.0], 1.0),
        ]);
        let grid = linspace(0.0, 10.0, 5);
        assert!(resample_curve(&Curve::new("one", vec![5.0], vec![1.0]), &grid)
            .iter()
            .all(Option::is_none));
        let m = resample(&curves, 5).unwrap();
        assert!(!m.is_missing_row(0));
        assert!(!m.is_missing_row(1));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            resample(&CurveCollection::default(), 10),
            Err(PipelineError::EmptyCollection)
        ));
        let disjoint = CurveCollection::new(vec![
            line("a", &[0.0, 1.0], 1.0),
            line("b", &[2.0, 3.0], 1.0),
        ]);
        assert!(matches!(
            resample(&disjoint, 10),
            Err(PipelineError::NoOverlap { .. })
        ));
        let touching = CurveCollection::new(vec![
            line("a", &[0.0, 1.0], 1.0),
            line("b", &[1.0, 3.0], 1.0),
        ]);
        assert!(matches!(
            resample(&touching, 10),
            Err(PipelineError::NoOverlap { .. })
        ));
        assert!(matches!(
            resample(&touching, 0),
            Err(PipelineError::InvalidPointCount(0))
        ));
    }

    #[test]
    fn test_single_point_grid_sits_at_overlap_min() {
        let curves = CurveCollection::new(vec![
            line("a", &[0.0, 5.0, 10.0], 1.0),
            line("b", &[2.0, 7.0, 12.0], 2.0),
        ]);
        let m = resample(&curves, 1).unwrap();
        assert_eq!(m.shape(), (2, 1));
        assert_eq!(m.grid(), &[2.0]);
        // a keeps only x = 5 and 10 inside [2, 10], so its first value is held
        assert!((m.row(0)[0].unwrap() - 5.0).abs() < EPS);
        assert!((m.row(1)[0].unwrap() - 4.0).abs() < EPS);
    }
}
