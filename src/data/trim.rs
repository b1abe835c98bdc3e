use serde::{Deserialize, Serialize};

use super::model::{Curve, CurveCollection};

// ---------------------------------------------------------------------------
// Explicit bounds
// ---------------------------------------------------------------------------

/// Inclusive trim window. Every bound is optional; `None` imposes no
/// constraint on that side. Inverted bounds are not validated and simply
/// yield an empty curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimBounds {
    #[serde(default)]
    pub x_min: Option<f64>,
    #[serde(default)]
    pub x_max: Option<f64>,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default)]
    pub y_max: Option<f64>,
}

impl TrimBounds {
    pub fn x_range(x_min: f64, x_max: f64) -> Self {
        Self {
            x_min: Some(x_min),
            x_max: Some(x_max),
            ..Default::default()
        }
    }

    /// Whether no bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.x_min.is_none() && self.x_max.is_none() && self.y_min.is_none() && self.y_max.is_none()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min.map_or(true, |lo| x >= lo)
            && self.x_max.map_or(true, |hi| x <= hi)
            && self.y_min.map_or(true, |lo| y >= lo)
            && self.y_max.map_or(true, |hi| y <= hi)
    }
}

/// Keep only the points of `curve` inside `bounds`.
pub fn trim(curve: &Curve, bounds: &TrimBounds) -> Curve {
    curve.retain_points(|x, y| bounds.contains(x, y))
}

// ---------------------------------------------------------------------------
// Auto-trim to the common domain
// ---------------------------------------------------------------------------

/// `(max of per-curve x minima, min of per-curve x maxima)` over the
/// non-empty curves. `None` when every curve is empty. The result may be
/// inverted (`min > max`) when the domains do not intersect.
pub fn overlap_domain(curves: &CurveCollection) -> Option<(f64, f64)> {
    curves
        .iter()
        .filter_map(Curve::x_range)
        .fold(None, |acc, (lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((a, b)) => Some((f64::max(a, lo), f64::min(b, hi))),
        })
}

/// Trim every curve to the collection's overlap domain.
///
/// Curves that are empty do not take part in the overlap computation but are
/// trimmed with the same bounds. An empty collection is returned unchanged.
pub fn auto_trim(curves: &CurveCollection) -> CurveCollection {
    let Some((lo, hi)) = overlap_domain(curves) else {
        return curves.clone();
    };
    let bounds = TrimBounds::x_range(lo, hi);
    curves.iter().map(|c| trim(c, &bounds)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(name: &str, lo: f64, hi: f64) -> Curve {
        let x: Vec<f64> = (0..=((hi - lo) as usize)).map(|i| lo + i as f64).collect();
        let y = x.iter().map(|v| v * 2.0).collect();
        Curve::new(name, x, y)
    }

    #[test]
    fn test_explicit_trim_inclusive() {
        let c = ramp("a", 0.0, 10.0);
        let t = trim(&c, &TrimBounds::x_range(2.0, 4.0));
        assert_eq!(t.x, vec![2.0, 3.0, 4.0]);
        assert_eq!(t.y, vec![4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_trim_by_y_only() {
        let c = ramp("a", 0.0, 10.0);
        let bounds = TrimBounds {
            y_max: Some(5.0),
            ..Default::default()
        };
        assert_eq!(trim(&c, &bounds).x, vec![0.0, 1.0, 2.0]);
        assert_eq!(trim(&c, &TrimBounds::default()), c);
    }

    #[test]
    fn test_inverted_bounds_give_empty_curve() {
        let c = ramp("a", 0.0, 10.0);
        assert!(trim(&c, &TrimBounds::x_range(8.0, 2.0)).is_empty());
    }

    #[test]
    fn test_overlap_of_three_domains() {
        let curves = CurveCollection::new(vec![
            ramp("a", 0.0, 10.0),
            ramp("b", 2.0, 12.0),
            ramp("c", 1.0, 9.0),
        ]);
        assert_eq!(overlap_domain(&curves), Some((2.0, 9.0)));
        let trimmed = auto_trim(&curves);
        for c in &trimmed {
            assert_eq!(c.x_range(), Some((2.0, 9.0)));
        }
    }

    #[test]
    fn test_auto_trim_is_idempotent() {
        let curves = CurveCollection::new(vec![
            ramp("a", 0.0, 10.0),
            ramp("b", 3.0, 15.0),
            Curve::new("empty", vec![], vec![]),
        ]);
        let once = auto_trim(&curves);
        let twice = auto_trim(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
        assert!(once.curves[2].is_empty());
    }

    #[test]
    fn test_auto_trim_empty_collection_is_noop() {
        let empty = CurveCollection::default();
        assert_eq!(auto_trim(&empty), empty);
        assert_eq!(overlap_domain(&empty), None);
    }
}
