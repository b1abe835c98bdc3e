use serde::{Deserialize, Serialize};

use super::model::{Curve, CurveCollection};
use crate::error::{PipelineError, Result};

/// Response normalization contract, always chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `y / max(y)`: the maximum becomes 1 and the offset from zero (e.g.
    /// residual mass fraction) is kept.
    RatioToMax,
    /// `(y - min) / (max - min)`: the curve spans exactly `[0, 1]`.
    MinMax,
    /// Leave the response untouched.
    #[default]
    None,
}

impl Normalization {
    pub fn label(self) -> &'static str {
        match self {
            Normalization::RatioToMax => "ratio-to-max",
            Normalization::MinMax => "min-max",
            Normalization::None => "none",
        }
    }
}

/// Divide every y by the curve's own maximum.
pub fn normalize_ratio_to_max(curve: &Curve) -> Result<Curve> {
    let Some((_, max)) = curve.y_range() else {
        return Ok(curve.clone());
    };
    if max == 0.0 {
        return Err(constant(curve, Normalization::RatioToMax));
    }
    checked(curve.map_y(|v| v / max), Normalization::RatioToMax)
}

/// Rescale y to `[0, 1]`.
pub fn normalize_min_max(curve: &Curve) -> Result<Curve> {
    let Some((min, max)) = curve.y_range() else {
        return Ok(curve.clone());
    };
    let range = max - min;
    if range == 0.0 {
        return Err(constant(curve, Normalization::MinMax));
    }
    checked(curve.map_y(|v| (v - min) / range), Normalization::MinMax)
}

/// Apply `contract` to one curve. Constant curves are a hard error; empty
/// curves pass through unchanged.
pub fn normalize(curve: &Curve, contract: Normalization) -> Result<Curve> {
    match contract {
        Normalization::RatioToMax => normalize_ratio_to_max(curve),
        Normalization::MinMax => normalize_min_max(curve),
        Normalization::None => Ok(curve.clone()),
    }
}

/// Apply `contract` to every curve; the first failure aborts.
pub fn normalize_all(curves: &CurveCollection, contract: Normalization) -> Result<CurveCollection> {
    curves
        .iter()
        .map(|c| normalize(c, contract))
        .collect::<Result<Vec<_>>>()
        .map(CurveCollection::new)
}

fn constant(curve: &Curve, contract: Normalization) -> PipelineError {
    PipelineError::ConstantCurve {
        sample: curve.sample.clone(),
        contract: contract.label(),
    }
}

// Overflow on extreme inputs (e.g. a tiny max) must not leak non-finite values.
fn checked(curve: Curve, contract: Normalization) -> Result<Curve> {
    if curve.y.iter().all(|v| v.is_finite()) {
        Ok(curve)
    } else {
        Err(PipelineError::NonFiniteResult {
            sample: curve.sample,
            contract: contract.label(),
        })
    }
}
