use arrow::array::{ArrayRef, Float64Array};

use super::utils::numeric_values;
use crate::error::{AihError, Result};

/// `raw / max(raw) * ceiling`, nulls preserved.
///
/// The maximum skips nulls and NaN. A missing, non-numeric or all-null column,
/// a negative value, or a zero / non-finite maximum is a `DegenerateScalingError`,
/// so every output lies in `[0, ceiling]`.
pub fn scale_to_ceiling(column: &str, values: Option<&ArrayRef>, ceiling: f64) -> Result<Float64Array> {
    let values = values.ok_or_else(|| AihError::degenerate(column, "column is absent"))?;
    let values =
        numeric_values(values).ok_or_else(|| AihError::degenerate(column, "column is not numeric"))?;

    if let Some(neg) = values.iter().flatten().find(|v| **v < 0.0) {
        return Err(AihError::degenerate(column, format!("negative value {}", neg)));
    }

    let max = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .ok_or_else(|| AihError::degenerate(column, "column has no values"))?;

    if max == 0.0 {
        return Err(AihError::degenerate(column, "maximum is zero"));
    }
    if !max.is_finite() {
        return Err(AihError::degenerate(column, format!("maximum is {}", max)));
    }

    Ok(values
        .iter()
        .map(|v| v.map(|x| x / max * ceiling))
        .collect())
}
