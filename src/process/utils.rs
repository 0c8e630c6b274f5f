// src/process/utils.rs

use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array},
    datatypes::DataType,
};

/// Trim whitespace; an empty result is a missing value.
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse an integer written either plainly ("2023") or as an integral float ("2023.0").
pub fn parse_integral(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

/// Read an Int64 or Float64 column as optional floats. `None` for any other type.
pub fn numeric_values(array: &ArrayRef) -> Option<Vec<Option<f64>>> {
    match array.data_type() {
        DataType::Float64 => {
            let arr = array.as_any().downcast_ref::<Float64Array>()?;
            Some(arr.iter().collect())
        }
        DataType::Int64 => {
            let arr = array.as_any().downcast_ref::<Int64Array>()?;
            Some(arr.iter().map(|v| v.map(|x| x as f64)).collect())
        }
        _ => None,
    }
}

pub fn is_numeric(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Int64 | DataType::Float64)
}
