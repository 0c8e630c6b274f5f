// src/summary/mod.rs
//! Numeric summaries and the aggregates behind the dashboard views.

pub mod dashboard;
pub mod describe;

use crate::error::{AihError, Result};
use crate::process::{
    convert::is_categorical,
    utils::{is_numeric, numeric_values},
    ProcessedDataset,
};

pub use dashboard::{
    available_years, filter_years, headline_totals, map_points, monthly_totals, procedure_totals,
    HeadlineTotals, MapPoint, Metric, MonthlyTotal,
};
pub use describe::{describe, NumericSummary};

/// Int64 / Float64 columns, in schema order.
pub fn numeric_columns(dataset: &ProcessedDataset) -> Vec<String> {
    dataset
        .schema()
        .fields()
        .iter()
        .filter(|f| is_numeric(f.data_type()))
        .map(|f| f.name().clone())
        .collect()
}

/// Dictionary-encoded text columns, in schema order.
pub fn categorical_columns(dataset: &ProcessedDataset) -> Vec<String> {
    dataset
        .schema()
        .fields()
        .iter()
        .filter(|f| is_categorical(f.data_type()))
        .map(|f| f.name().clone())
        .collect()
}

/// Values of a numeric column as optional floats.
pub(crate) fn numeric_column(dataset: &ProcessedDataset, name: &str) -> Result<Vec<Option<f64>>> {
    let array = dataset
        .column(name)
        .ok_or_else(|| AihError::UnknownColumn(name.to_string()))?;
    numeric_values(array).ok_or_else(|| AihError::NotNumeric(name.to_string()))
}
