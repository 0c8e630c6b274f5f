use arrow::{
    array::{Array, BooleanArray, Date32Array},
    compute::filter_record_batch,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::numeric_column;
use crate::cache::Fingerprint;
use crate::error::{AihError, Result};
use crate::process::{
    columns,
    convert::label_at,
    date_parser::from_date32,
    ProcessedDataset,
};

/// Which family of columns an aggregate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    /// Monetary amounts (`vl_*`).
    Value,
    /// Procedure counts (`qtd_*`).
    Count,
}

impl Metric {
    pub fn total_column(self) -> &'static str {
        match self {
            Self::Value => columns::VALUE_TOTAL,
            Self::Count => columns::COUNT_TOTAL,
        }
    }

    pub fn scaled_column(self) -> &'static str {
        match self {
            Self::Value => columns::VALUE_SCALED,
            Self::Count => columns::COUNT_SCALED,
        }
    }

    pub fn series_columns(self) -> Vec<String> {
        match self {
            Self::Value => columns::value_series(),
            Self::Count => columns::count_series(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadlineTotals {
    pub value_total: f64,
    pub count_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub municipality: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub total: Option<f64>,
    pub radius: f64,
}

fn admission_dates(dataset: &ProcessedDataset) -> Result<&Date32Array> {
    dataset
        .column(columns::ADMISSION_DATE)
        .and_then(|a| a.as_any().downcast_ref::<Date32Array>())
        .ok_or_else(|| AihError::UnknownColumn(columns::ADMISSION_DATE.to_string()))
}

fn sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().filter(|v| !v.is_nan()).sum()
}

/// Distinct admission years, ascending.
pub fn available_years(dataset: &ProcessedDataset) -> Result<Vec<i32>> {
    let dates = admission_dates(dataset)?;
    let years: BTreeSet<i32> = dates
        .iter()
        .flatten()
        .filter_map(from_date32)
        .map(|d| d.year())
        .collect();
    Ok(years.into_iter().collect())
}

/// Rows whose admission year is in `years`.
pub fn filter_years(dataset: &ProcessedDataset, years: &[i32]) -> Result<ProcessedDataset> {
    let wanted: BTreeSet<i32> = years.iter().copied().collect();
    let dates = admission_dates(dataset)?;
    let mask: BooleanArray = dates
        .iter()
        .map(|d| Some(d.and_then(from_date32).is_some_and(|d| wanted.contains(&d.year()))))
        .collect();
    let batch = filter_record_batch(dataset.batch(), &mask)?;
    debug!(kept = batch.num_rows(), of = dataset.num_rows(), "filtered by year");

    let year_labels: Vec<String> = wanted.iter().map(i32::to_string).collect();
    let fingerprint = Fingerprint::builder("filter-years")
        .fingerprint(&dataset.fingerprint())
        .field_list(&year_labels)
        .finish();
    Ok(ProcessedDataset::new(batch, fingerprint))
}

pub fn headline_totals(dataset: &ProcessedDataset) -> Result<HeadlineTotals> {
    Ok(HeadlineTotals {
        value_total: sum(&numeric_column(dataset, columns::VALUE_TOTAL)?),
        count_total: sum(&numeric_column(dataset, columns::COUNT_TOTAL)?),
    })
}

/// Sum of each per-procedure series column, largest first. Series columns the
/// dataset does not carry are skipped.
pub fn procedure_totals(dataset: &ProcessedDataset, metric: Metric) -> Result<Vec<(String, f64)>> {
    let mut totals = Vec::new();
    for name in metric.series_columns() {
        if dataset.column(&name).is_none() {
            debug!(column = %name, "series column absent");
            continue;
        }
        let total = sum(&numeric_column(dataset, &name)?);
        totals.push((name, total));
    }
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(totals)
}

/// Metric total per admission month, chronological.
pub fn monthly_totals(dataset: &ProcessedDataset, metric: Metric) -> Result<Vec<MonthlyTotal>> {
    let dates = admission_dates(dataset)?;
    let values = numeric_column(dataset, metric.total_column())?;
    let mut by_month: BTreeMap<i32, f64> = BTreeMap::new();
    for (day, value) in dates.iter().zip(values) {
        let Some(day) = day else { continue };
        let entry = by_month.entry(day).or_insert(0.0);
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            *entry += v;
        }
    }
    Ok(by_month
        .into_iter()
        .filter_map(|(day, total)| from_date32(day).map(|month| MonthlyTotal { month, total }))
        .collect())
}

/// `name`, or the reference-side `name_y` when the merge had to rename it.
fn reference_column(dataset: &ProcessedDataset, name: &str) -> String {
    if dataset.column(name).is_some() {
        return name.to_string();
    }
    let renamed = format!("{}{}", name, columns::RIGHT_SUFFIX);
    if dataset.column(&renamed).is_some() {
        renamed
    } else {
        name.to_string()
    }
}

/// Rows with municipality coordinates and a bubble radius, for the map view.
pub fn map_points(dataset: &ProcessedDataset, metric: Metric) -> Result<Vec<MapPoint>> {
    let lat = numeric_column(dataset, &reference_column(dataset, columns::LATITUDE))?;
    let lon = numeric_column(dataset, &reference_column(dataset, columns::LONGITUDE))?;
    let radii = numeric_column(dataset, metric.scaled_column())?;
    let totals = numeric_column(dataset, metric.total_column())?;
    let names = dataset.column(&reference_column(dataset, columns::MUNICIPALITY_NAME));

    let mut points = Vec::new();
    for row in 0..dataset.num_rows() {
        let (Some(latitude), Some(longitude), Some(radius)) = (lat[row], lon[row], radii[row])
        else {
            continue;
        };
        if latitude.is_nan() || longitude.is_nan() || radius.is_nan() {
            continue;
        }
        points.push(MapPoint {
            municipality: names.and_then(|a| label_at(a, row)).map(str::to_string),
            latitude,
            longitude,
            total: totals[row],
            radius,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{admissions, reference};
    use anyhow::Result;

    fn dataset() -> Result<ProcessedDataset> {
        Ok(crate::process::process(&admissions(), &reference())?)
    }

    #[test]
    fn lists_years() -> Result<()> {
        assert_eq!(available_years(&dataset()?)?, vec![2023, 2024]);
        Ok(())
    }

    #[test]
    fn filters_by_year() -> Result<()> {
        let ds = dataset()?;
        let only_2024 = filter_years(&ds, &[2024])?;
        assert_eq!(only_2024.num_rows(), 2);
        assert_eq!(available_years(&only_2024)?, vec![2024]);
        assert_ne!(only_2024.fingerprint(), ds.fingerprint());
        assert_eq!(filter_years(&ds, &[])?.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn totals_and_series() -> Result<()> {
        let ds = dataset()?;
        let head = headline_totals(&ds)?;
        assert_eq!(head.value_total, 100.0);
        assert_eq!(head.count_total, 10.0);

        let series = procedure_totals(&ds, Metric::Value)?;
        assert_eq!(series, vec![("vl_02".to_string(), 22.0)]);
        Ok(())
    }

    #[test]
    fn monthly_series_is_chronological() -> Result<()> {
        let months = monthly_totals(&dataset()?, Metric::Count)?;
        let labels: Vec<String> = months.iter().map(|m| m.month.format("%Y-%m").to_string()).collect();
        assert_eq!(labels, vec!["2023-01", "2023-02", "2024-03", "2024-12"]);
        assert_eq!(months[3].total, 3.0);
        Ok(())
    }

    #[test]
    fn map_points_skip_unmatched_rows() -> Result<()> {
        let points = map_points(&dataset()?, Metric::Value)?;
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].municipality.as_deref(), Some("Adamantina"));
        assert_eq!(points[2].radius, 30_000.0);
        Ok(())
    }

    #[test]
    fn map_points_use_reference_coordinates_after_rename() -> Result<()> {
        let adm = crate::load::load(
            crate::load::Source::bytes(
                "aih.csv",
                "ano_aih;mes_aih;codigo_municipio;vl_total;qtd_total;latitude;longitude\n\
                 2023;1;350010;5;1;0.5;0.5\n\
                 2023;2;999999;10;2;1.5;1.5\n",
            ),
            ';',
        )?;
        let ds = crate::process::process(&adm, &reference())?;
        assert!(ds.column("latitude_x").is_some());

        let points = map_points(&ds, Metric::Count)?;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].latitude, -21.68);
        assert_eq!(points[0].longitude, -51.07);
        assert_eq!(points[0].municipality.as_deref(), Some("Adamantina"));
        Ok(())
    }
}
