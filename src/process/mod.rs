// src/process/mod.rs
pub mod columns;
pub mod convert;
pub mod date_parser;
pub mod join;
pub mod scale;
pub mod utils;

use arrow::{
    array::{ArrayRef, Date32Array},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument};

use crate::cache::Fingerprint;
use crate::error::{AihError, Result};
use crate::load::RawTable;
use convert::{build_column, categorical_array};

/// Knobs of the preprocessing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOptions {
    /// Upper bound of `value_scaled` / `count_scaled`.
    pub scale_ceiling: f64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            scale_ceiling: 30_000.0,
        }
    }
}

/// Admissions left-joined with the municipality reference, typed and
/// enriched with the derived columns.
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    batch: RecordBatch,
    fingerprint: Fingerprint,
}

impl ProcessedDataset {
    pub(crate) fn new(batch: RecordBatch, fingerprint: Fingerprint) -> Self {
        Self { batch, fingerprint }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Identity of the inputs this dataset was derived from.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }
}

/// Cache key for `process_with` over these inputs.
pub fn process_key(admissions: &RawTable, reference: &RawTable, opts: &ProcessOptions) -> Fingerprint {
    Fingerprint::builder("process")
        .fingerprint(&admissions.fingerprint())
        .fingerprint(&reference.fingerprint())
        .number(opts.scale_ceiling)
        .finish()
}

pub fn process(admissions: &RawTable, reference: &RawTable) -> Result<ProcessedDataset> {
    process_with(admissions, reference, &ProcessOptions::default())
}

/// Merge admissions with the reference table on the 6-character municipality
/// key (many-to-one, left-outer), derive `admission_date`, dictionary-encode
/// text columns and add the scaled bubble-size columns.
#[instrument(
    level = "info",
    skip_all,
    fields(admissions = %admissions.origin, reference = %reference.origin)
)]
pub fn process_with(
    admissions: &RawTable,
    reference: &RawTable,
    opts: &ProcessOptions,
) -> Result<ProcessedDataset> {
    let adm_code = require(admissions, columns::ADMISSION_CODE)?;
    let ref_code = require(reference, columns::REFERENCE_CODE)?;
    let year_idx = require(admissions, columns::YEAR)?;
    let month_idx = require(admissions, columns::MONTH)?;

    // 1) join keys + many-to-one index
    let keys: Vec<Option<String>> = admissions.column(adm_code).map(join::join_key).collect();
    let index = join::index_reference(reference, ref_code)?;
    let matches = join::match_rows(&keys, &index);

    // 2) admission dates
    let mut dates = Vec::with_capacity(admissions.len());
    for (row, r) in admissions.rows.iter().enumerate() {
        let year = r.get(year_idx).map(String::as_str).unwrap_or("");
        let month = r.get(month_idx).map(String::as_str).unwrap_or("");
        let date = date_parser::first_of_month(year, month)
            .map_err(|reason| AihError::DateDerivationError { row, reason })?;
        dates.push(date_parser::to_date32(date));
    }

    // 3) merged columns, typed
    let shared: HashSet<&str> = admissions
        .headers
        .iter()
        .filter(|h| reference.headers.contains(*h))
        .map(String::as_str)
        .collect();

    let mut fields: Vec<Field> = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    let mut push = |(field, array): (Field, ArrayRef)| {
        fields.push(field);
        arrays.push(array);
    };

    for (j, name) in admissions.headers.iter().enumerate() {
        let cells: Vec<Option<&str>> = admissions.column(j).map(Some).collect();
        push(build_column(&suffixed(name, &shared, columns::LEFT_SUFFIX), &cells));
    }

    push((
        Field::new(columns::ADMISSION_DATE, DataType::Date32, false),
        Arc::new(Date32Array::from(dates)),
    ));
    let key_cells: Vec<Option<&str>> = keys.iter().map(|k| k.as_deref()).collect();
    push((
        Field::new(columns::JOIN_KEY, convert::categorical_type(), true),
        categorical_array(&key_cells),
    ));

    for (j, name) in reference.headers.iter().enumerate() {
        let cells: Vec<Option<&str>> = matches
            .iter()
            .map(|m| m.and_then(|r| reference.rows[r].get(j).map(String::as_str)))
            .collect();
        push(build_column(&suffixed(name, &shared, columns::RIGHT_SUFFIX), &cells));
    }

    // 4) bubble sizes
    let value_scaled = scale::scale_to_ceiling(
        columns::VALUE_TOTAL,
        find_array(&fields, &arrays, columns::VALUE_TOTAL),
        opts.scale_ceiling,
    )?;
    let count_scaled = scale::scale_to_ceiling(
        columns::COUNT_TOTAL,
        find_array(&fields, &arrays, columns::COUNT_TOTAL),
        opts.scale_ceiling,
    )?;
    fields.push(Field::new(columns::VALUE_SCALED, DataType::Float64, true));
    arrays.push(Arc::new(value_scaled));
    fields.push(Field::new(columns::COUNT_SCALED, DataType::Float64, true));
    arrays.push(Arc::new(count_scaled));

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        matched = matches.iter().filter(|m| m.is_some()).count(),
        "processed dataset"
    );

    Ok(ProcessedDataset::new(
        batch,
        process_key(admissions, reference, opts),
    ))
}

fn require(table: &RawTable, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| AihError::MissingColumn {
            table: table.origin.clone(),
            column: column.to_string(),
        })
}

fn find_array<'a>(fields: &[Field], arrays: &'a [ArrayRef], name: &str) -> Option<&'a ArrayRef> {
    fields
        .iter()
        .position(|f| f.name() == name)
        .map(|i| &arrays[i])
}

fn suffixed(name: &str, shared: &HashSet<&str>, suffix: &str) -> String {
    if shared.contains(name) || columns::DERIVED.contains(&name) {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}
