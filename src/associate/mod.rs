// src/associate/mod.rs
pub mod contingency;
pub mod cramers;
pub mod matrix;

use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::cache::Fingerprint;
use crate::error::{AihError, Result};
use crate::process::{convert::is_categorical, ProcessedDataset};
use contingency::{category_codes, ContingencyTable};
pub use matrix::AssociationMatrix;

/// Selected columns in first-seen order, duplicates removed.
fn distinct_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Cache key for `associate`: the dataset identity plus the column set,
/// independent of selection order.
pub fn association_key<S: AsRef<str>>(dataset: &ProcessedDataset, columns: &[S]) -> Fingerprint {
    let mut cols = distinct_columns(columns);
    cols.sort();
    Fingerprint::builder("associate")
        .fingerprint(&dataset.fingerprint())
        .field_list(&cols)
        .finish()
}

/// Bias-corrected Cramér's V for every pair of the selected categorical
/// columns. Pairs are computed in parallel; each writes its own cell.
#[instrument(level = "info", skip_all, fields(columns = columns.len()))]
pub fn associate<S: AsRef<str>>(dataset: &ProcessedDataset, columns: &[S]) -> Result<AssociationMatrix> {
    let names = distinct_columns(columns);
    if names.len() < 2 {
        return Err(AihError::InsufficientColumns {
            requested: names.len(),
        });
    }

    let schema = dataset.schema();
    let mut codes = Vec::with_capacity(names.len());
    for name in &names {
        let field = schema
            .field_with_name(name)
            .map_err(|_| AihError::UnknownColumn(name.clone()))?;
        if !is_categorical(field.data_type()) {
            return Err(AihError::NotCategorical(name.clone()));
        }
        let array = dataset
            .column(name)
            .ok_or_else(|| AihError::UnknownColumn(name.clone()))?;
        let column_codes =
            category_codes(array).ok_or_else(|| AihError::NotCategorical(name.clone()))?;
        codes.push(column_codes);
    }

    let pairs: Vec<(usize, usize)> = (0..names.len())
        .flat_map(|i| (i + 1..names.len()).map(move |j| (i, j)))
        .collect();

    let coefficients: Vec<(usize, usize, f64)> = pairs
        .into_par_iter()
        .map(|(i, j)| {
            let table = ContingencyTable::from_codes(&codes[i], &codes[j]);
            let v = cramers::cramers_v(&table);
            debug!(a = %names[i], b = %names[j], shape = ?table.shape(), n = table.total(), v, "pair");
            (i, j, v)
        })
        .collect();

    let mut matrix = AssociationMatrix::identity(names);
    for (i, j, v) in coefficients {
        matrix.set_pair(i, j, v);
    }
    info!(columns = matrix.len(), "association matrix ready");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessedDataset;
    use crate::test_util::{admissions, init_test_logging, reference};
    use anyhow::Result;
    use arrow::{
        array::{ArrayRef, Int64Array},
        datatypes::{DataType, Field, Schema},
        record_batch::RecordBatch,
    };
    use std::sync::Arc;

    fn categorical_dataset(cols: &[(&str, Vec<String>)]) -> ProcessedDataset {
        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        for (name, values) in cols {
            let cells: Vec<Option<&str>> = values.iter().map(|v| Some(v.as_str())).collect();
            fields.push(Field::new(*name, crate::process::convert::categorical_type(), true));
            arrays.push(crate::process::convert::categorical_array(&cells));
        }
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();
        ProcessedDataset::new(batch, Fingerprint::builder("fixture").finish())
    }

    fn assert_well_formed(m: &AssociationMatrix) {
        for i in 0..m.len() {
            assert_eq!(m.values()[i][i], 1.0);
            for j in 0..m.len() {
                let v = m.values()[i][j];
                assert_eq!(v, m.values()[j][i]);
                assert!((0.0..=1.0).contains(&v), "cell ({i},{j}) = {v}");
            }
        }
    }

    #[test]
    fn relabelled_column_has_full_association() -> Result<()> {
        let a: Vec<String> = (0..300).map(|i| format!("a{}", i % 5)).collect();
        let b: Vec<String> = (0..300).map(|i| format!("label-{}", (i % 5) * 7)).collect();
        let ds = categorical_dataset(&[("a", a), ("b", b)]);
        let m = associate(&ds, &["a", "b"])?;
        assert_well_formed(&m);
        assert!((m.get("a", "b").unwrap() - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn independent_columns_are_near_zero() -> Result<()> {
        // every (a, b) combination occurs equally often
        let a: Vec<String> = (0..1200).map(|i| format!("a{}", i % 3)).collect();
        let b: Vec<String> = (0..1200).map(|i| format!("b{}", (i / 3) % 4)).collect();
        let ds = categorical_dataset(&[("a", a), ("b", b)]);
        let m = associate(&ds, &["a", "b"])?;
        assert!(m.get("a", "b").unwrap() < 1e-6);
        Ok(())
    }

    #[test]
    fn pseudo_random_independence_is_small() -> Result<()> {
        // linear congruential draws, independent of the row's `a` label
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) % 4
        };
        let a: Vec<String> = (0..20_000).map(|i| format!("a{}", i % 3)).collect();
        let b: Vec<String> = (0..20_000).map(|_| format!("b{}", next())).collect();
        let ds = categorical_dataset(&[("a", a), ("b", b)]);
        let m = associate(&ds, &["a", "b"])?;
        assert!(m.get("a", "b").unwrap() < 0.05);
        Ok(())
    }

    #[test]
    fn one_column_is_insufficient() {
        let ds = categorical_dataset(&[("a", vec!["x".into(), "y".into()])]);
        let err = associate(&ds, &["a"]).unwrap_err();
        assert!(matches!(err, AihError::InsufficientColumns { requested: 1 }));
        let err = associate(&ds, &["a", "a"]).unwrap_err();
        assert!(matches!(err, AihError::InsufficientColumns { requested: 1 }));
    }

    #[test]
    fn rejects_unknown_and_numeric_columns() -> Result<()> {
        let ds = crate::process::process(&admissions(), &reference())?;
        assert!(matches!(
            associate(&ds, &["uf", "nope"]).unwrap_err(),
            AihError::UnknownColumn(c) if c == "nope"
        ));
        assert!(matches!(
            associate(&ds, &["uf", "vl_total"]).unwrap_err(),
            AihError::NotCategorical(c) if c == "vl_total"
        ));
        Ok(())
    }

    #[test]
    fn processed_dataset_matrix_is_well_formed() -> Result<()> {
        init_test_logging();
        let ds = crate::process::process(&admissions(), &reference())?;
        let m = associate(&ds, &["uf", "carater", "cod6", "nome_municipio"])?;
        assert_eq!(m.columns(), &["uf", "carater", "cod6", "nome_municipio"]);
        assert_well_formed(&m);
        Ok(())
    }

    #[test]
    fn key_ignores_selection_order() -> Result<()> {
        let ds = categorical_dataset(&[("a", vec!["x".into()]), ("b", vec!["y".into()])]);
        assert_eq!(association_key(&ds, &["a", "b"]), association_key(&ds, &["b", "a", "b"]));
        assert_ne!(association_key(&ds, &["a", "b"]), association_key(&ds, &["a"]));
        Ok(())
    }

    #[test]
    fn numeric_only_dataset_has_no_categories() {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("x", DataType::Int64, true),
                Field::new("y", DataType::Int64, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(Int64Array::from(vec![3, 4])) as ArrayRef,
            ],
        )
        .unwrap();
        let ds = ProcessedDataset::new(batch, Fingerprint::builder("fixture").finish());
        assert!(matches!(
            associate(&ds, &["x", "y"]).unwrap_err(),
            AihError::NotCategorical(_)
        ));
    }
}
