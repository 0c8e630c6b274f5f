use arrow::array::{Array, ArrayRef, DictionaryArray};
use arrow::datatypes::Int32Type;
use std::collections::HashMap;

/// Dictionary keys of a categorical column, `None` where the cell is null.
pub fn category_codes(array: &ArrayRef) -> Option<Vec<Option<i32>>> {
    let dict = array.as_any().downcast_ref::<DictionaryArray<Int32Type>>()?;
    let keys = dict.keys();
    Some(
        (0..dict.len())
            .map(|i| (!dict.is_null(i)).then(|| keys.value(i)))
            .collect(),
    )
}

/// Cross-tabulated co-occurrence counts of two categorical columns.
///
/// Only categories observed in rows where both sides are present get a row or
/// column, so every marginal total is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    counts: Vec<Vec<u64>>,
    row_totals: Vec<u64>,
    col_totals: Vec<u64>,
    total: u64,
}

impl ContingencyTable {
    pub fn from_codes(a: &[Option<i32>], b: &[Option<i32>]) -> Self {
        let mut rows: HashMap<i32, usize> = HashMap::new();
        let mut cols: HashMap<i32, usize> = HashMap::new();
        let mut cells: Vec<(usize, usize)> = Vec::with_capacity(a.len().min(b.len()));

        for (x, y) in a.iter().zip(b) {
            let (Some(x), Some(y)) = (x, y) else { continue };
            let next_r = rows.len();
            let r = *rows.entry(*x).or_insert(next_r);
            let next_c = cols.len();
            let c = *cols.entry(*y).or_insert(next_c);
            cells.push((r, c));
        }

        let mut counts = vec![vec![0u64; cols.len()]; rows.len()];
        for (r, c) in cells {
            counts[r][c] += 1;
        }
        Self::from_counts(counts)
    }

    /// Build from a dense count grid. Empty rows and columns are dropped.
    pub fn from_counts(counts: Vec<Vec<u64>>) -> Self {
        let width = counts.iter().map(Vec::len).max().unwrap_or(0);
        let col_sums: Vec<u64> = (0..width)
            .map(|c| counts.iter().map(|row| row.get(c).copied().unwrap_or(0)).sum())
            .collect();
        let keep_cols: Vec<usize> = (0..width).filter(|&c| col_sums[c] > 0).collect();

        let counts: Vec<Vec<u64>> = counts
            .into_iter()
            .filter(|row| row.iter().any(|&v| v > 0))
            .map(|row| {
                keep_cols
                    .iter()
                    .map(|&c| row.get(c).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        let row_totals: Vec<u64> = counts.iter().map(|r| r.iter().sum()).collect();
        let col_totals: Vec<u64> = keep_cols.iter().map(|&c| col_sums[c]).collect();
        let total = row_totals.iter().sum();
        Self {
            counts,
            row_totals,
            col_totals,
            total,
        }
    }

    /// `(r, k)`: observed categories of the first and second column.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_totals.len(), self.col_totals.len())
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Pearson chi-square statistic of independence (no continuity correction).
    pub fn chi_square(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let n = self.total as f64;
        let mut chi2 = 0.0;
        for (r, row) in self.counts.iter().enumerate() {
            for (c, &observed) in row.iter().enumerate() {
                let expected = self.row_totals[r] as f64 * self.col_totals[c] as f64 / n;
                let diff = observed as f64 - expected;
                chi2 += diff * diff / expected;
            }
        }
        chi2
    }
}
