use serde::Serialize;

/// Square, symmetric table of pairwise association strengths, indexed by
/// column name. The diagonal is exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl AssociationMatrix {
    /// Identity matrix over `columns`; off-diagonal cells start at 0.
    pub(crate) fn identity(columns: Vec<String>) -> Self {
        let n = columns.len();
        let values = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { columns, values }
    }

    /// Set `(i, j)` and `(j, i)` together. Diagonal cells stay at 1.
    pub(crate) fn set_pair(&mut self, i: usize, j: usize, v: f64) {
        if i == j {
            return;
        }
        self.values[i][j] = v;
        self.values[j][i] = v;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[self.index_of(a)?][self.index_of(b)?])
    }
}
