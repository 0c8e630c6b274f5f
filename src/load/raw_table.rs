// src/load/raw_table.rs

use crate::cache::Fingerprint;

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Where the rows came from (a path or an upload name), for error messages.
    pub origin: String,
    /// Column names from the header row, in file order.
    pub headers: Vec<String>,
    /// Each data row, one raw string per header.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of column `idx`, in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(idx).map(String::as_str).unwrap_or(""))
    }

    /// Content digest over headers and cells. The origin is left out so that
    /// byte-identical uploads under different names share a cache entry.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = Fingerprint::builder("raw-table");
        fp.field_list(&self.headers);
        for row in &self.rows {
            fp.field_list(row);
        }
        fp.finish()
    }
}
