use std::collections::HashMap;
use tracing::warn;

use super::utils::clean_cell;
use crate::error::{AihError, Result};
use crate::load::RawTable;

pub const JOIN_KEY_LEN: usize = 6;

/// First six characters of the code's string form. Blank codes have no key.
pub fn join_key(code: &str) -> Option<String> {
    clean_cell(code).map(|c| c.chars().take(JOIN_KEY_LEN).collect())
}

/// Join key → reference row. A key seen twice breaks the many-to-one contract.
pub fn index_reference(reference: &RawTable, code_idx: usize) -> Result<HashMap<String, usize>> {
    let keys: Vec<Option<String>> = reference.column(code_idx).map(join_key).collect();
    let mut index = HashMap::with_capacity(keys.len());
    for (row, key) in keys.iter().enumerate() {
        let Some(key) = key else { continue };
        if index.insert(key.clone(), row).is_some() {
            let occurrences = keys.iter().filter(|k| k.as_ref() == Some(key)).count();
            return Err(AihError::MergeCardinalityViolation {
                key: key.clone(),
                occurrences,
            });
        }
    }
    Ok(index)
}

/// For every left key, the matching reference row (left-outer).
pub fn match_rows(keys: &[Option<String>], index: &HashMap<String, usize>) -> Vec<Option<usize>> {
    let matches: Vec<Option<usize>> = keys
        .iter()
        .map(|k| k.as_ref().and_then(|k| index.get(k).copied()))
        .collect();
    let unmatched = matches.iter().filter(|m| m.is_none()).count();
    if unmatched > 0 {
        warn!(unmatched, total = keys.len(), "admission rows without a reference match");
    }
    matches
}
