use arrow::{
    array::{
        Array, ArrayRef, DictionaryArray, Float64Array, Int64Array, StringArray,
        StringDictionaryBuilder,
    },
    datatypes::{DataType, Field, Int32Type},
};
use std::sync::Arc;

use super::utils::clean_cell;

/// Storage type inferred for a column of raw text cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    /// Anything non-numeric; stored as a dictionary-encoded categorical.
    Categorical,
}

/// Arrow type of categorical columns.
pub fn categorical_type() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

pub fn is_categorical(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Dictionary(_, v) if v.as_ref() == &DataType::Utf8)
}

/// Look at every non-empty cell: all integers → Integer, all numbers → Float,
/// otherwise Categorical. A column with no values at all is Float (all null).
pub fn infer_kind<'a, I>(cells: I) -> ColumnKind
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut kind = None;
    for cell in cells.into_iter().flatten().filter_map(clean_cell) {
        let this = if cell.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else {
            return ColumnKind::Categorical;
        };
        kind = match (kind, this) {
            (Some(ColumnKind::Float), _) | (_, ColumnKind::Float) => Some(ColumnKind::Float),
            _ => Some(ColumnKind::Integer),
        };
    }
    kind.unwrap_or(ColumnKind::Float)
}

/// Type a column of raw cells into an Arrow field + array.
pub fn build_column(name: &str, cells: &[Option<&str>]) -> (Field, ArrayRef) {
    let cleaned: Vec<Option<&str>> = cells.iter().map(|c| c.and_then(clean_cell)).collect();
    match infer_kind(cleaned.iter().copied()) {
        ColumnKind::Integer => {
            let arr: Int64Array = cleaned
                .iter()
                .map(|c| c.and_then(|s| s.parse::<i64>().ok()))
                .collect();
            (Field::new(name, DataType::Int64, true), Arc::new(arr))
        }
        ColumnKind::Float => {
            let arr: Float64Array = cleaned
                .iter()
                .map(|c| c.and_then(|s| s.parse::<f64>().ok()))
                .collect();
            (Field::new(name, DataType::Float64, true), Arc::new(arr))
        }
        ColumnKind::Categorical => (
            Field::new(name, categorical_type(), true),
            categorical_array(&cleaned),
        ),
    }
}

/// Dictionary-encode text cells; each distinct label gets one key.
pub fn categorical_array(cells: &[Option<&str>]) -> ArrayRef {
    let mut builder = StringDictionaryBuilder::<Int32Type>::new();
    for cell in cells {
        match cell {
            Some(v) => {
                builder.append_value(v);
            }
            None => builder.append_null(),
        }
    }
    Arc::new(builder.finish())
}

/// Label of a categorical cell; `None` for nulls or non-categorical arrays.
pub fn label_at(array: &ArrayRef, row: usize) -> Option<&str> {
    let dict = array.as_any().downcast_ref::<DictionaryArray<Int32Type>>()?;
    if dict.is_null(row) {
        return None;
    }
    let labels = dict.values().as_any().downcast_ref::<StringArray>()?;
    let key = usize::try_from(dict.keys().value(row)).ok()?;
    (key < labels.len()).then(|| labels.value(key))
}
