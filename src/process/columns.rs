// src/process/columns.rs
//! Column names the pipeline reads or produces.

pub const YEAR: &str = "ano_aih";
pub const MONTH: &str = "mes_aih";
pub const ADMISSION_CODE: &str = "codigo_municipio";
pub const REFERENCE_CODE: &str = "codigo_ibge";
pub const VALUE_TOTAL: &str = "vl_total";
pub const COUNT_TOTAL: &str = "qtd_total";
pub const MUNICIPALITY_NAME: &str = "nome_municipio";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

pub const ADMISSION_DATE: &str = "admission_date";
pub const JOIN_KEY: &str = "cod6";
pub const VALUE_SCALED: &str = "value_scaled";
pub const COUNT_SCALED: &str = "count_scaled";

/// Columns the preprocessor adds. Input columns with these names are suffixed.
pub const DERIVED: [&str; 4] = [ADMISSION_DATE, JOIN_KEY, VALUE_SCALED, COUNT_SCALED];

/// Suffixes for names present in both inputs, or clashing with a derived column.
pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

/// Per-procedure value series, `vl_02..vl_08`.
pub fn value_series() -> Vec<String> {
    (2..=8).map(|i| format!("vl_{:02}", i)).collect()
}

/// Per-procedure count series, `qtd_01..qtd_08`.
pub fn count_series() -> Vec<String> {
    (1..=8).map(|i| format!("qtd_{:02}", i)).collect()
}
