// src/config.rs

use serde::{Deserialize, Deserializer};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{AihError, Result};

/// Where one input table lives and how its fields are separated.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSourceConfig {
    pub path: PathBuf,
    pub separator: char,
}

impl TableSourceConfig {
    pub fn admissions_default() -> Self {
        Self {
            path: PathBuf::from("dados_corrigidos.csv"),
            separator: ';',
        }
    }

    pub fn reference_default() -> Self {
        Self {
            path: PathBuf::from("municipios.csv"),
            separator: ',',
        }
    }
}

/// A table section as written; absent keys take the role's default.
#[derive(Deserialize)]
struct TableSourceSection {
    path: Option<PathBuf>,
    separator: Option<char>,
}

impl TableSourceSection {
    fn resolve(self, defaults: TableSourceConfig) -> TableSourceConfig {
        TableSourceConfig {
            path: self.path.unwrap_or(defaults.path),
            separator: self.separator.unwrap_or(defaults.separator),
        }
    }
}

fn admissions_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<TableSourceConfig, D::Error> {
    Ok(TableSourceSection::deserialize(d)?.resolve(TableSourceConfig::admissions_default()))
}

fn reference_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<TableSourceConfig, D::Error> {
    Ok(TableSourceSection::deserialize(d)?.resolve(TableSourceConfig::reference_default()))
}

/// Pipeline settings. Every field is optional in the YAML file, including the
/// keys inside each table section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(deserialize_with = "admissions_section")]
    pub admissions: TableSourceConfig,
    #[serde(deserialize_with = "reference_section")]
    pub reference: TableSourceConfig,
    /// Upper bound of the bubble-size scaling range.
    pub scale_ceiling: f64,
    /// Maximum cached entries per stage; `None` keeps everything.
    pub cache_capacity: Option<usize>,
    /// Default selection for association when the caller gives none.
    pub association_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            admissions: TableSourceConfig::admissions_default(),
            reference: TableSourceConfig::reference_default(),
            scale_ceiling: 30_000.0,
            cache_capacity: None,
            association_columns: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document. Missing keys take their default values.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_yaml::from_str(text).map_err(|e| AihError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| AihError::Config(format!("reading {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded pipeline config");
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if !(self.scale_ceiling.is_finite() && self.scale_ceiling > 0.0) {
            return Err(AihError::Config(format!(
                "scale_ceiling must be a positive number, got {}",
                self.scale_ceiling
            )));
        }
        if self.cache_capacity == Some(0) {
            return Err(AihError::Config("cache_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
