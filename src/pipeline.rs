// src/pipeline.rs
//! Load → process → associate, with every stage memoized on its inputs.

use serde::Serialize;
use std::{fmt, path::PathBuf, sync::Arc};
use tracing::{info, instrument, warn};

use crate::associate::{self, association_key, AssociationMatrix};
use crate::cache::{BoundedStore, Cache, CacheStats, CacheStore, MemoryStore};
use crate::config::PipelineConfig;
use crate::error::{AihError, Result};
use crate::load::{load, RawTable, Source};
use crate::process::{process_key, process_with, ProcessOptions, ProcessedDataset};
use crate::summary::{self, NumericSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableRole {
    Admissions,
    Reference,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admissions => f.write_str("admissions"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// An input table that has not been provided yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingInput {
    pub role: TableRole,
    pub path: PathBuf,
}

/// Either a result, or the list of inputs still needed to produce it.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome<T> {
    Ready(T),
    AwaitingInput(Vec<MissingInput>),
}

impl<T> PipelineOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::AwaitingInput(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub processed: CacheStats,
    pub matrices: CacheStats,
}

pub struct Pipeline {
    config: PipelineConfig,
    processed: Cache<ProcessedDataset>,
    matrices: Cache<AssociationMatrix>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        match config.cache_capacity {
            Some(capacity) => Self::with_stores(
                config,
                Box::new(BoundedStore::new(capacity)),
                Box::new(BoundedStore::new(capacity)),
            ),
            None => Self::with_stores(
                config,
                Box::new(MemoryStore::new()),
                Box::new(MemoryStore::new()),
            ),
        }
    }

    pub fn with_stores(
        config: PipelineConfig,
        processed_store: Box<dyn CacheStore<ProcessedDataset>>,
        matrix_store: Box<dyn CacheStore<AssociationMatrix>>,
    ) -> Self {
        Self {
            config,
            processed: Cache::with_store("processed", processed_store),
            matrices: Cache::with_store("associations", matrix_store),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both tables and produce the processed dataset. Absent sources are
    /// reported together instead of failing on the first one.
    #[instrument(level = "info", skip_all, fields(admissions = %admissions.name(), reference = %reference.name()))]
    pub fn prepare(
        &self,
        admissions: Source,
        reference: Source,
    ) -> Result<PipelineOutcome<Arc<ProcessedDataset>>> {
        let mut missing = Vec::new();
        let adm = self.load_role(TableRole::Admissions, admissions, &mut missing)?;
        let refs = self.load_role(TableRole::Reference, reference, &mut missing)?;

        let (Some(adm), Some(refs)) = (adm, refs) else {
            warn!(missing = missing.len(), "awaiting input tables");
            return Ok(PipelineOutcome::AwaitingInput(missing));
        };

        let opts = ProcessOptions {
            scale_ceiling: self.config.scale_ceiling,
        };
        let key = process_key(&adm, &refs, &opts);
        let dataset = self
            .processed
            .memoize(&key, || process_with(&adm, &refs, &opts))?;
        info!(rows = dataset.num_rows(), key = %key, "dataset ready");
        Ok(PipelineOutcome::Ready(dataset))
    }

    /// `prepare` over the configured file paths.
    pub fn prepare_configured(&self) -> Result<PipelineOutcome<Arc<ProcessedDataset>>> {
        self.prepare(
            Source::path(&self.config.admissions.path),
            Source::path(&self.config.reference.path),
        )
    }

    /// Memoized association matrix. An empty selection falls back to the
    /// configured `association_columns`.
    pub fn associate<S: AsRef<str>>(
        &self,
        dataset: &ProcessedDataset,
        columns: &[S],
    ) -> Result<Arc<AssociationMatrix>> {
        let selection: Vec<String> = if columns.is_empty() {
            self.config.association_columns.clone()
        } else {
            columns.iter().map(|c| c.as_ref().to_string()).collect()
        };
        let key = association_key(dataset, &selection);
        self.matrices
            .memoize(&key, || associate::associate(dataset, &selection))
    }

    pub fn describe<S: AsRef<str>>(
        &self,
        dataset: &ProcessedDataset,
        columns: &[S],
    ) -> Result<Vec<NumericSummary>> {
        summary::describe(dataset, columns)
    }

    pub fn cache_stats(&self) -> PipelineStats {
        PipelineStats {
            processed: self.processed.stats(),
            matrices: self.matrices.stats(),
        }
    }

    fn load_role(
        &self,
        role: TableRole,
        source: Source,
        missing: &mut Vec<MissingInput>,
    ) -> Result<Option<RawTable>> {
        let separator = match role {
            TableRole::Admissions => self.config.admissions.separator,
            TableRole::Reference => self.config.reference.separator,
        };
        match load(source, separator) {
            Ok(table) => Ok(Some(table)),
            Err(AihError::SourceNotFound { path }) => {
                missing.push(MissingInput { role, path });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
