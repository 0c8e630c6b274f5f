//! Preprocessing and categorical-association core for hospital admission
//! (AIH) billing records joined with municipality reference data.

pub mod associate;
pub mod cache;
pub mod config;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod process;
pub mod summary;

pub use associate::{associate, AssociationMatrix};
pub use cache::{Cache, CacheStats, CacheStore, Fingerprint};
pub use config::PipelineConfig;
pub use error::{AihError, Result};
pub use load::{load, RawTable, Source};
pub use pipeline::{MissingInput, Pipeline, PipelineOutcome, PipelineStats, TableRole};
pub use process::{process, process_with, ProcessOptions, ProcessedDataset};
