//! dialogsense Core
//!
//! Types and plumbing shared across dialogsense components.
//!
//! This crate provides:
//! - Error types and result handling
//! - The analysis configuration loaded from INI files
//! - Dialogue dataset loading (JSON, JSON Lines, CSV, plain text)
//! - Classification result types and their serialization

pub mod config;
pub mod dataset;
pub mod error;
pub mod types;
pub mod writer;

pub use config::{AnalysisConfig, InferenceOptions};
pub use dataset::{load_dataset, Dataset, DatasetFormat};
pub use error::{Error, Result};
pub use types::{ClassificationOutput, DialogueRecord, ResultEntry};
pub use writer::{write_results, OutputFormat};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, InferenceOptions};
    pub use crate::dataset::Dataset;
    pub use crate::error::{Error, Result};
    pub use crate::types::{ClassificationOutput, DialogueRecord, ResultEntry};
}
