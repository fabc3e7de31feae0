//! Data-quality detection and suggestion core for datawash.
//!
//! The crate inspects an in-memory table, detects data-quality defects and
//! proposes an ordered, conflict-free list of corrective operations. Actual
//! value transformations are delegated to caller-registered transformers.
//!
//! # Pipeline
//! - [`sampling::SmartSampler`] bounds the work on large tables
//! - [`cache::ComputationCache`] memoizes per-column derived values
//! - [`profiler`] builds the [`models::DatasetProfile`]
//! - [`detectors::DetectorRegistry`] runs the detectors and collects findings
//! - [`suggestions::generate_suggestions`] maps findings to actions
//! - [`parallel`] fans profiling and detection out over a bounded pool
//!
//! [`report::analyze`] wires these together.
//!
//! # Example
//! ```rust
//! use datawash_core::{DetectorRegistry, Table, WashConfig, analyze};
//! use serde_json::json;
//!
//! let table = Table::from_records(&[
//!     json!({"id": 1, "active": "yes"}),
//!     json!({"id": 2, "active": "no"}),
//! ])?;
//! let config = WashConfig::default();
//! let registry = DetectorRegistry::with_defaults(&config.detectors);
//! let report = analyze(&table, &config, &registry);
//! assert!(report.quality_score() <= 100);
//! # Ok::<(), datawash_core::DataWashError>(())
//! ```

pub mod cache;
pub mod config;
pub mod detectors;
pub mod error;
pub mod logging;
pub mod models;
pub mod parallel;
pub mod profiler;
pub mod report;
pub mod sampling;
pub mod suggestions;
pub mod table;
pub mod transform;

// Re-export commonly used types
pub use cache::ComputationCache;
pub use config::{
    ConfigValidationError, DetectorConfig, OutlierMethod, ParallelConfig, SamplingConfig,
    SimilarityConfig, SuggestionConfig, UseCase, WashConfig,
};
pub use detectors::{DetectionContext, Detector, DetectorRegistry};
pub use error::{DataWashError, Result};
pub use models::{
    ColumnProfile, ColumnStatistics, DatasetProfile, Finding, Params, Severity, Suggestion,
    TransformationResult,
};
pub use report::{Report, analyze, quality_score};
pub use sampling::SmartSampler;
pub use suggestions::{generate_suggestions, sort_by_execution_order};
pub use table::{Column, DataType, Table};
pub use transform::{Transformer, TransformerRegistry};
