//! Pipeline configuration.
//!
//! Every section deserializes with defaults, so a partial JSON document only
//! needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DataWashError, Result};

/// Names of the built-in detectors, in registration order.
pub const DEFAULT_DETECTORS: [&str; 6] = [
    "missing",
    "duplicates",
    "types",
    "formats",
    "outliers",
    "similarity",
];

/// Validation errors for pipeline configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("outlier_threshold must be positive, got {0}")]
    InvalidOutlierThreshold(f64),
    #[error("stratification range [{min}, {max}] is empty")]
    InvalidStratificationRange { min: usize, max: usize },
    #[error("signature_length {signature_length} is not divisible by bands {bands}")]
    BandMismatch {
        signature_length: usize,
        bands: usize,
    },
}

fn check_unit(field: &'static str, value: f64) -> std::result::Result<(), ConfigValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigValidationError::OutOfUnitRange { field, value })
    }
}

fn check_nonzero(field: &'static str, value: usize) -> std::result::Result<(), ConfigValidationError> {
    if value == 0 {
        Err(ConfigValidationError::Zero { field })
    } else {
        Ok(())
    }
}

fn clamp_unit(field: &str, value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0.0, 1.0]", field, value);
    }
    value.clamp(0.0, 1.0)
}

fn at_least_one(field: &str, value: usize) -> usize {
    if value == 0 {
        tracing::warn!("{} 0 raised to minimum of 1", field);
        1
    } else {
        value
    }
}

/// Sampling settings for large tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Tables with more rows than this are sampled
    pub threshold: usize,
    /// Target number of rows in the sample
    pub target_size: usize,
    /// Seed for every random draw
    pub seed: u64,
    /// Share of the target reserved for null-bearing rows
    pub null_row_share: f64,
    /// Smallest distinct-value count of a stratification column
    pub min_strata: usize,
    /// Largest distinct-value count of a stratification column
    pub max_strata: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            threshold: 50_000,
            target_size: 10_000,
            seed: 42,
            null_row_share: 0.1,
            min_strata: 2,
            max_strata: 20,
        }
    }
}

impl SamplingConfig {
    /// Builder method to set the sampling threshold.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builder method to set the target sample size.
    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = at_least_one("target_size", target_size);
        self
    }

    /// Builder method to set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the null-row share.
    pub fn with_null_row_share(mut self, share: f64) -> Self {
        self.null_row_share = clamp_unit("null_row_share", share);
        self
    }

    /// Maximum number of null-bearing rows kept in a sample.
    pub fn null_row_cap(&self) -> usize {
        (self.target_size as f64 * self.null_row_share).floor() as usize
    }
}

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Values outside `[q1 - k*iqr, q3 + k*iqr]`
    #[default]
    Iqr,
    /// Values whose absolute z-score exceeds the threshold
    Zscore,
}

impl OutlierMethod {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::Zscore => "zscore",
        }
    }
}

/// Tuning of the similar-columns detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Character n-gram size for name blocking
    pub ngram_size: usize,
    /// Shared n-grams needed for a name candidate
    pub min_shared_ngrams: usize,
    /// MinHash signature length
    pub signature_length: usize,
    /// LSH band count; must divide `signature_length`
    pub bands: usize,
    /// Buckets larger than this are skipped
    pub max_bucket_size: usize,
    /// Columns with more unique values are not compared by value
    pub max_unique_values: usize,
    /// Cap on pairs passed to exact verification
    pub max_candidates: usize,
    /// Jaccard threshold used by the size-ratio filter
    pub value_threshold: f64,
    /// Combined score a pair must exceed to be reported
    pub combined_threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            ngram_size: 2,
            min_shared_ngrams: 2,
            signature_length: 100,
            bands: 20,
            max_bucket_size: 50,
            max_unique_values: 10_000,
            max_candidates: 5_000,
            value_threshold: 0.7,
            combined_threshold: 0.6,
        }
    }
}

impl SimilarityConfig {
    /// Rows per LSH band.
    pub fn rows_per_band(&self) -> usize {
        self.signature_length.checked_div(self.bands).unwrap_or(0)
    }

    /// Builder method to set the Jaccard threshold of the size filter.
    pub fn with_value_threshold(mut self, threshold: f64) -> Self {
        self.value_threshold = clamp_unit("value_threshold", threshold);
        self
    }

    /// Builder method to set the reporting threshold.
    pub fn with_combined_threshold(mut self, threshold: f64) -> Self {
        self.combined_threshold = clamp_unit("combined_threshold", threshold);
        self
    }

    /// Builder method to set the candidate cap.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = at_least_one("max_candidates", max);
        self
    }

    fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        check_nonzero("ngram_size", self.ngram_size)?;
        check_nonzero("signature_length", self.signature_length)?;
        check_nonzero("bands", self.bands)?;
        check_nonzero("max_bucket_size", self.max_bucket_size)?;
        check_nonzero("max_candidates", self.max_candidates)?;
        if self.signature_length % self.bands != 0 {
            return Err(ConfigValidationError::BandMismatch {
                signature_length: self.signature_length,
                bands: self.bands,
            });
        }
        check_unit("value_threshold", self.value_threshold)?;
        check_unit("combined_threshold", self.combined_threshold)?;
        if self.value_threshold == 0.0 {
            return Err(ConfigValidationError::Zero {
                field: "value_threshold",
            });
        }
        Ok(())
    }
}

/// Detector selection and tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detector names to run
    pub enabled: Vec<String>,
    pub outlier_method: OutlierMethod,
    /// IQR multiplier or z-score cutoff, depending on the method
    pub outlier_threshold: f64,
    pub similarity: SimilarityConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_DETECTORS.iter().map(ToString::to_string).collect(),
            outlier_method: OutlierMethod::Iqr,
            outlier_threshold: 1.5,
            similarity: SimilarityConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Builder method to choose which detectors run.
    pub fn with_enabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled = names.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the outlier method.
    pub fn with_outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = method;
        self
    }

    /// Builder method to set the outlier threshold.
    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        if threshold.is_finite() && threshold > 0.0 {
            self.outlier_threshold = threshold;
        } else {
            tracing::warn!(
                "outlier_threshold {} is not positive, keeping {}",
                threshold,
                self.outlier_threshold
            );
        }
        self
    }

    /// Builder method to set the similarity tuning.
    pub fn with_similarity(mut self, similarity: SimilarityConfig) -> Self {
        self.similarity = similarity;
        self
    }
}

/// Use-case profile that boosts suggestion priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    #[default]
    General,
    Ml,
    Analytics,
    Export,
}

impl std::str::FromStr for UseCase {
    type Err = DataWashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "ml" => Ok(Self::Ml),
            "analytics" => Ok(Self::Analytics),
            "export" => Ok(Self::Export),
            other => Err(DataWashError::configuration(format!(
                "Unknown use case '{other}', expected one of general, ml, analytics, export"
            ))),
        }
    }
}

/// Suggestion generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub max_suggestions: usize,
    pub use_case: UseCase,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 50,
            use_case: UseCase::General,
        }
    }
}

impl SuggestionConfig {
    /// Builder method to cap the number of suggestions.
    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = at_least_one("max_suggestions", max);
        self
    }

    /// Builder method to set the use case.
    pub fn with_use_case(mut self, use_case: UseCase) -> Self {
        self.use_case = use_case;
        self
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Upper bound on pool threads
    pub max_workers: usize,
    /// Tables with more columns than this run in parallel
    pub column_threshold: usize,
    /// Tables with more rows than this run in parallel
    pub row_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            column_threshold: 10,
            row_threshold: 10_000,
        }
    }
}

impl ParallelConfig {
    /// Builder method to bound the worker count.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = at_least_one("max_workers", max_workers);
        self
    }

    /// Builder method to set the parallelism thresholds.
    pub fn with_thresholds(mut self, columns: usize, rows: usize) -> Self {
        self.column_threshold = columns;
        self.row_threshold = rows;
        self
    }

    /// Effective worker count: `min(max_workers, available parallelism)`.
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        self.max_workers.min(available).max(1)
    }

    /// True when a table of this shape should be processed in parallel.
    pub fn should_parallelize(&self, row_count: usize, column_count: usize) -> bool {
        column_count > self.column_threshold || row_count > self.row_threshold
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WashConfig {
    pub sampling: SamplingConfig,
    pub detectors: DetectorConfig,
    pub suggestions: SuggestionConfig,
    pub parallel: ParallelConfig,
}

impl WashConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a config from JSON, filling unspecified fields with defaults.
    ///
    /// # Errors
    /// Returns a serialization error for malformed JSON and a configuration
    /// error when the loaded values fail validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DataWashError::serialization("Failed to parse configuration", e))?;
        config
            .validate()
            .map_err(|e| DataWashError::configuration(e.to_string()))?;
        Ok(config)
    }

    /// Builder method to set the sampling section.
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    /// Builder method to set the detector section.
    pub fn with_detectors(mut self, detectors: DetectorConfig) -> Self {
        self.detectors = detectors;
        self
    }

    /// Builder method to set the suggestion section.
    pub fn with_suggestions(mut self, suggestions: SuggestionConfig) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Builder method to set the parallel section.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any threshold is outside its valid range.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        check_nonzero("target_size", self.sampling.target_size)?;
        check_unit("null_row_share", self.sampling.null_row_share)?;
        if self.sampling.min_strata > self.sampling.max_strata {
            return Err(ConfigValidationError::InvalidStratificationRange {
                min: self.sampling.min_strata,
                max: self.sampling.max_strata,
            });
        }
        if !(self.detectors.outlier_threshold.is_finite() && self.detectors.outlier_threshold > 0.0)
        {
            return Err(ConfigValidationError::InvalidOutlierThreshold(
                self.detectors.outlier_threshold,
            ));
        }
        self.detectors.similarity.validate()?;
        check_nonzero("max_suggestions", self.suggestions.max_suggestions)?;
        check_nonzero("max_workers", self.parallel.max_workers)?;
        Ok(())
    }
}
