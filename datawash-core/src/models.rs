//! Data models shared across the pipeline.
//!
//! Profiles are produced once per profiling pass and never mutated
//! afterwards. Findings are produced by exactly one detector. Suggestions are
//! created by the suggestion engine and consumed by an external apply step.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::table::DataType;

/// Parameter bag handed to a transformer.
pub type Params = Map<String, Value>;

/// Maximum number of row indices a finding carries.
pub const MAX_FINDING_ROWS: usize = 100;

/// Severity of a finding, and priority of a suggestion.
///
/// Ordering follows importance: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or low-impact defect
    Low,
    /// Defect likely to distort results
    Medium,
    /// Defect that breaks downstream use
    High,
}

impl Severity {
    /// Weight used when ranking suggestions.
    pub fn weight(&self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    /// Points subtracted from the quality score per finding, before
    /// confidence scaling.
    pub fn penalty(&self) -> f64 {
        match self {
            Self::High => 10.0,
            Self::Medium => 5.0,
            Self::Low => 2.0,
        }
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); 0.0 for a single value
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    /// Adjusted Fisher-Pearson skewness; 0.0 below three values
    pub skewness: f64,
    /// Excess kurtosis; 0.0 below four values
    pub kurtosis: f64,
}

/// Summary statistics of a categorical, boolean or text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStatistics {
    /// Up to ten most frequent rendered values with their counts
    pub top_values: Vec<(String, usize)>,
    /// Most frequent rendered value
    pub mode: Option<String>,
    pub avg_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

/// Type-appropriate statistics bag of a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnStatistics {
    /// Numeric path
    Numeric(NumericStatistics),
    /// Categorical path
    Categorical(CategoricalStatistics),
    /// No non-null values to summarise
    #[default]
    Empty,
}

/// A structural pattern that matched a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Share of sampled values that matched, rounded to three decimals
    pub match_ratio: f64,
    /// Regex source or date template that matched
    pub descriptor: String,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: DataType,
    /// First winning pattern in the fixed detection order
    pub semantic_type: Option<String>,
    pub null_count: usize,
    pub null_ratio: f64,
    pub unique_count: usize,
    pub unique_ratio: f64,
    /// Up to five non-null values in row order
    pub sample_values: Vec<Value>,
    pub statistics: ColumnStatistics,
    /// Pattern name to match details
    pub patterns: BTreeMap<String, PatternMatch>,
}

impl ColumnProfile {
    /// Fallback profile substituted when profiling a column fails.
    pub fn empty(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            semantic_type: None,
            null_count: 0,
            null_ratio: 0.0,
            unique_count: 0,
            unique_ratio: 0.0,
            sample_values: Vec::new(),
            statistics: ColumnStatistics::Empty,
            patterns: BTreeMap::new(),
        }
    }

    /// True if the profiler recorded the named pattern.
    pub fn has_pattern(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }
}

/// Profile of a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub memory_bytes: usize,
    pub columns: BTreeMap<String, ColumnProfile>,
    pub duplicate_row_count: usize,
    /// True when the profile was computed on a sample
    pub sampled: bool,
    /// Number of rows actually profiled when sampled
    pub sample_size: Option<usize>,
}

impl DatasetProfile {
    /// Profile of a table with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            row_count: 0,
            column_count: 0,
            memory_bytes: 0,
            columns: BTreeMap::new(),
            duplicate_row_count: 0,
            sampled: false,
            sample_size: None,
        }
    }

    /// Looks up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.get(name)
    }
}

/// Issue-type tags emitted by the built-in detectors.
pub mod issue {
    pub const MISSING_VALUES: &str = "missing_values";
    pub const EMPTY_STRINGS: &str = "empty_strings";
    pub const DUPLICATE_ROWS: &str = "duplicate_rows";
    pub const NUMERIC_AS_STRING: &str = "numeric_as_string";
    pub const BOOLEAN_AS_STRING: &str = "boolean_as_string";
    pub const INCONSISTENT_CASE: &str = "inconsistent_case";
    pub const INCONSISTENT_DATE_FORMAT: &str = "inconsistent_date_format";
    pub const WHITESPACE_PADDING: &str = "whitespace_padding";
    pub const OUTLIERS: &str = "outliers";
    pub const SIMILAR_COLUMNS: &str = "similar_columns";
}

/// A detected data-quality defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the detector that produced this finding
    pub detector: String,
    pub issue_type: String,
    pub severity: Severity,
    /// Affected column names
    pub columns: Vec<String>,
    /// Affected row indices, capped at [`MAX_FINDING_ROWS`]
    pub rows: Option<Vec<usize>>,
    pub details: Map<String, Value>,
    pub message: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl Finding {
    /// Creates a finding with full confidence and no rows or details.
    pub fn new(
        detector: impl Into<String>,
        issue_type: impl Into<String>,
        severity: Severity,
        columns: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            detector: detector.into(),
            issue_type: issue_type.into(),
            severity,
            columns,
            rows: None,
            details: Map::new(),
            message: message.into(),
            confidence: 1.0,
        }
    }

    /// Sets the affected rows, keeping only the first [`MAX_FINDING_ROWS`].
    pub fn with_rows(mut self, mut rows: Vec<usize>) -> Self {
        rows.truncate(MAX_FINDING_ROWS);
        self.rows = Some(rows);
        self
    }

    /// Adds a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Sets the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Reads a numeric detail.
    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.details.get(key).and_then(Value::as_f64)
    }

    /// Reads a string detail.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

/// A proposed corrective action derived from one finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Dense 1-based rank by descending priority score, reassigned on every
    /// priority sort
    pub id: usize,
    pub finding: Finding,
    pub action: String,
    /// Key of the transformer that carries out the action
    pub transformer: String,
    /// Operation within the transformer, used for exclusion and ordering
    pub operation: String,
    pub params: Params,
    pub priority: Severity,
    pub impact: String,
    pub rationale: String,
}

impl Suggestion {
    /// `(transformer, operation)` pair used by the exclusion and ordering
    /// tables.
    pub fn action_key(&self) -> (&str, &str) {
        (&self.transformer, &self.operation)
    }

    /// Columns the suggestion applies to, read from the `columns` parameter.
    pub fn target_columns(&self) -> Vec<&str> {
        self.params
            .get("columns")
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Record of one transformation applied by an external transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationResult {
    pub transformer: String,
    pub params: Params,
    pub rows_affected: usize,
    pub columns_affected: Vec<String>,
    /// Textual record of the operation performed
    pub operation_log: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering_and_weights() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::High.weight(), 3.0);
        assert_eq!(Severity::Low.penalty(), 2.0);
        assert_eq!(Severity::Medium.to_string(), "medium");
    }

    #[test]
    fn test_finding_rows_are_capped() {
        let finding = Finding::new("outliers", issue::OUTLIERS, Severity::Low, vec![], "x")
            .with_rows((0..250).collect());
        assert_eq!(finding.rows.as_ref().map(Vec::len), Some(MAX_FINDING_ROWS));
    }

    #[test]
    fn test_finding_confidence_clamped() {
        let finding =
            Finding::new("types", issue::NUMERIC_AS_STRING, Severity::Medium, vec![], "x")
                .with_confidence(1.7);
        assert_eq!(finding.confidence, 1.0);
    }

    #[test]
    fn test_finding_details() {
        let finding = Finding::new("missing", issue::MISSING_VALUES, Severity::Low, vec![], "x")
            .with_detail("null_ratio", 0.25)
            .with_detail("dtype", "float");
        assert_eq!(finding.detail_f64("null_ratio"), Some(0.25));
        assert_eq!(finding.detail_str("dtype"), Some("float"));
        assert_eq!(finding.detail_f64("missing"), None);
    }

    #[test]
    fn test_suggestion_target_columns() {
        let finding = Finding::new("formats", issue::INCONSISTENT_CASE, Severity::Low, vec![], "x");
        let mut params = Params::new();
        params.insert("columns".to_string(), json!(["name", "city"]));
        let suggestion = Suggestion {
            id: 1,
            finding,
            action: "Standardize text casing".to_string(),
            transformer: "formats".to_string(),
            operation: "lowercase".to_string(),
            params,
            priority: Severity::Low,
            impact: String::new(),
            rationale: String::new(),
        };
        assert_eq!(suggestion.target_columns(), vec!["name", "city"]);
        assert_eq!(suggestion.action_key(), ("formats", "lowercase"));
    }

    #[test]
    fn test_statistics_serde_tagging() {
        let stats = ColumnStatistics::Empty;
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, json!({"kind": "empty"}));
    }

    #[test]
    fn test_dataset_profile_serde_roundtrip() {
        let mut profile = DatasetProfile::empty();
        profile.row_count = 3;
        profile
            .columns
            .insert("a".to_string(), ColumnProfile::empty("a", DataType::Integer));

        let json = serde_json::to_string(&profile).unwrap();
        let restored: DatasetProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, restored);
    }
}
