//! Data-quality detectors and their registry.
//!
//! A detector inspects a table and its profile and returns findings. The
//! registry is an explicit value built once and passed into the pipeline;
//! there is no global detector state.

pub mod duplicates;
pub mod formats;
pub mod minhash;
pub mod missing;
pub mod outliers;
pub mod similarity;
pub mod types;

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::cache::ComputationCache;
use crate::config::DetectorConfig;
use crate::error::{DataWashError, Result};
use crate::models::{DatasetProfile, Finding};
use crate::table::Table;

pub use duplicates::DuplicateDetector;
pub use formats::FormatDetector;
pub use missing::MissingDetector;
pub use outliers::OutlierDetector;
pub use similarity::SimilarityDetector;
pub use types::TypeDetector;

/// Read-only inputs shared by every detector in one run.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub table: &'a Table,
    pub profile: &'a DatasetProfile,
    pub cache: &'a ComputationCache<'a>,
}

impl<'a> DetectionContext<'a> {
    /// Bundles a table with its profile and cache.
    pub fn new(
        table: &'a Table,
        profile: &'a DatasetProfile,
        cache: &'a ComputationCache<'a>,
    ) -> Self {
        Self {
            table,
            profile,
            cache,
        }
    }
}

/// A named analyzer that turns a table into findings.
///
/// # Object Safety
/// This trait is object-safe; the registry stores `Box<dyn Detector>`.
/// Implementations must not mutate the table or the cache.
pub trait Detector: Send + Sync {
    /// Unique detector name, also used as the `detector` field of findings
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Runs detection.
    ///
    /// # Errors
    /// Returns a detection error if the detector cannot analyse the input.
    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>>;
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs one detector, turning an error or a panic into a detection error.
///
/// # Errors
/// Returns `DataWashError::Detection` when the detector fails or panics.
pub fn try_run_detector(detector: &dyn Detector, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
    match catch_unwind(AssertUnwindSafe(|| detector.detect(ctx))) {
        Ok(result) => result,
        Err(payload) => Err(DataWashError::detection_failed(
            detector.name(),
            format!("panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

/// Runs one detector in isolation; failures are logged and yield no findings.
pub fn run_detector_isolated(detector: &dyn Detector, ctx: &DetectionContext<'_>) -> Vec<Finding> {
    tracing::debug!("Running detector: {}", detector.name());
    match try_run_detector(detector, ctx) {
        Ok(findings) => {
            tracing::debug!(
                "Detector {} found {} issues",
                detector.name(),
                findings.len()
            );
            findings
        }
        Err(e) => {
            tracing::warn!("{}", e);
            Vec::new()
        }
    }
}

/// Ordered collection of detectors keyed by name.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}

impl DetectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the six built-in detectors.
    pub fn with_defaults(config: &DetectorConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MissingDetector));
        registry.register(Box::new(DuplicateDetector));
        registry.register(Box::new(TypeDetector));
        registry.register(Box::new(FormatDetector));
        registry.register(Box::new(OutlierDetector::new(
            config.outlier_method,
            config.outlier_threshold,
        )));
        registry.register(Box::new(SimilarityDetector::new(config.similarity.clone())));
        registry
    }

    /// Adds a detector, replacing any detector with the same name in place.
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        match self
            .detectors
            .iter_mut()
            .find(|existing| existing.name() == detector.name())
        {
            Some(slot) => *slot = detector,
            None => self.detectors.push(detector),
        }
    }

    /// Looks up a detector by name.
    pub fn get(&self, name: &str) -> Option<&dyn Detector> {
        self.detectors
            .iter()
            .find(|d| d.name() == name)
            .map(AsRef::as_ref)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detectors to run, in registration order.
    ///
    /// `None` selects every detector; unknown names are ignored.
    pub fn select(&self, enabled: Option<&[String]>) -> Vec<&dyn Detector> {
        self.detectors
            .iter()
            .filter(|d| enabled.is_none_or(|names| names.iter().any(|n| n == d.name())))
            .map(AsRef::as_ref)
            .collect()
    }

    /// Runs the enabled detectors sequentially over a prepared context.
    pub fn run_with_context(
        &self,
        ctx: &DetectionContext<'_>,
        enabled: Option<&[String]>,
    ) -> Vec<Finding> {
        self.select(enabled)
            .into_iter()
            .flat_map(|detector| run_detector_isolated(detector, ctx))
            .collect()
    }

    /// Runs the enabled detectors sequentially with a fresh cache.
    pub fn run_all(
        &self,
        table: &Table,
        profile: &DatasetProfile,
        enabled: Option<&[String]>,
    ) -> Vec<Finding> {
        let cache = ComputationCache::new(table);
        let ctx = DetectionContext::new(table, profile, &cache);
        self.run_with_context(&ctx, enabled)
    }
}

/// Rounds to three decimals for finding details.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Rounds to four decimals for finding details.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, issue};
    use crate::profiler::profile_dataset;
    use serde_json::json;

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn description(&self) -> &'static str {
            "Always panics"
        }

        fn detect(&self, _ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
            panic!("boom")
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn description(&self) -> &'static str {
            "Always errors"
        }

        fn detect(&self, _ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
            Err(DataWashError::detection_failed("failing", "bad input"))
        }
    }

    struct ConstantDetector;

    impl Detector for ConstantDetector {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn description(&self) -> &'static str {
            "Always reports one finding"
        }

        fn detect(&self, _ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
            Ok(vec![Finding::new(
                "constant",
                issue::OUTLIERS,
                Severity::Low,
                vec!["x".to_string()],
                "constant finding",
            )])
        }
    }

    fn table() -> Table {
        Table::from_records(&[json!({"x": 1}), json!({"x": 2})]).unwrap()
    }

    #[test]
    fn test_default_registry_order() {
        let registry = DetectorRegistry::with_defaults(&DetectorConfig::default());
        assert_eq!(
            registry.names(),
            vec!["missing", "duplicates", "types", "formats", "outliers", "similarity"]
        );
        assert!(registry.get("types").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = DetectorRegistry::new();
        registry.register(Box::new(ConstantDetector));
        registry.register(Box::new(ConstantDetector));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_filters_enabled() {
        let registry = DetectorRegistry::with_defaults(&DetectorConfig::default());
        let enabled = vec!["outliers".to_string(), "missing".to_string(), "bogus".to_string()];
        let names: Vec<_> = registry
            .select(Some(&enabled))
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["missing", "outliers"]);
        assert_eq!(registry.select(None).len(), 6);
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut registry = DetectorRegistry::new();
        registry.register(Box::new(PanickingDetector));
        registry.register(Box::new(FailingDetector));
        registry.register(Box::new(ConstantDetector));

        let table = table();
        let profile = profile_dataset(&table);
        let findings = registry.run_all(&table, &profile, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detector, "constant");
    }

    #[test]
    fn test_panic_becomes_detection_error() {
        let table = table();
        let profile = profile_dataset(&table);
        let cache = ComputationCache::new(&table);
        let ctx = DetectionContext::new(&table, &profile, &cache);
        let err = try_run_detector(&PanickingDetector, &ctx).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
