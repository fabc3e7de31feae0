//! Pipeline entry point and the analysis report it produces.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::cache::ComputationCache;
use crate::config::WashConfig;
use crate::detectors::{DetectionContext, DetectorRegistry};
use crate::error::Result;
use crate::models::{DatasetProfile, Finding, Severity, Suggestion, TransformationResult};
use crate::parallel::{profile_dataset_parallel, run_detectors_parallel};
use crate::profiler::profile_dataset_with_cache;
use crate::sampling::SmartSampler;
use crate::suggestions::{generate_suggestions, sort_by_execution_order};
use crate::table::Table;
use crate::transform::TransformerRegistry;

const SUMMARY_MESSAGES_PER_SEVERITY: usize = 5;

/// Data-quality score in `[0, 100]`.
///
/// Starts at 100 and subtracts `penalty(severity) * confidence` per finding
/// (high 10, medium 5, low 2). An empty table scores 100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quality_score(findings: &[Finding], row_count: usize) -> u8 {
    if row_count == 0 {
        return 100;
    }
    let penalty: f64 = findings
        .iter()
        .map(|f| f.severity.penalty() * f.confidence)
        .sum();
    (100.0 - penalty).clamp(0.0, 100.0) as u8
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    profile: DatasetProfile,
    findings: Vec<Finding>,
    suggestions: Vec<Suggestion>,
}

impl Report {
    /// Assembles a report from already computed parts.
    pub fn new(profile: DatasetProfile, findings: Vec<Finding>, suggestions: Vec<Suggestion>) -> Self {
        Self {
            profile,
            findings,
            suggestions,
        }
    }

    /// Dataset profile, with counts estimated for the full table when sampled.
    pub fn profile(&self) -> &DatasetProfile {
        &self.profile
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Suggestions ranked by priority, ids `1..=N`.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn quality_score(&self) -> u8 {
        quality_score(&self.findings, self.profile.row_count)
    }

    /// True if detection ran on a sample rather than the full table.
    pub fn was_sampled(&self) -> bool {
        self.profile.sampled
    }

    /// Looks up a suggestion by id.
    pub fn suggestion(&self, id: usize) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id == id)
    }

    /// Human-readable summary of the run.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Dataset: {} rows x {} columns",
            self.profile.row_count, self.profile.column_count
        );
        let _ = writeln!(
            out,
            "Memory: {:.1} MB",
            self.profile.memory_bytes as f64 / 1024.0 / 1024.0
        );
        if let Some(sample_size) = self.profile.sample_size {
            let _ = writeln!(out, "Sampled: {sample_size} rows analysed");
        }
        let _ = writeln!(
            out,
            "Duplicate rows: {}",
            self.profile.duplicate_row_count
        );
        let _ = writeln!(out, "Data Quality Score: {}/100", self.quality_score());
        let _ = writeln!(out, "Issues found: {}", self.findings.len());
        let _ = writeln!(out, "Suggestions: {}", self.suggestions.len());

        for severity in [Severity::High, Severity::Medium, Severity::Low] {
            let issues: Vec<&Finding> = self
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            if issues.is_empty() {
                continue;
            }
            let _ = write!(
                out,
                "\n  [{}] {} issue(s)",
                severity.name().to_uppercase(),
                issues.len()
            );
            for finding in issues.iter().take(SUMMARY_MESSAGES_PER_SEVERITY) {
                let _ = write!(out, "\n    - {}", finding.message);
            }
            if issues.len() > SUMMARY_MESSAGES_PER_SEVERITY {
                let _ = write!(
                    out,
                    "\n    ... and {} more",
                    issues.len() - SUMMARY_MESSAGES_PER_SEVERITY
                );
            }
        }
        out
    }

    /// Applies the selected suggestions to `table` through the registry.
    ///
    /// Unknown ids are logged and skipped. The selected suggestions run in
    /// execution order regardless of the order of `ids`.
    ///
    /// # Errors
    /// Returns `UnknownTransformer` if a suggestion names a transformer that
    /// is not registered, or the first error a transformer reports.
    pub fn apply(
        &self,
        table: &Table,
        ids: &[usize],
        transformers: &TransformerRegistry,
    ) -> Result<(Table, Vec<TransformationResult>)> {
        let by_id: HashMap<usize, &Suggestion> =
            self.suggestions.iter().map(|s| (s.id, s)).collect();

        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.get(id) {
                Some(suggestion) => selected.push((*suggestion).clone()),
                None => tracing::warn!("Suggestion ID {} not found, skipping", id),
            }
        }

        let mut current = table.clone();
        let mut results = Vec::with_capacity(selected.len());
        for suggestion in sort_by_execution_order(selected) {
            let (next, result) =
                transformers.run(&suggestion.transformer, &current, &suggestion.params)?;
            tracing::info!(
                "Applied suggestion {} ({}): {} rows affected",
                suggestion.id,
                suggestion.action,
                result.rows_affected
            );
            current = next;
            results.push(result);
        }
        Ok((current, results))
    }

    /// Applies every suggestion.
    ///
    /// # Errors
    /// See [`Report::apply`].
    pub fn apply_all(
        &self,
        table: &Table,
        transformers: &TransformerRegistry,
    ) -> Result<(Table, Vec<TransformationResult>)> {
        let ids: Vec<usize> = self.suggestions.iter().map(|s| s.id).collect();
        self.apply(table, &ids, transformers)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Report(rows={}, cols={}, issues={}, suggestions={})",
            self.profile.row_count,
            self.profile.column_count,
            self.findings.len(),
            self.suggestions.len()
        )
    }
}

/// Runs the full pipeline: sample, profile, detect, suggest.
///
/// Never fails; per-column and per-detector failures are logged and
/// replaced by defaults. An invalid configuration is reported with a
/// warning and used as-is.
pub fn analyze(table: &Table, config: &WashConfig, registry: &DetectorRegistry) -> Report {
    if let Err(e) = config.validate() {
        tracing::warn!("Configuration failed validation: {}", e);
    }

    let sampler = SmartSampler::with_config(table, &config.sampling);
    let working = sampler.sample_table();

    let cache = ComputationCache::with_limits(
        working,
        config.detectors.similarity.max_unique_values,
        config.sampling.seed,
    );
    let parallel = config
        .parallel
        .should_parallelize(working.row_count(), working.column_count());

    tracing::info!(
        "Profiling {} columns ({})",
        working.column_count(),
        if parallel { "parallel" } else { "sequential" }
    );
    let profile = if parallel {
        profile_dataset_parallel(working, Some(&cache), &config.parallel)
    } else {
        profile_dataset_with_cache(working, Some(&cache))
    };
    let profile = sampler.rescale_profile(profile);

    let ctx = DetectionContext::new(working, &profile, &cache);
    let enabled = config.detectors.enabled.as_slice();
    let findings = if parallel {
        run_detectors_parallel(&ctx, &registry.select(Some(enabled)), &config.parallel)
    } else {
        registry.run_with_context(&ctx, Some(enabled))
    };
    tracing::info!("Detection produced {} findings", findings.len());

    let suggestions = generate_suggestions(
        &findings,
        config.suggestions.max_suggestions,
        config.suggestions.use_case,
    );
    tracing::info!("Generated {} suggestions", suggestions.len());

    Report::new(profile, findings, suggestions)
}
