//! Bounded worker-pool fan-out for profiling and detection.
//!
//! Each unit of work (one column profile, one detector run) is isolated: a
//! panic or error inside it is logged and replaced by a safe default, and the
//! rest of the batch carries on. Column profiles are keyed by name, so the
//! scheduling order never shows in the result.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use crate::cache::ComputationCache;
use crate::config::ParallelConfig;
use crate::detectors::{DetectionContext, Detector, run_detector_isolated};
use crate::error::{DataWashError, Result};
use crate::models::{ColumnProfile, DatasetProfile, Finding};
use crate::profiler::{assemble_profile, profile_column};
use crate::table::{Column, Table};

/// Builds a pool of `min(max_workers, available parallelism)` threads.
///
/// # Errors
/// Returns a configuration error if the pool cannot be created.
pub fn build_pool(config: &ParallelConfig) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .thread_name(|i| format!("datawash-worker-{i}"))
        .build()
        .map_err(|e| DataWashError::configuration(format!("Failed to build worker pool: {e}")))
}

/// Profiles one column, substituting an empty profile if profiling panics.
pub fn profile_column_isolated(
    column: &Column,
    cache: Option<&ComputationCache<'_>>,
) -> ColumnProfile {
    catch_unwind(AssertUnwindSafe(|| profile_column(column, cache))).unwrap_or_else(|_| {
        tracing::warn!(
            "Profiling column '{}' failed, using empty profile",
            column.name()
        );
        ColumnProfile::empty(column.name(), column.data_type())
    })
}

fn profile_columns_sequential(
    table: &Table,
    cache: Option<&ComputationCache<'_>>,
) -> BTreeMap<String, ColumnProfile> {
    table
        .columns()
        .iter()
        .map(|column| {
            (
                column.name().to_string(),
                profile_column_isolated(column, cache),
            )
        })
        .collect()
}

/// Profiles every column of a table on the worker pool.
///
/// Falls back to sequential profiling if no pool can be built.
pub fn profile_dataset_parallel(
    table: &Table,
    cache: Option<&ComputationCache<'_>>,
    config: &ParallelConfig,
) -> DatasetProfile {
    tracing::info!(
        "Profiling dataset in parallel: {} rows, {} columns, {} workers",
        table.row_count(),
        table.column_count(),
        config.worker_count()
    );

    let columns = match build_pool(config) {
        Ok(pool) => pool.install(|| {
            table
                .columns()
                .par_iter()
                .map(|column| {
                    (
                        column.name().to_string(),
                        profile_column_isolated(column, cache),
                    )
                })
                .collect()
        }),
        Err(e) => {
            tracing::warn!("{}; profiling sequentially", e);
            profile_columns_sequential(table, cache)
        }
    };
    assemble_profile(table, columns)
}

/// Runs detectors on the worker pool and concatenates their findings.
///
/// Finding order across detectors is unspecified.
pub fn run_detectors_parallel(
    ctx: &DetectionContext<'_>,
    detectors: &[&dyn Detector],
    config: &ParallelConfig,
) -> Vec<Finding> {
    match build_pool(config) {
        Ok(pool) => pool.install(|| {
            detectors
                .par_iter()
                .flat_map_iter(|detector| run_detector_isolated(*detector, ctx))
                .collect()
        }),
        Err(e) => {
            tracing::warn!("{}; running detectors sequentially", e);
            detectors
                .iter()
                .flat_map(|detector| run_detector_isolated(*detector, ctx))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::detectors::DetectorRegistry;
    use crate::profiler::profile_dataset;
    use serde_json::json;

    fn wide_table() -> Table {
        let columns = (0..12)
            .map(|c| {
                Column::new(
                    format!("c{c}"),
                    (0..30)
                        .map(|r| if r % 7 == 0 { json!(null) } else { json!(r * c) })
                        .collect(),
                )
            })
            .collect();
        Table::new(columns).unwrap()
    }

    #[test]
    fn test_parallel_profile_matches_sequential() {
        let table = wide_table();
        let cache = ComputationCache::new(&table);
        let parallel = profile_dataset_parallel(&table, Some(&cache), &ParallelConfig::default());
        assert_eq!(parallel, profile_dataset(&table));
    }

    #[test]
    fn test_parallel_detection_matches_sequential() {
        let table = wide_table();
        let profile = profile_dataset(&table);
        let cache = ComputationCache::new(&table);
        let ctx = DetectionContext::new(&table, &profile, &cache);
        let registry = DetectorRegistry::with_defaults(&DetectorConfig::default());

        let mut parallel =
            run_detectors_parallel(&ctx, &registry.select(None), &ParallelConfig::default());
        let mut sequential = registry.run_with_context(&ctx, None);
        let key = |f: &Finding| (f.detector.clone(), f.issue_type.clone(), f.columns.clone());
        parallel.sort_by_key(key);
        sequential.sort_by_key(key);
        assert_eq!(parallel, sequential);
        assert!(!parallel.is_empty());
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = build_pool(&ParallelConfig::default().with_max_workers(2)).unwrap();
        assert!(pool.current_num_threads() <= 2);
    }
}
