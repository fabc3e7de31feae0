//! Column and dataset profiling.
//!
//! Each column is profiled independently of the others, which lets the
//! parallel orchestrator fan column work out over a pool. Dataset-level
//! values (counts, memory estimate, duplicate rows) are computed once.

pub mod patterns;
pub mod statistics;

use std::collections::{BTreeMap, HashSet};

use crate::cache::ComputationCache;
use crate::models::{ColumnProfile, ColumnStatistics, DatasetProfile};
use crate::table::{Column, Table, render_cell};

/// Number of non-null sample values kept per column.
pub const SAMPLE_VALUES: usize = 5;

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((count as f64 / total as f64) * 10_000.0).round() / 10_000.0
}

/// Profiles a whole table sequentially.
pub fn profile_dataset(table: &Table) -> DatasetProfile {
    profile_dataset_with_cache(table, None)
}

/// Profiles a whole table sequentially, reusing cached column values.
pub fn profile_dataset_with_cache(
    table: &Table,
    cache: Option<&ComputationCache<'_>>,
) -> DatasetProfile {
    tracing::info!(
        "Profiling dataset: {} rows, {} columns",
        table.row_count(),
        table.column_count()
    );

    let columns = table
        .columns()
        .iter()
        .map(|column| (column.name().to_string(), profile_column(column, cache)))
        .collect();
    assemble_profile(table, columns)
}

/// Builds the dataset profile around already-profiled columns.
pub fn assemble_profile(table: &Table, columns: BTreeMap<String, ColumnProfile>) -> DatasetProfile {
    DatasetProfile {
        row_count: table.row_count(),
        column_count: table.column_count(),
        memory_bytes: table.estimated_memory_bytes(),
        columns,
        duplicate_row_count: duplicate_rows(table).len(),
        sampled: false,
        sample_size: None,
    }
}

/// Indices of rows equal to an earlier row, keeping the first occurrence.
pub fn duplicate_rows(table: &Table) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(table.row_count());
    (0..table.row_count())
        .filter(|&row| !seen.insert(table.row_key(row)))
        .collect()
}

/// Profiles a single column.
///
/// When a cache for the column's table is supplied, the null mask and the
/// distinct count come from it.
pub fn profile_column(column: &Column, cache: Option<&ComputationCache<'_>>) -> ColumnProfile {
    let total = column.len();
    let null_count = cache
        .and_then(|c| c.null_mask(column.name()).ok())
        .map_or_else(|| column.null_count(), |mask| mask.iter().filter(|n| **n).count());
    let unique_count = cache
        .and_then(|c| c.unique_count(column.name()).ok())
        .unwrap_or_else(|| statistics::distinct_count(column));

    let statistics = if column.data_type().is_numeric() {
        let values: Vec<f64> = column.numeric_values().into_iter().map(|(_, v)| v).collect();
        statistics::numeric_statistics(&values).map(ColumnStatistics::Numeric)
    } else {
        statistics::categorical_statistics(column).map(ColumnStatistics::Categorical)
    }
    .unwrap_or_default();

    let rendered: Vec<String> = column
        .non_null()
        .take(patterns::PATTERN_SAMPLE_SIZE)
        .map(render_cell)
        .collect();
    let detected = patterns::detect_patterns(&rendered);

    ColumnProfile {
        name: column.name().to_string(),
        dtype: column.data_type(),
        semantic_type: patterns::semantic_type(&detected),
        null_count,
        null_ratio: ratio(null_count, total),
        unique_count,
        unique_ratio: ratio(unique_count, total),
        sample_values: column.non_null().take(SAMPLE_VALUES).cloned().collect(),
        statistics,
        patterns: detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DataType;
    use serde_json::{Value, json};

    fn people() -> Table {
        Table::from_records(&[
            json!({"name": "Ann", "age": 31, "email": "ann@example.com"}),
            json!({"name": "Bob", "age": null, "email": "bob@example.com"}),
            json!({"name": "Ann", "age": 31, "email": "ann@example.com"}),
            json!({"name": "Cy", "age": 45, "email": null}),
        ])
        .unwrap()
    }

    #[test]
    fn test_profile_dataset() {
        let table = people();
        let profile = profile_dataset(&table);

        assert_eq!(profile.row_count, 4);
        assert_eq!(profile.column_count, 3);
        assert_eq!(profile.duplicate_row_count, 1);
        assert!(!profile.sampled);
        assert!(profile.memory_bytes > 0);

        let age = profile.column("age").unwrap();
        assert_eq!(age.dtype, DataType::Integer);
        assert_eq!(age.null_count, 1);
        assert_eq!(age.null_ratio, 0.25);
        assert_eq!(age.unique_count, 2);
        assert!(matches!(age.statistics, ColumnStatistics::Numeric(_)));

        let email = profile.column("email").unwrap();
        assert_eq!(email.semantic_type.as_deref(), Some("email"));
        assert_eq!(email.sample_values.len(), 3);

        let name = profile.column("name").unwrap();
        assert!(matches!(name.statistics, ColumnStatistics::Categorical(_)));
    }

    #[test]
    fn test_boolean_column_uses_categorical_path() {
        let column = Column::new("flag", vec![json!(true), json!(false), json!(true)]);
        let profile = profile_column(&column, None);
        assert_eq!(profile.dtype, DataType::Boolean);
        assert!(matches!(profile.statistics, ColumnStatistics::Categorical(_)));
    }

    #[test]
    fn test_all_null_column() {
        let column = Column::new("gone", vec![Value::Null, Value::Null]);
        let profile = profile_column(&column, None);
        assert_eq!(profile.null_ratio, 1.0);
        assert_eq!(profile.unique_count, 0);
        assert_eq!(profile.statistics, ColumnStatistics::Empty);
        assert!(profile.patterns.is_empty());
    }

    #[test]
    fn test_cached_profile_matches_uncached() {
        let table = people();
        let cache = ComputationCache::new(&table);
        assert_eq!(
            profile_dataset_with_cache(&table, Some(&cache)),
            profile_dataset(&table)
        );
    }

    #[test]
    fn test_empty_table() {
        let profile = profile_dataset(&Table::default());
        assert_eq!(profile.row_count, 0);
        assert_eq!(profile.duplicate_row_count, 0);
        assert!(profile.columns.is_empty());
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let table = Table::from_records(&[
            json!({"a": 1}),
            json!({"a": 2}),
            json!({"a": 1}),
            json!({"a": 1}),
        ])
        .unwrap();
        assert_eq!(duplicate_rows(&table), vec![2, 3]);
    }
}
