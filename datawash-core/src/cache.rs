//! Per-table memoization of expensive per-column values.
//!
//! A [`ComputationCache`] borrows one immutable [`Table`] and computes each
//! derived value at most once per column. Repeat calls hand back a reference
//! to the same cached object, so callers can compare with [`std::ptr::eq`] to
//! tell whether work was already done. There is no invalidation: a new table
//! needs a new cache.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{DataWashError, Result};
use crate::profiler::statistics;
use crate::table::{Column, Table, render_cell};

/// Default cap on the number of values rendered into a value set.
pub const DEFAULT_MAX_VALUES: usize = 10_000;

/// Default seed for value-set subsampling.
pub const DEFAULT_SEED: u64 = 42;

/// Numeric summary memoized per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of finite values summarised
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; 0.0 for a single value
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// 25th percentile, linear interpolation
    pub q1: f64,
    /// 75th percentile, linear interpolation
    pub q3: f64,
}

impl NumericSummary {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[derive(Debug, Default)]
struct ColumnSlots {
    null_mask: OnceLock<Vec<bool>>,
    value_set: OnceLock<HashSet<String>>,
    unique_count: OnceLock<usize>,
    statistics: OnceLock<Option<NumericSummary>>,
}

/// Lazily computed, shared per-column values for one table.
///
/// The cache is `Sync`; profiling and detection units running on different
/// threads may share one instance.
#[derive(Debug)]
pub struct ComputationCache<'a> {
    table: &'a Table,
    max_values: usize,
    seed: u64,
    positions: HashMap<&'a str, usize>,
    slots: Vec<ColumnSlots>,
}

impl<'a> ComputationCache<'a> {
    /// Creates a cache with the default value cap and seed.
    pub fn new(table: &'a Table) -> Self {
        Self::with_limits(table, DEFAULT_MAX_VALUES, DEFAULT_SEED)
    }

    /// Creates a cache with an explicit value-set cap and subsampling seed.
    pub fn with_limits(table: &'a Table, max_values: usize, seed: u64) -> Self {
        let positions = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name(), i))
            .collect();
        let slots = table
            .columns()
            .iter()
            .map(|_| ColumnSlots::default())
            .collect();
        Self {
            table,
            max_values,
            seed,
            positions,
            slots,
        }
    }

    /// The table this cache is scoped to.
    pub fn table(&self) -> &'a Table {
        self.table
    }

    fn lookup(&self, column: &str) -> Result<(&'a Column, &ColumnSlots)> {
        let index = *self
            .positions
            .get(column)
            .ok_or_else(|| DataWashError::column_not_found(column))?;
        match (self.table.columns().get(index), self.slots.get(index)) {
            (Some(col), Some(slots)) => Ok((col, slots)),
            _ => Err(DataWashError::column_not_found(column)),
        }
    }

    /// Per-row null flags of a column.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn null_mask(&self, column: &str) -> Result<&Vec<bool>> {
        let (col, slots) = self.lookup(column)?;
        Ok(slots
            .null_mask
            .get_or_init(|| col.values().iter().map(serde_json::Value::is_null).collect()))
    }

    /// Unique non-null values of a column, rendered as strings.
    ///
    /// When the column has more distinct values than the cap, a seeded
    /// subsample of that many distinct values is kept instead.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn value_set(&self, column: &str) -> Result<&HashSet<String>> {
        let (col, slots) = self.lookup(column)?;
        Ok(slots.value_set.get_or_init(|| {
            let mut seen = HashSet::new();
            let distinct: Vec<String> = col
                .non_null()
                .map(render_cell)
                .filter(|v| seen.insert(v.clone()))
                .collect();
            if distinct.len() <= self.max_values {
                return seen;
            }
            let mut rng = StdRng::seed_from_u64(self.seed);
            rand::seq::index::sample(&mut rng, distinct.len(), self.max_values)
                .into_iter()
                .filter_map(|i| distinct.get(i).cloned())
                .collect()
        }))
    }

    /// Number of distinct non-null values of a column.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn unique_count(&self, column: &str) -> Result<usize> {
        let (col, slots) = self.lookup(column)?;
        Ok(*slots
            .unique_count
            .get_or_init(|| statistics::distinct_count(col)))
    }

    /// Numeric summary of a column; `None` for non-numeric or empty columns.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn statistics(&self, column: &str) -> Result<&Option<NumericSummary>> {
        let (col, slots) = self.lookup(column)?;
        Ok(slots.statistics.get_or_init(|| {
            if !col.data_type().is_numeric() {
                return None;
            }
            let values: Vec<f64> = col.numeric_values().into_iter().map(|(_, v)| v).collect();
            statistics::numeric_summary(&values)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn sample_table() -> Table {
        Table::new(vec![
            Column::new("n", vec![json!(1), json!(2), Value::Null, json!(4), json!(5)]),
            Column::new("s", vec![json!("a"), json!("b"), json!("a"), Value::Null, json!("c")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_accessors_return_identical_objects() {
        let table = sample_table();
        let cache = ComputationCache::new(&table);

        let first = cache.null_mask("n").unwrap();
        let second = cache.null_mask("n").unwrap();
        assert!(std::ptr::eq(first, second));

        let first = cache.value_set("s").unwrap();
        let second = cache.value_set("s").unwrap();
        assert!(std::ptr::eq(first, second));

        let first = cache.statistics("n").unwrap();
        let second = cache.statistics("n").unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_values() {
        let table = sample_table();
        let cache = ComputationCache::new(&table);

        assert_eq!(
            cache.null_mask("n").unwrap(),
            &vec![false, false, true, false, false]
        );
        let expected: HashSet<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
        assert_eq!(cache.value_set("s").unwrap(), &expected);
        assert_eq!(cache.unique_count("s").unwrap(), 3);
        assert_eq!(cache.unique_count("n").unwrap(), 4);

        let stats = cache.statistics("n").unwrap().as_ref().unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!(cache.statistics("s").unwrap().is_none());
    }

    #[test]
    fn test_unknown_column() {
        let table = sample_table();
        let cache = ComputationCache::new(&table);
        assert!(matches!(
            cache.null_mask("missing"),
            Err(DataWashError::ColumnNotFound { .. })
        ));
        assert!(cache.unique_count("missing").is_err());
    }

    #[test]
    fn test_value_set_is_capped_and_deterministic() {
        let values = (0..500).map(|i| json!(i)).collect();
        let table = Table::new(vec![Column::new("id", values)]).unwrap();

        let first = ComputationCache::with_limits(&table, 50, 7);
        let second = ComputationCache::with_limits(&table, 50, 7);
        assert_eq!(first.value_set("id").unwrap().len(), 50);
        assert_eq!(first.value_set("id").unwrap(), second.value_set("id").unwrap());
        assert_eq!(first.unique_count("id").unwrap(), 500);

        let repeated = (0..1_000).map(|i| json!(i % 10)).collect();
        let table = Table::new(vec![Column::new("code", repeated)]).unwrap();
        let cache = ComputationCache::with_limits(&table, 50, 7);
        assert_eq!(cache.value_set("code").unwrap().len(), 10);
    }

    #[test]
    fn test_cache_is_shareable_across_threads() {
        let table = sample_table();
        let cache = ComputationCache::new(&table);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| cache.value_set("s").unwrap().len()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), 3);
            }
        });
    }
}
