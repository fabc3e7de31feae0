//! Exact duplicate rows.

use super::{DetectionContext, Detector, round4};
use crate::error::Result;
use crate::models::{Finding, Severity, issue};
use crate::profiler::duplicate_rows;

/// Flags rows that repeat an earlier row exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateDetector;

impl Detector for DuplicateDetector {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn description(&self) -> &'static str {
        "Detects exact duplicate rows"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let count = ctx.profile.duplicate_row_count;
        if count == 0 {
            return Ok(Vec::new());
        }

        let ratio = if ctx.profile.row_count > 0 {
            count as f64 / ctx.profile.row_count as f64
        } else {
            0.0
        };
        let severity = if ratio > 0.1 {
            Severity::High
        } else if ratio > 0.01 {
            Severity::Medium
        } else {
            Severity::Low
        };

        let columns = ctx
            .table
            .column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let finding = Finding::new(
            self.name(),
            issue::DUPLICATE_ROWS,
            severity,
            columns,
            format!(
                "Found {} exact duplicate rows ({:.1}% of data)",
                count,
                ratio * 100.0
            ),
        )
        .with_rows(duplicate_rows(ctx.table))
        .with_detail("duplicate_count", count)
        .with_detail("duplicate_ratio", round4(ratio));

        Ok(vec![finding])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ComputationCache;
    use crate::profiler::profile_dataset;
    use crate::table::Table;
    use serde_json::json;

    fn run(table: &Table) -> Vec<Finding> {
        let profile = profile_dataset(table);
        let cache = ComputationCache::new(table);
        DuplicateDetector
            .detect(&DetectionContext::new(table, &profile, &cache))
            .unwrap()
    }

    #[test]
    fn test_duplicates_detected() {
        let table = Table::from_records(&[
            json!({"a": 1, "b": "x"}),
            json!({"a": 2, "b": "y"}),
            json!({"a": 1, "b": "x"}),
            json!({"a": 1, "b": "x"}),
        ])
        .unwrap();
        let findings = run(&table);
        assert_eq!(findings.len(), 1);

        let finding = &findings[0];
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.rows, Some(vec![2, 3]));
        assert_eq!(finding.columns, vec!["a", "b"]);
        assert_eq!(finding.detail_f64("duplicate_ratio"), Some(0.5));
    }

    #[test]
    fn test_type_distinct_values_are_not_duplicates() {
        let table = Table::from_records(&[json!({"a": 1}), json!({"a": "1"})]).unwrap();
        assert!(run(&table).is_empty());
    }

    #[test]
    fn test_null_rows_compare_equal() {
        let table = Table::from_records(&[json!({"a": null}), json!({"a": null})]).unwrap();
        assert_eq!(run(&table).len(), 1);
    }

    #[test]
    fn test_affected_rows_are_capped() {
        let records: Vec<_> = (0..300).map(|_| json!({"a": 1})).collect();
        let table = Table::from_records(&records).unwrap();
        let findings = run(&table);
        assert_eq!(findings[0].rows.as_ref().map(Vec::len), Some(100));
        assert_eq!(findings[0].details["duplicate_count"], json!(299));
    }
}
