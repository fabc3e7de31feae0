//! Missing values and empty strings.

use serde_json::Value;

use super::{DetectionContext, Detector};
use crate::error::Result;
use crate::models::{Finding, Severity, issue};

/// Flags columns with nulls and text columns holding blank strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingDetector;

fn severity_for(null_ratio: f64) -> Severity {
    if null_ratio > 0.5 {
        Severity::High
    } else if null_ratio > 0.1 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

impl Detector for MissingDetector {
    fn name(&self) -> &'static str {
        "missing"
    }

    fn description(&self) -> &'static str {
        "Detects missing values and null patterns"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (name, profile) in &ctx.profile.columns {
            if profile.null_count == 0 {
                continue;
            }
            findings.push(
                Finding::new(
                    self.name(),
                    issue::MISSING_VALUES,
                    severity_for(profile.null_ratio),
                    vec![name.clone()],
                    format!(
                        "Column '{}' has {} missing values ({:.1}%)",
                        name,
                        profile.null_count,
                        profile.null_ratio * 100.0
                    ),
                )
                .with_detail("null_count", profile.null_count)
                .with_detail("null_ratio", profile.null_ratio)
                .with_detail("dtype", profile.dtype.name()),
            );
        }

        for column in ctx.table.columns() {
            if !column.data_type().is_textual() {
                continue;
            }
            let blank_rows: Vec<usize> = column
                .enumerate_non_null()
                .filter(|(_, v)| matches!(v, Value::String(s) if s.trim().is_empty()))
                .map(|(row, _)| row)
                .collect();
            if blank_rows.is_empty() {
                continue;
            }
            findings.push(
                Finding::new(
                    self.name(),
                    issue::EMPTY_STRINGS,
                    Severity::Medium,
                    vec![column.name().to_string()],
                    format!(
                        "Column '{}' has {} empty strings that may represent missing values",
                        column.name(),
                        blank_rows.len()
                    ),
                )
                .with_detail("empty_string_count", blank_rows.len())
                .with_rows(blank_rows)
                .with_confidence(0.9),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ComputationCache;
    use crate::profiler::profile_dataset;
    use crate::table::{Column, Table};
    use serde_json::json;

    fn run(table: &Table) -> Vec<Finding> {
        let profile = profile_dataset(table);
        let cache = ComputationCache::new(table);
        MissingDetector
            .detect(&DetectionContext::new(table, &profile, &cache))
            .unwrap()
    }

    #[test]
    fn test_null_ratio_severity() {
        let table = Table::new(vec![
            Column::new("mostly_null", vec![json!(1), Value::Null, Value::Null, Value::Null]),
            Column::new("some_null", vec![json!("a"), json!("b"), json!("c"), Value::Null]),
            Column::new("full", vec![json!(1), json!(2), json!(3), json!(4)]),
        ])
        .unwrap();
        let findings = run(&table);
        assert_eq!(findings.len(), 2);

        let mostly = findings.iter().find(|f| f.columns == ["mostly_null"]).unwrap();
        assert_eq!(mostly.severity, Severity::High);
        assert_eq!(mostly.detail_f64("null_ratio"), Some(0.75));
        assert_eq!(mostly.detail_str("dtype"), Some("integer"));

        let some = findings.iter().find(|f| f.columns == ["some_null"]).unwrap();
        assert_eq!(some.severity, Severity::Medium);
        assert_eq!(some.confidence, 1.0);
    }

    #[test]
    fn test_low_severity_for_small_ratio() {
        assert_eq!(severity_for(0.05), Severity::Low);
        assert_eq!(severity_for(0.1), Severity::Low);
        assert_eq!(severity_for(0.11), Severity::Medium);
        assert_eq!(severity_for(0.51), Severity::High);
    }

    #[test]
    fn test_blank_strings() {
        let table = Table::new(vec![Column::new(
            "city",
            vec![json!("Oslo"), json!(""), json!("   "), json!("Rome")],
        )])
        .unwrap();
        let findings = run(&table);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.issue_type, issue::EMPTY_STRINGS);
        assert_eq!(finding.rows, Some(vec![1, 2]));
        assert_eq!(finding.confidence, 0.9);
    }

    #[test]
    fn test_clean_table_has_no_findings() {
        let table = Table::from_records(&[json!({"a": 1, "b": "x"})]).unwrap();
        assert!(run(&table).is_empty());
        assert!(run(&Table::default()).is_empty());
    }
}
