//! Numbers and booleans stored as text.

use std::collections::BTreeSet;

use serde_json::Value;

use super::{DetectionContext, Detector, round3};
use crate::error::Result;
use crate::models::{Finding, Severity, issue};

/// Recognized boolean vocabulary after trimming and lower-casing.
pub const BOOLEAN_VOCABULARY: [&str; 12] = [
    "true", "false", "yes", "no", "y", "n", "1", "0", "t", "f", "on", "off",
];

const NUMERIC_MIN_RATIO: f64 = 0.8;

/// True if the trimmed text parses as a finite number.
pub fn parses_as_number(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Flags text columns that hold numbers or booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDetector;

impl TypeDetector {
    fn numeric_finding(&self, column: &str, texts: &[&str]) -> Option<Finding> {
        let numeric = texts.iter().filter(|t| parses_as_number(t)).count();
        let ratio = numeric as f64 / texts.len() as f64;
        (ratio > NUMERIC_MIN_RATIO).then(|| {
            Finding::new(
                self.name(),
                issue::NUMERIC_AS_STRING,
                Severity::Medium,
                vec![column.to_string()],
                format!(
                    "Column '{}' appears numeric but stored as string ({:.0}% parseable)",
                    column,
                    ratio * 100.0
                ),
            )
            .with_detail("numeric_ratio", round3(ratio))
            .with_confidence(ratio)
        })
    }

    fn boolean_finding(&self, column: &str, texts: &[&str]) -> Option<Finding> {
        let distinct: BTreeSet<String> = texts.iter().map(|t| t.trim().to_lowercase()).collect();
        let recognized = distinct
            .iter()
            .all(|v| BOOLEAN_VOCABULARY.contains(&v.as_str()));
        (recognized && distinct.len() >= 2).then(|| {
            Finding::new(
                self.name(),
                issue::BOOLEAN_AS_STRING,
                Severity::Low,
                vec![column.to_string()],
                format!("Column '{column}' contains boolean-like values stored as strings"),
            )
            .with_detail("values", distinct.into_iter().collect::<Vec<_>>())
            .with_confidence(0.95)
        })
    }
}

impl Detector for TypeDetector {
    fn name(&self) -> &'static str {
        "types"
    }

    fn description(&self) -> &'static str {
        "Detects numeric and boolean values stored as strings"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for column in ctx.table.columns() {
            if !column.data_type().is_textual() {
                continue;
            }
            let texts: Vec<&str> = column.non_null().filter_map(Value::as_str).collect();
            if texts.is_empty() {
                continue;
            }
            findings.extend(self.numeric_finding(column.name(), &texts));
            findings.extend(self.boolean_finding(column.name(), &texts));
        }
        Ok(findings)
    }
}
