//! Statistical outliers in numeric columns.

use super::{DetectionContext, Detector, round4};
use crate::config::OutlierMethod;
use crate::error::Result;
use crate::models::{Finding, Severity, issue};

const MIN_VALUES: usize = 10;

/// Flags numeric values outside IQR fences or beyond a z-score cutoff.
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    method: OutlierMethod,
    threshold: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new(OutlierMethod::Iqr, 1.5)
    }
}

impl OutlierDetector {
    /// Creates a detector; `threshold` is the IQR multiplier or z cutoff.
    pub fn new(method: OutlierMethod, threshold: f64) -> Self {
        Self { method, threshold }
    }

    fn bounds(&self, ctx: &DetectionContext<'_>, column: &str) -> Result<Option<(f64, f64)>> {
        let Some(stats) = ctx.cache.statistics(column)? else {
            return Ok(None);
        };
        let bounds = match self.method {
            OutlierMethod::Iqr => {
                let iqr = stats.iqr();
                (iqr != 0.0).then(|| {
                    (
                        stats.q1 - self.threshold * iqr,
                        stats.q3 + self.threshold * iqr,
                    )
                })
            }
            OutlierMethod::Zscore => (stats.std != 0.0).then(|| {
                (
                    stats.mean - self.threshold * stats.std,
                    stats.mean + self.threshold * stats.std,
                )
            }),
        };
        Ok(bounds)
    }
}

impl Detector for OutlierDetector {
    fn name(&self) -> &'static str {
        "outliers"
    }

    fn description(&self) -> &'static str {
        "Detects statistical outliers in numeric columns"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for column in ctx.table.columns() {
            if !column.data_type().is_numeric() {
                continue;
            }
            let values = column.numeric_values();
            if values.len() < MIN_VALUES {
                continue;
            }
            let Some((lower, upper)) = self.bounds(ctx, column.name())? else {
                continue;
            };

            let rows: Vec<usize> = values
                .iter()
                .filter(|(_, v)| *v < lower || *v > upper)
                .map(|(row, _)| *row)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let ratio = rows.len() as f64 / values.len() as f64;
            let severity = if ratio > 0.05 {
                Severity::High
            } else if ratio > 0.01 {
                Severity::Medium
            } else {
                Severity::Low
            };
            findings.push(
                Finding::new(
                    self.name(),
                    issue::OUTLIERS,
                    severity,
                    vec![column.name().to_string()],
                    format!(
                        "Column '{}' has {} outliers ({:.1}%) detected by {}",
                        column.name(),
                        rows.len(),
                        ratio * 100.0,
                        self.method.name().to_uppercase()
                    ),
                )
                .with_detail("outlier_count", rows.len())
                .with_detail("outlier_ratio", round4(ratio))
                .with_detail("method", self.method.name())
                .with_detail("threshold", self.threshold)
                .with_rows(rows)
                .with_confidence(0.85),
            );
        }
        Ok(findings)
    }
}
