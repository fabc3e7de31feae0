//! Inconsistent casing, date formats and whitespace within text columns.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{DetectionContext, Detector};
use crate::error::{DataWashError, Result};
use crate::models::{Finding, Severity, issue};
use crate::profiler::patterns::DATE_PATTERN;

const MIN_VALUES: usize = 5;

/// All cased characters are uppercase and at least one exists.
pub fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        cased |= ch.is_uppercase();
    }
    cased
}

/// All cased characters are lowercase and at least one exists.
pub fn is_lower(text: &str) -> bool {
    let mut cased = false;
    for ch in text.chars() {
        if ch.is_uppercase() {
            return false;
        }
        cased |= ch.is_lowercase();
    }
    cased
}

/// Uppercase characters only start words and lowercase ones only follow
/// cased characters; at least one cased character exists.
pub fn is_title(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for ch in text.chars() {
        if ch.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if ch.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

struct DateShapes {
    slash: Regex,
    iso: Regex,
}

fn date_shapes() -> Result<&'static DateShapes> {
    static SHAPES: OnceLock<std::result::Result<DateShapes, String>> = OnceLock::new();
    SHAPES
        .get_or_init(|| {
            Ok(DateShapes {
                slash: Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$").map_err(|e| e.to_string())?,
                iso: Regex::new(r"^\d{4}-\d{2}-\d{2}").map_err(|e| e.to_string())?,
            })
        })
        .as_ref()
        .map_err(|e| DataWashError::detection_failed("formats", e.clone()))
}

/// Flags casing, date-format and padding inconsistencies in text columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDetector;

impl FormatDetector {
    fn case_finding(&self, column: &str, texts: &[&str]) -> Option<Finding> {
        let has_upper = texts.iter().any(|t| is_upper(t));
        let has_lower = texts.iter().any(|t| is_lower(t));
        let has_title = texts.iter().any(|t| is_title(t));
        let classes = [has_upper, has_lower, has_title]
            .iter()
            .filter(|present| **present)
            .count();
        (classes >= 2).then(|| {
            Finding::new(
                self.name(),
                issue::INCONSISTENT_CASE,
                Severity::Low,
                vec![column.to_string()],
                format!("Column '{column}' has inconsistent casing (mixed upper/lower/title case)"),
            )
            .with_detail("has_upper", has_upper)
            .with_detail("has_lower", has_lower)
            .with_detail("has_title", has_title)
            .with_confidence(0.8)
        })
    }

    fn date_finding(&self, column: &str, texts: &[&str]) -> Result<Option<Finding>> {
        let shapes = date_shapes()?;
        let slash = texts.iter().filter(|t| shapes.slash.is_match(t)).count();
        let iso = texts.iter().filter(|t| shapes.iso.is_match(t)).count();
        if slash == 0 || iso == 0 {
            return Ok(None);
        }
        Ok(Some(
            Finding::new(
                self.name(),
                issue::INCONSISTENT_DATE_FORMAT,
                Severity::Medium,
                vec![column.to_string()],
                format!(
                    "Column '{column}' has mixed date formats ({slash} slash-style, {iso} ISO-style)"
                ),
            )
            .with_detail("slash_count", slash)
            .with_detail("dash_count", iso)
            .with_confidence(0.85),
        ))
    }

    fn whitespace_finding(&self, column: &str, texts: &[&str]) -> Option<Finding> {
        let leading = texts
            .iter()
            .filter(|t| t.len() != t.trim_start().len())
            .count();
        let trailing = texts
            .iter()
            .filter(|t| t.len() != t.trim_end().len())
            .count();
        let total = leading + trailing;
        (total > 0).then(|| {
            Finding::new(
                self.name(),
                issue::WHITESPACE_PADDING,
                Severity::Low,
                vec![column.to_string()],
                format!("Column '{column}' has {total} values with leading/trailing whitespace"),
            )
            .with_detail("leading_spaces", leading)
            .with_detail("trailing_spaces", trailing)
        })
    }
}

impl Detector for FormatDetector {
    fn name(&self) -> &'static str {
        "formats"
    }

    fn description(&self) -> &'static str {
        "Detects inconsistent formats within columns"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for column in ctx.table.columns() {
            if !column.data_type().is_textual() {
                continue;
            }
            let texts: Vec<&str> = column.non_null().filter_map(Value::as_str).collect();
            if texts.len() < MIN_VALUES {
                continue;
            }

            findings.extend(self.case_finding(column.name(), &texts));

            let has_date_pattern = ctx
                .profile
                .column(column.name())
                .is_some_and(|p| p.has_pattern(DATE_PATTERN));
            if has_date_pattern {
                findings.extend(self.date_finding(column.name(), &texts)?);
            }

            findings.extend(self.whitespace_finding(column.name(), &texts));
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
        FormatDetector
            .detect(&DetectionContext::new(table, &profile, &cache))
            .unwrap()
    }

    fn text_table(name: &str, values: &[&str]) -> Table {
        Table::new(vec![Column::new(
            name,
            values.iter().map(|v| json!(v)).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn test_case_classes() {
        assert!(is_upper("ABC 1"));
        assert!(!is_upper("123"));
        assert!(is_lower("abc-d"));
        assert!(is_title("Hello World"));
        assert!(!is_title("HELLO"));
        assert!(!is_title("hello"));
        assert!(is_title("A"));
        assert!(is_upper("A"));
    }

    #[test]
    fn test_inconsistent_case() {
        let table = text_table("city", &["oslo", "ROME", "Paris", "berlin", "madrid"]);
        let findings = run(&table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].issue_type, issue::INCONSISTENT_CASE);
        assert_eq!(findings[0].confidence, 0.8);
    }

    #[test]
    fn test_consistent_case() {
        let table = text_table("city", &["oslo", "rome", "paris", "berlin", "madrid"]);
        assert!(run(&table).is_empty());
    }

    #[test]
    fn test_too_few_values_skipped() {
        let table = text_table("city", &["oslo", "ROME", " Paris "]);
        assert!(run(&table).is_empty());
    }

    #[test]
    fn test_whitespace_padding() {
        let table = text_table("code", &["a1", " a2", "a3 ", " a4 ", "a5"]);
        let findings = run(&table);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.issue_type, issue::WHITESPACE_PADDING);
        assert_eq!(finding.details["leading_spaces"], json!(2));
        assert_eq!(finding.details["trailing_spaces"], json!(2));
    }

    #[test]
    fn test_mixed_date_formats() {
        let table = text_table(
            "signup",
            &[
                "jan 15, 2023",
                "feb 20, 2023",
                "mar 05, 2023",
                "apr 11, 2023",
                "may 30, 2023",
                "jun 01, 2023",
                "jul 19, 2023",
                "aug 23, 2023",
                "01/15/2023",
                "2023-01-15",
            ],
        );
        let findings = run(&table);
        let dates: Vec<_> = findings
            .iter()
            .filter(|f| f.issue_type == issue::INCONSISTENT_DATE_FORMAT)
            .collect();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].severity, Severity::Medium);
        assert_eq!(dates[0].details["slash_count"], json!(1));
        assert_eq!(dates[0].details["dash_count"], json!(1));
    }

    #[test]
    fn test_dates_without_date_pattern_are_ignored() {
        let table = text_table(
            "mixed",
            &["01/15/2023", "2023-01-15", "x", "y", "z"],
        );
        let findings = run(&table);
        assert!(
            findings
                .iter()
                .all(|f| f.issue_type != issue::INCONSISTENT_DATE_FORMAT)
        );
    }
}
