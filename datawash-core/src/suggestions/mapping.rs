//! Static mapping from issue types to corrective actions.

use serde_json::{Value, json};

use crate::config::UseCase;
use crate::models::{Finding, Params, Severity, issue};

/// Operation chosen for a finding plus the parameters handed to the
/// transformer.
pub type BuiltAction = (&'static str, Params);

/// How one issue type turns into a suggestion.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionTemplate {
    pub issue_type: &'static str,
    pub action: &'static str,
    pub transformer: &'static str,
    pub impact: &'static str,
    pub rationale: &'static str,
    pub build: fn(&Finding) -> BuiltAction,
}

fn columns(finding: &Finding) -> Value {
    json!(finding.columns)
}

fn params(entries: Vec<(&str, Value)>) -> Params {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn missing_values(finding: &Finding) -> BuiltAction {
    let null_ratio = finding.detail_f64("null_ratio").unwrap_or(0.0);
    let numeric = matches!(finding.detail_str("dtype"), Some("integer" | "float"));
    let strategy = if null_ratio > 0.5 {
        "drop_rows"
    } else if numeric {
        "fill_median"
    } else {
        "fill_mode"
    };
    (
        strategy,
        params(vec![
            ("columns", columns(finding)),
            ("strategy", json!(strategy)),
        ]),
    )
}

fn empty_strings(finding: &Finding) -> BuiltAction {
    (
        "clean_empty_strings",
        params(vec![
            ("columns", columns(finding)),
            ("strategy", json!("clean_empty_strings")),
            ("fill_strategy", json!("mode")),
        ]),
    )
}

fn duplicate_rows(_finding: &Finding) -> BuiltAction {
    ("drop_duplicates", params(vec![("keep", json!("first"))]))
}

fn format_operation(finding: &Finding, operation: &'static str) -> BuiltAction {
    (
        operation,
        params(vec![
            ("columns", columns(finding)),
            ("operation", json!(operation)),
        ]),
    )
}

fn inconsistent_case(finding: &Finding) -> BuiltAction {
    format_operation(finding, "lowercase")
}

fn whitespace_padding(finding: &Finding) -> BuiltAction {
    format_operation(finding, "strip_whitespace")
}

fn inconsistent_date_format(finding: &Finding) -> BuiltAction {
    let (operation, mut built) = format_operation(finding, "standardize_dates");
    built.insert("target_format".to_string(), json!("%Y-%m-%d"));
    (operation, built)
}

fn outliers(finding: &Finding) -> BuiltAction {
    (
        "clip_outliers",
        params(vec![
            ("columns", columns(finding)),
            ("strategy", json!("clip_outliers")),
            ("method", json!(finding.detail_str("method").unwrap_or("iqr"))),
            ("threshold", json!(finding.detail_f64("threshold").unwrap_or(1.5))),
        ]),
    )
}

fn convert_type(finding: &Finding, target: &'static str) -> BuiltAction {
    (
        target,
        params(vec![
            ("columns", columns(finding)),
            ("target_type", json!(target)),
        ]),
    )
}

fn numeric_as_string(finding: &Finding) -> BuiltAction {
    convert_type(finding, "numeric")
}

fn boolean_as_string(finding: &Finding) -> BuiltAction {
    convert_type(finding, "boolean")
}

fn similar_columns(finding: &Finding) -> BuiltAction {
    format_operation(finding, "review_merge")
}

/// Every issue type that maps to a suggestion.
pub static TEMPLATES: [SuggestionTemplate; 10] = [
    SuggestionTemplate {
        issue_type: issue::MISSING_VALUES,
        action: "Handle missing values",
        transformer: "missing",
        impact: "Removes or fills null values to prevent errors",
        rationale: "Missing values cause errors in ML and analysis",
        build: missing_values,
    },
    SuggestionTemplate {
        issue_type: issue::EMPTY_STRINGS,
        action: "Clean empty strings",
        transformer: "missing",
        impact: "Standardizes missing value representation",
        rationale: "Empty strings are often unintentional missing values",
        build: empty_strings,
    },
    SuggestionTemplate {
        issue_type: issue::DUPLICATE_ROWS,
        action: "Remove duplicate rows",
        transformer: "duplicates",
        impact: "Removes redundant data that skews analysis",
        rationale: "Exact duplicates inflate counts and bias statistics",
        build: duplicate_rows,
    },
    SuggestionTemplate {
        issue_type: issue::INCONSISTENT_CASE,
        action: "Standardize text casing",
        transformer: "formats",
        impact: "Ensures consistent text representation",
        rationale: "Mixed casing causes mismatches in grouping and joins",
        build: inconsistent_case,
    },
    SuggestionTemplate {
        issue_type: issue::INCONSISTENT_DATE_FORMAT,
        action: "Standardize date format",
        transformer: "formats",
        impact: "Ensures consistent date parsing",
        rationale: "Mixed date formats cause parsing errors",
        build: inconsistent_date_format,
    },
    SuggestionTemplate {
        issue_type: issue::WHITESPACE_PADDING,
        action: "Strip whitespace from values",
        transformer: "formats",
        impact: "Removes accidental padding that causes mismatches",
        rationale: "Leading/trailing whitespace causes silent matching failures",
        build: whitespace_padding,
    },
    SuggestionTemplate {
        issue_type: issue::OUTLIERS,
        action: "Review and handle outliers",
        transformer: "missing",
        impact: "Reduces influence of extreme values on analysis",
        rationale: "Outliers can heavily skew means and model training",
        build: outliers,
    },
    SuggestionTemplate {
        issue_type: issue::NUMERIC_AS_STRING,
        action: "Convert to numeric type",
        transformer: "types",
        impact: "Enables numeric operations and reduces memory",
        rationale: "Numeric data stored as strings prevents mathematical operations",
        build: numeric_as_string,
    },
    SuggestionTemplate {
        issue_type: issue::BOOLEAN_AS_STRING,
        action: "Convert to boolean type",
        transformer: "types",
        impact: "Correct type enables boolean operations",
        rationale: "Boolean data as strings wastes memory and prevents logic ops",
        build: boolean_as_string,
    },
    SuggestionTemplate {
        issue_type: issue::SIMILAR_COLUMNS,
        action: "Review potentially duplicate columns",
        transformer: "columns",
        impact: "May reduce redundant data",
        rationale: "Similar columns may be duplicated data or candidates for merging",
        build: similar_columns,
    },
];

/// Template for an issue type, if one exists.
pub fn template_for(issue_type: &str) -> Option<&'static SuggestionTemplate> {
    TEMPLATES.iter().find(|t| t.issue_type == issue_type)
}

/// Priority multiplier a use case applies to an issue type.
pub fn boost(use_case: UseCase, issue_type: &str) -> f64 {
    let table: &[(&str, f64)] = match use_case {
        UseCase::General => &[],
        UseCase::Ml => &[
            (issue::DUPLICATE_ROWS, 1.5),
            (issue::MISSING_VALUES, 1.3),
            (issue::NUMERIC_AS_STRING, 1.3),
            (issue::BOOLEAN_AS_STRING, 1.2),
            (issue::OUTLIERS, 1.2),
            (issue::SIMILAR_COLUMNS, 1.4),
        ],
        UseCase::Analytics => &[
            (issue::MISSING_VALUES, 1.5),
            (issue::OUTLIERS, 1.3),
            (issue::INCONSISTENT_DATE_FORMAT, 1.4),
            (issue::INCONSISTENT_CASE, 1.2),
        ],
        UseCase::Export => &[
            (issue::INCONSISTENT_DATE_FORMAT, 1.5),
            (issue::WHITESPACE_PADDING, 1.4),
            (issue::INCONSISTENT_CASE, 1.3),
            (issue::NUMERIC_AS_STRING, 1.3),
        ],
    };
    table
        .iter()
        .find(|(name, _)| *name == issue_type)
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

/// Promotes a severity by one step when the multiplier is large enough.
///
/// `>= 1.4` lifts low to medium and `>= 1.3` lifts medium to high; a boost
/// never lowers priority.
pub fn boosted_priority(severity: Severity, multiplier: f64) -> Severity {
    match severity {
        Severity::Low if multiplier >= 1.4 => Severity::Medium,
        Severity::Medium if multiplier >= 1.3 => Severity::High,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(issue_type: &str) -> Finding {
        Finding::new("test", issue_type, Severity::Low, vec!["col".to_string()], "msg")
    }

    #[test]
    fn test_every_template_is_unique() {
        for template in &TEMPLATES {
            assert_eq!(
                TEMPLATES
                    .iter()
                    .filter(|t| t.issue_type == template.issue_type)
                    .count(),
                1
            );
        }
        assert!(template_for("unmapped_issue").is_none());
    }

    #[test]
    fn test_missing_values_strategy() {
        let build = template_for(issue::MISSING_VALUES).unwrap().build;

        let high = finding(issue::MISSING_VALUES)
            .with_detail("null_ratio", 0.6)
            .with_detail("dtype", "float");
        assert_eq!(build(&high).0, "drop_rows");

        let numeric = finding(issue::MISSING_VALUES)
            .with_detail("null_ratio", 0.2)
            .with_detail("dtype", "integer");
        assert_eq!(build(&numeric).0, "fill_median");

        let text = finding(issue::MISSING_VALUES)
            .with_detail("null_ratio", 0.2)
            .with_detail("dtype", "string");
        let (operation, built) = build(&text);
        assert_eq!(operation, "fill_mode");
        assert_eq!(built["strategy"], json!("fill_mode"));
        assert_eq!(built["columns"], json!(["col"]));
    }

    #[test]
    fn test_date_params() {
        let build = template_for(issue::INCONSISTENT_DATE_FORMAT).unwrap().build;
        let (operation, built) = build(&finding(issue::INCONSISTENT_DATE_FORMAT));
        assert_eq!(operation, "standardize_dates");
        assert_eq!(built["target_format"], json!("%Y-%m-%d"));
    }

    #[test]
    fn test_outlier_params_follow_finding() {
        let build = template_for(issue::OUTLIERS).unwrap().build;
        let outlier = finding(issue::OUTLIERS)
            .with_detail("method", "zscore")
            .with_detail("threshold", 3.0);
        let (_, built) = build(&outlier);
        assert_eq!(built["method"], json!("zscore"));
        assert_eq!(built["threshold"], json!(3.0));
    }

    #[test]
    fn test_boosts() {
        assert_eq!(boost(UseCase::General, issue::DUPLICATE_ROWS), 1.0);
        assert_eq!(boost(UseCase::Ml, issue::DUPLICATE_ROWS), 1.5);
        assert_eq!(boost(UseCase::Export, issue::WHITESPACE_PADDING), 1.4);
        assert_eq!(boost(UseCase::Analytics, issue::SIMILAR_COLUMNS), 1.0);
    }

    #[test]
    fn test_boosted_priority_only_increases() {
        assert_eq!(boosted_priority(Severity::Low, 1.4), Severity::Medium);
        assert_eq!(boosted_priority(Severity::Low, 1.3), Severity::Low);
        assert_eq!(boosted_priority(Severity::Medium, 1.3), Severity::High);
        assert_eq!(boosted_priority(Severity::High, 1.5), Severity::High);
        assert_eq!(boosted_priority(Severity::Medium, 1.0), Severity::Medium);
    }
}
