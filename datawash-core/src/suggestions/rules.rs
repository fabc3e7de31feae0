//! Conflict and ordering rules between suggested operations.
//!
//! Operations are identified by `(transformer, operation)` pairs.

use std::collections::HashSet;

use crate::models::Suggestion;

/// A `(transformer, operation)` pair.
pub type ActionKey = (&'static str, &'static str);

const CASE_OPERATIONS: [ActionKey; 3] = [
    ("formats", "lowercase"),
    ("formats", "uppercase"),
    ("formats", "titlecase"),
];

/// Dominant operation and the operations it excludes on the same column.
pub static EXCLUSIONS: [(ActionKey, &[ActionKey]); 4] = [
    (
        ("types", "boolean"),
        &[
            CASE_OPERATIONS[0],
            CASE_OPERATIONS[1],
            CASE_OPERATIONS[2],
            ("types", "numeric"),
        ],
    ),
    (("types", "numeric"), &CASE_OPERATIONS),
    (("formats", "standardize_dates"), &CASE_OPERATIONS),
    (
        ("missing", "drop_rows"),
        &[
            ("missing", "fill_median"),
            ("missing", "fill_mode"),
            ("missing", "fill_value"),
        ],
    ),
];

/// Safe application order: row-count changes, string normalization,
/// missing-value fills, type conversion, outlier clipping, column-level ops.
pub static EXECUTION_ORDER: [ActionKey; 21] = [
    ("duplicates", "drop_duplicates"),
    ("missing", "drop_rows"),
    ("formats", "strip_whitespace"),
    ("formats", "lowercase"),
    ("formats", "uppercase"),
    ("formats", "titlecase"),
    ("formats", "standardize_dates"),
    ("missing", "clean_empty_strings"),
    ("missing", "empty_to_nan"),
    ("missing", "fill_median"),
    ("missing", "fill_mode"),
    ("missing", "fill_value"),
    ("types", "numeric"),
    ("types", "boolean"),
    ("types", "datetime"),
    ("types", "string"),
    ("missing", "clip_outliers"),
    ("columns", "review_merge"),
    ("columns", "merge"),
    ("columns", "rename"),
    ("columns", "drop"),
];

/// Position of an operation in [`EXECUTION_ORDER`]; unknown pairs rank last.
pub fn execution_rank(transformer: &str, operation: &str) -> usize {
    EXECUTION_ORDER
        .iter()
        .position(|(t, o)| *t == transformer && *o == operation)
        .unwrap_or(EXECUTION_ORDER.len())
}

/// Operations excluded by a dominant operation.
pub fn excluded_by(transformer: &str, operation: &str) -> &'static [ActionKey] {
    EXCLUSIONS
        .iter()
        .find(|((t, o), _)| *t == transformer && *o == operation)
        .map_or(&[], |(_, excluded)| *excluded)
}

/// Drops suggestions whose operation is excluded by a dominant operation
/// suggested for one of the same columns.
pub fn resolve_exclusions(suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut blocked: HashSet<(String, ActionKey)> = HashSet::new();
    for suggestion in &suggestions {
        let (transformer, operation) = suggestion.action_key();
        let excluded = excluded_by(transformer, operation);
        for column in suggestion.target_columns() {
            for key in excluded {
                blocked.insert((column.to_string(), *key));
            }
        }
    }
    if blocked.is_empty() {
        return suggestions;
    }

    suggestions
        .into_iter()
        .filter(|suggestion| {
            let (transformer, operation) = suggestion.action_key();
            let is_blocked = suggestion.target_columns().iter().any(|column| {
                blocked
                    .iter()
                    .any(|(c, (t, o))| c == column && *t == transformer && *o == operation)
            });
            if is_blocked {
                tracing::debug!(
                    "Dropping {}/{} for {:?}: excluded by a dominant operation",
                    transformer,
                    operation,
                    suggestion.target_columns()
                );
            }
            !is_blocked
        })
        .collect()
}

/// Stable reorder into safe application order; ids are left untouched.
pub fn sort_by_execution_order(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    suggestions.sort_by_key(|s| execution_rank(&s.transformer, &s.operation));
    suggestions
}
