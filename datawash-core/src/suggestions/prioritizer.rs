//! Priority scoring and ranking of suggestions.

use std::cmp::Ordering;

use super::rules::execution_rank;
use crate::models::Suggestion;

/// `0.5 * priority weight + 0.5 * finding confidence`.
pub fn priority_score(suggestion: &Suggestion) -> f64 {
    0.5 * suggestion.priority.weight() + 0.5 * suggestion.finding.confidence
}

fn rank_order(a: &Suggestion, b: &Suggestion) -> Ordering {
    priority_score(b)
        .total_cmp(&priority_score(a))
        .then_with(|| {
            execution_rank(&a.transformer, &a.operation)
                .cmp(&execution_rank(&b.transformer, &b.operation))
        })
        .then_with(|| a.target_columns().cmp(&b.target_columns()))
}

/// Sorts by descending priority score and reassigns ids `1..=N`.
///
/// Score ties are broken by execution order, then by target column names,
/// so equal inputs always rank the same way.
pub fn sort_suggestions(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    suggestions.sort_by(rank_order);
    for (index, suggestion) in suggestions.iter_mut().enumerate() {
        suggestion.id = index + 1;
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, Params, Severity};
    use serde_json::json;

    fn suggestion(priority: Severity, confidence: f64, operation: &str, column: &str) -> Suggestion {
        let mut params = Params::new();
        params.insert("columns".to_string(), json!([column]));
        Suggestion {
            id: 0,
            finding: Finding::new("test", "test", priority, vec![column.to_string()], "msg")
                .with_confidence(confidence),
            action: String::new(),
            transformer: "formats".to_string(),
            operation: operation.to_string(),
            params,
            priority,
            impact: String::new(),
            rationale: String::new(),
        }
    }

    #[test]
    fn test_priority_score() {
        let s = suggestion(Severity::High, 0.8, "lowercase", "a");
        assert!((priority_score(&s) - 1.9).abs() < 1e-12);
        let s = suggestion(Severity::Low, 1.0, "lowercase", "a");
        assert!((priority_score(&s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sort_assigns_dense_ids() {
        let sorted = sort_suggestions(vec![
            suggestion(Severity::Low, 1.0, "lowercase", "a"),
            suggestion(Severity::High, 1.0, "lowercase", "b"),
            suggestion(Severity::Medium, 0.9, "lowercase", "c"),
        ]);
        let columns: Vec<_> = sorted.iter().map(|s| s.target_columns()[0]).collect();
        assert_eq!(columns, vec!["b", "c", "a"]);
        let ids: Vec<_> = sorted.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_follow_execution_order_then_columns() {
        let sorted = sort_suggestions(vec![
            suggestion(Severity::Low, 0.8, "lowercase", "z"),
            suggestion(Severity::Low, 0.8, "strip_whitespace", "y"),
            suggestion(Severity::Low, 0.8, "lowercase", "b"),
        ]);
        let order: Vec<_> = sorted
            .iter()
            .map(|s| (s.operation.as_str(), s.target_columns()[0]))
            .collect();
        assert_eq!(
            order,
            vec![
                ("strip_whitespace", "y"),
                ("lowercase", "b"),
                ("lowercase", "z")
            ]
        );
    }
}
