//! Turns findings into a ranked, conflict-free list of suggestions.

use super::mapping::{boost, boosted_priority, template_for};
use super::prioritizer::sort_suggestions;
use super::rules::{resolve_exclusions, sort_by_execution_order};
use crate::config::UseCase;
use crate::models::{Finding, Suggestion};

fn map_finding(finding: &Finding, use_case: UseCase) -> Option<Suggestion> {
    let Some(template) = template_for(&finding.issue_type) else {
        tracing::debug!(
            "No suggestion mapping for issue type '{}' from detector '{}'",
            finding.issue_type,
            finding.detector
        );
        return None;
    };
    let (operation, params) = (template.build)(finding);
    let multiplier = boost(use_case, &finding.issue_type);

    Some(Suggestion {
        id: 0,
        finding: finding.clone(),
        action: template.action.to_string(),
        transformer: template.transformer.to_string(),
        operation: operation.to_string(),
        params,
        priority: boosted_priority(finding.severity, multiplier),
        impact: template.impact.to_string(),
        rationale: template.rationale.to_string(),
    })
}

/// Generates at most `max_suggestions` suggestions for the findings.
///
/// Findings without a mapping are skipped. Use-case boosts can raise a
/// suggestion's priority, conflicting operations on the same column are
/// resolved in favour of the dominant one, and the survivors are ranked by
/// priority score with ids `1..=N`.
pub fn generate_suggestions(
    findings: &[Finding],
    max_suggestions: usize,
    use_case: UseCase,
) -> Vec<Suggestion> {
    let mapped: Vec<Suggestion> = findings
        .iter()
        .filter_map(|finding| map_finding(finding, use_case))
        .collect();
    let mapped_count = mapped.len();

    let resolved = resolve_exclusions(mapped);
    let mut ranked = sort_suggestions(sort_by_execution_order(resolved));
    ranked.truncate(max_suggestions);

    tracing::debug!(
        "Generated {} suggestions from {} findings ({} mapped)",
        ranked.len(),
        findings.len(),
        mapped_count
    );
    ranked
}
