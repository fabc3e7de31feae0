//! Similar-column detection with name and value blocking.
//!
//! Candidate pairs come from two cheap blocking passes: shared character
//! n-grams of the column names, and MinHash/LSH buckets of the column value
//! sets (with a set-size ratio filter). Only the union of those candidates,
//! capped, is verified exactly.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::minhash::{LshIndex, MinHasher, passes_size_filter};
use super::{DetectionContext, Detector, round3};
use crate::config::SimilarityConfig;
use crate::error::Result;
use crate::models::{Finding, Severity, issue};

const NAME_WEIGHT: f64 = 0.4;
const VALUE_WEIGHT: f64 = 0.6;
const MEDIUM_SCORE: f64 = 0.8;

/// Levenshtein edit distance over chars, two-row Wagner-Fischer.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len() > b_chars.len() {
        return levenshtein_distance(b, a);
    }

    let m = a_chars.len();
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];

    for (j, b_char) in b_chars.iter().enumerate() {
        curr[0] = j + 1;
        for (i, a_char) in a_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr[i + 1] = (prev[i + 1] + 1).min(curr[i] + 1).min(prev[i] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// `1 - distance / max_len` over lower-cased names; two empty names are
/// identical.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

/// Exact Jaccard similarity; 0.0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|v| large.contains(*v)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

fn ngrams(name: &str, n: usize) -> BTreeSet<String> {
    let chars: Vec<char> = name.to_lowercase().chars().collect();
    if n == 0 || chars.len() < n {
        return BTreeSet::new();
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Pairs of column indices sharing at least `min_shared` name n-grams.
pub fn name_candidates(names: &[&str], n: usize, min_shared: usize) -> BTreeSet<(usize, usize)> {
    let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (column, name) in names.iter().enumerate() {
        for gram in ngrams(name, n) {
            index.entry(gram).or_default().push(column);
        }
    }

    let mut shared: HashMap<(usize, usize), usize> = HashMap::new();
    for members in index.values() {
        for (i, a) in members.iter().enumerate() {
            for b in members.iter().skip(i + 1) {
                *shared.entry((*a, *b)).or_insert(0) += 1;
            }
        }
    }

    shared
        .into_iter()
        .filter(|(_, count)| *count >= min_shared.max(1))
        .map(|(pair, _)| pair)
        .collect()
}

/// Reports pairs of columns that look like duplicates of each other.
#[derive(Debug, Clone, Default)]
pub struct SimilarityDetector {
    config: SimilarityConfig,
}

impl SimilarityDetector {
    /// Creates a detector with the given tuning.
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    fn value_sets<'c>(&self, ctx: &'c DetectionContext<'_>) -> Result<Vec<Option<&'c HashSet<String>>>> {
        ctx.table
            .columns()
            .iter()
            .map(|column| {
                if ctx.cache.unique_count(column.name())? > self.config.max_unique_values {
                    Ok(None)
                } else {
                    ctx.cache.value_set(column.name()).map(Some)
                }
            })
            .collect()
    }

    fn value_candidates(&self, sets: &[Option<&HashSet<String>>]) -> BTreeSet<(usize, usize)> {
        let hasher = MinHasher::new(self.config.signature_length);
        let signatures: Vec<(usize, Vec<u32>)> = sets
            .iter()
            .enumerate()
            .filter_map(|(i, &set)| {
                set.filter(|s| !s.is_empty())
                    .map(|s| (i, hasher.signature(s)))
            })
            .collect();

        let lsh = LshIndex::new(
            self.config.bands,
            self.config.rows_per_band(),
            self.config.max_bucket_size,
        );
        let size = |i: usize| sets.get(i).copied().flatten().map_or(0, HashSet::len);
        lsh.candidate_pairs(&signatures)
            .into_iter()
            .filter(|&(a, b)| passes_size_filter(size(a), size(b), self.config.value_threshold))
            .collect()
    }
}

impl Detector for SimilarityDetector {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn description(&self) -> &'static str {
        "Detects similar or potentially duplicate columns"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Finding>> {
        let names = ctx.table.column_names();
        if names.len() < 2 {
            return Ok(Vec::new());
        }

        let sets = self.value_sets(ctx)?;
        let by_name = name_candidates(&names, self.config.ngram_size, self.config.min_shared_ngrams);
        let by_value = self.value_candidates(&sets);
        tracing::debug!(
            "Similarity candidates: {} by name, {} by value",
            by_name.len(),
            by_value.len()
        );

        let empty = HashSet::new();
        let mut findings = Vec::new();
        for (a, b) in by_name
            .union(&by_value)
            .copied()
            .take(self.config.max_candidates)
        {
            let (Some(name_a), Some(name_b)) = (names.get(a), names.get(b)) else {
                continue;
            };
            let set_a = sets.get(a).copied().flatten().unwrap_or(&empty);
            let set_b = sets.get(b).copied().flatten().unwrap_or(&empty);

            let name_sim = name_similarity(name_a, name_b);
            let value_sim = jaccard(set_a, set_b);
            let combined = NAME_WEIGHT * name_sim + VALUE_WEIGHT * value_sim;
            if combined <= self.config.combined_threshold {
                continue;
            }

            let severity = if combined > MEDIUM_SCORE {
                Severity::Medium
            } else {
                Severity::Low
            };
            findings.push(
                Finding::new(
                    self.name(),
                    issue::SIMILAR_COLUMNS,
                    severity,
                    vec![(*name_a).to_string(), (*name_b).to_string()],
                    format!("Columns '{name_a}' and '{name_b}' appear similar (score: {combined:.2})"),
                )
                .with_detail("name_similarity", round3(name_sim))
                .with_detail("value_similarity", round3(value_sim))
                .with_detail("combined_score", round3(combined))
                .with_confidence(combined),
            );
        }
        Ok(findings)
    }
}
