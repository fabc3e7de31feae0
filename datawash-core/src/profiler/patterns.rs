//! Structural pattern and date-format detection.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::models::PatternMatch;

/// Number of leading non-null values inspected per column.
pub const PATTERN_SAMPLE_SIZE: usize = 1_000;

/// Share of values a structural pattern must exceed to win.
pub const STRUCTURAL_MIN_RATIO: f64 = 0.5;

/// Share of values a date template must exceed to win.
pub const DATE_MIN_RATIO: f64 = 0.7;

/// Name under which a winning date template is recorded.
pub const DATE_PATTERN: &str = "date";

const STRUCTURAL_SOURCES: [(&str, &str); 7] = [
    ("email", r"^[\w.+-]+@[\w-]+\.[\w.-]+$"),
    ("url", r"^https?://[\w\-._~:/?#\[\]@!$&'()*+,;=]+$"),
    ("phone", r"^[+]?[(]?[0-9]{1,4}[)]?[-\s./0-9]{6,15}$"),
    ("ipv4", r"^(?:\d{1,3}\.){3}\d{1,3}$"),
    (
        "uuid",
        r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
    ),
    ("currency", r"^[$€£¥]\s?[\d,]+\.?\d*$"),
    ("zip_us", r"^\d{5}(-\d{4})?$"),
];

/// Date templates tried in order; the first above [`DATE_MIN_RATIO`] wins.
pub const DATE_FORMATS: [&str; 13] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y%m%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Pre-compiled structural patterns in detection order.
pub struct PatternCatalog {
    patterns: Vec<(&'static str, Regex)>,
}

impl PatternCatalog {
    /// Gets the singleton instance of compiled patterns.
    pub fn instance() -> &'static Self {
        static CATALOG: OnceLock<PatternCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        let patterns = STRUCTURAL_SOURCES
            .iter()
            .filter_map(|(name, source)| match Regex::new(source) {
                Ok(regex) => Some((*name, regex)),
                Err(e) => {
                    tracing::warn!("Pattern '{}' failed to compile: {}", name, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Compiled patterns in detection order.
    pub fn patterns(&self) -> &[(&'static str, Regex)] {
        &self.patterns
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn parses_as_date(value: &str, format: &str) -> bool {
    if format.contains("%H") {
        NaiveDateTime::parse_from_str(value, format).is_ok()
    } else {
        NaiveDate::parse_from_str(value, format).is_ok()
    }
}

/// Finds the first date template that parses more than 70% of the sample.
pub fn detect_date_format(sample: &[String]) -> Option<PatternMatch> {
    if sample.is_empty() {
        return None;
    }
    let total = sample.len() as f64;
    DATE_FORMATS.iter().find_map(|format| {
        let parsed = sample.iter().filter(|v| parses_as_date(v, format)).count();
        let ratio = parsed as f64 / total;
        (ratio > DATE_MIN_RATIO).then(|| PatternMatch {
            match_ratio: round3(ratio),
            descriptor: (*format).to_string(),
        })
    })
}

/// Detects patterns over rendered non-null values.
///
/// Every structural pattern matching more than half of the first 1,000
/// values is recorded. The date scan only runs when no structural pattern
/// won.
pub fn detect_patterns(values: &[String]) -> BTreeMap<String, PatternMatch> {
    let sample = &values[..values.len().min(PATTERN_SAMPLE_SIZE)];
    let mut results = BTreeMap::new();
    if sample.is_empty() {
        return results;
    }

    let total = sample.len() as f64;
    for (name, regex) in PatternCatalog::instance().patterns() {
        let matches = sample.iter().filter(|v| regex.is_match(v)).count();
        let ratio = matches as f64 / total;
        if ratio > STRUCTURAL_MIN_RATIO {
            results.insert(
                (*name).to_string(),
                PatternMatch {
                    match_ratio: round3(ratio),
                    descriptor: regex.as_str().to_string(),
                },
            );
        }
    }

    if results.is_empty()
        && let Some(date) = detect_date_format(sample)
    {
        results.insert(DATE_PATTERN.to_string(), date);
    }
    results
}

/// Semantic type of a column: the first winning structural pattern in
/// detection order, else `date`.
pub fn semantic_type(patterns: &BTreeMap<String, PatternMatch>) -> Option<String> {
    PatternCatalog::instance()
        .patterns()
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once(DATE_PATTERN))
        .find(|name| patterns.contains_key(*name))
        .map(ToString::to_string)
}
