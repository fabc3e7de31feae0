//! Summary statistics for column profiling.

use std::collections::{HashMap, HashSet};

use crate::cache::NumericSummary;
use crate::models::{CategoricalStatistics, NumericStatistics};
use crate::table::{Column, cell_key, render_cell};

/// Number of top values kept in categorical statistics.
const TOP_VALUES: usize = 10;

/// Distinct non-null values of a column, compared by canonical cell key.
pub fn distinct_count(column: &Column) -> usize {
    column.non_null().map(cell_key).collect::<HashSet<_>>().len()
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0.0 below two values.
pub fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Quantile of sorted values using linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            let lo = sorted.get(lower).copied().unwrap_or(0.0);
            let hi = sorted.get(upper).copied().unwrap_or(lo);
            lo + (hi - lo) * frac
        }
    }
}

fn central_moment_sums(values: &[f64], mean: f64) -> (f64, f64, f64) {
    values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
        let d = v - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    })
}

/// Adjusted Fisher-Pearson sample skewness; 0.0 below three values or for
/// constant data.
pub fn skewness(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let (m2, m3, _) = central_moment_sums(values, mean);
    let m2 = m2 / n;
    let m3 = m3 / n;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    (n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5)
}

/// Unbiased excess kurtosis; 0.0 below four values or for constant data.
pub fn kurtosis(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let (m2, _, m4) = central_moment_sums(values, mean);
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let variance = m2 / (n - 1.0);
    let leading = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    leading * m4 / variance.powi(2) - correction
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Compact summary used by the computation cache and outlier detection.
pub fn numeric_summary(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let mean = mean(values);
    Some(NumericSummary {
        count: values.len(),
        mean,
        std: sample_std(values, mean),
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
    })
}

/// Full numeric statistics for a profile.
pub fn numeric_statistics(values: &[f64]) -> Option<NumericStatistics> {
    let summary = numeric_summary(values)?;
    let sorted = sorted_copy(values);
    Some(NumericStatistics {
        mean: summary.mean,
        median: quantile(&sorted, 0.5),
        std: summary.std,
        min: summary.min,
        max: summary.max,
        q25: summary.q1,
        q75: summary.q3,
        skewness: skewness(values, summary.mean),
        kurtosis: kurtosis(values, summary.mean),
    })
}

/// Categorical statistics over the rendered non-null values of a column.
///
/// Ties in frequency keep first-appearance order.
pub fn categorical_statistics(column: &Column) -> Option<CategoricalStatistics> {
    let rendered: Vec<String> = column.non_null().map(render_cell).collect();
    if rendered.is_empty() {
        return None;
    }

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, value) in rendered.iter().enumerate() {
        counts.entry(value.as_str()).or_insert((0, position)).0 += 1;
    }
    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first))| (value, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let lengths: Vec<usize> = rendered.iter().map(|v| v.chars().count()).collect();
    let total_length: usize = lengths.iter().sum();

    Some(CategoricalStatistics {
        top_values: ranked
            .iter()
            .take(TOP_VALUES)
            .map(|(value, count, _)| ((*value).to_string(), *count))
            .collect(),
        mode: ranked.first().map(|(value, _, _)| (*value).to_string()),
        avg_length: total_length as f64 / lengths.len() as f64,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&sorted, 0.25), 1.75));
        assert!(approx(quantile(&sorted, 0.5), 2.5));
        assert!(approx(quantile(&sorted, 0.75), 3.25));
        assert!(approx(quantile(&[7.0], 0.9), 7.0));
        assert!(approx(quantile(&[], 0.5), 0.0));
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert!(approx(m, 5.0));
        assert!(approx(sample_std(&values, m), (32.0_f64 / 7.0).sqrt()));
        assert!(approx(sample_std(&[3.0], 3.0), 0.0));
    }

    #[test]
    fn test_skewness_and_kurtosis() {
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(skewness(&symmetric, 3.0), 0.0));
        // Known value for 1..=5: -1.2
        assert!(approx(kurtosis(&symmetric, 3.0), -1.2));

        let skewed = [1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&skewed, mean(&skewed)) > 0.0);

        assert!(approx(skewness(&[1.0, 2.0], 1.5), 0.0));
        assert!(approx(kurtosis(&[4.0, 4.0, 4.0, 4.0], 4.0), 0.0));
    }

    #[test]
    fn test_numeric_statistics() {
        let stats = numeric_statistics(&[5.0, 1.0, 3.0]).unwrap();
        assert!(approx(stats.median, 3.0));
        assert!(approx(stats.min, 1.0));
        assert!(approx(stats.max, 5.0));
        assert!(approx(stats.q25, 2.0));
        assert!(approx(stats.q75, 4.0));
        assert!(numeric_statistics(&[]).is_none());
    }

    #[test]
    fn test_categorical_statistics() {
        let column = Column::new(
            "city",
            vec![
                json!("Oslo"),
                json!("Rome"),
                json!("Oslo"),
                Value::Null,
                json!("Bergen"),
            ],
        );
        let stats = categorical_statistics(&column).unwrap();
        assert_eq!(stats.mode.as_deref(), Some("Oslo"));
        assert_eq!(stats.top_values[0], ("Oslo".to_string(), 2));
        assert_eq!(stats.top_values[1], ("Rome".to_string(), 1));
        assert_eq!(stats.min_length, 4);
        assert_eq!(stats.max_length, 6);
        assert!(approx(stats.avg_length, 4.5));
    }

    #[test]
    fn test_distinct_count_distinguishes_types() {
        let column = Column::new("x", vec![json!(1), json!("1"), json!(1), Value::Null]);
        assert_eq!(distinct_count(&column), 2);
    }
}
