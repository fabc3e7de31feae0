//! Parallel and sequential runs must agree.

use datawash_core::{
    DetectorRegistry, Finding, ParallelConfig, Table, WashConfig, analyze,
    parallel::profile_dataset_parallel, profiler::profile_dataset,
};
use serde_json::{Value, json};

/// Fourteen columns mixing numeric, text, null-bearing and duplicated data.
fn wide() -> Table {
    let records: Vec<Value> = (0..60)
        .map(|i: i64| {
            let mut row = serde_json::Map::new();
            for c in 0..8 {
                let value = if (i + c) % 11 == 0 {
                    Value::Null
                } else {
                    json!(i * (c + 1))
                };
                row.insert(format!("metric_{c}"), value);
            }
            row.insert("spike".to_string(), json!(if i == 59 { 10_000 } else { i % 7 }));
            row.insert(
                "city".to_string(),
                json!(["oslo", "ROME", "Paris"][(i % 3) as usize]),
            );
            row.insert("code".to_string(), json!(format!("{}", i % 20)));
            row.insert("code_copy".to_string(), json!(format!("{}", i % 20)));
            row.insert("padded".to_string(), json!(format!(" v{} ", i % 5)));
            row.insert(
                "active".to_string(),
                json!(if i % 2 == 0 { "yes" } else { "no" }),
            );
            Value::Object(row)
        })
        .collect();
    Table::from_records(&records).unwrap()
}

fn sorted(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| {
        (&a.detector, &a.issue_type, &a.columns).cmp(&(&b.detector, &b.issue_type, &b.columns))
    });
    findings
}

fn sequential_config() -> WashConfig {
    WashConfig::default()
        .with_parallel(ParallelConfig::default().with_thresholds(usize::MAX, usize::MAX))
}

fn parallel_config() -> WashConfig {
    WashConfig::default().with_parallel(ParallelConfig::default().with_thresholds(0, 0))
}

#[test]
fn test_profiles_match() {
    let table = wide();
    let parallel = profile_dataset_parallel(&table, None, &ParallelConfig::default());
    assert_eq!(parallel, profile_dataset(&table));
    assert_eq!(parallel.column_count, 14);
}

#[test]
fn test_reports_match() {
    let table = wide();
    let sequential_config = sequential_config();
    let parallel_config = parallel_config();
    let registry = DetectorRegistry::with_defaults(&sequential_config.detectors);

    let sequential = analyze(&table, &sequential_config, &registry);
    let parallel = analyze(&table, &parallel_config, &registry);

    assert!(!sequential.findings().is_empty());
    assert_eq!(sequential.profile(), parallel.profile());
    assert_eq!(
        sorted(sequential.findings().to_vec()),
        sorted(parallel.findings().to_vec())
    );
    assert_eq!(sequential.suggestions(), parallel.suggestions());
    assert_eq!(sequential.quality_score(), parallel.quality_score());
}

#[test]
fn test_single_worker_pool() {
    let table = wide();
    let config = parallel_config()
        .with_parallel(ParallelConfig::default().with_thresholds(0, 0).with_max_workers(1));
    let registry = DetectorRegistry::with_defaults(&config.detectors);
    let report = analyze(&table, &config, &registry);
    let baseline = analyze(&table, &sequential_config(), &registry);
    assert_eq!(report.suggestions(), baseline.suggestions());
}
