//! Representative sampling of large tables.
//!
//! Tables above the configured row threshold are reduced to a bounded sample
//! that keeps null-bearing rows and the category balance of the first
//! low-cardinality column. Every draw is seeded, so the same input and
//! config always yield the same sample.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::SamplingConfig;
use crate::models::DatasetProfile;
use crate::table::{Table, cell_key};

/// Bounded, representative view of a table.
#[derive(Debug)]
pub struct SmartSampler<'a> {
    original_size: usize,
    sample: Cow<'a, Table>,
    is_sampled: bool,
    scale_factor: f64,
}

impl<'a> SmartSampler<'a> {
    /// Samples with the default configuration.
    pub fn new(table: &'a Table) -> Self {
        Self::with_config(table, &SamplingConfig::default())
    }

    /// Samples `table` if it has more rows than `config.threshold`.
    pub fn with_config(table: &'a Table, config: &SamplingConfig) -> Self {
        let original_size = table.row_count();
        if original_size <= config.threshold {
            return Self {
                original_size,
                sample: Cow::Borrowed(table),
                is_sampled: false,
                scale_factor: 1.0,
            };
        }

        let rows = sample_rows(table, config);
        let sample = table.take(&rows);
        let scale_factor = if sample.row_count() == 0 {
            1.0
        } else {
            original_size as f64 / sample.row_count() as f64
        };
        tracing::info!(
            "Sampled {} of {} rows (scale factor {:.3})",
            sample.row_count(),
            original_size,
            scale_factor
        );

        Self {
            original_size,
            sample: Cow::Owned(sample),
            is_sampled: true,
            scale_factor,
        }
    }

    /// True when the table exceeded the threshold and was reduced.
    pub fn is_sampled(&self) -> bool {
        self.is_sampled
    }

    /// The working table: the sample, or the original when not sampled.
    pub fn sample_table(&self) -> &Table {
        &self.sample
    }

    /// Row count of the original table.
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// Row count of the working table.
    pub fn sample_size(&self) -> usize {
        self.sample.row_count()
    }

    /// `original_size / sample_size`, or 1.0 when not sampled.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Scales a count observed on the sample to a full-table estimate.
    ///
    /// Identity when not sampled.
    pub fn extrapolate(&self, count: usize) -> usize {
        if !self.is_sampled {
            return count;
        }
        (count as f64 * self.scale_factor).round() as usize
    }

    /// Rescales row-level counts of a profile computed on the sample.
    pub fn rescale_profile(&self, mut profile: DatasetProfile) -> DatasetProfile {
        if !self.is_sampled {
            return profile;
        }
        profile.row_count = self.original_size;
        profile.duplicate_row_count = self.extrapolate(profile.duplicate_row_count);
        profile.memory_bytes = self.extrapolate(profile.memory_bytes);
        for column in profile.columns.values_mut() {
            column.null_count = self.extrapolate(column.null_count);
        }
        profile.sampled = true;
        profile.sample_size = Some(self.sample_size());
        profile
    }
}

fn seeded_pick(candidates: &[usize], amount: usize, seed: u64) -> Vec<usize> {
    if amount >= candidates.len() {
        return candidates.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked: Vec<usize> = rand::seq::index::sample(&mut rng, candidates.len(), amount)
        .into_iter()
        .filter_map(|i| candidates.get(i).copied())
        .collect();
    picked.sort_unstable();
    picked
}

/// Row indices of the representative sample, null-bearing rows first.
pub fn sample_rows(table: &Table, config: &SamplingConfig) -> Vec<usize> {
    let null_rows: Vec<usize> = (0..table.row_count())
        .filter(|&row| table.row_has_null(row))
        .collect();
    let null_sample = seeded_pick(&null_rows, config.null_row_cap(), config.seed);

    let taken: HashSet<usize> = null_sample.iter().copied().collect();
    let remaining: Vec<usize> = (0..table.row_count())
        .filter(|row| !taken.contains(row))
        .collect();
    let remaining_target = config.target_size.saturating_sub(null_sample.len());

    let main_sample = match stratification_column(table, &remaining, config) {
        Some(column) => {
            tracing::debug!("Stratifying sample on column '{}'", column);
            stratified_pick(table, column, &remaining, remaining_target, config.seed)
        }
        None => seeded_pick(&remaining, remaining_target, config.seed),
    };

    let mut rows = null_sample;
    rows.extend(main_sample);
    rows
}

/// First column whose distinct non-null count over `rows` lies in the
/// configured stratification range.
pub fn stratification_column<'t>(
    table: &'t Table,
    rows: &[usize],
    config: &SamplingConfig,
) -> Option<&'t str> {
    table.columns().iter().find_map(|column| {
        let distinct: HashSet<String> = rows
            .iter()
            .filter_map(|&r| column.values().get(r))
            .filter(|v| !v.is_null())
            .map(cell_key)
            .collect();
        (config.min_strata..=config.max_strata)
            .contains(&distinct.len())
            .then_some(column.name())
    })
}

fn stratified_pick(
    table: &Table,
    column: &str,
    rows: &[usize],
    target: usize,
    seed: u64,
) -> Vec<usize> {
    let Some(column) = table.column(column) else {
        return seeded_pick(rows, target, seed);
    };

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for &row in rows {
        if let Some(value) = column.values().get(row).filter(|v| !v.is_null()) {
            groups.entry(cell_key(value)).or_default().push(row);
        }
    }
    let total: usize = groups.values().map(Vec::len).sum();
    if total == 0 {
        return Vec::new();
    }

    groups
        .values()
        .flat_map(|members| {
            let share = (target as f64 * members.len() as f64 / total as f64).round() as usize;
            let size = share.max(1).min(members.len());
            seeded_pick(members, size, seed)
        })
        .collect()
}
