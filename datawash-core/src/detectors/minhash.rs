//! MinHash signatures and LSH banding over column value sets.
//!
//! Hashing is explicit and seeded (FNV-1a over the bytes, XORed with the
//! seed, then a splitmix64 finalizer) so bucket assignment is identical
//! across runs and platforms.

use std::collections::{BTreeSet, HashMap, HashSet};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// splitmix64 finalizer.
pub fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Seeded 64-bit hash of a byte string.
pub fn seeded_hash(seed: u64, bytes: &[u8]) -> u64 {
    mix64(fnv1a(bytes) ^ seed)
}

/// Computes fixed-length MinHash signatures.
#[derive(Debug, Clone)]
pub struct MinHasher {
    seeds: Vec<u64>,
}

impl MinHasher {
    /// Creates a hasher with `num_perm` deterministic permutation seeds.
    pub fn new(num_perm: usize) -> Self {
        let seeds = (0..num_perm as u64).map(mix64).collect();
        Self { seeds }
    }

    /// Signature length.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// True for a zero-length signature.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Signature of a value set; an empty set maps to all zeros.
    ///
    /// Each component is the low 32 bits of the minimum seeded hash.
    pub fn signature(&self, values: &HashSet<String>) -> Vec<u32> {
        if values.is_empty() {
            return vec![0; self.seeds.len()];
        }
        let base: Vec<u64> = values.iter().map(|v| fnv1a(v.as_bytes())).collect();
        self.seeds
            .iter()
            .map(|seed| {
                let min = base
                    .iter()
                    .map(|h| mix64(h ^ seed))
                    .min()
                    .unwrap_or(0);
                (min & u64::from(u32::MAX)) as u32
            })
            .collect()
    }
}

/// Fraction of equal components; an estimate of Jaccard similarity.
pub fn estimated_similarity(a: &[u32], b: &[u32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let equal = a.iter().zip(b).filter(|(x, y)| x == y).count();
    equal as f64 / a.len() as f64
}

/// Hash of one band of a signature, seeded by the band index.
pub fn band_hash(band: usize, rows: &[u32]) -> u64 {
    let bytes: Vec<u8> = rows.iter().flat_map(|r| r.to_le_bytes()).collect();
    seeded_hash(mix64(band as u64), &bytes)
}

/// Banded LSH index producing candidate column pairs.
#[derive(Debug, Clone)]
pub struct LshIndex {
    bands: usize,
    rows_per_band: usize,
    max_bucket_size: usize,
}

impl LshIndex {
    /// Creates an index with `bands` bands of `rows_per_band` rows.
    pub fn new(bands: usize, rows_per_band: usize, max_bucket_size: usize) -> Self {
        Self {
            bands,
            rows_per_band,
            max_bucket_size,
        }
    }

    /// Pairs `(a, b)`, `a < b`, sharing a band bucket of size 2..=max.
    ///
    /// `signatures` holds `(column index, signature)`; buckets above the
    /// size limit are skipped.
    pub fn candidate_pairs(&self, signatures: &[(usize, Vec<u32>)]) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        if self.rows_per_band == 0 {
            return pairs;
        }

        for band in 0..self.bands {
            let start = band * self.rows_per_band;
            let end = start + self.rows_per_band;
            let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
            for (column, signature) in signatures {
                if let Some(rows) = signature.get(start..end) {
                    buckets.entry(band_hash(band, rows)).or_default().push(*column);
                }
            }

            for members in buckets.values() {
                if members.len() < 2 || members.len() > self.max_bucket_size {
                    continue;
                }
                for (i, a) in members.iter().enumerate() {
                    for b in members.iter().skip(i + 1) {
                        pairs.insert(((*a).min(*b), (*a).max(*b)));
                    }
                }
            }
        }
        pairs
    }
}

/// True if two sets of these sizes can reach Jaccard `threshold`:
/// `max / min <= (2 - t) / t`.
pub fn passes_size_filter(size_a: usize, size_b: usize, threshold: f64) -> bool {
    let (small, large) = (size_a.min(size_b), size_a.max(size_b));
    if small == 0 || threshold <= 0.0 {
        return false;
    }
    large as f64 / small as f64 <= (2.0 - threshold) / threshold
}
