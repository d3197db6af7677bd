//! Shared seen-candidate filter
//!
//! A lock-free bloom filter shared by all generator workers. It sheds
//! near-certain duplicates before they reach the writer queue, trading a small
//! false-positive rate for a large reduction in queue and store traffic.
//!
//! The filter is advisory only: a false positive costs one skipped candidate's
//! throughput, never correctness, because the writer performs the
//! authoritative uniqueness check against the store. False negatives cannot
//! occur, so nothing marked seen is ever re-enqueued by the same run.

use ahash::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free atomic bloom filter over candidate strings.
///
/// Bits live in a `Vec<AtomicU64>` updated with `fetch_or`, so concurrent
/// inserts never lose a set bit and readers never need a lock.
pub struct SeenFilter {
    bits: Vec<AtomicU64>,
    num_hashes: u32,
    state: RandomState,
    approx_items: AtomicU64,
}

impl SeenFilter {
    /// Size the filter for an expected item count and target false-positive
    /// rate using the standard bloom dimensioning formulas.
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;

        // m = -n * ln(p) / ln(2)^2
        let num_bits = (-n * false_positive_rate.ln() / (ln2 * ln2)).ceil() as usize;
        let num_bits = num_bits.max(64);

        // k = (m/n) * ln(2)
        let num_hashes = ((num_bits as f64 / n) * ln2).ceil() as u32;

        Self::with_bits(num_bits, num_hashes.clamp(1, 16))
    }

    /// Construct with explicit bit count and hash count.
    pub fn with_bits(num_bits: usize, num_hashes: u32) -> Self {
        let words = (num_bits.max(64) + 63) / 64;
        Self {
            bits: (0..words).map(|_| AtomicU64::new(0)).collect(),
            num_hashes: num_hashes.max(1),
            state: RandomState::new(),
            approx_items: AtomicU64::new(0),
        }
    }

    /// Whether the candidate was probably inserted before.
    ///
    /// `true` may be wrong (false positive); `false` is always right.
    pub fn probably_contains(&self, candidate: &str) -> bool {
        let (h1, h2) = self.hash_pair(candidate);
        let num_bits = self.bits.len() as u64 * 64;

        (0..self.num_hashes as u64).all(|i| {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % num_bits;
            self.bits[(bit / 64) as usize].load(Ordering::Relaxed) & (1 << (bit % 64)) != 0
        })
    }

    /// Mark a candidate as seen. Returns `true` when the candidate was
    /// probably new (at least one of its bits was previously clear).
    pub fn insert(&self, candidate: &str) -> bool {
        let (h1, h2) = self.hash_pair(candidate);
        let num_bits = self.bits.len() as u64 * 64;

        let mut any_clear = false;
        for i in 0..self.num_hashes as u64 {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % num_bits;
            let mask = 1u64 << (bit % 64);
            let prev = self.bits[(bit / 64) as usize].fetch_or(mask, Ordering::Relaxed);
            if prev & mask == 0 {
                any_clear = true;
            }
        }

        if any_clear {
            self.approx_items.fetch_add(1, Ordering::Relaxed);
        }
        any_clear
    }

    /// Approximate number of distinct items inserted.
    pub fn approx_len(&self) -> u64 {
        self.approx_items.load(Ordering::Relaxed)
    }

    /// Memory held by the bit array, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.bits.len() * 8
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    // Double hashing: two independent 64-bit values derive all k indices.
    fn hash_pair(&self, candidate: &str) -> (u64, u64) {
        let mut hasher = self.state.build_hasher();
        candidate.hash(&mut hasher);
        let h1 = hasher.finish();

        let mut hasher = self.state.build_hasher();
        hasher.write_u64(h1);
        candidate.hash(&mut hasher);
        let h2 = hasher.finish() | 1; // odd stride

        (h1, h2)
    }
}
