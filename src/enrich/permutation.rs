//! Gene-label permutation null for the enrichment score.
//!
//! The null distribution for a set of size k is the enrichment score of
//! random k-member subsets of the ranked universe. Sampling is driven by
//! a deterministic xorshift generator so a fixed seed reproduces every
//! p-value regardless of thread scheduling.

use crate::enrich::score::enrichment_statistic;

/// Simple deterministic random number generator for permutations.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero.
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        // xorshift64
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Sample `k` distinct indices from `0..n`, sorted ascending.
    pub(crate) fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        debug_assert!(k <= n);
        let mut sample: Vec<usize> = if 2 * k > n {
            // Dense draw: partial Fisher-Yates over the whole range.
            let mut pool: Vec<usize> = (0..n).collect();
            for i in 0..k {
                let j = i + (self.next_u64() as usize) % (n - i);
                pool.swap(i, j);
            }
            pool.truncate(k);
            pool
        } else {
            // Sparse draw: rejection sampling.
            let mut seen = std::collections::HashSet::with_capacity(k);
            let mut out = Vec::with_capacity(k);
            while out.len() < k {
                let idx = (self.next_u64() as usize) % n;
                if seen.insert(idx) {
                    out.push(idx);
                }
            }
            out
        };
        sample.sort_unstable();
        sample
    }
}

/// Null enrichment scores for a set size against a fixed ranking.
pub(crate) fn permutation_null(
    scores: &[f64],
    set_size: usize,
    weight: f64,
    n_permutations: usize,
    seed: u64,
) -> Vec<f64> {
    let mut rng = SimpleRng::new(seed);
    (0..n_permutations)
        .map(|_| {
            let indices = rng.sample_indices(scores.len(), set_size);
            enrichment_statistic(scores, &indices, weight).es
        })
        .collect()
}

/// Nominal p-value and normalized enrichment score against a null pool.
///
/// Classic GSEA conventions: the observed score is compared only against
/// same-signed null scores, with the +1 small-sample correction; NES is
/// the observed score over the mean magnitude of that pool. An empty
/// pool yields p = 1.0 and NES = 0.0 rather than NaN.
pub(crate) fn p_value_and_nes(es: f64, null: &[f64]) -> (f64, f64) {
    let pool: Vec<f64> = if es >= 0.0 {
        null.iter().copied().filter(|&v| v >= 0.0).collect()
    } else {
        null.iter().copied().filter(|&v| v < 0.0).collect()
    };
    if pool.is_empty() {
        return (1.0, 0.0);
    }

    let n_extreme = pool.iter().filter(|v| v.abs() >= es.abs()).count();
    let p_value = (n_extreme as f64 + 1.0) / (pool.len() as f64 + 1.0);

    let mean_abs = pool.iter().map(|v| v.abs()).sum::<f64>() / pool.len() as f64;
    let nes = if mean_abs > 0.0 { es / mean_abs } else { 0.0 };

    (p_value, nes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = SimpleRng::new(7);
        let mut b = SimpleRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = SimpleRng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_sample_indices_distinct_and_sorted() {
        let mut rng = SimpleRng::new(11);
        for &(n, k) in &[(10usize, 3usize), (10, 9), (100, 50), (5, 5)] {
            let sample = rng.sample_indices(n, k);
            assert_eq!(sample.len(), k);
            for pair in sample.windows(2) {
                assert!(pair[0] < pair[1], "indices must be sorted and distinct");
            }
            assert!(sample.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn test_null_reproducible_under_seed() {
        let scores: Vec<f64> = (0..50).map(|i| 2.0 - i as f64 * 0.08).collect();
        let a = permutation_null(&scores, 5, 1.0, 50, 42);
        let b = permutation_null(&scores, 5, 1.0, 50, 42);
        assert_eq!(a, b);

        let c = permutation_null(&scores, 5, 1.0, 50, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn test_p_value_bounds() {
        let null = vec![0.3, -0.2, 0.5, -0.6, 0.1];
        for &es in &[0.9, -0.9, 0.0, 0.2] {
            let (p, _) = p_value_and_nes(es, &null);
            assert!(p > 0.0 && p <= 1.0, "p = {} out of bounds", p);
        }
    }

    #[test]
    fn test_p_value_counts_same_signed_pool() {
        // Positive pool: {0.1, 0.2, 0.4}; es = 0.3 has one null >= it.
        let null = vec![0.1, 0.2, 0.4, -0.5, -0.9];
        let (p, _) = p_value_and_nes(0.3, &null);
        assert_relative_eq!(p, 2.0 / 4.0);
    }

    #[test]
    fn test_nes_scales_by_pool_mean() {
        let null = vec![0.2, 0.4, -0.3];
        let (_, nes) = p_value_and_nes(0.6, &null);
        // Positive pool mean magnitude is 0.3.
        assert_relative_eq!(nes, 2.0);
    }

    #[test]
    fn test_empty_pool_degenerates_cleanly() {
        let null = vec![0.2, 0.4];
        let (p, nes) = p_value_and_nes(-0.5, &null);
        assert_relative_eq!(p, 1.0);
        assert_relative_eq!(nes, 0.0);
    }
}
