//! Multiple testing correction.

/// Benjamini-Hochberg false discovery rate adjustment.
///
/// Returns q-values in the same order as the input p-values. Each q-value
/// is `min(p * n / rank, next-larger q)`, capped at 1.0.
pub fn adjust_bh(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Walk from the largest p-value down, enforcing monotonicity.
    let mut q_values = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for rank in (0..n).rev() {
        let idx = order[rank];
        let adjusted = p_values[idx] * n as f64 / (rank + 1) as f64;
        running_min = running_min.min(adjusted).min(1.0);
        q_values[idx] = running_min;
    }

    q_values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bh_empty() {
        assert!(adjust_bh(&[]).is_empty());
    }

    #[test]
    fn test_bh_single() {
        let q = adjust_bh(&[0.02]);
        assert_relative_eq!(q[0], 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_bh_known_values() {
        // 4 tests: ranks 1..4 give 0.004*4/1, 0.008*4/2, 0.03*4/3, 0.5
        let q = adjust_bh(&[0.008, 0.5, 0.004, 0.03]);
        assert_relative_eq!(q[2], 0.016, epsilon = 1e-12);
        assert_relative_eq!(q[0], 0.016, epsilon = 1e-12);
        assert_relative_eq!(q[3], 0.04, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bh_monotone_in_sorted_order() {
        let p = [0.001, 0.02, 0.02, 0.04, 0.9];
        let q = adjust_bh(&p);
        for i in 1..p.len() {
            assert!(q[i] + 1e-12 >= q[i - 1]);
        }
    }

    #[test]
    fn test_bh_capped_at_one() {
        let q = adjust_bh(&[0.6, 0.7, 0.8, 0.95]);
        for v in q {
            assert!(v <= 1.0);
        }
    }
}
