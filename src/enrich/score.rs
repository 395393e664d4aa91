//! Weighted Kolmogorov-Smirnov enrichment score.
//!
//! The running sum walks the ranking from top to bottom: set members
//! ("hits") push it up by their weighted score mass, non-members pull it
//! down by a constant step. The enrichment score is the largest signed
//! deviation from zero, and the leading edge is the subset of members on
//! the extreme side of that peak.

use crate::data::RankedList;
use std::collections::HashSet;

/// Enrichment statistic for one gene set against one ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EsStat {
    /// Signed enrichment score (maximum deviation of the running sum).
    pub es: f64,
    /// Ordinal (within the hit list) of the hit at/after the extreme.
    pub peak_hit: usize,
}

/// Compute the enrichment statistic from sorted hit positions.
///
/// The running sum is piecewise linear between hits, so only the value
/// just before each hit (candidate minimum) and just after it (candidate
/// maximum) can be extremes; the walk is O(hits), not O(ranking).
///
/// `hit_indices` must be sorted, non-empty and within `scores`. When the
/// total weighted mass of the hits is zero, every hit contributes a
/// uniform increment instead.
pub(crate) fn enrichment_statistic(scores: &[f64], hit_indices: &[usize], weight: f64) -> EsStat {
    let n = scores.len();
    let k = hit_indices.len();
    debug_assert!(k > 0 && k <= n);

    let weights: Vec<f64> = hit_indices
        .iter()
        .map(|&i| scores[i].abs().powf(weight))
        .collect();
    let total: f64 = weights.iter().sum();

    let miss_step = if n > k { 1.0 / (n - k) as f64 } else { 0.0 };

    let mut hit_mass = 0.0;
    let mut best: f64 = 0.0;
    let mut peak_hit = 0;
    for (j, (&idx, &w)) in hit_indices.iter().zip(&weights).enumerate() {
        // Misses accumulated before this hit: positions 0..idx hold j
        // earlier hits, the rest are misses.
        let before = hit_mass - miss_step * (idx - j) as f64;
        if before.abs() > best.abs() {
            best = before;
            peak_hit = j;
        }

        let increment = if total > 0.0 { w / total } else { 1.0 / k as f64 };
        let after = before + increment;
        if after.abs() > best.abs() {
            best = after;
            peak_hit = j;
        }

        hit_mass += increment;
    }

    EsStat { es: best, peak_hit }
}

/// Observed enrichment of a gene set, with the leading edge resolved to
/// symbols.
#[derive(Debug, Clone)]
pub struct SetScore {
    /// Signed enrichment score.
    pub es: f64,
    /// Positions of the set's members in the ranking, sorted.
    pub hit_indices: Vec<usize>,
    /// Members driving the enrichment, in rank order.
    pub leading_edge: Vec<String>,
}

/// Score one gene set against a ranking.
///
/// Returns `None` when no member of the set appears in the ranking.
pub fn score_gene_set(ranking: &RankedList, genes: &HashSet<String>, weight: f64) -> Option<SetScore> {
    let mut hit_indices: Vec<usize> = ranking
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| genes.contains(&e.symbol))
        .map(|(i, _)| i)
        .collect();
    if hit_indices.is_empty() {
        return None;
    }
    hit_indices.sort_unstable();

    let scores = ranking.scores();
    let stat = enrichment_statistic(&scores, &hit_indices, weight);

    // For a positive score the leading edge is the members at or before
    // the peak; for a negative score, the members after the trough.
    let leading: &[usize] = if stat.es >= 0.0 {
        &hit_indices[..=stat.peak_hit]
    } else {
        &hit_indices[stat.peak_hit..]
    };
    let leading_edge = leading
        .iter()
        .map(|&i| ranking.entries()[i].symbol.clone())
        .collect();

    Some(SetScore {
        es: stat.es,
        hit_indices,
        leading_edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RankingConfig, SortDirection};
    use crate::data::{build_ranking, DeRecord, DeTable};
    use approx::assert_relative_eq;

    fn ranking_from(pairs: &[(&str, f64)]) -> RankedList {
        let records = pairs
            .iter()
            .enumerate()
            .map(|(i, (symbol, score))| DeRecord {
                gene_id: format!("g{}", i),
                symbol: Some(symbol.to_string()),
                log2_fold_change: *score,
                padj: Some(0.01),
            })
            .collect();
        let table = DeTable::new("test", records).unwrap();
        build_ranking(
            &table,
            &RankingConfig {
                direction: SortDirection::Descending,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn set(genes: &[&str]) -> HashSet<String> {
        genes.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_top_concentrated_set_scores_positive() {
        // Descending ranking: A=3, B=2, C=1, D=-1, E=-2.
        let ranking = ranking_from(&[("A", 3.0), ("B", 2.0), ("C", 1.0), ("D", -1.0), ("E", -2.0)]);
        let score = score_gene_set(&ranking, &set(&["A", "B"]), 1.0).unwrap();

        // Hand walk: hits at 0, 1 with mass 3/5 and 2/5; peak after B.
        assert_relative_eq!(score.es, 1.0, epsilon = 1e-12);
        assert_eq!(score.leading_edge, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_bottom_concentrated_set_scores_negative() {
        let ranking = ranking_from(&[("A", 3.0), ("B", 2.0), ("C", 1.0), ("D", -1.0), ("E", -2.0)]);
        let score = score_gene_set(&ranking, &set(&["E"]), 1.0).unwrap();

        // Four misses at -0.25 each, then the hit recovers the sum to 0.
        assert_relative_eq!(score.es, -1.0, epsilon = 1e-12);
        assert_eq!(score.leading_edge, vec!["E".to_string()]);
    }

    #[test]
    fn test_unweighted_matches_classic_ks() {
        let ranking = ranking_from(&[("A", 3.0), ("B", 2.0), ("C", 1.0), ("D", -1.0), ("E", -2.0)]);
        // weight 0 makes every hit increment 1/k regardless of score.
        let score = score_gene_set(&ranking, &set(&["A", "C"]), 0.0).unwrap();

        // Walk: +0.5, -1/3, +0.5 -> peak 2/3 after C.
        assert_relative_eq!(score.es, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_mass_hits_fall_back_to_uniform() {
        let ranking = ranking_from(&[("A", 0.0), ("B", 0.0), ("C", 1.0), ("D", -1.0)]);
        let score = score_gene_set(&ranking, &set(&["A", "B"]), 1.0).unwrap();
        // A and B rank 2nd/3rd (descending, ties lexical): C=1, A=0, B=0, D=-1.
        // Walk: -0.5, +0.5 at A -> 0, +0.5 at B -> 0.5, -0.5 -> 0.
        assert_relative_eq!(score.es.abs(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_absent_set_returns_none() {
        let ranking = ranking_from(&[("A", 1.0), ("B", -1.0)]);
        assert!(score_gene_set(&ranking, &set(&["ZZZ"]), 1.0).is_none());
    }

    #[test]
    fn test_whole_universe_set() {
        // Every gene a hit: no misses, running sum climbs to 1.
        let ranking = ranking_from(&[("A", 2.0), ("B", 1.0)]);
        let score = score_gene_set(&ranking, &set(&["A", "B"]), 1.0).unwrap();
        assert_relative_eq!(score.es, 1.0, epsilon = 1e-12);
        assert_eq!(score.leading_edge.len(), 2);
    }

    #[test]
    fn test_leading_edge_stops_at_peak() {
        // A strong early hit, then a weak hit far down the list: the
        // peak comes after the first member only.
        let ranking = ranking_from(&[
            ("A", 10.0),
            ("B", 0.5),
            ("C", 0.4),
            ("D", 0.3),
            ("E", 0.2),
            ("F", 0.1),
        ]);
        let score = score_gene_set(&ranking, &set(&["A", "F"]), 1.0).unwrap();
        assert!(score.es > 0.0);
        assert_eq!(score.leading_edge, vec!["A".to_string()]);
    }
}
