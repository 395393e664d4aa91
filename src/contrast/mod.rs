//! Differencing of two related DE contrasts.
//!
//! Given contrasts A and B against a shared baseline, the difference
//! table asks: which genes respond differently between the two? Rows are
//! the union of genes significant in either input; values are A's log2
//! fold-change minus B's.

use crate::config::DiffConfig;
use crate::data::{DeRecord, DeTable};
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Policy for union genes absent from one of the two input tables.
///
/// The upstream DE engine can drop genes from one contrast (independent
/// filtering), so a gene significant in A may have no row in B at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingGenePolicy {
    /// Drop the gene: a one-sided delta has no defined value, and
    /// fabricating one silently reorders downstream rankings.
    Skip,
    /// Treat the absent side's log2 fold-change as 0.0.
    Zero,
    /// Surface the gene as a `MissingGene` error.
    Strict,
}

/// Compute the difference table of two DE contrasts.
///
/// 1. Collect the union of gene ids significant (padj < threshold) in
///    either table, in A-then-B row order.
/// 2. For each id, emit `log2FC = A - B`. A is the canonical symbol
///    source; B's symbol is used only when A has no row under the
///    [`MissingGenePolicy::Zero`] policy.
/// 3. The output padj column is fixed at the threshold value — a
///    bookkeeping placeholder so the table passes the ranked-vector
///    builder's padj filter, not a recomputed statistic.
pub fn contrast_difference(a: &DeTable, b: &DeTable, config: &DiffConfig) -> Result<DeTable> {
    config.validate()?;
    let alpha = config.significance;

    // Union in deterministic order: A's significant rows, then B's not
    // already seen.
    let mut union: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for id in a.significant_ids(alpha).into_iter().chain(b.significant_ids(alpha)) {
        if seen.insert(id) {
            union.push(id);
        }
    }

    let mut records = Vec::with_capacity(union.len());
    for gene_id in union {
        let (delta, symbol) = match (a.get(gene_id), b.get(gene_id)) {
            (Some(ra), Some(rb)) => (
                ra.log2_fold_change - rb.log2_fold_change,
                ra.symbol.clone(),
            ),
            (Some(ra), None) => match config.missing_gene {
                MissingGenePolicy::Skip => {
                    log::debug!("difference: {} absent from {}, skipped", gene_id, b.source());
                    continue;
                }
                MissingGenePolicy::Zero => (ra.log2_fold_change, ra.symbol.clone()),
                MissingGenePolicy::Strict => {
                    return Err(GseaError::MissingGene {
                        gene_id: gene_id.to_string(),
                        table: b.source().to_string(),
                    })
                }
            },
            (None, Some(rb)) => match config.missing_gene {
                MissingGenePolicy::Skip => {
                    log::debug!("difference: {} absent from {}, skipped", gene_id, a.source());
                    continue;
                }
                MissingGenePolicy::Zero => (-rb.log2_fold_change, rb.symbol.clone()),
                MissingGenePolicy::Strict => {
                    return Err(GseaError::MissingGene {
                        gene_id: gene_id.to_string(),
                        table: a.source().to_string(),
                    })
                }
            },
            // Union members come from one of the two tables.
            (None, None) => unreachable!(),
        };

        records.push(DeRecord {
            gene_id: gene_id.to_string(),
            symbol,
            log2_fold_change: delta,
            padj: Some(alpha),
        });
    }

    DeTable::new(format!("diff({}, {})", a.source(), b.source()), records)
}
