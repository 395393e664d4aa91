//! Symbol-keyed ranking vectors for enrichment analysis.

use crate::config::{RankingConfig, SortDirection};
use crate::data::DeTable;
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One entry of a ranking vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGene {
    /// Human gene symbol (unique within the list).
    pub symbol: String,
    /// Mean log2 fold-change across records sharing the symbol.
    pub score: f64,
}

/// A ranking vector: one score per distinct human symbol, value-sorted.
///
/// Order is part of the contract — the enrichment statistic is
/// rank-sensitive. Ties in score are broken by symbol lexical order, so
/// the same table and config always produce the same list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    entries: Vec<RankedGene>,
}

impl RankedList {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in rank order.
    pub fn entries(&self) -> &[RankedGene] {
        &self.entries
    }

    /// Scores in rank order.
    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.score).collect()
    }

    /// Look up the score of a symbol.
    pub fn score_of(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.score)
    }

    /// Write as a two-column TSV (symbol, score).
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "symbol\tscore")?;
        for e in &self.entries {
            writeln!(writer, "{}\t{}", e.symbol, e.score)?;
        }
        Ok(())
    }
}

/// Build a ranking vector from a DE table.
///
/// Records with a missing or above-threshold padj are dropped, then
/// records without a human symbol; survivors are grouped by symbol and
/// each group collapses to the arithmetic mean of its log2 fold-changes.
/// The result is sorted by score per `config.direction`.
pub fn build_ranking(table: &DeTable, config: &RankingConfig) -> Result<RankedList> {
    config.validate()?;

    // Aggregation is keyed on a BTreeMap so group order never depends on
    // hash order; the tie-break below stays reproducible.
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in table.records() {
        match record.padj {
            Some(p) if p < config.padj_threshold => {}
            _ => continue,
        }
        let symbol = match record.symbol.as_deref() {
            Some(s) => s,
            None => continue,
        };
        let entry = groups.entry(symbol).or_insert((0.0, 0));
        entry.0 += record.log2_fold_change;
        entry.1 += 1;
    }

    if groups.is_empty() {
        return Err(GseaError::EmptyRanking(format!(
            "no records from {} survive padj < {} with a human symbol",
            table.source(),
            config.padj_threshold
        )));
    }

    let mut entries: Vec<RankedGene> = groups
        .into_iter()
        .map(|(symbol, (sum, n))| RankedGene {
            symbol: symbol.to_string(),
            score: sum / n as f64,
        })
        .collect();

    entries.sort_by(|a, b| {
        let by_score = match config.direction {
            SortDirection::Ascending => a.score.partial_cmp(&b.score),
            SortDirection::Descending => b.score.partial_cmp(&a.score),
        }
        .unwrap_or(std::cmp::Ordering::Equal);
        by_score.then_with(|| a.symbol.cmp(&b.symbol))
    });

    Ok(RankedList { entries })
}
