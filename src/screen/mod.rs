//! Cross-reference of DE results against an in-vivo dependency screen.
//!
//! The screen arrives as a MAGeCK-style gene summary (one row per gene,
//! already collapsed from guide level). Overlap between significant DE
//! symbols and screen hits is tested for over-representation with a
//! hypergeometric upper-tail p-value over the DE symbol universe.

use crate::config::OverlapConfig;
use crate::data::DeTable;
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{DiscreteCDF, Hypergeometric};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Column holding the screen gene identifier (human symbol).
pub const SCREEN_ID_COLUMN: &str = "id";
/// Column holding the screen score.
pub const SCREEN_SCORE_COLUMN: &str = "score";
/// Column holding the screen false discovery rate.
pub const SCREEN_FDR_COLUMN: &str = "fdr";

/// One gene's summary statistics from the dependency screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRecord {
    /// Human gene symbol.
    pub gene: String,
    /// Screen score (more extreme = stronger dependency).
    pub score: f64,
    /// False discovery rate; absent when the gene was not testable.
    pub fdr: Option<f64>,
}

/// A gene-level dependency screen summary.
#[derive(Debug, Clone)]
pub struct ScreenTable {
    source: String,
    records: Vec<ScreenRecord>,
}

impl ScreenTable {
    /// Load a screen summary from a delimited file with a header row.
    ///
    /// Required columns: `id`, `score`, `fdr` (comma or tab separated,
    /// sniffed from the header line). `NA` FDR values load as absent.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let delimiter = {
            let mut header = String::new();
            BufReader::new(File::open(path)?).read_line(&mut header)?;
            if header.contains('\t') {
                b'\t'
            } else {
                b','
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| GseaError::MissingColumn {
                    path: display.clone(),
                    column: name.to_string(),
                })
        };
        let id_idx = position(SCREEN_ID_COLUMN)?;
        let score_idx = position(SCREEN_SCORE_COLUMN)?;
        let fdr_idx = position(SCREEN_FDR_COLUMN)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            let gene = field(id_idx);
            if gene.is_empty() {
                continue;
            }
            let score: f64 = field(score_idx).parse().map_err(|_| GseaError::MalformedInput {
                path: display.clone(),
                reason: format!("unparseable screen score '{}' for {}", field(score_idx), gene),
            })?;
            let fdr = match field(fdr_idx) {
                "" | "NA" | "NaN" | "nan" => None,
                s => Some(s.parse::<f64>().map_err(|_| GseaError::MalformedInput {
                    path: display.clone(),
                    reason: format!("unparseable screen fdr '{}' for {}", s, gene),
                })?),
            };

            records.push(ScreenRecord {
                gene: gene.to_string(),
                score,
                fdr,
            });
        }

        if records.is_empty() {
            return Err(GseaError::MalformedInput {
                path: display,
                reason: "no usable data rows".to_string(),
            });
        }

        Ok(Self {
            source: display,
            records,
        })
    }

    /// Source path for error context.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in file order.
    pub fn records(&self) -> &[ScreenRecord] {
        &self.records
    }

    /// Symbols of screen hits at an FDR cutoff.
    pub fn hits_at(&self, alpha: f64) -> BTreeSet<&str> {
        self.records
            .iter()
            .filter(|r| r.fdr.map(|f| f < alpha).unwrap_or(false))
            .map(|r| r.gene.as_str())
            .collect()
    }
}

/// Overlap between significant DE symbols and screen hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapResult {
    /// DE symbols considered (the hypergeometric population).
    pub n_universe: usize,
    /// Significant DE symbols (the draws).
    pub n_de: usize,
    /// Screen hits present in the universe (the marked population).
    pub n_screen: usize,
    /// Symbols in both.
    pub n_overlap: usize,
    /// Hypergeometric upper-tail p-value for the overlap.
    pub p_value: f64,
    /// Overlapping symbols, lexically sorted.
    pub genes: Vec<String>,
}

impl std::fmt::Display for OverlapResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DE symbol universe:   {}", self.n_universe)?;
        writeln!(f, "Significant DE genes: {}", self.n_de)?;
        writeln!(f, "Screen hits in universe: {}", self.n_screen)?;
        writeln!(f, "Overlap: {} (p = {:.4e})", self.n_overlap, self.p_value)?;
        if !self.genes.is_empty() {
            writeln!(f, "Genes: {}", self.genes.join(", "))?;
        }
        Ok(())
    }
}

/// Test significant DE symbols for over-representation among screen hits.
///
/// The universe is the set of distinct human symbols in the DE table;
/// screen hits outside that universe are ignored (they were never
/// candidates for the DE side).
pub fn screen_overlap(
    de: &DeTable,
    screen: &ScreenTable,
    config: &OverlapConfig,
) -> Result<OverlapResult> {
    config.validate()?;

    let universe: BTreeSet<&str> = de
        .records()
        .iter()
        .filter_map(|r| r.symbol.as_deref())
        .collect();
    if universe.is_empty() {
        return Err(GseaError::InvalidParameter(format!(
            "no record in {} carries a human symbol",
            de.source()
        )));
    }

    let de_hits: BTreeSet<&str> = de
        .records()
        .iter()
        .filter(|r| r.is_significant_at(config.de_threshold))
        .filter_map(|r| r.symbol.as_deref())
        .collect();

    let screen_hits: BTreeSet<&str> = screen
        .hits_at(config.screen_threshold)
        .into_iter()
        .filter(|g| universe.contains(g))
        .collect();

    let genes: Vec<String> = de_hits
        .intersection(&screen_hits)
        .map(|g| g.to_string())
        .collect();

    let p_value = hypergeometric_upper_tail(
        universe.len() as u64,
        screen_hits.len() as u64,
        de_hits.len() as u64,
        genes.len() as u64,
    )?;

    Ok(OverlapResult {
        n_universe: universe.len(),
        n_de: de_hits.len(),
        n_screen: screen_hits.len(),
        n_overlap: genes.len(),
        p_value,
        genes,
    })
}

/// P(X >= observed) for X ~ Hypergeometric(population, successes, draws).
fn hypergeometric_upper_tail(
    population: u64,
    successes: u64,
    draws: u64,
    observed: u64,
) -> Result<f64> {
    if observed == 0 {
        return Ok(1.0);
    }
    let dist = Hypergeometric::new(population, successes, draws)
        .map_err(|e| GseaError::Enrichment(format!("hypergeometric test: {}", e)))?;
    Ok(dist.sf(observed - 1))
}
