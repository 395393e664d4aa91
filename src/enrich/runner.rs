//! Enrichment runner: validate, score, adjust, sort.

use crate::config::GseaConfig;
use crate::correct::adjust_bh;
use crate::data::{GeneSetCollection, RankedList};
use crate::enrich::permutation::{p_value_and_nes, permutation_null};
use crate::enrich::score::score_gene_set;
use crate::error::{GseaError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-set seed offset so parallel scheduling never changes a p-value.
const SET_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Enrichment of one gene set against one ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Pathway / gene-set name.
    pub pathway: String,
    /// Signed enrichment score.
    pub es: f64,
    /// Enrichment score normalized by the mean same-signed null magnitude.
    pub nes: f64,
    /// Nominal permutation p-value.
    pub p_value: f64,
    /// BH-adjusted p-value across the sets tested in this run.
    pub padj: f64,
    /// Effective set size: members present in the ranking.
    pub size: usize,
    /// Members driving the enrichment, in rank order.
    pub leading_edge: Vec<String>,
}

/// Results of one enrichment run, sorted by ascending nominal p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResultSet {
    /// Gene-set collection the run tested against.
    pub collection: String,
    /// Per-set results, ascending by p-value (ties by pathway name).
    pub results: Vec<EnrichmentResult>,
}

impl EnrichmentResultSet {
    /// Number of sets tested.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results significant at a padj threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&EnrichmentResult> {
        self.results.iter().filter(|r| r.padj < alpha).collect()
    }

    /// Iterate over results in significance order.
    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentResult> {
        self.results.iter()
    }

    /// Write the report as TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "pathway\tes\tnes\tp_value\tpadj\tsize\tleading_edge")?;
        for r in &self.results {
            writeln!(
                writer,
                "{}\t{:.4}\t{:.4}\t{:.4e}\t{:.4e}\t{}\t{}",
                r.pathway,
                r.es,
                r.nes,
                r.p_value,
                r.padj,
                r.size,
                r.leading_edge.join(","),
            )?;
        }
        Ok(())
    }
}

/// Run gene-set enrichment of a ranking against a collection.
///
/// Sets are reduced to their effective size (members present in the
/// ranking) and kept when that size falls within the configured bounds;
/// each kept set gets an enrichment score, a permutation p-value and a
/// NES. Nominal p-values are BH-adjusted across the kept sets.
pub fn run_gsea(
    ranking: &RankedList,
    collection: &GeneSetCollection,
    config: &GseaConfig,
) -> Result<EnrichmentResultSet> {
    config.validate()?;
    if ranking.is_empty() {
        return Err(GseaError::EmptyRanking(
            "cannot run enrichment on an empty ranking vector".to_string(),
        ));
    }
    if collection.is_empty() {
        return Err(GseaError::EmptyCollection(collection.name().to_string()));
    }

    let scores = ranking.scores();

    // Resolve each set to its hits up front; size filtering happens on
    // the effective size, not the nominal one.
    let mut candidates = Vec::new();
    let mut n_skipped = 0usize;
    for set in collection.sets() {
        match score_gene_set(ranking, &set.genes, config.weight) {
            Some(observed)
                if (config.min_size..=config.max_size).contains(&observed.hit_indices.len()) =>
            {
                candidates.push((set.name.clone(), observed));
            }
            _ => n_skipped += 1,
        }
    }
    if n_skipped > 0 {
        log::debug!(
            "{}: {} of {} sets outside size bounds {}..{}",
            collection.name(),
            n_skipped,
            collection.len(),
            config.min_size,
            config.max_size
        );
    }

    let score_one = |(i, (pathway, observed)): (usize, &(String, crate::enrich::score::SetScore))| {
        let seed = config.seed.wrapping_add((i as u64).wrapping_mul(SET_SEED_STRIDE));
        let null = permutation_null(
            &scores,
            observed.hit_indices.len(),
            config.weight,
            config.n_permutations,
            seed,
        );
        let (p_value, nes) = p_value_and_nes(observed.es, &null);
        EnrichmentResult {
            pathway: pathway.clone(),
            es: observed.es,
            nes,
            p_value,
            padj: f64::NAN,
            size: observed.hit_indices.len(),
            leading_edge: observed.leading_edge.clone(),
        }
    };

    let mut results: Vec<EnrichmentResult> = if config.parallel {
        candidates.par_iter().enumerate().map(score_one).collect()
    } else {
        candidates.iter().enumerate().map(score_one).collect()
    };

    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    for (result, q) in results.iter_mut().zip(adjust_bh(&p_values)) {
        result.padj = q;
    }

    results.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.pathway.cmp(&b.pathway))
    });

    Ok(EnrichmentResultSet {
        collection: collection.name().to_string(),
        results,
    })
}
