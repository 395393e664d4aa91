//! Gene-set enrichment analysis of ranking vectors.
//!
//! `score` holds the enrichment statistic itself, `permutation` its
//! null model, and `runner` the validate/invoke/sort layer the rest of
//! the crate talks to.

mod permutation;
mod runner;
mod score;

pub use runner::{run_gsea, EnrichmentResult, EnrichmentResultSet};
pub use score::{score_gene_set, SetScore};
