//! Ranked gene-set enrichment analysis over differential-expression
//! contrasts.
//!
//! This library covers the post-DE half of a bulk RNA-seq workflow: it
//! consumes DESeq2-style result tables and produces ranked enrichment
//! reports against curated pathway collections.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (DeTable, RankedList, GeneSetCollection)
//! - **contrast**: Differencing of two related DE contrasts
//! - **enrich**: Gene-set enrichment scoring, permutation null, runner
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **screen**: Cross-reference against an in-vivo dependency screen
//! - **batch**: Batched enrichment over (collection x table) pairs
//! - **config**: Per-stage thresholds and knobs, resolved at the top level
//!
//! # Example
//!
//! ```no_run
//! use degsea::prelude::*;
//!
//! // Load a DE table and a pathway collection
//! let table = DeTable::from_path("de/hypoxia_ko/results.csv").unwrap();
//! let hallmark = GeneSetCollection::from_gmt("genesets/h.all.gmt").unwrap();
//!
//! // Rank and test
//! let ranking = build_ranking(&table, &RankingConfig::default()).unwrap();
//! let report = run_gsea(&ranking, &hallmark, &GseaConfig::default()).unwrap();
//! report.to_tsv("results/hallmark/hypoxia_ko/results_gsea.tsv").unwrap();
//! ```

pub mod batch;
pub mod config;
pub mod contrast;
pub mod correct;
pub mod data;
pub mod enrich;
pub mod error;
pub mod screen;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::batch::{
        run_batch, BatchConfig, BatchFailure, BatchReport, CollectionSource,
    };
    pub use crate::config::{
        DiffConfig, GseaConfig, OverlapConfig, RankingConfig, SortDirection,
    };
    pub use crate::contrast::{contrast_difference, MissingGenePolicy};
    pub use crate::correct::adjust_bh;
    pub use crate::data::{
        build_ranking, DeRecord, DeTable, GeneSet, GeneSetCollection, RankedGene, RankedList,
    };
    pub use crate::enrich::{run_gsea, EnrichmentResult, EnrichmentResultSet};
    pub use crate::error::{GseaError, Result};
    pub use crate::screen::{screen_overlap, OverlapResult, ScreenRecord, ScreenTable};
}
