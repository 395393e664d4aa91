//! Data structures for DE tables, rankings and gene-set collections.

mod de_table;
mod gene_sets;
mod ranking;

pub use de_table::{
    DeRecord, DeTable, DEFAULT_ID_COLUMN, LOG2FC_COLUMN, PADJ_COLUMN, SYMBOL_COLUMN,
};
pub use gene_sets::{GeneSet, GeneSetCollection};
pub use ranking::{build_ranking, RankedGene, RankedList};
