//! Error types for the degsea library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum GseaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed input in {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: String, column: String },

    #[error("Duplicate gene identifier '{gene_id}' in {path}")]
    DuplicateGeneId { path: String, gene_id: String },

    #[error("Empty ranking: {0}")]
    EmptyRanking(String),

    #[error("Gene '{gene_id}' is significant in the union but absent from table {table}")]
    MissingGene { gene_id: String, table: String },

    #[error("Empty gene-set collection: {0}")]
    EmptyCollection(String),

    #[error("Enrichment computation failed: {0}")]
    Enrichment(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, GseaError>;
