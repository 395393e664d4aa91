//! Batch enrichment over (collection x table) cross-products.
//!
//! One pair failing must not take its siblings down: every pair is
//! loaded, ranked, scored and persisted independently, and failures are
//! collected (and logged with their pair context) instead of propagated.

use crate::config::{GseaConfig, RankingConfig};
use crate::data::{build_ranking, DeTable, GeneSetCollection};
use crate::enrich::run_gsea;
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_suffix() -> String {
    "gsea.tsv".to_string()
}

/// A named gene-set collection source on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSource {
    /// Collection name; first path component of every report it produces.
    pub name: String,
    /// Path to the GMT file.
    pub path: PathBuf,
}

/// Batch run configuration, YAML-loadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Name of the batch run.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Gene-set collections to test against.
    pub collections: Vec<CollectionSource>,
    /// DE (or difference) table paths to rank and test.
    pub tables: Vec<PathBuf>,
    /// Root directory for reports.
    pub output_root: PathBuf,
    /// Report filename suffix, appended to the table's basename.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Ranked-vector builder settings.
    #[serde(default)]
    pub ranking: RankingConfig,
    /// Enrichment settings.
    #[serde(default)]
    pub gsea: GseaConfig,
}

impl BatchConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(GseaError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(GseaError::from)
    }
}

/// A (collection, table) pair that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Collection name of the pair.
    pub collection: String,
    /// Table path of the pair.
    pub table: PathBuf,
    /// Rendered error.
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Reports written, in run order.
    pub written: Vec<PathBuf>,
    /// Pairs that failed, in run order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Number of reports written.
    pub fn n_ok(&self) -> usize {
        self.written.len()
    }

    /// Number of failed pairs.
    pub fn n_failed(&self) -> usize {
        self.failures.len()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reports written: {}", self.n_ok())?;
        writeln!(f, "Failed pairs:    {}", self.n_failed())?;
        for failure in &self.failures {
            writeln!(
                f,
                "  {} x {}: {}",
                failure.collection,
                failure.table.display(),
                failure.message
            )?;
        }
        Ok(())
    }
}

/// Derive the report path for one (collection, table) pair.
///
/// Pattern: `<root>/<collection>/<condition>/<stem>_<suffix>`, where the
/// condition is the table path's parent directory name.
pub fn output_path(root: &Path, collection: &str, table: &Path, suffix: &str) -> PathBuf {
    let condition = table
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let stem = table
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    root.join(collection)
        .join(condition)
        .join(format!("{}_{}", stem, suffix))
}

/// Run enrichment for every (collection, table) pair.
///
/// Collections are loaded once each; a collection that fails to load
/// fails all of its pairs. Per-pair failures are logged and collected,
/// never propagated, so one bad input cannot abort the rest of the run.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    if config.collections.is_empty() {
        return Err(GseaError::InvalidParameter(
            "batch config lists no gene-set collections".to_string(),
        ));
    }
    if config.tables.is_empty() {
        return Err(GseaError::InvalidParameter(
            "batch config lists no tables".to_string(),
        ));
    }
    config.ranking.validate()?;
    config.gsea.validate()?;

    let mut report = BatchReport {
        written: Vec::new(),
        failures: Vec::new(),
    };

    for source in &config.collections {
        let collection = match GeneSetCollection::from_gmt_named(&source.path, &source.name) {
            Ok(c) => c,
            Err(e) => {
                log::warn!(
                    "batch '{}': collection {} ({}) failed to load: {}",
                    config.name,
                    source.name,
                    source.path.display(),
                    e
                );
                for table in &config.tables {
                    report.failures.push(BatchFailure {
                        collection: source.name.clone(),
                        table: table.clone(),
                        message: e.to_string(),
                    });
                }
                continue;
            }
        };

        for table in &config.tables {
            match run_pair(&collection, table, config) {
                Ok(path) => report.written.push(path),
                Err(e) => {
                    log::warn!(
                        "batch '{}': {} x {} failed: {}",
                        config.name,
                        source.name,
                        table.display(),
                        e
                    );
                    report.failures.push(BatchFailure {
                        collection: source.name.clone(),
                        table: table.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(report)
}

/// Load, rank, score and persist one pair.
fn run_pair(collection: &GeneSetCollection, table: &Path, config: &BatchConfig) -> Result<PathBuf> {
    let de = DeTable::from_path(table)?;
    let ranking = build_ranking(&de, &config.ranking)?;
    let results = run_gsea(&ranking, collection, &config.gsea)?;

    let path = output_path(&config.output_root, collection.name(), table, &config.suffix);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    results.to_tsv(&path)?;
    Ok(path)
}
