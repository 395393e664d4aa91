//! Per-stage analysis configuration.
//!
//! Every threshold the pipeline uses lives here, resolved once at the top
//! level and passed down. Components never carry hardcoded cutoffs.

use crate::contrast::MissingGenePolicy;
use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};

/// Sort direction for a ranking vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Most negative log2 fold-change first.
    Ascending,
    /// Most positive log2 fold-change first.
    Descending,
}

/// Configuration for the ranked-vector builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Keep records with adjusted p-value strictly below this cutoff.
    /// 1.0 keeps every record that has a finite padj.
    pub padj_threshold: f64,
    /// Sort direction of the output vector.
    pub direction: SortDirection,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            padj_threshold: 1.0,
            direction: SortDirection::Ascending,
        }
    }
}

impl RankingConfig {
    /// Validate threshold bounds.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.padj_threshold) {
            return Err(GseaError::InvalidParameter(format!(
                "ranking padj threshold must be in [0, 1], got {}",
                self.padj_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration for the contrast differencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Union-building significance cutoff on adjusted p-values.
    /// Deliberately loose by default: recall over precision.
    pub significance: f64,
    /// What to do with union genes absent from one of the two tables.
    pub missing_gene: MissingGenePolicy,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            significance: 0.25,
            missing_gene: MissingGenePolicy::Skip,
        }
    }
}

impl DiffConfig {
    /// Validate threshold bounds.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.significance) {
            return Err(GseaError::InvalidParameter(format!(
                "difference significance threshold must be in [0, 1], got {}",
                self.significance
            )));
        }
        Ok(())
    }
}

/// Configuration for the enrichment runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GseaConfig {
    /// Minimum effective gene-set size (members present in the ranking).
    pub min_size: usize,
    /// Maximum effective gene-set size.
    pub max_size: usize,
    /// Number of gene-label permutations per set.
    pub n_permutations: usize,
    /// Weight exponent applied to ranking scores in the running sum.
    pub weight: f64,
    /// Random seed for the permutation null.
    pub seed: u64,
    /// Fan scoring out across gene sets with rayon.
    pub parallel: bool,
}

impl Default for GseaConfig {
    fn default() -> Self {
        Self {
            min_size: 15,
            max_size: 500,
            n_permutations: 5000,
            weight: 1.0,
            seed: 42,
            parallel: true,
        }
    }
}

impl GseaConfig {
    /// Create a quick configuration for testing (fewer permutations).
    pub fn quick() -> Self {
        Self {
            n_permutations: 200,
            ..Default::default()
        }
    }

    /// Validate size bounds and the permutation budget.
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 || self.min_size > self.max_size {
            return Err(GseaError::InvalidParameter(format!(
                "gene-set size bounds must satisfy 1 <= min <= max, got {}..{}",
                self.min_size, self.max_size
            )));
        }
        if self.n_permutations == 0 {
            return Err(GseaError::InvalidParameter(
                "permutation budget must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the dependency-screen overlap test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapConfig {
    /// Significance cutoff on DE adjusted p-values.
    pub de_threshold: f64,
    /// Significance cutoff on screen FDR values.
    pub screen_threshold: f64,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            de_threshold: 0.05,
            screen_threshold: 0.05,
        }
    }
}

impl OverlapConfig {
    /// Validate threshold bounds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("DE", self.de_threshold),
            ("screen", self.screen_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GseaError::InvalidParameter(format!(
                    "{} overlap threshold must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
