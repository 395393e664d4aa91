//! Gene-set collections in the GMT pathway-database format.

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A named set of human gene symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneSet {
    /// Pathway / gene-set name.
    pub name: String,
    /// Free-text description field (often a URL in curated databases).
    pub description: String,
    /// Member symbols, duplicates collapsed.
    pub genes: HashSet<String>,
}

/// A collection of gene sets loaded from one GMT file.
#[derive(Debug, Clone)]
pub struct GeneSetCollection {
    name: String,
    sets: Vec<GeneSet>,
}

impl GeneSetCollection {
    /// Build a collection from sets, rejecting duplicate set names.
    pub fn new(name: impl Into<String>, sets: Vec<GeneSet>) -> Result<Self> {
        let name = name.into();
        let mut seen: HashSet<&str> = HashSet::with_capacity(sets.len());
        for set in &sets {
            if !seen.insert(set.name.as_str()) {
                return Err(GseaError::MalformedInput {
                    path: name.clone(),
                    reason: format!("duplicate gene-set name '{}'", set.name),
                });
            }
        }
        Ok(Self { name, sets })
    }

    /// Load a GMT file: one set per line,
    /// `name<TAB>description<TAB>gene1<TAB>gene2...`.
    ///
    /// The collection takes its name from the file stem unless overridden
    /// with [`GeneSetCollection::from_gmt_named`].
    pub fn from_gmt<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "collection".to_string());
        Self::from_gmt_named(path, name)
    }

    /// Load a GMT file under an explicit collection name.
    pub fn from_gmt_named<P: AsRef<Path>>(path: P, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut sets = Vec::new();
        for (line_no, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let set_name = fields.next().unwrap_or("").trim();
            let description = fields.next().map(str::trim);
            let genes: HashSet<String> = fields
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect();

            let description = match description {
                Some(d) if !set_name.is_empty() => d,
                _ => {
                    return Err(GseaError::MalformedInput {
                        path: display,
                        reason: format!(
                            "line {}: expected name, description and members, tab-separated",
                            line_no + 1
                        ),
                    })
                }
            };
            if genes.is_empty() {
                return Err(GseaError::MalformedInput {
                    path: display,
                    reason: format!("line {}: gene set '{}' has no members", line_no + 1, set_name),
                });
            }

            sets.push(GeneSet {
                name: set_name.to_string(),
                description: description.to_string(),
                genes,
            });
        }

        if sets.is_empty() {
            return Err(GseaError::EmptyCollection(display));
        }

        Self::new(name, sets)
    }

    /// Collection name (used in batch output paths).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sets in file order.
    pub fn sets(&self) -> &[GeneSet] {
        &self.sets
    }
}
