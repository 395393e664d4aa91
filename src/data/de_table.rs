//! Differential-expression tables produced by an upstream DE engine.
//!
//! A table holds one row per gene for a single pairwise contrast. The
//! crate never recomputes DE statistics; it consumes the exported columns
//! (identifier, human ortholog symbol, log2 fold-change, adjusted p-value)
//! and ignores everything else in the file.

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Column holding the human ortholog symbol.
pub const SYMBOL_COLUMN: &str = "HumanSymbol";
/// Column holding the log2 fold-change.
pub const LOG2FC_COLUMN: &str = "log2FoldChange";
/// Column holding the adjusted p-value.
pub const PADJ_COLUMN: &str = "padj";
/// Identifier column written by `to_tsv` and preferred on load.
pub const DEFAULT_ID_COLUMN: &str = "GeneID";

/// One gene's DE statistics for one contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeRecord {
    /// Species-specific accession (e.g. an Ensembl gene id).
    pub gene_id: String,
    /// Human ortholog symbol; absent when no ortholog is annotated.
    pub symbol: Option<String>,
    /// Log2 fold-change of the contrast (sign follows the numerator).
    pub log2_fold_change: f64,
    /// Adjusted p-value; absent when the test was underpowered.
    pub padj: Option<f64>,
}

impl DeRecord {
    /// Check significance at a cutoff. Records without a padj never pass.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.padj.map(|p| p < alpha).unwrap_or(false)
    }
}

/// An ordered collection of DE records for one pairwise contrast.
#[derive(Debug, Clone)]
pub struct DeTable {
    /// Where the table came from, for error context (path or synthetic label).
    source: String,
    records: Vec<DeRecord>,
    /// Gene id -> position in `records`.
    index: HashMap<String, usize>,
}

impl DeTable {
    /// Build a table from records, enforcing unique gene identifiers.
    pub fn new(source: impl Into<String>, records: Vec<DeRecord>) -> Result<Self> {
        let source = source.into();
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.gene_id.clone(), i).is_some() {
                return Err(GseaError::DuplicateGeneId {
                    path: source,
                    gene_id: record.gene_id.clone(),
                });
            }
        }
        Ok(Self {
            source,
            records,
            index,
        })
    }

    /// Load a DE table from a delimited file with a header row.
    ///
    /// The delimiter (comma or tab) is sniffed from the header line.
    /// The identifier column is `GeneID` when present, otherwise the
    /// first column (DESeq2 exports often leave the rownames column
    /// unnamed). Rows whose log2 fold-change is `NA` carry no usable
    /// effect size and are dropped.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path, None)
    }

    /// Load with an explicit identifier column name.
    pub fn from_path_with_id<P: AsRef<Path>>(path: P, id_column: &str) -> Result<Self> {
        Self::load(path, Some(id_column))
    }

    fn load<P: AsRef<Path>>(path: P, id_column: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let delimiter = sniff_delimiter(path)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let id_idx = match id_column {
            Some(name) => position(name).ok_or_else(|| GseaError::MissingColumn {
                path: display.clone(),
                column: name.to_string(),
            })?,
            // Prefer the canonical name, fall back to the first column.
            None => position(DEFAULT_ID_COLUMN).unwrap_or(0),
        };
        let symbol_idx = position(SYMBOL_COLUMN).ok_or_else(|| GseaError::MissingColumn {
            path: display.clone(),
            column: SYMBOL_COLUMN.to_string(),
        })?;
        let log2fc_idx = position(LOG2FC_COLUMN).ok_or_else(|| GseaError::MissingColumn {
            path: display.clone(),
            column: LOG2FC_COLUMN.to_string(),
        })?;
        let padj_idx = position(PADJ_COLUMN).ok_or_else(|| GseaError::MissingColumn {
            path: display.clone(),
            column: PADJ_COLUMN.to_string(),
        })?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            let gene_id = field(id_idx);
            if gene_id.is_empty() {
                return Err(GseaError::MalformedInput {
                    path: display.clone(),
                    reason: format!("empty gene identifier in data row {}", row + 1),
                });
            }

            let log2_fold_change = match parse_optional(field(log2fc_idx)) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    log::debug!(
                        "{}: dropping {} (no log2 fold-change)",
                        display,
                        gene_id
                    );
                    continue;
                }
                Err(value) => {
                    return Err(GseaError::MalformedInput {
                        path: display.clone(),
                        reason: format!("unparseable log2 fold-change '{}' for {}", value, gene_id),
                    })
                }
            };

            let padj = match parse_optional(field(padj_idx)) {
                Ok(padj) => padj,
                Err(value) => {
                    return Err(GseaError::MalformedInput {
                        path: display.clone(),
                        reason: format!("unparseable padj '{}' for {}", value, gene_id),
                    })
                }
            };
            if let Some(p) = padj {
                if !(0.0..=1.0).contains(&p) {
                    return Err(GseaError::MalformedInput {
                        path: display.clone(),
                        reason: format!("padj {} for {} is outside [0, 1]", p, gene_id),
                    });
                }
            }

            let symbol = match field(symbol_idx) {
                "" | "NA" => None,
                s => Some(s.to_string()),
            };

            records.push(DeRecord {
                gene_id: gene_id.to_string(),
                symbol,
                log2_fold_change,
                padj,
            });
        }

        if records.is_empty() {
            return Err(GseaError::MalformedInput {
                path: display,
                reason: "no usable data rows".to_string(),
            });
        }

        Self::new(display, records)
    }

    /// Write the canonical four columns as TSV.
    ///
    /// The output loads back through [`DeTable::from_path`], which is how
    /// difference tables reach the ranked-vector builder.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            DEFAULT_ID_COLUMN, SYMBOL_COLUMN, LOG2FC_COLUMN, PADJ_COLUMN
        )?;
        for r in &self.records {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                r.gene_id,
                r.symbol.as_deref().unwrap_or("NA"),
                r.log2_fold_change,
                r.padj.map(|p| p.to_string()).unwrap_or_else(|| "NA".into()),
            )?;
        }
        Ok(())
    }

    /// Source label (path or synthetic name) for error context.
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

    /// Records in table order.
    pub fn records(&self) -> &[DeRecord] {
        &self.records
    }

    /// Look up a record by gene identifier.
    pub fn get(&self, gene_id: &str) -> Option<&DeRecord> {
        self.index.get(gene_id).map(|&i| &self.records[i])
    }

    /// Gene ids significant at a cutoff, in table order.
    pub fn significant_ids(&self, alpha: f64) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .map(|r| r.gene_id.as_str())
            .collect()
    }
}

/// Parse a numeric field where `NA`/empty means absent.
///
/// `Err` carries the offending text for error context.
fn parse_optional(field: &str) -> std::result::Result<Option<f64>, String> {
    match field {
        "" | "NA" | "NaN" | "nan" => Ok(None),
        s => s.parse::<f64>().map(Some).map_err(|_| s.to_string()),
    }
}

/// Detect the delimiter (tab or comma) from the header line.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = String::new();
    reader.read_line(&mut header)?;
    Ok(if header.contains('\t') { b'\t' } else { b',' })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fixture(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_with_extra_columns() {
        let file = write_fixture(
            "GeneID,baseMean,HumanSymbol,log2FoldChange,padj\n\
             ENSMUSG01,100.5,TP53,1.25,0.001\n\
             ENSMUSG02,3.2,MYC,-0.5,0.9\n",
        );
        let table = DeTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let r = table.get("ENSMUSG01").unwrap();
        assert_eq!(r.symbol.as_deref(), Some("TP53"));
        assert_eq!(r.log2_fold_change, 1.25);
        assert_eq!(r.padj, Some(0.001));
    }

    #[test]
    fn test_load_tsv_first_column_fallback() {
        // Unnamed rownames column, as R's write.csv-style exports produce.
        let file = write_fixture(
            "\tHumanSymbol\tlog2FoldChange\tpadj\n\
             g1\tBRCA1\t0.7\t0.04\n",
        );
        let table = DeTable::from_path(file.path()).unwrap();
        assert!(table.get("g1").is_some());
    }

    #[test]
    fn test_missing_column_is_error() {
        let file = write_fixture("GeneID,log2FoldChange,padj\ng1,1.0,0.5\n");
        let err = DeTable::from_path(file.path()).unwrap_err();
        assert!(matches!(err, GseaError::MissingColumn { column, .. } if column == SYMBOL_COLUMN));
    }

    #[test]
    fn test_na_fields_load_as_none() {
        let file = write_fixture(
            "GeneID,HumanSymbol,log2FoldChange,padj\n\
             g1,NA,1.0,NA\n\
             g2,ABC,2.0,0.01\n",
        );
        let table = DeTable::from_path(file.path()).unwrap();
        let r = table.get("g1").unwrap();
        assert!(r.symbol.is_none());
        assert!(r.padj.is_none());
        assert!(!r.is_significant_at(0.25));
    }

    #[test]
    fn test_na_log2fc_rows_are_dropped() {
        let file = write_fixture(
            "GeneID,HumanSymbol,log2FoldChange,padj\n\
             g1,ABC,NA,0.01\n\
             g2,DEF,2.0,0.01\n",
        );
        let table = DeTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("g1").is_none());
    }

    #[test]
    fn test_duplicate_gene_id_is_error() {
        let file = write_fixture(
            "GeneID,HumanSymbol,log2FoldChange,padj\n\
             g1,ABC,1.0,0.1\n\
             g1,ABC,1.1,0.2\n",
        );
        let err = DeTable::from_path(file.path()).unwrap_err();
        assert!(matches!(err, GseaError::DuplicateGeneId { gene_id, .. } if gene_id == "g1"));
    }

    #[test]
    fn test_padj_out_of_range_is_error() {
        let file = write_fixture(
            "GeneID,HumanSymbol,log2FoldChange,padj\ng1,ABC,1.0,1.5\n",
        );
        assert!(DeTable::from_path(file.path()).is_err());
    }

    #[test]
    fn test_tsv_roundtrip() {
        let table = DeTable::new(
            "synthetic",
            vec![
                DeRecord {
                    gene_id: "g1".into(),
                    symbol: Some("ABC".into()),
                    log2_fold_change: 1.5,
                    padj: Some(0.25),
                },
                DeRecord {
                    gene_id: "g2".into(),
                    symbol: None,
                    log2_fold_change: -0.125,
                    padj: None,
                },
            ],
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        table.to_tsv(file.path()).unwrap();
        let loaded = DeTable::from_path(file.path()).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("g1").unwrap(), table.get("g1").unwrap());
        assert_eq!(loaded.get("g2").unwrap(), table.get("g2").unwrap());
    }

    #[test]
    fn test_significant_ids_in_table_order() {
        let table = DeTable::new(
            "synthetic",
            vec![
                DeRecord {
                    gene_id: "g1".into(),
                    symbol: None,
                    log2_fold_change: 1.0,
                    padj: Some(0.2),
                },
                DeRecord {
                    gene_id: "g2".into(),
                    symbol: None,
                    log2_fold_change: 1.0,
                    padj: Some(0.5),
                },
                DeRecord {
                    gene_id: "g3".into(),
                    symbol: None,
                    log2_fold_change: 1.0,
                    padj: Some(0.01),
                },
            ],
        )
        .unwrap();
        assert_eq!(table.significant_ids(0.25), vec!["g1", "g3"]);
    }
}
