//! Integration tests for the DE-to-enrichment pipeline.

use degsea::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a synthetic DE table: `n` genes with log2 fold-changes stepping
/// from +3 down, symbols SYM00.., all significant at padj 0.001.
fn write_de_table(dir: &Path, condition: &str, n: usize) -> PathBuf {
    let cond_dir = dir.join(condition);
    fs::create_dir_all(&cond_dir).unwrap();
    let path = cond_dir.join("results.csv");

    let mut rows = String::from("GeneID,baseMean,HumanSymbol,log2FoldChange,padj\n");
    for i in 0..n {
        let log2fc = 3.0 - i as f64 * 6.0 / (n - 1) as f64;
        rows.push_str(&format!(
            "ENSMUSG{:04},100.0,SYM{:02},{},0.001\n",
            i, i, log2fc
        ));
    }
    fs::write(&path, rows).unwrap();
    path
}

/// Write a GMT with a top-loaded, a bottom-loaded and a spread-out set.
fn write_gmt(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(
        &path,
        "UP_SET\tdesc\tSYM00\tSYM01\tSYM02\tSYM03\tSYM04\n\
         DOWN_SET\tdesc\tSYM25\tSYM26\tSYM27\tSYM28\tSYM29\n\
         SPREAD_SET\tdesc\tSYM02\tSYM10\tSYM18\tSYM27\n",
    )
    .unwrap();
    path
}

fn quick_gsea_config() -> GseaConfig {
    GseaConfig {
        min_size: 3,
        max_size: 50,
        n_permutations: 200,
        ..GseaConfig::default()
    }
}

#[test]
fn test_full_enrichment_chain() {
    let dir = TempDir::new().unwrap();
    let de_path = write_de_table(dir.path(), "organoid_ko", 30);
    let gmt_path = write_gmt(dir.path(), "sets.gmt");

    let table = DeTable::from_path(&de_path).unwrap();
    let collection = GeneSetCollection::from_gmt(&gmt_path).unwrap();

    let ranking = build_ranking(
        &table,
        &RankingConfig {
            direction: SortDirection::Descending,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(ranking.len(), 30);

    let results = run_gsea(&ranking, &collection, &quick_gsea_config()).unwrap();
    assert_eq!(results.len(), 3);

    let up = results.iter().find(|r| r.pathway == "UP_SET").unwrap();
    let down = results.iter().find(|r| r.pathway == "DOWN_SET").unwrap();
    assert!(up.es > 0.0, "top-loaded set should enrich positively");
    assert!(down.es < 0.0, "bottom-loaded set should enrich negatively");
    assert!(up.p_value < 0.1);
    assert!(down.p_value < 0.1);
    assert!(up.leading_edge.contains(&"SYM00".to_string()));

    // Persist and spot-check the report.
    let report_path = dir.path().join("report.tsv");
    results.to_tsv(&report_path).unwrap();
    let contents = fs::read_to_string(&report_path).unwrap();
    assert!(contents.starts_with("pathway\t"));
    assert_eq!(contents.lines().count(), 4);
}

#[test]
fn test_difference_table_feeds_the_ranking_builder() {
    let dir = TempDir::new().unwrap();
    let path_a = write_de_table(dir.path(), "organoid_ko", 20);
    let path_b = write_de_table(dir.path(), "monolayer_ko", 20);

    let a = DeTable::from_path(&path_a).unwrap();
    let b = DeTable::from_path(&path_b).unwrap();

    let diff = contrast_difference(&a, &b, &DiffConfig::default()).unwrap();
    assert_eq!(diff.len(), 20);

    // The placeholder padj equals the threshold, so the difference table
    // round-trips through the loader and passes the default padj filter.
    let diff_path = dir.path().join("diff.tsv");
    diff.to_tsv(&diff_path).unwrap();
    let reloaded = DeTable::from_path(&diff_path).unwrap();
    for record in reloaded.records() {
        assert_eq!(record.padj, Some(0.25));
        // Identical contrasts cancel exactly.
        assert_eq!(record.log2_fold_change, 0.0);
    }

    let ranking = build_ranking(&reloaded, &RankingConfig::default()).unwrap();
    assert_eq!(ranking.len(), 20);

    // A stricter cutoff than the placeholder filters everything out.
    let err = build_ranking(
        &reloaded,
        &RankingConfig {
            padj_threshold: 0.2,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, GseaError::EmptyRanking(_)));
}

#[test]
fn test_difference_scenario_values() {
    let a = DeTable::new(
        "a",
        vec![DeRecord {
            gene_id: "gene1".into(),
            symbol: Some("X".into()),
            log2_fold_change: 2.0,
            padj: Some(0.01),
        }],
    )
    .unwrap();
    let b = DeTable::new(
        "b",
        vec![DeRecord {
            gene_id: "gene1".into(),
            symbol: Some("X".into()),
            log2_fold_change: 0.5,
            padj: Some(0.20),
        }],
    )
    .unwrap();

    let diff = contrast_difference(&a, &b, &DiffConfig::default()).unwrap();
    let row = diff.get("gene1").unwrap();
    assert_eq!(row.log2_fold_change, 1.5);
    assert_eq!(row.symbol.as_deref(), Some("X"));
    assert_eq!(row.padj, Some(0.25));
}

#[test]
fn test_empty_collection_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let gmt_path = dir.path().join("empty.gmt");
    fs::write(&gmt_path, "\n").unwrap();

    let err = GeneSetCollection::from_gmt(&gmt_path).unwrap_err();
    assert!(matches!(err, GseaError::EmptyCollection(_)));
}

#[test]
fn test_batch_isolates_per_pair_failures() {
    let dir = TempDir::new().unwrap();
    let gmt_a = write_gmt(dir.path(), "a.gmt");
    let gmt_b = write_gmt(dir.path(), "b.gmt");
    let t1 = write_de_table(dir.path(), "cond1", 30);
    let t2 = write_de_table(dir.path(), "cond2", 30);
    let missing = dir.path().join("cond3").join("results.csv");

    let config = BatchConfig {
        name: "integration".to_string(),
        description: None,
        collections: vec![
            CollectionSource {
                name: "colA".to_string(),
                path: gmt_a,
            },
            CollectionSource {
                name: "colB".to_string(),
                path: gmt_b,
            },
        ],
        tables: vec![t1, t2, missing.clone()],
        output_root: dir.path().join("out"),
        suffix: "gsea.tsv".to_string(),
        ranking: RankingConfig {
            direction: SortDirection::Descending,
            ..Default::default()
        },
        gsea: quick_gsea_config(),
    };

    // 2 collections x 3 tables; the missing table fails under both
    // collections, everything else runs to completion.
    let report = run_batch(&config).unwrap();
    assert_eq!(report.n_ok(), 4);
    assert_eq!(report.n_failed(), 2);
    for failure in &report.failures {
        assert_eq!(failure.table, missing);
    }

    for cond in ["cond1", "cond2"] {
        for col in ["colA", "colB"] {
            let path = dir
                .path()
                .join("out")
                .join(col)
                .join(cond)
                .join("results_gsea.tsv");
            assert!(path.exists(), "missing report {}", path.display());
        }
    }

    // Re-running overwrites in place; pre-existing directories are fine.
    let report = run_batch(&config).unwrap();
    assert_eq!(report.n_ok(), 4);
}

#[test]
fn test_screen_overlap_end_to_end() {
    let dir = TempDir::new().unwrap();
    let de_path = write_de_table(dir.path(), "organoid_ko", 20);

    // Screen hits: three of the DE symbols plus one unrelated gene.
    let screen_path = dir.path().join("screen.tsv");
    fs::write(
        &screen_path,
        "id\tscore\tfdr\n\
         SYM00\t0.0001\t0.001\n\
         SYM01\t0.0002\t0.002\n\
         SYM02\t0.0003\t0.003\n\
         UNRELATED\t0.0004\t0.004\n",
    )
    .unwrap();

    let de = DeTable::from_path(&de_path).unwrap();
    let screen = ScreenTable::from_path(&screen_path).unwrap();

    let result = screen_overlap(&de, &screen, &OverlapConfig::default()).unwrap();
    // Every DE gene is significant at 0.05, so the draw is the whole
    // universe and the overlap is certain.
    assert_eq!(result.n_universe, 20);
    assert_eq!(result.n_de, 20);
    assert_eq!(result.n_screen, 3);
    assert_eq!(result.n_overlap, 3);
    assert!((result.p_value - 1.0).abs() < 1e-9);
    assert_eq!(
        result.genes,
        vec!["SYM00".to_string(), "SYM01".to_string(), "SYM02".to_string()]
    );
}

#[test]
fn test_ranking_aggregates_shared_symbols_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.csv");
    fs::write(
        &path,
        "GeneID,HumanSymbol,log2FoldChange,padj\n\
         ENSMUSG0001,Y,1.0,0.01\n\
         ENSMUSG0002,Y,3.0,0.01\n\
         ENSMUSG0003,Z,-1.0,0.01\n",
    )
    .unwrap();

    let table = DeTable::from_path(&path).unwrap();
    let ranking = build_ranking(&table, &RankingConfig::default()).unwrap();

    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking.score_of("Y"), Some(2.0));
    let symbols: Vec<&str> = ranking.entries().iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["Z", "Y"]);
}
