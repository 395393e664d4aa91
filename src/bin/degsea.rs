//! degsea - ranked gene-set enrichment over DE contrasts
//!
//! Command-line interface for ranking DE tables, differencing contrasts
//! and running batched gene-set enrichment.

use clap::{Parser, Subcommand, ValueEnum};
use degsea::batch::{run_batch, BatchConfig, CollectionSource};
use degsea::config::{DiffConfig, GseaConfig, OverlapConfig, RankingConfig, SortDirection};
use degsea::contrast::{contrast_difference, MissingGenePolicy};
use degsea::data::{build_ranking, DeTable, GeneSetCollection};
use degsea::enrich::run_gsea;
use degsea::error::Result;
use degsea::screen::{screen_overlap, ScreenTable};
use std::path::PathBuf;

/// CLI-friendly missing-gene policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingGenePolicy {
    /// Drop genes absent from one of the two tables
    Skip,
    /// Treat the absent side's fold-change as zero
    Zero,
    /// Fail on the first gene absent from one side
    Strict,
}

impl From<CliMissingGenePolicy> for MissingGenePolicy {
    fn from(policy: CliMissingGenePolicy) -> Self {
        match policy {
            CliMissingGenePolicy::Skip => MissingGenePolicy::Skip,
            CliMissingGenePolicy::Zero => MissingGenePolicy::Zero,
            CliMissingGenePolicy::Strict => MissingGenePolicy::Strict,
        }
    }
}

/// Ranked gene-set enrichment over differential-expression contrasts
#[derive(Parser)]
#[command(name = "degsea")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a symbol-keyed ranking vector from a DE table
    Rank {
        /// Path to the DE table (CSV or TSV)
        #[arg(short, long)]
        table: PathBuf,

        /// Output path for the ranking TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Keep records with padj strictly below this cutoff
        #[arg(long, default_value = "1.0")]
        padj: f64,

        /// Sort descending (most up-regulated first)
        #[arg(long)]
        descending: bool,
    },

    /// Difference two related DE contrasts into a synthetic DE table
    Diff {
        /// Contrast A (the minuend and canonical symbol source)
        #[arg(short = 'a', long)]
        table_a: PathBuf,

        /// Contrast B (the subtrahend)
        #[arg(short = 'b', long)]
        table_b: PathBuf,

        /// Output path for the difference table TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Union-building significance cutoff
        #[arg(long, default_value = "0.25")]
        threshold: f64,

        /// Policy for union genes absent from one table
        #[arg(long, value_enum, default_value = "skip")]
        policy: CliMissingGenePolicy,
    },

    /// Run gene-set enrichment of one DE table against one GMT file
    Gsea {
        /// Path to the DE table (CSV or TSV)
        #[arg(short, long)]
        table: PathBuf,

        /// Path to the gene-set collection (GMT)
        #[arg(short, long)]
        gene_sets: PathBuf,

        /// Output path for the enrichment report TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Ranking padj cutoff (default: no filtering)
        #[arg(long, default_value = "1.0")]
        padj: f64,

        /// Sort the ranking descending
        #[arg(long)]
        descending: bool,

        /// Minimum effective gene-set size
        #[arg(long, default_value = "15")]
        min_size: usize,

        /// Maximum effective gene-set size
        #[arg(long, default_value = "500")]
        max_size: usize,

        /// Permutation budget per set
        #[arg(long, default_value = "5000")]
        permutations: usize,

        /// Random seed for the permutation null
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Run a batch from a YAML configuration file
    Batch {
        /// Path to the batch configuration YAML
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Cross-reference significant DE genes against a dependency screen
    Screen {
        /// Path to the DE table (CSV or TSV)
        #[arg(short, long)]
        table: PathBuf,

        /// Path to the screen gene summary (columns: id, score, fdr)
        #[arg(short, long)]
        screen: PathBuf,

        /// DE significance cutoff
        #[arg(long, default_value = "0.05")]
        de_threshold: f64,

        /// Screen FDR cutoff
        #[arg(long, default_value = "0.05")]
        screen_threshold: f64,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Generate an example batch configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "batch.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: invalid log level '{}', defaulting to warn",
                cli.log_level
            );
            log::LevelFilter::Warn
        });
    env_logger::Builder::new().filter_level(log_level).init();

    let result = match cli.command {
        Commands::Rank {
            table,
            output,
            padj,
            descending,
        } => cmd_rank(&table, &output, padj, descending),

        Commands::Diff {
            table_a,
            table_b,
            output,
            threshold,
            policy,
        } => cmd_diff(&table_a, &table_b, &output, threshold, policy.into()),

        Commands::Gsea {
            table,
            gene_sets,
            output,
            padj,
            descending,
            min_size,
            max_size,
            permutations,
            seed,
        } => cmd_gsea(
            &table,
            &gene_sets,
            &output,
            padj,
            descending,
            min_size,
            max_size,
            permutations,
            seed,
        ),

        Commands::Batch { config } => cmd_batch(&config),

        Commands::Screen {
            table,
            screen,
            de_threshold,
            screen_threshold,
            format,
        } => cmd_screen(&table, &screen, de_threshold, screen_threshold, &format),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn direction(descending: bool) -> SortDirection {
    if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    }
}

/// Build and write a ranking vector
fn cmd_rank(table_path: &PathBuf, output: &PathBuf, padj: f64, descending: bool) -> Result<()> {
    eprintln!("Loading {}...", table_path.display());
    let table = DeTable::from_path(table_path)?;
    eprintln!("Loaded {} records", table.len());

    let config = RankingConfig {
        padj_threshold: padj,
        direction: direction(descending),
    };
    let ranking = build_ranking(&table, &config)?;
    ranking.to_tsv(output)?;

    eprintln!("Wrote {} ranked symbols to {}", ranking.len(), output.display());
    Ok(())
}

/// Difference two contrasts and write the result
fn cmd_diff(
    table_a: &PathBuf,
    table_b: &PathBuf,
    output: &PathBuf,
    threshold: f64,
    policy: MissingGenePolicy,
) -> Result<()> {
    eprintln!("Loading {}...", table_a.display());
    let a = DeTable::from_path(table_a)?;
    eprintln!("Loading {}...", table_b.display());
    let b = DeTable::from_path(table_b)?;
    eprintln!("Loaded {} and {} records", a.len(), b.len());

    let config = DiffConfig {
        significance: threshold,
        missing_gene: policy,
    };
    let diff = contrast_difference(&a, &b, &config)?;
    diff.to_tsv(output)?;

    eprintln!(
        "Wrote {} difference rows (padj < {}) to {}",
        diff.len(),
        threshold,
        output.display()
    );
    Ok(())
}

/// Run one enrichment and write the report
#[allow(clippy::too_many_arguments)]
fn cmd_gsea(
    table_path: &PathBuf,
    gene_sets: &PathBuf,
    output: &PathBuf,
    padj: f64,
    descending: bool,
    min_size: usize,
    max_size: usize,
    permutations: usize,
    seed: u64,
) -> Result<()> {
    eprintln!("Loading {}...", table_path.display());
    let table = DeTable::from_path(table_path)?;
    eprintln!("Loading {}...", gene_sets.display());
    let collection = GeneSetCollection::from_gmt(gene_sets)?;
    eprintln!(
        "Loaded {} records, {} gene sets",
        table.len(),
        collection.len()
    );

    let ranking = build_ranking(
        &table,
        &RankingConfig {
            padj_threshold: padj,
            direction: direction(descending),
        },
    )?;
    eprintln!("Ranking {} symbols", ranking.len());

    let config = GseaConfig {
        min_size,
        max_size,
        n_permutations: permutations,
        seed,
        ..GseaConfig::default()
    };
    eprintln!(
        "Running enrichment ({} permutations per set)...",
        config.n_permutations
    );
    let results = run_gsea(&ranking, &collection, &config)?;
    results.to_tsv(output)?;

    eprintln!("Wrote {} set results to {}", results.len(), output.display());
    let n_sig = results.significant_at(0.05).len();
    eprintln!("  {} significant at padj < 0.05", n_sig);

    // Print top hits
    if !results.is_empty() {
        eprintln!("\nTop 5 sets:");
        for r in results.iter().take(5) {
            eprintln!(
                "  {}: ES={:.3}, NES={:.3}, padj={:.4}",
                r.pathway, r.es, r.nes, r.padj
            );
        }
    }

    Ok(())
}

/// Run a batch from configuration
fn cmd_batch(config_path: &PathBuf) -> Result<()> {
    eprintln!("Loading batch configuration from {}...", config_path.display());
    let config_str = std::fs::read_to_string(config_path)?;
    let config = BatchConfig::from_yaml(&config_str)?;

    eprintln!(
        "Running batch '{}': {} collections x {} tables...",
        config.name,
        config.collections.len(),
        config.tables.len()
    );
    let report = run_batch(&config)?;

    println!("{}", report);
    Ok(())
}

/// Cross-reference a DE table against a dependency screen
fn cmd_screen(
    table_path: &PathBuf,
    screen_path: &PathBuf,
    de_threshold: f64,
    screen_threshold: f64,
    format: &str,
) -> Result<()> {
    eprintln!("Loading {}...", table_path.display());
    let table = DeTable::from_path(table_path)?;
    eprintln!("Loading {}...", screen_path.display());
    let screen = ScreenTable::from_path(screen_path)?;
    eprintln!("Loaded {} DE records, {} screen genes", table.len(), screen.len());

    let config = OverlapConfig {
        de_threshold,
        screen_threshold,
    };
    let result = screen_overlap(&table, &screen, &config)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Screen Overlap");
            println!("==============");
            print!("{}", result);
        }
    }

    Ok(())
}

/// Generate an example batch configuration
fn cmd_example(output: &PathBuf) -> Result<()> {
    let config = BatchConfig {
        name: "example-gsea".to_string(),
        description: Some(
            "Hallmark and KEGG enrichment over two culture-condition contrasts".to_string(),
        ),
        collections: vec![
            CollectionSource {
                name: "hallmark".to_string(),
                path: PathBuf::from("genesets/h.all.v2023.2.Hs.symbols.gmt"),
            },
            CollectionSource {
                name: "kegg".to_string(),
                path: PathBuf::from("genesets/c2.cp.kegg.v2023.2.Hs.symbols.gmt"),
            },
        ],
        tables: vec![
            PathBuf::from("de/organoid_ko/results.csv"),
            PathBuf::from("de/monolayer_ko/results.csv"),
        ],
        output_root: PathBuf::from("results/gsea"),
        suffix: "gsea.tsv".to_string(),
        ranking: RankingConfig::default(),
        gsea: GseaConfig::default(),
    };

    let yaml = config.to_yaml()?;
    std::fs::write(output, &yaml)?;
    eprintln!("Wrote example batch configuration to {}", output.display());
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
