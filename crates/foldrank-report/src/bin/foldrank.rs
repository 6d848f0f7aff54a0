//! FOLDRANK CLI entry point
//!
//! ```bash
//! foldrank consolidate --root results/run_01 \
//!     --output-csv design_metrics_summary.csv \
//!     --output-markdown design_metrics_report.md
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use foldrank_report::{
    config::{ConsolidateConfig, ScoreWeights, SearchPatterns},
    pipeline::ConsolidateStage,
    prodigy, sequences,
};

/// FOLDRANK: consolidated ranking for protein binder design pipelines
#[derive(Parser, Debug)]
#[command(name = "foldrank")]
#[command(version)]
#[command(about = "Consolidate design metrics into a ranked report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Consolidate all pipeline metrics and write the ranked reports
    Consolidate(ConsolidateArgs),

    /// Parse a raw binding-affinity log into a CSV summary
    ParseProdigy(ParseProdigyArgs),

    /// Extract the target chain sequence from a structure file
    ExtractSequence(ExtractSequenceArgs),

    /// Show version and build info
    Version,
}

#[derive(Args, Debug)]
struct ConsolidateArgs {
    /// Pipeline output directory containing all results
    #[arg(long, required = true)]
    root: PathBuf,

    /// Output CSV file (full tabular record)
    #[arg(long, default_value = "design_metrics_summary.csv")]
    output_csv: PathBuf,

    /// Output Markdown report
    #[arg(long, default_value = "design_metrics_report.md")]
    output_markdown: PathBuf,

    /// Output summary JSON
    #[arg(long, default_value = "design_metrics_summary.json")]
    output_json: PathBuf,

    /// Number of top candidates highlighted in the Markdown report
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// JSON file with a custom weight table ({"metric": weight, ...})
    #[arg(long)]
    weights: Option<PathBuf>,

    // ═══════════════════════════════════════════════════════════════════
    // SEARCH PATTERNS (relative to --root)
    // ═══════════════════════════════════════════════════════════════════

    /// Glob pattern for interface score files
    #[arg(long, default_value = "*/ipsae_scores/*_10_10.txt")]
    ipsae_pattern: String,

    /// Glob pattern for binding affinity summary CSVs
    #[arg(long, default_value = "*/prodigy/*_prodigy_summary.csv")]
    prodigy_pattern: String,

    /// Glob pattern for similarity-search summary TSVs
    #[arg(long, default_value = "*/foldseek/*_foldseek_summary.tsv")]
    foldseek_pattern: String,

    /// Glob pattern for prediction confidence directories
    #[arg(long, default_value = "*/predictions")]
    confidence_pattern: String,

    /// Glob pattern for sequence redesign output directories
    #[arg(long, default_value = "*_mpnn_optimized")]
    mpnn_pattern: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ParseProdigyArgs {
    /// Raw affinity predictor log
    #[arg(long, required = true)]
    input: PathBuf,

    /// Output CSV summary file
    #[arg(long, required = true)]
    output: PathBuf,

    /// Structure identifier for the summary row
    #[arg(long, required = true)]
    structure_id: String,
}

#[derive(Args, Debug)]
struct ExtractSequenceArgs {
    /// Input structure file (.cif, .pdb, .ent)
    structure_file: PathBuf,

    /// Output FASTA file (default: stdout)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Chain ID of the designed binder to exclude from target selection
    #[arg(long)]
    designed_chain: Option<String>,

    /// Output all chains, not just the target
    #[arg(long)]
    all_chains: bool,

    /// Output format
    #[arg(long, default_value = "fasta", value_parser = ["fasta", "plain"])]
    format: String,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Consolidate(args) => run_consolidate(args),
        Commands::ParseProdigy(args) => run_parse_prodigy(args),
        Commands::ExtractSequence(args) => run_extract_sequence(args),
        Commands::Version => show_version(),
    }
}

fn run_consolidate(args: ConsolidateArgs) -> Result<()> {
    let weights = match &args.weights {
        Some(path) => ScoreWeights::load(path)?,
        None => ScoreWeights::default(),
    };

    let config = ConsolidateConfig {
        root_dir: args.root,
        output_csv: args.output_csv,
        output_markdown: args.output_markdown,
        output_json: args.output_json,
        top_n: args.top_n,
        patterns: SearchPatterns {
            ipsae: args.ipsae_pattern,
            prodigy: args.prodigy_pattern,
            foldseek: args.foldseek_pattern,
            confidence: args.confidence_pattern,
            mpnn: args.mpnn_pattern,
        },
        weights,
        verbose: args.verbose,
    };

    let result = ConsolidateStage::new(config)?.run()?;

    if let Some(top) = &result.top_candidate {
        log::info!("  Top ranked: {}", top);
    }
    Ok(())
}

fn run_parse_prodigy(args: ParseProdigyArgs) -> Result<()> {
    prodigy::write_summary_csv(&args.input, &args.output, &args.structure_id)?;
    log::info!(
        "Parsed affinity log {} -> {}",
        args.input.display(),
        args.output.display()
    );
    Ok(())
}

fn run_extract_sequence(args: ExtractSequenceArgs) -> Result<()> {
    let chains = sequences::load_chain_sequences(&args.structure_file)?;
    if chains.is_empty() {
        anyhow::bail!(
            "No sequences found in structure file: {}",
            args.structure_file.display()
        );
    }

    let stem = args
        .structure_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "structure".to_string());

    let selected: Vec<(&str, &str)> = if args.all_chains {
        chains.iter().map(|(c, s)| (c.as_str(), s.as_str())).collect()
    } else {
        let target = sequences::identify_target_chain(&chains, args.designed_chain.as_deref())
            .context("Could not identify target chain")?;
        log::info!(
            "Extracted target chain {} ({} residues) of {} total chain(s)",
            target.0,
            target.1.len(),
            chains.len()
        );
        vec![target]
    };

    let rendered = if args.format == "fasta" {
        sequences::format_fasta(&stem, &selected)
    } else {
        let mut out = String::new();
        for (_, seq) in &selected {
            out.push_str(seq);
            out.push('\n');
        }
        out
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write sequence output: {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}

fn show_version() -> Result<()> {
    println!("foldrank {}", env!("CARGO_PKG_VERSION"));
    println!("Protein design metric consolidation and ranking");
    Ok(())
}
