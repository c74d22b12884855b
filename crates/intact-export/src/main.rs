//! IntAct export - UniProt and MITAB export tool

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use intact_common::logging::{init_logging, LogConfig, LogLevel};
use intact_export::{
    write_summary, ExportConfig, ExportRule, InMemoryOntology, InMemoryTaxonomy, JsonLinesSource,
    MiScorer, MitabChunkWriter, PublicationChunker, UniprotExporter,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "intact-export")]
#[command(author, version, about = "IntAct interaction export tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export CC, DR, GPAD and GPI files for UniProt
    Uniprot {
        /// JSON-lines file of raw interactions
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./out/uniprot")]
        output: PathBuf,

        /// Export rule: default, mi-score or all (overrides EXPORT_RULE)
        #[arg(short, long)]
        rule: Option<ExportRule>,

        /// GO parent links (child<TAB>parent) used to validate GO terms
        #[arg(long)]
        go_ontology: Option<PathBuf>,

        /// Date written in file headers and GPAD lines (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Write the run summary to this JSON file
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Split publications into MITAB 2.5 chunk files
    Mitab {
        /// JSON-lines file of raw interactions
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./out/mitab")]
        output: PathBuf,

        /// Taxonomy names (taxid<TAB>scientific name)
        #[arg(long)]
        taxonomy: Option<PathBuf>,

        /// Maximum interactions per file (overrides EXPORT_LARGE_SCALE_THRESHOLD)
        #[arg(long)]
        threshold: Option<usize>,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("intact-export")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match run(cli.command) {
        Ok(true) => {},
        Ok(false) => process::exit(1),
        Err(e) => {
            error!(error = %e, "Export failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        },
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn load_config(rule: Option<ExportRule>) -> Result<ExportConfig> {
    let config = ExportConfig::from_lookup(|name| match (name, rule) {
        ("EXPORT_RULE", Some(rule)) => Some(rule.to_string()),
        _ => std::env::var(name).ok(),
    })
    .context("Invalid export configuration")?;
    Ok(config)
}

/// Returns false when the run completed with failed outputs
fn run(command: Command) -> Result<bool> {
    match command {
        Command::Uniprot {
            input,
            output,
            rule,
            go_ontology,
            date,
            summary,
        } => {
            let config = load_config(rule)?;
            let ontology = go_ontology
                .map(|path| {
                    InMemoryOntology::from_tsv(&path)
                        .with_context(|| format!("Failed to load GO ontology from {}", path.display()))
                })
                .transpose()?;
            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let date = date.unwrap_or_else(|| Local::now().date_naive());
            info!(input = %input.display(), output = %output.display(), rule = %config.rule, "Starting UniProt export");

            let mut exporter = UniprotExporter::new(&config, &output, date);
            if let Some(ref ontology) = ontology {
                exporter = exporter.with_ontology(ontology);
            }

            let pb = spinner("Exporting UniProt lines")?;
            let result = exporter.export_source(&JsonLinesSource::new(&input), &MiScorer::default());
            pb.finish_and_clear();
            let export_summary = result.context("UniProt export failed")?;

            if let Some(path) = summary {
                write_summary(&export_summary, &path)
                    .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            }
            for (format, reason) in &export_summary.failed_sinks {
                warn!(%format, reason = %reason, "Output failed");
            }
            Ok(export_summary.is_success())
        },
        Command::Mitab {
            input,
            output,
            taxonomy,
            threshold,
        } => {
            let config = load_config(None)?;
            let taxonomy = match taxonomy {
                Some(path) => InMemoryTaxonomy::from_tsv(&path)
                    .with_context(|| format!("Failed to load taxonomy from {}", path.display()))?,
                None => InMemoryTaxonomy::default(),
            };
            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let chunker = PublicationChunker::new(threshold.unwrap_or(config.large_scale_threshold));
            info!(input = %input.display(), output = %output.display(), threshold = chunker.threshold(), "Starting MITAB export");

            let mut writer = MitabChunkWriter::new(&output, &taxonomy);
            let pb = spinner("Writing MITAB chunks")?;
            let result = chunker.export_source(&JsonLinesSource::new(&input), &mut writer);
            pb.finish_and_clear();
            let chunk_summary = result.context("MITAB export failed")?;

            info!(files = writer.written().len(), "MITAB export complete");
            println!("{}", serde_json::to_string_pretty(&chunk_summary)?);
            Ok(true)
        },
    }
}
