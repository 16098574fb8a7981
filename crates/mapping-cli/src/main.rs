//! mapping-cli: command-line job runner for the mapping-driven columnar
//! ETL engine.
//!
//! Reads an input columnar file and a mapping document, compiles and
//! executes the mapping plan, writes the result in the configured
//! output format, and prints a job summary as JSON on stdout. This is
//! the thin collaborator surface standing in for the original engine's
//! HTTP upload endpoint: no temp-file dance, since the CLI reads its
//! input files directly from the paths given.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mapping_core::compiler::{MappingConfig, Schema};
use mapping_core::{compiler, executor};
use mapping_io::reader::read_table;
use mapping_io::writer::{write_output, WriteOptions};

/// Columnar ETL engine driven by a declarative mapping document.
#[derive(Parser)]
#[command(name = "mapping-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a mapping document and run it over an input table.
    Run {
        /// Input columnar file (`.json` typed table or `.csv`).
        #[arg(short, long)]
        input: PathBuf,

        /// Mapping document (`.json` or `.yaml`/`.yml`).
        #[arg(short, long)]
        mapping: PathBuf,

        /// Output base path, overriding the mapping document's
        /// `output_path`. The writer appends the format's extension.
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct JobSummary {
    status: &'static str,
    run_id: String,
    input_rows: usize,
    output_rows: usize,
    processing_time_ms: f64,
    throughput_rows_per_sec: f64,
    output_path: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { input, mapping, output } => run(&input, &mapping, output.as_deref()),
    }
}

fn run(input: &PathBuf, mapping_path: &PathBuf, output_override: Option<&str>) -> anyhow::Result<()> {
    let run_id = new_run_id();
    info!(run_id = %run_id, "ETL run started");
    let start = Instant::now();

    let config = load_mapping_config(mapping_path)?;
    info!(format = ?config.output_format, mapping_count = config.mappings.len(), "mapping document loaded");

    let table = read_table(input)?;
    if table.height() == 0 {
        tracing::warn!("input table is empty");
    }
    info!(rows = table.height(), cols = table.width(), "input table loaded");

    let schema = Schema::from_table(&table);
    let plan = compiler::compile(&config.mappings, &schema)?;
    let output_table = executor::execute(&plan, &table)?;
    info!(rows = output_table.height(), cols = output_table.width(), "mapping plan executed");

    let base_path = output_override
        .map(str::to_string)
        .or_else(|| config.output_path.clone())
        .unwrap_or_else(|| format!("output_{run_id}"));
    let opts = WriteOptions {
        delimited: &config.delimited,
        markup: &config.markup,
        mappings: &config.mappings,
    };
    let output_path = write_output(&output_table, &base_path, config.output_format, &opts)?;
    info!(output_path = %output_path, "output written");

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 { table.height() as f64 / (elapsed_ms / 1000.0) } else { 0.0 };

    let summary = JobSummary {
        status: "success",
        run_id,
        input_rows: table.height(),
        output_rows: output_table.height(),
        processing_time_ms: (elapsed_ms * 100.0).round() / 100.0,
        throughput_rows_per_sec: throughput.round(),
        output_path,
    };
    info!(
        total_ms = summary.processing_time_ms,
        throughput = summary.throughput_rows_per_sec,
        "ETL run completed"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_mapping_config(path: &PathBuf) -> anyhow::Result<MappingConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read mapping document {}: {e}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            MappingConfig::from_yaml(&text)?
        }
        _ => MappingConfig::from_json(&text)?,
    };
    Ok(config)
}

fn new_run_id() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%3f").to_string()
}
