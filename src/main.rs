//! Experience Engine CLI
//!
//! Normalizes one or more carrier exports and writes, per input file:
//!   <stem>.report.json      full report (mapping, validation, aggregates)
//!   <stem>.claims.<ext>     processed claims (per-claimant files only)
//!
//! Inputs sharing a stem get `_2`, `_3`, ... in argument order.
//!
//! Files are independent snapshots and are processed in parallel.
//!
//! Usage:
//!   experience-engine claims.csv experience.csv --config plan.json --output-dir out
//!   RUST_LOG=debug experience-engine claims.csv --format json

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;

use experience_engine::export::{export_to_path, ExportFormat};
use experience_engine::ingest::DEFAULT_CHUNK_SIZE;
use experience_engine::mapping::{MappingOptions, DEFAULT_MATCH_THRESHOLD};
use experience_engine::{Configuration, EngineReport, ExperienceEngine, ValidationOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "experience-engine")]
#[command(about = "Normalize carrier claims/experience CSVs and compute plan metrics")]
#[command(version)]
struct Args {
    /// Carrier CSV files to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Plan configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for output files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Format for the processed-claims export
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Fuzzy match threshold; a column binds when similarity >= 1 - threshold
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    threshold: f64,

    /// Normalize rows even when required columns are unmapped
    #[arg(long)]
    allow_missing_required: bool,

    /// Byte window for chunked ingestion
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

/// Output stem per input, suffixed where several inputs share one
fn output_stems(inputs: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let base = file_stem(input);
            let mut stem = base.clone();
            let mut n = 2;
            while !used.insert(stem.clone()) {
                stem = format!("{}_{}", base, n);
                n += 1;
            }
            stem
        })
        .collect()
}

fn write_outputs(stem: &str, report: &EngineReport, args: &Args) -> Result<()> {
    let report_path = args.output_dir.join(format!("{}.report.json", stem));
    let file = File::create(&report_path)
        .with_context(|| format!("creating {}", report_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;

    if let Some(claims) = report.as_claims() {
        let format = ExportFormat::from(args.format);
        let claims_path = args.output_dir.join(format!("{}.claims.{}", stem, format.extension()));
        export_to_path(&claims_path, &claims.claims, format)
            .with_context(|| format!("writing {}", claims_path.display()))?;
    }
    Ok(())
}

fn print_summary(input: &Path, report: &EngineReport) {
    let v = report.validation();
    println!("{}", input.display());
    println!("  Schema:   {}", report.schema_type().as_str());
    println!(
        "  Rows:     {} valid / {} total ({} errors, {} warnings)",
        v.valid_rows,
        v.total_rows,
        v.errors.len(),
        v.warnings.len()
    );
    for issue in v.errors.iter().take(10) {
        println!("    row {:>5} {:<20} {} [{}]", issue.row, issue.field, issue.message, issue.value);
    }

    match report {
        EngineReport::Claims(r) => {
            let m = &r.metrics;
            println!("  Claims:   {} across {} claimants", m.claim_count, m.claimant_count);
            println!("  Total:    ${:.2}", m.total_claims);
            println!("  Net paid: ${:.2}", m.total_net_paid);
            println!("  Over stop-loss threshold: {}", m.claims_over_threshold);
        }
        EngineReport::Experience(r) => {
            if let Some(last) = r.summaries.last() {
                let ratio = last
                    .rolling_12_loss_ratio
                    .map(|x| format!("{:.1}%", x * 100.0))
                    .unwrap_or_else(|| "n/a".to_string());
                println!("  Months:   {}", r.summaries.len());
                println!("  Rolling 12 loss ratio ({}): {}", last.month, ratio);
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let config = match &args.config {
        Some(path) => Configuration::from_json_path(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => Configuration::default(),
    };

    let engine = ExperienceEngine::new(config)?
        .with_mapping_options(MappingOptions {
            threshold: args.threshold,
            ..MappingOptions::default()
        })
        .with_validation_options(ValidationOptions {
            allow_missing_required: args.allow_missing_required,
        })
        .with_chunk_size(args.chunk_size);

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let stems = output_stems(&args.inputs);
    let results: Vec<(&PathBuf, Result<EngineReport>)> = args
        .inputs
        .par_iter()
        .zip(&stems)
        .map(|(input, stem)| {
            let result = engine
                .process_file(input)
                .with_context(|| format!("processing {}", input.display()))
                .and_then(|report| write_outputs(stem, &report, &args).map(|_| report));
            (input, result)
        })
        .collect();

    let mut failures = 0;
    for (input, result) in &results {
        match result {
            Ok(report) => print_summary(input, report),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {:#}", input.display(), e);
            }
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    if failures > 0 {
        bail!("{} of {} files failed", failures, results.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_stems_get_distinct_outputs() {
        let inputs: Vec<PathBuf> = ["jan/claims.csv", "feb/claims.csv", "claims_2.txt", "experience.csv"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(output_stems(&inputs), vec!["claims", "claims_2", "claims_2_2", "experience"]);
    }

    #[test]
    fn test_distinct_stems_unchanged() {
        let inputs = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(output_stems(&inputs), vec!["a", "b"]);
    }
}
