//! Scan command - classify PDFs and show the names they would be filed under.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use serde::Serialize;

use icbc_core::models::{DocumentRecord, FilerConfig, ScanResults};
use icbc_core::naming::filing_file_name;
use icbc_core::scan::{ScanOptions, Scanner};

use crate::report;

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Folder to scan (defaults to paths.input_dir)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Only open the N most recently modified PDFs
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Name files by plate alone instead of "{name} - {plate}"
    #[arg(long)]
    plate_only: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON document
    Json,
    /// CSV, one row per file
    Csv,
}

#[derive(Serialize)]
struct ScanEntry<'a> {
    #[serde(flatten)]
    record: &'a DocumentRecord,
    filing_name: String,
}

#[derive(Serialize)]
struct ScanListing<'a> {
    classified: Vec<ScanEntry<'a>>,
    non_matching: &'a [PathBuf],
    payment_plans: &'a [PathBuf],
    unreadable: &'a [PathBuf],
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if args.max.is_some() {
        config.filing.max_documents_per_run = args.max;
    }
    if args.plate_only {
        config.filing.use_alt_naming = false;
    }

    let input = args.input.or_else(|| config.paths.input_dir.clone());
    let Some(input) = input else {
        anyhow::bail!("Input folder not set. Pass --input or set paths.input_dir in the config.");
    };
    if !input.is_dir() {
        anyhow::bail!("Input folder '{}' does not exist.", input.display());
    }

    let scanner = Scanner::new(ScanOptions::for_filing(&config));
    let files = scanner.discover(&input);

    let results = match args.format {
        OutputFormat::Text => {
            let pb = super::file_progress(files.len())?;
            let results = scanner.scan_paths(&files, |_, _| pb.inc(1));
            pb.finish_and_clear();
            results
        }
        _ => scanner.scan_paths(&files, |_, _| {}),
    };

    match args.format {
        OutputFormat::Text => print_text(&results, &config),
        OutputFormat::Json => print_json(&results, &config)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            report::write_summary_rows(&mut wtr, &results, &config)?;
            wtr.flush()?;
        }
    }

    Ok(())
}

fn print_text(results: &ScanResults, config: &FilerConfig) {
    println!(
        "{} Scanned {} PDFs",
        style("ℹ").blue(),
        results.total()
    );

    for record in &results.classified {
        println!();
        println!(
            "{} {}",
            style("✓").green(),
            record.source_path.display()
        );
        println!("  Filing name: {}", style(filing_file_name(record, config.filing.use_alt_naming)).bold());
        println!("  Timestamp:   {}", record.transaction_timestamp);
        if let Some(plate) = &record.license_plate {
            println!("  Plate:       {}", plate);
        }
        if let Some(name) = &record.insured_name {
            println!("  Name:        {}", name);
        }
        if let Some(producer) = &record.producer_code {
            let folder = config
                .producer_mapping
                .get(producer)
                .map(String::as_str)
                .unwrap_or("(unmapped)");
            println!("  Producer:    {} -> {}", producer, folder);
        }
        if let Some(kind) = &record.transaction_type {
            println!("  Type:        {}", kind);
        }
    }

    super::print_list("Non ICBC PDFs:", results.non_matching.iter().map(|p| p.display()));
    super::print_list(
        "Payment plan agreements and receipts:",
        results.payment_plans.iter().map(|p| p.display()),
    );
    super::print_list("Could not be opened:", results.unreadable.iter().map(|p| p.display()));

    println!();
    println!(
        "   {} classified, {} non-matching, {} payment plans, {} unreadable",
        style(results.classified.len()).green(),
        results.non_matching.len(),
        results.payment_plans.len(),
        style(results.unreadable.len()).red()
    );
}

fn print_json(results: &ScanResults, config: &FilerConfig) -> anyhow::Result<()> {
    let listing = ScanListing {
        classified: results
            .classified
            .iter()
            .map(|record| ScanEntry {
                record,
                filing_name: filing_file_name(record, config.filing.use_alt_naming),
            })
            .collect(),
        non_matching: &results.non_matching,
        payment_plans: &results.payment_plans,
        unreadable: &results.unreadable,
    };
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
