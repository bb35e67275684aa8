//! Stamp command - e-stamp the newest ICBC PDFs and optionally file them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;

use icbc_core::models::StampDateSource;
use icbc_core::pipeline::{run_stamping, StampRun};
use icbc_core::scan::{ScanOptions, Scanner};

use crate::report::{self, RunLog};

const DEFAULT_STAMP_FOLDER: &str = "ICBC E-Stamp Copies";

/// Arguments for the stamp command.
#[derive(Args)]
pub struct StampArgs {
    /// Folder to scan (defaults to paths.input_dir)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where stamped copies are written (defaults to paths.stamp_output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of most recently modified PDFs to consider
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Agency name printed above the agency number
    #[arg(long)]
    agency_name: Option<String>,

    /// Broker number printed instead of the number on the form
    #[arg(long)]
    agency_number: Option<String>,

    /// Stamp today's date instead of the transaction date
    #[arg(long)]
    today: bool,

    /// Only write customer copies
    #[arg(long)]
    customer_only: bool,

    /// File the scanned PDFs into paths.output_dir after stamping
    #[arg(long)]
    copy: bool,

    /// Where to write the run log
    #[arg(long)]
    log: Option<PathBuf>,
}

fn default_stamp_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_STAMP_FOLDER)
}

pub fn run(args: StampArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = super::load_config(config_path)?;

    if let Some(max) = args.max {
        config.stamp.max_documents = max;
    }
    if args.agency_name.is_some() {
        config.stamp.agency_name = args.agency_name;
    }
    if args.agency_number.is_some() {
        config.stamp.agency_number = args.agency_number;
    }
    if args.today {
        config.stamp.date_source = StampDateSource::Today;
    }
    config.stamp.customer_copy_only |= args.customer_only;
    config.stamp.copy_after_stamp |= args.copy;

    let input = super::require_input_dir(args.input, &config)?;
    let stamp_output = args
        .output
        .or_else(|| config.paths.stamp_output_dir.clone())
        .unwrap_or_else(default_stamp_dir);
    fs::create_dir_all(&stamp_output)?;
    println!("{} Stamp folder: {}", style("✓").green(), stamp_output.display());

    let filing_output = if config.stamp.copy_after_stamp {
        filing_target(config.paths.output_dir.as_deref())
    } else {
        None
    };

    let files = Scanner::new(ScanOptions::for_stamping(&config)).discover(&input);
    let pb = super::file_progress(files.len())?;
    let run = run_stamping(&config, &input, &stamp_output, filing_output, |_, _| pb.inc(1));
    pb.finish_with_message("Complete");

    let log_path = args.log.unwrap_or_else(report::default_log_path);
    let mut log = RunLog::new("ICBC E-Stamp Summary");
    log.stamping(&run);
    log.write(&log_path)?;

    print_summary(&run);
    println!();
    println!(
        "{} Done in {:?}. Log saved to {}",
        style("✓").green(),
        start.elapsed(),
        log_path.display()
    );

    Ok(())
}

/// The filing root, if configured and present.
fn filing_target(output: Option<&Path>) -> Option<&Path> {
    match output {
        Some(path) if path.is_dir() => Some(path),
        Some(path) => {
            println!(
                "{} Path '{}' does not exist. Skipping copy operation.",
                style("⚠").yellow(),
                path.display()
            );
            None
        }
        None => {
            println!(
                "{} paths.output_dir is not set. Skipping copy operation.",
                style("⚠").yellow()
            );
            None
        }
    }
}

fn print_summary(run: &StampRun) {
    println!();
    println!(
        "{} Stamped {} of {} ICBC PDFs ({} already stamped or without markers)",
        style("ℹ").blue(),
        style(run.stamp.stamped.len()).green(),
        run.scan.classified.len(),
        run.stamp.skipped.len()
    );

    super::print_list(
        "Stamp does not fit (try a shorter agency name):",
        run.stamp.does_not_fit.iter().map(|p| p.display()),
    );
    super::print_list(
        "Could not be stamped:",
        run.stamp
            .failed
            .iter()
            .map(|(p, e)| format!("{}: {}", p.display(), e)),
    );

    if let Some(filing) = &run.filing {
        super::print_list(
            "Producer folders that do not exist:",
            filing.missing_folders.iter().map(|p| p.display()),
        );
        println!(
            "   {} copied to the filing tree, {} already filed",
            style(filing.copy.copied.len()).green(),
            filing.copy.duplicates.len()
        );
    }
}
