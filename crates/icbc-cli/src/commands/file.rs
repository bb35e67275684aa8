//! File command - copy classified PDFs into the filing tree, re-file, archive
//! and renumber.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;

use icbc_core::pipeline::{file_scanned, FilingRun};
use icbc_core::scan::{ScanOptions, Scanner};

use crate::report::{self, RunLog};

/// Arguments for the file command.
#[derive(Args)]
pub struct FileArgs {
    /// Folder to scan (defaults to paths.input_dir)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Root of the filing tree (defaults to paths.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only open the N most recently modified PDFs
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Create missing producer folders
    #[arg(long)]
    create_subfolders: bool,

    /// Name files by plate alone instead of "{name} - {plate}"
    #[arg(long)]
    plate_only: bool,

    /// Leave files in the output root even when a matching subfolder exists
    #[arg(long)]
    no_refile: bool,

    /// Skip archiving
    #[arg(long)]
    no_archive: bool,

    /// Where to write the run log
    #[arg(long)]
    log: Option<PathBuf>,

    /// Also write a CSV summary of every scanned file
    #[arg(long)]
    summary: Option<PathBuf>,
}

pub fn run(args: FileArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = super::load_config(config_path)?;

    if args.max.is_some() {
        config.filing.max_documents_per_run = args.max;
    }
    config.filing.create_subfolders |= args.create_subfolders;
    if args.plate_only {
        config.filing.use_alt_naming = false;
    }
    if args.no_refile {
        config.filing.refile_unmapped = false;
    }
    if args.no_archive {
        config.filing.archive_enabled = false;
    }

    let input = super::require_input_dir(args.input, &config)?;
    let Some(output) = args.output.or_else(|| config.paths.output_dir.clone()) else {
        anyhow::bail!("Output folder not set. Pass --output or set paths.output_dir in the config.");
    };
    super::prepare_output_dir(&output)?;

    let scanner = Scanner::new(ScanOptions::for_filing(&config));
    let files = scanner.discover(&input);
    println!("{} Found {} PDFs to scan", style("ℹ").blue(), files.len());

    let pb = super::file_progress(files.len())?;
    let scan = scanner.scan_paths(&files, |_, _| pb.inc(1));
    pb.finish_with_message("Complete");

    let run = file_scanned(&config, scan, &output, &scanner);

    let log_path = args.log.unwrap_or_else(report::default_log_path);
    let mut log = RunLog::new("Bulk Copy ICBC Summary");
    log.filing(&run);
    log.write(&log_path)?;

    if let Some(summary_path) = &args.summary {
        report::write_summary(summary_path, &run.scan, &config)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

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

fn print_summary(run: &FilingRun) {
    super::print_list(
        "Producer folders that do not exist:",
        run.missing_folders.iter().map(|p| p.display()),
    );
    if run.copy.root_missing {
        println!("{} Output folder is missing, nothing was copied.", style("⚠").yellow());
    }

    println!();
    println!(
        "{} Scanned {} PDFs: {} ICBC, {} non-matching, {} payment plans, {} unreadable",
        style("ℹ").blue(),
        run.scan.total(),
        run.scan.classified.len(),
        run.scan.non_matching.len(),
        run.scan.payment_plans.len(),
        run.scan.unreadable.len()
    );
    println!(
        "   {} copied, {} already filed, {} failed",
        style(run.copy.copied.len()).green(),
        run.copy.duplicates.len(),
        style(run.copy.failed.len()).red()
    );
    if let Some(refile) = &run.refile {
        println!("   {} re-filed into producer folders", refile.moved.len());
    }
    match &run.archived {
        Some(archived) => println!("   {} archived", archived.len()),
        None => println!("   nothing old enough to archive"),
    }
    if let Some(reincrement) = &run.reincrement {
        println!(
            "   {} renumbered, {} empty folders removed",
            reincrement.renamed.len(),
            reincrement.removed_dirs.len()
        );
    }

    super::print_list(
        "Could not be copied:",
        run.copy
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.source_path.display(), f.error)),
    );
}
