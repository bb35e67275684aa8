//! Archive command - move old files under `_Archive` and close numbering gaps.

use std::path::PathBuf;

use clap::Args;
use console::style;

use icbc_core::filing::{archive, reincrement, ARCHIVE_DIR};

/// Arguments for the archive command.
#[derive(Args)]
pub struct ArchiveArgs {
    /// Root of the filing tree (defaults to paths.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum age in years (defaults to filing.min_age_to_archive_years)
    #[arg(long)]
    years: Option<u32>,

    /// Leave " (n)" suffixes as they are after archiving
    #[arg(long)]
    no_renumber: bool,
}

pub fn run(args: ArchiveArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let Some(output) = args.output.or_else(|| config.paths.output_dir.clone()) else {
        anyhow::bail!("Output folder not set. Pass --output or set paths.output_dir in the config.");
    };
    if !output.is_dir() {
        anyhow::bail!("Output folder '{}' does not exist.", output.display());
    }
    let years = args.years.unwrap_or(config.filing.min_age_to_archive_years);

    println!(
        "{} Archiving files older than {} years into {}",
        style("ℹ").blue(),
        years,
        output.join(ARCHIVE_DIR).display()
    );

    let Some(moved) = archive(&output, years) else {
        println!("{} Nothing old enough to archive.", style("✓").green());
        return Ok(());
    };

    println!("{} Archived {} files", style("✓").green(), moved.len());
    for file in &moved {
        println!("  - {} -> {}", file.from.display(), file.to.display());
    }

    if args.no_renumber || moved.is_empty() {
        return Ok(());
    }

    let report = reincrement(&output);
    println!(
        "{} Renumbered {} files, removed {} empty folders",
        style("✓").green(),
        report.renamed.len(),
        report.removed_dirs.len()
    );
    super::print_list(
        "Could not be renumbered:",
        report.failed.iter().map(|e| e.to_string()),
    );

    Ok(())
}
