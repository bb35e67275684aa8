//! CLI subcommands.

pub mod archive;
pub mod config;
pub mod file;
pub mod scan;
pub mod stamp;

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use icbc_core::models::FilerConfig;

/// Load the config from `--config`, else the default location, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FilerConfig> {
    if let Some(path) = config_path {
        return Ok(FilerConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(FilerConfig::from_file(&default_path)?)
    } else {
        Ok(FilerConfig::default())
    }
}

/// The input folder from the argument or config; it must exist.
pub fn require_input_dir(arg: Option<PathBuf>, config: &FilerConfig) -> anyhow::Result<PathBuf> {
    let Some(input) = arg.or_else(|| config.paths.input_dir.clone()) else {
        anyhow::bail!("Input folder not set. Pass --input or set paths.input_dir in the config.");
    };
    if !input.is_dir() {
        anyhow::bail!("Input folder '{}' does not exist.", input.display());
    }
    println!("{} Input folder: {}", style("✓").green(), input.display());
    Ok(input)
}

/// Create `output` if its parent exists; otherwise it is a configuration error.
pub fn prepare_output_dir(output: &Path) -> anyhow::Result<()> {
    if !output.is_dir() {
        match output.parent() {
            Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => fs::create_dir(output)?,
            _ => anyhow::bail!(
                "Parent path of '{}' does not exist. Cannot create output folder.",
                output.display()
            ),
        }
    }
    println!("{} Output folder: {}", style("✓").green(), output.display());
    Ok(())
}

/// Progress bar in the shared style.
pub fn file_progress(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Print a labelled list, if non-empty.
pub fn print_list<I, T>(label: &str, items: I)
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        return;
    }
    println!();
    println!("{}", style(label).yellow());
    for item in items {
        println!("  - {}", item);
    }
}
