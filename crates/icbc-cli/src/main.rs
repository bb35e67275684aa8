//! CLI for filing, archiving and e-stamping ICBC transaction PDFs.

mod commands;
mod report;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{archive, config, file, scan, stamp};

/// ICBC document filer - classify, file and e-stamp ICBC transaction PDFs
#[derive(Parser)]
#[command(name = "icbc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify PDFs and show how they would be filed
    Scan(scan::ScanArgs),

    /// Copy ICBC PDFs into the filing tree
    File(file::FileArgs),

    /// E-stamp the newest ICBC PDFs
    Stamp(stamp::StampArgs),

    /// Archive old files in the filing tree
    Archive(archive::ArchiveArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Scan(args) => scan::run(args, config_path),
        Commands::File(args) => file::run(args, config_path),
        Commands::Stamp(args) => stamp::run(args, config_path),
        Commands::Archive(args) => archive::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
