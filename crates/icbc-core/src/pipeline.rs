//! End-to-end filing and stamping runs.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ScanError;
use crate::filing::{archive, refile, reincrement, CopyOptions, CopyReport, Copier, MovedFile, RefileReport, ReincrementReport};
use crate::models::{FilerConfig, ScanOutcome, ScanResults};
use crate::scan::{ScanOptions, Scanner};
use crate::stamp::{StampOptions, StampReport, Stamper};

/// Everything a filing run did, for reporting.
#[derive(Debug, Default)]
pub struct FilingRun {
    pub scan: ScanResults,
    /// Mapped producer folders missing under the output root.
    pub missing_folders: Vec<PathBuf>,
    pub copy: CopyReport,
    pub refile: Option<RefileReport>,
    /// `None` when archiving was disabled or nothing was old enough.
    pub archived: Option<Vec<MovedFile>>,
    pub reincrement: Option<ReincrementReport>,
}

/// Scan `input` and file the results under `output`: copy, re-file,
/// archive, then renumber if anything was archived.
pub fn run_filing<F>(config: &FilerConfig, input: &Path, output: &Path, on_file: F) -> FilingRun
where
    F: FnMut(&Path, &Result<ScanOutcome, ScanError>),
{
    let scanner = Scanner::new(ScanOptions::for_filing(config));
    let files = scanner.discover(input);
    let scan = scanner.scan_paths(&files, on_file);
    file_scanned(config, scan, output, &scanner)
}

/// The filing stages for an already completed scan.
pub fn file_scanned(config: &FilerConfig, scan: ScanResults, output: &Path, scanner: &Scanner) -> FilingRun {
    let mut run = FilingRun {
        scan,
        ..Default::default()
    };

    if output.is_dir() {
        run.missing_folders = config.missing_producer_folders(output);
        for folder in &run.missing_folders {
            warn!("Producer folder does not exist: {}", folder.display());
        }
    }

    let mut copier = Copier::new(
        output,
        &config.producer_mapping,
        CopyOptions::from_config(config),
        scanner,
    );
    run.copy = copier.resolve_and_copy(&run.scan.classified);
    if run.copy.root_missing {
        return run;
    }

    if config.filing.refile_unmapped {
        run.refile = Some(refile(output, &run.copy.copied));
    }

    if config.filing.archive_enabled {
        run.archived = archive(output, config.filing.min_age_to_archive_years);
        if run.archived.as_ref().is_some_and(|moved| !moved.is_empty()) {
            run.reincrement = Some(reincrement(output));
        }
    }

    info!(
        "Filing complete: {} copied, {} archived",
        run.copy.copied.len(),
        run.archived.as_ref().map_or(0, Vec::len)
    );
    run
}

/// A stamping run, optionally followed by filing.
#[derive(Debug, Default)]
pub struct StampRun {
    pub scan: ScanResults,
    pub stamp: StampReport,
    pub filing: Option<FilingRun>,
}

/// Scan the newest PDFs in `input`, stamp them into `stamp_output`, and file
/// them under `filing_output` when given.
pub fn run_stamping<F>(
    config: &FilerConfig,
    input: &Path,
    stamp_output: &Path,
    filing_output: Option<&Path>,
    on_file: F,
) -> StampRun
where
    F: FnMut(&Path, &Result<ScanOutcome, ScanError>),
{
    let scanner = Scanner::new(ScanOptions::for_stamping(config));
    let files = scanner.discover(input);
    let scan = scanner.scan_paths(&files, on_file);

    let stamp = Stamper::new(stamp_output, StampOptions::from_config(config), &scanner).stamp_all(&scan.classified);

    let filing = filing_output.map(|output| {
        let filer = Scanner::new(ScanOptions::for_filing(config));
        let files = filer.discover(input);
        let scan = filer.scan_paths(&files, |_, _| {});
        file_scanned(config, scan, output, &filer)
    });

    StampRun { scan, stamp, filing }
}
