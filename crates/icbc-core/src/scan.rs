//! Document scanner: discovers PDFs and classifies each one.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{glob_with, MatchOptions, Pattern};
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::extract::patterns::{CUSTOMER_COPY, TIME_MARKER, VALIDATION_MARKER};
use crate::extract::{extract_agency_number, extract_fields, extract_timestamp, PageText};
use crate::models::{DocumentRecord, FilerConfig, PageMark, PageRegions, ScanOutcome, ScanResults, StampMarks};
use crate::pdf::{PageLayout, PdfExtractor, PdfProcessor};

/// Agency number recorded when none is printed on the form.
pub const UNKNOWN_AGENCY: &str = "UNKNOWN";

/// Scanner settings.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Open at most this many PDFs, newest first.
    pub max_documents: Option<usize>,
    /// Record stamp marker locations on every page.
    pub collect_stamp_marks: bool,
    /// Clip regions on the first page.
    pub regions: PageRegions,
}

impl ScanOptions {
    /// Options for the filing pipeline.
    pub fn for_filing(config: &FilerConfig) -> Self {
        Self {
            max_documents: config.filing.max_documents_per_run,
            collect_stamp_marks: false,
            regions: config.regions,
        }
    }

    /// Options for the stamping pipeline.
    pub fn for_stamping(config: &FilerConfig) -> Self {
        Self {
            max_documents: Some(config.stamp.max_documents),
            collect_stamp_marks: true,
            regions: config.regions,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_documents: None,
            collect_stamp_marks: false,
            regions: PageRegions::default(),
        }
    }
}

/// Reads the transaction timestamp of an already filed document.
pub trait TimestampReader {
    /// `None` when the file cannot be read or carries no timestamp.
    fn read_timestamp(&self, path: &Path) -> Option<String>;
}

/// Classifies PDFs into records, payment plans and non-matching files.
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// PDFs to visit under `dir`, newest first and capped.
    pub fn discover(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = list_pdfs(dir);
        if let Some(max) = self.options.max_documents {
            files.truncate(max);
        }
        files
    }

    /// Scan every PDF under `dir`.
    pub fn scan_dir(&self, dir: &Path) -> ScanResults {
        let files = self.discover(dir);
        self.scan_paths(&files, |_, _| {})
    }

    /// Scan the given files in order, reporting each outcome to `on_file`.
    pub fn scan_paths<F>(&self, paths: &[PathBuf], mut on_file: F) -> ScanResults
    where
        F: FnMut(&Path, &Result<ScanOutcome, ScanError>),
    {
        let mut results = ScanResults::default();

        for path in paths {
            let outcome = self.scan_file(path);
            match &outcome {
                Ok(ScanOutcome::Classified(record)) => {
                    debug!("Classified {} ({})", path.display(), record.transaction_timestamp)
                }
                Ok(ScanOutcome::PaymentPlan) => debug!("Payment plan {}", path.display()),
                Ok(ScanOutcome::Unclassified) => debug!("Not a transaction form: {}", path.display()),
                Err(e) => warn!("Skipping unreadable PDF: {}", e),
            }
            on_file(path, &outcome);
            results.record(path.clone(), outcome);
        }

        info!(
            "Scanned {} PDFs: {} classified, {} non-matching, {} payment plans, {} unreadable",
            results.total(),
            results.classified.len(),
            results.non_matching.len(),
            results.payment_plans.len(),
            results.unreadable.len()
        );
        results
    }

    /// Classify one file.
    pub fn scan_file(&self, path: &Path) -> Result<ScanOutcome, ScanError> {
        let extractor = open(path)?;
        if extractor.page_count() == 0 {
            return Ok(ScanOutcome::Unclassified);
        }

        let first = page_layout(&extractor, path, 1)?;
        let text = PageText::from_layout(&first, &self.options.regions);
        let fields = extract_fields(&text);
        let payment_plan = fields.payment_plan;

        let Some(mut record) = fields.into_record(path) else {
            return Ok(ScanOutcome::Unclassified);
        };
        if payment_plan {
            return Ok(ScanOutcome::PaymentPlan);
        }

        if self.options.collect_stamp_marks {
            record.stamp = Some(self.collect_stamp_marks(&extractor, path, first)?);
        }

        Ok(ScanOutcome::Classified(record))
    }

    /// Agency number, customer-copy pages and marker boxes across all pages.
    fn collect_stamp_marks(
        &self,
        extractor: &PdfExtractor,
        path: &Path,
        first: PageLayout,
    ) -> Result<StampMarks, ScanError> {
        let mut marks = StampMarks::default();
        let mut agency_number = None;

        let mut layout = first;
        for number in 1..=extractor.page_count() {
            if number > 1 {
                layout = page_layout(extractor, path, number)?;
            }
            let index = number - 1;

            if agency_number.is_none() {
                agency_number = extract_agency_number(&layout.text());
            }
            if CUSTOMER_COPY.is_match(&layout.clip_text(&self.options.regions.customer_copy)) {
                marks.customer_copy_pages.push(index);
            }
            for line in layout.find_lines(&VALIDATION_MARKER) {
                marks.validation_marks.push(PageMark { page: index, bbox: line.bbox });
            }
            for line in layout.find_lines(&TIME_MARKER) {
                marks.time_marks.push(PageMark { page: index, bbox: line.bbox });
            }
        }

        marks.agency_number = agency_number.unwrap_or_else(|| UNKNOWN_AGENCY.to_string());
        Ok(marks)
    }
}

impl TimestampReader for Scanner {
    fn read_timestamp(&self, path: &Path) -> Option<String> {
        read_timestamp(path, &self.options.regions)
    }
}

/// Read a file's transaction timestamp the same way scanning does.
pub fn read_timestamp(path: &Path, regions: &PageRegions) -> Option<String> {
    let extractor = match open(path) {
        Ok(extractor) => extractor,
        Err(e) => {
            debug!("Cannot read timestamp: {}", e);
            return None;
        }
    };
    if extractor.page_count() == 0 {
        return None;
    }
    let layout = page_layout(&extractor, path, 1).ok()?;
    extract_timestamp(&layout.clip_text(&regions.timestamp), &layout.text())
}

fn open(path: &Path) -> Result<PdfExtractor, ScanError> {
    let data = fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data).map_err(|source| ScanError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extractor)
}

fn page_layout(extractor: &PdfExtractor, path: &Path, number: u32) -> Result<PageLayout, ScanError> {
    extractor.page_layout(number).map_err(|source| ScanError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn case_insensitive() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

/// Files under `root`, at any depth, whose name matches `file_pattern`
/// (a glob, case-insensitive).
pub fn find_files(root: &Path, file_pattern: &str) -> Vec<PathBuf> {
    let Some(root_str) = root.to_str() else {
        warn!("Skipping non UTF-8 path {}", root.display());
        return Vec::new();
    };
    let pattern = format!("{}/**/{}", Pattern::escape(root_str), file_pattern);

    match glob_with(&pattern, case_insensitive()) {
        Ok(paths) => paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect(),
        Err(e) => {
            warn!("Invalid search pattern {}: {}", pattern, e);
            Vec::new()
        }
    }
}

/// Every PDF under `dir`, newest-modified first.
pub fn list_pdfs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = find_files(dir, "*.pdf")
        .into_iter()
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    files.into_iter().map(|(_, p)| p).collect()
}

/// Sort records newest first by transaction timestamp.
pub fn newest_first(records: &mut [DocumentRecord]) {
    records.sort_by(|a, b| b.transaction_timestamp.cmp(&a.transaction_timestamp));
}
