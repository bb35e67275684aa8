//! E-stamping: draws the agency number, validation date and time next to
//! the markers on each form and writes batch and customer copies.

pub mod geometry;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::StampError;
use crate::filing::find_filed;
use crate::filing::fs_ops::unique_path;
use crate::models::{DocumentRecord, FilerConfig, StampDateSource};
use crate::naming::{compute_stamp_name, leading_token};
use crate::pdf::PdfEditor;
use crate::scan::{TimestampReader, UNKNOWN_AGENCY};

pub use geometry::{stamp_boxes, StampText};

/// Folder under the stamp output holding the full stamped copies.
pub const BATCH_COPIES_DIR: &str = "ICBC Batch Copies";

/// Stamper settings.
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Printed above the agency number when set.
    pub agency_name: Option<String>,
    /// Printed instead of the agency number read from the form.
    pub agency_number: Option<String>,
    pub date_source: StampDateSource,
    /// Skip the batch copy.
    pub customer_copy_only: bool,
    /// Composite "{name} - {plate}" naming.
    pub composite_names: bool,
}

impl StampOptions {
    pub fn from_config(config: &FilerConfig) -> Self {
        Self {
            agency_name: config.stamp.agency_name.clone(),
            agency_number: config.stamp.agency_number.clone(),
            date_source: config.stamp.date_source,
            customer_copy_only: config.stamp.customer_copy_only,
            composite_names: config.filing.use_alt_naming,
        }
    }
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            agency_name: None,
            agency_number: None,
            date_source: StampDateSource::Timestamp,
            customer_copy_only: false,
            composite_names: true,
        }
    }
}

/// Files written for one stamped document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StampedCopies {
    pub source_path: PathBuf,
    pub batch_copy: Option<PathBuf>,
    pub customer_copy: Option<PathBuf>,
}

/// Why a record was not stamped without it being an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StampSkip {
    /// No "NOT VALID UNLESS STAMPED BY" marker was found.
    NoMarkers,
    /// A copy with the same name prefix and timestamp already exists.
    AlreadyStamped(PathBuf),
}

/// Result of stamping one record.
#[derive(Debug, Clone, PartialEq)]
pub enum StampOutcome {
    Stamped(StampedCopies),
    Skipped(StampSkip),
}

/// What one stamping pass did.
#[derive(Debug, Default)]
pub struct StampReport {
    pub stamped: Vec<StampedCopies>,
    pub skipped: Vec<(PathBuf, StampSkip)>,
    /// Documents whose stamp text overflowed its box.
    pub does_not_fit: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, StampError)>,
}

/// Stamps classified records into the stamp output folder.
pub struct Stamper<'a, R: TimestampReader> {
    output_dir: &'a Path,
    options: StampOptions,
    reader: &'a R,
    now: NaiveDateTime,
}

impl<'a, R: TimestampReader> Stamper<'a, R> {
    pub fn new(output_dir: &'a Path, options: StampOptions, reader: &'a R) -> Self {
        Self {
            output_dir,
            options,
            reader,
            now: Local::now().naive_local(),
        }
    }

    /// Use a fixed moment for today-dated stamps.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Stamp every record, oldest first. No document's failure stops the pass.
    pub fn stamp_all(&self, records: &[DocumentRecord]) -> StampReport {
        let mut report = StampReport::default();

        for record in records.iter().rev() {
            let source = record.source_path.clone();
            match self.stamp_record(record) {
                Ok(StampOutcome::Stamped(copies)) => report.stamped.push(copies),
                Ok(StampOutcome::Skipped(skip)) => {
                    debug!("Not stamping {}: {:?}", source.display(), skip);
                    report.skipped.push((source, skip));
                }
                Err(e @ StampError::DoesNotFit { .. }) => {
                    warn!("{}: {}", source.display(), e);
                    report.does_not_fit.push(source);
                }
                Err(e) => {
                    warn!("Failed to stamp {}: {}", source.display(), e);
                    report.failed.push((source, e));
                }
            }
        }

        info!(
            "Stamped {} documents ({} skipped, {} did not fit, {} failed)",
            report.stamped.len(),
            report.skipped.len(),
            report.does_not_fit.len(),
            report.failed.len()
        );
        report
    }

    /// Moment printed on the stamp.
    fn stamp_moment(&self, record: &DocumentRecord) -> Result<NaiveDateTime, StampError> {
        match self.options.date_source {
            StampDateSource::Today => Ok(self.now),
            StampDateSource::Timestamp => record
                .transaction_moment()
                .ok_or_else(|| StampError::InvalidTimestamp(record.transaction_timestamp.clone())),
        }
    }

    /// Stamp one record and write its copies.
    pub fn stamp_record(&self, record: &DocumentRecord) -> Result<StampOutcome, StampError> {
        let Some(marks) = record.stamp.as_ref().filter(|m| !m.validation_marks.is_empty()) else {
            return Ok(StampOutcome::Skipped(StampSkip::NoMarkers));
        };

        let name = compute_stamp_name(record, self.options.composite_names);
        if let Some(existing) = find_filed(
            self.output_dir,
            leading_token(&name),
            &record.transaction_timestamp,
            self.reader,
        ) {
            return Ok(StampOutcome::Skipped(StampSkip::AlreadyStamped(existing)));
        }

        let agency_number = self
            .options
            .agency_number
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(if marks.agency_number.is_empty() {
                UNKNOWN_AGENCY
            } else {
                marks.agency_number.as_str()
            });
        let text = StampText {
            agency_number,
            agency_name: self.options.agency_name.as_deref(),
            moment: self.stamp_moment(record)?,
        };

        let boxes = stamp_boxes(marks, &text);
        if let Some(overflow) = boxes.iter().find(|b| !b.fits()) {
            return Err(StampError::DoesNotFit {
                page: overflow.page,
                text: overflow.text.clone(),
            });
        }

        let data = fs::read(&record.source_path)?;
        let mut editor = PdfEditor::load(&data)?;
        editor.insert_text_boxes(&boxes)?;

        let mut copies = StampedCopies {
            source_path: record.source_path.clone(),
            ..Default::default()
        };

        if !self.options.customer_copy_only {
            let batch_dir = self.output_dir.join(BATCH_COPIES_DIR);
            fs::create_dir_all(&batch_dir)?;
            let path = unique_path(&batch_dir.join(format!("{}.pdf", name)));
            editor.save(&path)?;
            debug!("Wrote batch copy {}", path.display());
            copies.batch_copy = Some(path);
        }

        let mut pages = marks.customer_copy_pages.clone();
        if record.kind_flags.top {
            let last = editor.page_count() - 1;
            if !pages.contains(&last) {
                pages.push(last);
            }
        }
        if pages.is_empty() {
            debug!("No customer pages in {}", record.source_path.display());
        } else {
            editor.retain_pages(&pages)?;
            fs::create_dir_all(self.output_dir)?;
            let path = unique_path(&self.output_dir.join(format!("{} (Customer Copy).pdf", name)));
            editor.save(&path)?;
            debug!("Wrote customer copy {}", path.display());
            copies.customer_copy = Some(path);
        }

        Ok(StampOutcome::Stamped(copies))
    }
}
