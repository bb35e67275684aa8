//! Scanned document records and scan outcomes.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::pdf::Rect;

/// Format of the transaction timestamp digit string.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A recognized transaction document. Only documents carrying a transaction
/// timestamp become records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Source file the record was read from.
    pub source_path: PathBuf,

    /// `YYYYMMDDHHMMSS` digit string.
    pub transaction_timestamp: String,

    /// Normalized plate, possibly a sentinel such as `NONLIC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,

    /// Normalized display name of the insured, owner or lessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insured_name: Option<String>,

    /// Upper-cased producer code from the page footer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_code: Option<String>,

    /// Title-cased transaction type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,

    /// Raw document-kind flags.
    pub kind_flags: KindFlags,

    /// Stamp marker locations, collected only in stamping mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp: Option<StampMarks>,
}

impl DocumentRecord {
    /// Create a record with only the required fields set.
    pub fn new(source_path: impl Into<PathBuf>, transaction_timestamp: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            transaction_timestamp: transaction_timestamp.into(),
            license_plate: None,
            insured_name: None,
            producer_code: None,
            transaction_type: None,
            kind_flags: KindFlags::default(),
            stamp: None,
        }
    }

    /// The transaction timestamp as a moment, if well formed.
    pub fn transaction_moment(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.transaction_timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// File extension of the source, including the leading dot.
    pub fn extension(&self) -> String {
        self.source_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| ".pdf".to_string())
    }
}

/// Document-kind flags. Several may be set at once; naming picks one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindFlags {
    /// Temporary Operation Permit.
    pub top: bool,
    pub storage: bool,
    pub cancellation: bool,
    pub rental: bool,
    pub special_risk: bool,
    pub garage: bool,
    pub manuscript: bool,
    pub binder: bool,
}

impl KindFlags {
    /// True when no flag is set.
    pub fn is_empty(&self) -> bool {
        *self == KindFlags::default()
    }
}

/// A marker found on a page, with its line bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMark {
    /// Zero-based page index.
    pub page: u32,
    /// Bounding box of the marker line, top-left origin.
    pub bbox: Rect,
}

/// Everything the stamper needs beyond the filing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StampMarks {
    /// Agency number read from the document, `UNKNOWN` when absent.
    pub agency_number: String,
    /// Zero-based indices of pages printed as customer copies.
    pub customer_copy_pages: Vec<u32>,
    /// "NOT VALID UNLESS STAMPED BY" locations.
    pub validation_marks: Vec<PageMark>,
    /// "TIME OF VALIDATION" locations.
    pub time_marks: Vec<PageMark>,
}

/// Terminal state of one scanned file.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// A transaction document with its extracted fields.
    Classified(DocumentRecord),
    /// A payment plan agreement or receipt, never filed.
    PaymentPlan,
    /// A PDF with no transaction timestamp.
    Unclassified,
}

/// Aggregated outcome of a directory scan.
#[derive(Debug, Default)]
pub struct ScanResults {
    /// Recognized documents, newest first.
    pub classified: Vec<DocumentRecord>,
    /// PDFs without a transaction timestamp.
    pub non_matching: Vec<PathBuf>,
    /// Payment plan agreements and receipts.
    pub payment_plans: Vec<PathBuf>,
    /// PDFs that could not be opened.
    pub unreadable: Vec<PathBuf>,
}

impl ScanResults {
    /// Fold one file's result into the collections.
    pub fn record(&mut self, path: PathBuf, result: Result<ScanOutcome, ScanError>) {
        match result {
            Ok(ScanOutcome::Classified(record)) => self.classified.push(record),
            Ok(ScanOutcome::PaymentPlan) => self.payment_plans.push(path),
            Ok(ScanOutcome::Unclassified) => self.non_matching.push(path),
            Err(_) => self.unreadable.push(path),
        }
    }

    /// Total number of files visited.
    pub fn total(&self) -> usize {
        self.classified.len() + self.non_matching.len() + self.payment_plans.len() + self.unreadable.len()
    }
}
