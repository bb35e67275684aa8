//! Core library for ICBC transaction PDF filing.
//!
//! This crate provides:
//! - Positioned PDF text extraction and page stamping (lopdf)
//! - Field extraction and name normalization for ICBC transaction forms
//! - Deterministic filing names and duplicate-free copying into a filing tree
//! - Re-filing, age-based archiving and duplicate-suffix renumbering
//! - E-stamping with batch and customer copies

pub mod error;
pub mod extract;
pub mod filing;
pub mod models;
pub mod naming;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod stamp;

pub use error::{FilingError, IcbcError, PdfError, Result, ScanError, StampError};
pub use models::{DocumentRecord, FilerConfig, KindFlags, ScanOutcome, ScanResults};
pub use naming::{compute_base_name, compute_stamp_name, sanitize_filename};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{run_filing, run_stamping, FilingRun, StampRun};
pub use scan::{ScanOptions, Scanner, TimestampReader};
pub use stamp::{StampOptions, Stamper};
