//! Error types for the icbc-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the icbc library.
#[derive(Error, Debug)]
pub enum IcbcError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Document scanning error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// Copy, move or archive error.
    #[error("filing error: {0}")]
    Filing(#[from] FilingError),

    /// Stamping error.
    #[error("stamp error: {0}")]
    Stamp(#[from] StampError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// A page could not be modified.
    #[error("failed to edit page: {0}")]
    Edit(String),

    /// The document could not be written.
    #[error("failed to save PDF: {0}")]
    Save(String),
}

/// Errors raised while reading a single source document.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The file could not be read from disk.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a usable PDF.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: PdfError,
    },
}

impl ScanError {
    /// Path of the document that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::Read { path, .. } | ScanError::Open { path, .. } => path,
        }
    }
}

/// Errors raised while copying, moving or renaming filed documents.
#[derive(Error, Debug)]
pub enum FilingError {
    /// A copy failed.
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A move or rename failed.
    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A folder could not be created.
    #[error("failed to create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to stamping a single document.
#[derive(Error, Debug)]
pub enum StampError {
    /// The stamp text overflows its box.
    #[error("stamp text {text:?} does not fit on page {page}")]
    DoesNotFit { page: u32, text: String },

    /// The transaction timestamp is not a valid `YYYYMMDDHHMMSS` moment.
    #[error("invalid transaction timestamp: {0}")]
    InvalidTimestamp(String),

    /// Underlying PDF failure.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// I/O failure writing the stamped copies.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for the icbc library.
pub type Result<T> = std::result::Result<T, IcbcError>;
