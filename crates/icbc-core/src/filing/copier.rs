//! Destination resolution, duplicate detection and copying.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info, warn};

use super::fs_ops::{copy_preserving_mtime, ensure_dir, unique_path};
use crate::error::FilingError;
use crate::models::{DocumentRecord, FilerConfig, ProducerMapping};
use crate::naming::{compute_base_name, leading_token, sanitize_filename};
use crate::scan::{find_files, TimestampReader};

/// Copier settings.
#[derive(Debug, Clone, Copy)]
pub struct CopyOptions {
    /// Create missing producer folders instead of filing into the root.
    pub create_subfolders: bool,
    /// Composite "{name} - {plate}" naming.
    pub composite_names: bool,
}

impl CopyOptions {
    pub fn from_config(config: &FilerConfig) -> Self {
        Self {
            create_subfolders: config.filing.create_subfolders,
            composite_names: config.filing.use_alt_naming,
        }
    }
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            create_subfolders: false,
            composite_names: true,
        }
    }
}

/// A source file that could not be copied.
#[derive(Debug)]
pub struct CopyFailure {
    pub source_path: PathBuf,
    pub error: FilingError,
}

/// What one copy pass did.
#[derive(Debug, Default)]
pub struct CopyReport {
    /// Destination paths written, in processing order.
    pub copied: Vec<PathBuf>,
    /// Sources skipped because their transaction is already filed.
    pub duplicates: Vec<PathBuf>,
    /// Per-file copy failures.
    pub failed: Vec<CopyFailure>,
    /// The output root did not exist; nothing was attempted.
    pub root_missing: bool,
}

/// Files classified records into the output tree, at most once per transaction.
pub struct Copier<'a, R: TimestampReader> {
    output_root: &'a Path,
    mapping: &'a ProducerMapping,
    options: CopyOptions,
    reader: &'a R,
    seen: HashSet<(String, String)>,
}

impl<'a, R: TimestampReader> Copier<'a, R> {
    pub fn new(output_root: &'a Path, mapping: &'a ProducerMapping, options: CopyOptions, reader: &'a R) -> Self {
        Self {
            output_root,
            mapping,
            options,
            reader,
            seen: HashSet::new(),
        }
    }

    /// Copy every record not already filed. `records` are newest first, as
    /// the scanner returns them; they are processed oldest first.
    pub fn resolve_and_copy(&mut self, records: &[DocumentRecord]) -> CopyReport {
        let mut report = CopyReport::default();

        if !self.output_root.is_dir() {
            warn!(
                "Output folder {} does not exist, skipping copy",
                self.output_root.display()
            );
            report.root_missing = true;
            return report;
        }

        for record in records.iter().rev() {
            match self.copy_record(record) {
                Ok(Some(dest)) => {
                    debug!("Copied {} -> {}", record.source_path.display(), dest.display());
                    report.copied.push(dest);
                }
                Ok(None) => report.duplicates.push(record.source_path.clone()),
                Err(error) => {
                    warn!("{}", error);
                    report.failed.push(CopyFailure {
                        source_path: record.source_path.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Copied {} files ({} already filed, {} failed)",
            report.copied.len(),
            report.duplicates.len(),
            report.failed.len()
        );
        report
    }

    /// Copy one record; `Ok(None)` when the transaction is already filed.
    pub fn copy_record(&mut self, record: &DocumentRecord) -> Result<Option<PathBuf>, FilingError> {
        let base_name = compute_base_name(record, self.options.composite_names);
        let token = leading_token(&base_name).to_uppercase();
        let key = (token, record.transaction_timestamp.clone());

        if self.seen.contains(&key) || self.is_filed(&key.0, &record.transaction_timestamp) {
            debug!("Already filed: {} ({})", base_name, record.transaction_timestamp);
            self.seen.insert(key);
            return Ok(None);
        }

        let folder = self.destination_folder(record)?;
        let dest = unique_path(&folder.join(format!("{}{}", base_name, record.extension())));
        copy_preserving_mtime(&record.source_path, &dest)?;

        self.seen.insert(key);
        Ok(Some(dest))
    }

    /// Producer subfolder, or the output root when unmapped or absent.
    pub fn destination_folder(&self, record: &DocumentRecord) -> Result<PathBuf, FilingError> {
        let Some(folder_name) = record
            .producer_code
            .as_ref()
            .and_then(|code| self.mapping.get(&code.to_uppercase()))
            .map(|name| sanitize_filename(name))
            .filter(|name| !name.is_empty())
        else {
            return Ok(self.output_root.to_path_buf());
        };

        let folder = self.output_root.join(folder_name);
        if folder.is_dir() {
            return Ok(folder);
        }
        if self.options.create_subfolders {
            ensure_dir(&folder)?;
            return Ok(folder);
        }

        warn!(
            "Producer folder {} does not exist, filing into {}",
            folder.display(),
            self.output_root.display()
        );
        Ok(self.output_root.to_path_buf())
    }

    fn is_filed(&self, token: &str, timestamp: &str) -> bool {
        find_filed(self.output_root, token, timestamp, self.reader).is_some()
    }
}

/// First PDF under `root` whose name starts with `token` (any case) and whose
/// first page carries `timestamp`.
pub fn find_filed<R: TimestampReader + ?Sized>(
    root: &Path,
    token: &str,
    timestamp: &str,
    reader: &R,
) -> Option<PathBuf> {
    if token.is_empty() {
        return None;
    }
    let pattern = format!("{}*.pdf", Pattern::escape(token));
    find_files(root, &pattern)
        .into_iter()
        .find(|candidate| reader.read_timestamp(candidate).as_deref() == Some(timestamp))
}
