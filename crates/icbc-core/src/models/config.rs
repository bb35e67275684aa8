//! Configuration structures for the filing and stamping pipelines.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IcbcError, Result};
use crate::pdf::Rect;

/// Main configuration for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilerConfig {
    /// Input and output locations.
    pub paths: PathsConfig,

    /// Producer code to destination folder name.
    pub producer_mapping: ProducerMapping,

    /// Copy, re-file and archive behaviour.
    pub filing: FilingConfig,

    /// E-stamp behaviour.
    pub stamp: StampConfig,

    /// Fixed clip rectangles on the first page of a transaction form.
    pub regions: PageRegions,
}

/// Producer code (upper-cased) to folder name.
pub type ProducerMapping = BTreeMap<String, String>;

/// Input and output locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder scanned for source PDFs.
    pub input_dir: Option<PathBuf>,

    /// Root of the filed document tree.
    pub output_dir: Option<PathBuf>,

    /// Folder receiving stamped batch and customer copies.
    pub stamp_output_dir: Option<PathBuf>,
}

/// Copy, re-file and archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingConfig {
    /// Create missing producer subfolders instead of falling back to the root.
    pub create_subfolders: bool,

    /// Name documents "{name} - {plate}" instead of by plate alone.
    pub use_alt_naming: bool,

    /// Maximum number of PDFs opened per run (newest first). `None` is unbounded.
    pub max_documents_per_run: Option<usize>,

    /// Move documents left in the output root next to earlier documents with the same prefix.
    pub refile_unmapped: bool,

    /// Run the archiver after filing.
    pub archive_enabled: bool,

    /// Minimum age, in years of 365 days, before a filed document is archived.
    pub min_age_to_archive_years: u32,
}

impl Default for FilingConfig {
    fn default() -> Self {
        Self {
            create_subfolders: false,
            use_alt_naming: true,
            max_documents_per_run: None,
            refile_unmapped: true,
            archive_enabled: true,
            min_age_to_archive_years: 1,
        }
    }
}

/// Which moment is printed in the stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampDateSource {
    /// The document's transaction timestamp.
    #[default]
    Timestamp,
    /// The moment the stamp is applied.
    Today,
}

/// E-stamp configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Number of newest PDFs considered per stamping run.
    pub max_documents: usize,

    /// Agency name printed above the agency number. Empty disables the name line.
    pub agency_name: Option<String>,

    /// Broker number used instead of the agency number read from the document.
    pub agency_number: Option<String>,

    /// Which moment is printed in the stamp.
    pub date_source: StampDateSource,

    /// Only write the customer copy.
    pub customer_copy_only: bool,

    /// Run the filing pipeline after stamping.
    pub copy_after_stamp: bool,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            max_documents: 10,
            agency_name: None,
            agency_number: None,
            date_source: StampDateSource::Timestamp,
            customer_copy_only: false,
            copy_after_stamp: false,
        }
    }
}

/// Clip rectangles, in top-left-origin page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRegions {
    /// "Transaction Timestamp" box in the page header.
    pub timestamp: Rect,

    /// "Payment Plan Agreement" title.
    pub payment_plan: Rect,

    /// "Payment Plan Receipt" title.
    pub payment_plan_receipt: Rect,

    /// Footer carrying the "- PRODUCER -" code.
    pub producer: Rect,

    /// Footer carrying the "Customer Copy" marker.
    pub customer_copy: Rect,
}

impl Default for PageRegions {
    fn default() -> Self {
        Self {
            timestamp: Rect::new(409.979, 63.8488, 576.0, 83.7455),
            payment_plan: Rect::new(425.402, 35.9664, 557.916, 48.3001),
            payment_plan_receipt: Rect::new(461.071, 37.423, 575.922, 48.423),
            producer: Rect::new(198.0, 761.04, 255.011, 769.977),
            customer_copy: Rect::new(498.438, 751.953, 578.181, 769.977),
        }
    }
}

impl FilerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FilerConfig = serde_json::from_str(&content)
            .map_err(|e| IcbcError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config.normalized())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| IcbcError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Upper-case and trim producer codes so lookups match extracted codes.
    pub fn normalized(mut self) -> Self {
        self.producer_mapping = self
            .producer_mapping
            .into_iter()
            .map(|(code, folder)| (code.trim().to_uppercase(), folder.trim().to_string()))
            .filter(|(code, folder)| !code.is_empty() && !folder.is_empty())
            .collect();
        self
    }

    /// Mapped producer folders that do not exist under `output_root`.
    pub fn missing_producer_folders(&self, output_root: &Path) -> Vec<PathBuf> {
        let mut missing: Vec<PathBuf> = self
            .producer_mapping
            .values()
            .map(|folder| output_root.join(crate::naming::sanitize_filename(folder)))
            .filter(|path| !path.is_dir())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
