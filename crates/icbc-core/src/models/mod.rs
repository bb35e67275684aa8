//! Data models: scanned records and run configuration.

pub mod config;
pub mod record;

pub use config::{FilerConfig, FilingConfig, PageRegions, PathsConfig, ProducerMapping, StampConfig, StampDateSource};
pub use record::{DocumentRecord, KindFlags, PageMark, ScanOutcome, ScanResults, StampMarks};
