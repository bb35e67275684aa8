//! Run log and CSV summary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use icbc_core::filing::MovedFile;
use icbc_core::models::{FilerConfig, ScanResults};
use icbc_core::naming::filing_file_name;
use icbc_core::pipeline::{FilingRun, StampRun};

/// Plain-text log with one section per non-empty result list.
pub struct RunLog {
    content: String,
}

impl RunLog {
    pub fn new(title: &str) -> Self {
        Self {
            content: format!("=== {} ===\n", title),
        }
    }

    /// Append a section; empty sections are omitted.
    pub fn section<I, T>(&mut self, title: &str, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        let mut body = String::new();
        for item in items {
            let _ = writeln!(body, "{}", item);
        }
        if !body.is_empty() {
            let _ = writeln!(self.content, "=== {} ===", title);
            self.content.push_str(&body);
            self.content.push('\n');
        }
        self
    }

    pub fn scan(&mut self, scan: &ScanResults) -> &mut Self {
        self.section("Non ICBC PDFs found", scan.non_matching.iter().map(|p| p.display()))
            .section(
                "Payment Plan Agreements and Receipts",
                scan.payment_plans.iter().map(|p| p.display()),
            )
            .section("PDFs that could NOT be opened", scan.unreadable.iter().map(|p| p.display()))
    }

    pub fn filing(&mut self, run: &FilingRun) -> &mut Self {
        self.scan(&run.scan).filing_stages(run)
    }

    /// Copy, re-file, archive and renumber sections.
    fn filing_stages(&mut self, run: &FilingRun) -> &mut Self {
        self.section(
                "Producer folders that do not exist",
                run.missing_folders.iter().map(|p| p.display()),
            )
            .section("Copied ICBC PDFs", run.copy.copied.iter().map(|p| p.display()))
            .section(
                "ICBC PDFs that could NOT be copied",
                run.copy.failed.iter().map(|f| format!("{}: {}", f.source_path.display(), f.error)),
            );
        if let Some(refile) = &run.refile {
            self.section("ICBC PDFs matched to a producer subfolder", refile.moved.iter().map(moved));
        }
        if let Some(archived) = &run.archived {
            self.section("Archived PDFs", archived.iter().map(moved));
        }
        if let Some(reincrement) = &run.reincrement {
            self.section("Renumbered PDFs", reincrement.renamed.iter().map(moved))
                .section("Removed empty folders", reincrement.removed_dirs.iter().map(|p| p.display()));
        }
        self
    }

    pub fn stamping(&mut self, run: &StampRun) -> &mut Self {
        self.scan(&run.scan)
            .section(
                "Stamped copies",
                run.stamp
                    .stamped
                    .iter()
                    .flat_map(|c| c.batch_copy.iter().chain(c.customer_copy.iter()))
                    .map(|p| p.display()),
            )
            .section(
                "Stamp does not fit",
                run.stamp.does_not_fit.iter().map(|p| p.display()),
            )
            .section(
                "PDFs that could NOT be stamped",
                run.stamp.failed.iter().map(|(p, e)| format!("{}: {}", p.display(), e)),
            );
        if let Some(filing) = &run.filing {
            self.filing_stages(filing);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, &self.content)?;
        Ok(())
    }
}

fn moved(file: &MovedFile) -> String {
    format!("{} -> {}", file.from.display(), file.to.display())
}

/// Default log location: `log.txt` in the working directory.
pub fn default_log_path() -> PathBuf {
    PathBuf::from("log.txt")
}

/// One CSV row per scanned file with its outcome and filing name.
pub fn write_summary(path: &Path, scan: &ScanResults, config: &FilerConfig) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_summary_rows(&mut wtr, scan, config)?;
    wtr.flush()?;
    Ok(())
}

pub fn write_summary_rows<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    scan: &ScanResults,
    config: &FilerConfig,
) -> anyhow::Result<()> {
    wtr.write_record([
        "filename",
        "status",
        "transaction_timestamp",
        "license_plate",
        "insured_name",
        "producer_code",
        "transaction_type",
        "filing_name",
    ])?;

    for record in &scan.classified {
        let filename = record.source_path.display().to_string();
        wtr.write_record([
            filename.as_str(),
            "classified",
            &record.transaction_timestamp,
            record.license_plate.as_deref().unwrap_or(""),
            record.insured_name.as_deref().unwrap_or(""),
            record.producer_code.as_deref().unwrap_or(""),
            record.transaction_type.as_deref().unwrap_or(""),
            &filing_file_name(record, config.filing.use_alt_naming),
        ])?;
    }

    let others = [
        ("non_matching", &scan.non_matching),
        ("payment_plan", &scan.payment_plans),
        ("unreadable", &scan.unreadable),
    ];
    for (status, paths) in others {
        for path in paths {
            let filename = path.display().to_string();
            wtr.write_record([filename.as_str(), status, "", "", "", "", "", ""])?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use icbc_core::models::DocumentRecord;

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut log = RunLog::new("Bulk Copy ICBC Summary");
        log.section("Empty", Vec::<String>::new())
            .section("Copied ICBC PDFs", ["out/ABC123.pdf"]);

        assert_eq!(
            log.as_str(),
            "=== Bulk Copy ICBC Summary ===\n=== Copied ICBC PDFs ===\nout/ABC123.pdf\n\n"
        );
    }

    #[test]
    fn test_summary_rows() {
        let mut scan = ScanResults::default();
        scan.classified.push(DocumentRecord {
            license_plate: Some("ABC123".to_string()),
            ..DocumentRecord::new("in/a.pdf", "20240115093000")
        });
        scan.unreadable.push(PathBuf::from("in/bad.pdf"));

        let mut wtr = csv::Writer::from_writer(vec![]);
        write_summary_rows(&mut wtr, &scan, &FilerConfig::default()).unwrap();
        let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "in/a.pdf,classified,20240115093000,ABC123,,,,ABC123.pdf");
        assert_eq!(lines[2], "in/bad.pdf,unreadable,,,,,,");
    }
}
