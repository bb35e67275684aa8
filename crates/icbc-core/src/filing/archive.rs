//! Archiver and renumberer.
//!
//! Old documents move to `_Archive/<year>/<relative path>`. Renumbering then
//! closes the gaps the move leaves in `" (n)"` duplicate sequences.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};
use tracing::{debug, info, warn};

use super::fs_ops::{extension_with_dot, is_pdf, move_file, pdf_files, split_duplicate_suffix, subfolders, unique_path};
use super::refile::MovedFile;
use crate::error::FilingError;
use crate::scan::find_files;

/// Name of the archive tree under the output root.
pub const ARCHIVE_DIR: &str = "_Archive";

const DAYS_PER_YEAR: i64 = 365;

/// Last-modified calendar date of `path`, in local time.
pub fn modified_date(path: &Path) -> io::Result<NaiveDate> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}

/// Files last modified strictly before this date are archived.
pub fn archive_cutoff(today: NaiveDate, min_age_years: u32) -> NaiveDate {
    today - Duration::days(i64::from(min_age_years) * DAYS_PER_YEAR)
}

/// Archive relative to today's date.
pub fn archive(output_root: &Path, min_age_years: u32) -> Option<Vec<MovedFile>> {
    archive_as_of(output_root, min_age_years, Local::now().date_naive())
}

/// Move every PDF older than the cutoff into the archive tree.
///
/// Returns `None` when nothing was eligible, so callers can skip renumbering.
pub fn archive_as_of(output_root: &Path, min_age_years: u32, today: NaiveDate) -> Option<Vec<MovedFile>> {
    let cutoff = archive_cutoff(today, min_age_years);
    let archive_root = output_root.join(ARCHIVE_DIR);

    let eligible: Vec<(PathBuf, NaiveDate)> = find_files(output_root, "*.pdf")
        .into_iter()
        .filter(|path| !path.starts_with(&archive_root))
        .filter_map(|path| match modified_date(&path) {
            Ok(date) if date < cutoff => Some((path, date)),
            Ok(_) => None,
            Err(e) => {
                warn!("Cannot read modified time of {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    if eligible.is_empty() {
        debug!("Nothing older than {} to archive", cutoff);
        return None;
    }

    let mut archived = Vec::with_capacity(eligible.len());
    for (path, date) in eligible {
        let Ok(relative) = path.strip_prefix(output_root) else {
            continue;
        };
        let dest = unique_path(&archive_root.join(date.year().to_string()).join(relative));
        match move_file(&path, &dest) {
            Ok(()) => {
                debug!("Archived {} -> {}", path.display(), dest.display());
                archived.push(MovedFile { from: path, to: dest });
            }
            Err(e) => warn!("{}", e),
        }
    }

    info!("Archived {} files older than {}", archived.len(), cutoff);
    Some(archived)
}

/// What one renumbering pass did.
#[derive(Debug, Default)]
pub struct ReincrementReport {
    pub renamed: Vec<MovedFile>,
    pub removed_dirs: Vec<PathBuf>,
    pub failed: Vec<FilingError>,
}

/// Every folder under `root`, root included, deepest first.
fn folders_deepest_first(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        match subfolders(&dir) {
            Ok(children) => pending.extend(children),
            Err(e) => warn!("Cannot list {}: {}", dir.display(), e),
        }
        found.push(dir);
    }
    found.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    found
}

/// Renumber `" (n)"` siblings in every folder into a contiguous sequence,
/// then remove folders left empty (never `root`).
pub fn reincrement(root: &Path) -> ReincrementReport {
    let mut report = ReincrementReport::default();

    for dir in folders_deepest_first(root) {
        renumber_folder(&dir, &mut report);

        if dir != root && is_empty_dir(&dir) {
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    debug!("Removed empty folder {}", dir.display());
                    report.removed_dirs.push(dir);
                }
                Err(e) => warn!("Cannot remove {}: {}", dir.display(), e),
            }
        }
    }

    info!(
        "Renumbered {} files, removed {} empty folders",
        report.renamed.len(),
        report.removed_dirs.len()
    );
    report
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut entries| entries.next().is_none()).unwrap_or(false)
}

/// Target names for one folder: `(current, wanted)` for every file that changes.
fn plan_renames(files: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    // (base stem, extension) -> [(suffix, path)]
    let mut groups: BTreeMap<(String, String), Vec<(Option<u32>, PathBuf)>> = BTreeMap::new();
    for file in files.iter().filter(|f| is_pdf(f)) {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base, suffix) = split_duplicate_suffix(&stem);
        groups
            .entry((base.to_string(), extension_with_dot(file)))
            .or_default()
            .push((suffix, file.clone()));
    }

    let mut plan = Vec::new();
    for ((base, ext), mut members) in groups {
        members.sort();
        for (index, (_, current)) in members.into_iter().enumerate() {
            let name = match index {
                0 => format!("{}{}", base, ext),
                n => format!("{} ({}){}", base, n, ext),
            };
            let wanted = current.with_file_name(name);
            if wanted != current {
                plan.push((current, wanted));
            }
        }
    }
    plan
}

/// Temporary name for the `index`th staged rename, never an existing file.
fn staging_path(dir: &Path, index: usize) -> PathBuf {
    let temp = dir.join(format!(".icbc-renumber-{}.tmp", index));
    if !temp.exists() {
        return temp;
    }
    warn!("Leaving stale {} in place", temp.display());
    unique_path(&temp)
}

fn renumber_folder(dir: &Path, report: &mut ReincrementReport) {
    let files = match pdf_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            return;
        }
    };

    // Two phases so a rename never lands on a sibling that is itself about
    // to be renamed.
    let mut staged = Vec::new();
    for (index, (current, wanted)) in plan_renames(&files).into_iter().enumerate() {
        let temp = staging_path(dir, index);
        match fs::rename(&current, &temp) {
            Ok(()) => staged.push((current, temp, wanted)),
            Err(source) => report.failed.push(FilingError::Move {
                from: current,
                to: temp,
                source,
            }),
        }
    }

    for (original, temp, wanted) in staged {
        let target = unique_path(&wanted);
        match fs::rename(&temp, &target) {
            Ok(()) => {
                debug!("Renumbered {} -> {}", original.display(), target.display());
                report.renamed.push(MovedFile {
                    from: original,
                    to: target,
                });
            }
            Err(source) => {
                warn!("Cannot rename {}: {}", temp.display(), source);
                report.failed.push(FilingError::Move {
                    from: temp,
                    to: target,
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::time::{Duration as StdDuration, SystemTime};

    fn write_aged(path: &Path, days: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"pdf").unwrap();
        let mtime = SystemTime::now() - StdDuration::from_secs(days * 86_400);
        File::options().write(true).open(path).unwrap().set_modified(mtime).unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_cutoff_boundary_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let exact = root.join("Jane/EXACT.pdf");
        let older = root.join("Jane/OLDER.pdf");
        write_aged(&exact, 0);
        write_aged(&older, 0);

        let exact_date = modified_date(&exact).unwrap();
        let today = exact_date + Duration::days(365);
        let older_mtime = SystemTime::now() - StdDuration::from_secs(86_400);
        File::options().write(true).open(&older).unwrap().set_modified(older_mtime).unwrap();
        let older_date = modified_date(&older).unwrap();
        assert!(older_date < exact_date);

        let archived = archive_as_of(root, 1, today).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].from, older);
        assert_eq!(
            archived[0].to,
            root.join(ARCHIVE_DIR)
                .join(older_date.year().to_string())
                .join("Jane/OLDER.pdf")
        );
        assert!(exact.exists());
    }

    #[test]
    fn test_nothing_eligible_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(&dir.path().join("NEW.pdf"), 1);
        assert!(archive(dir.path(), 1).is_none());
    }

    #[test]
    fn test_archive_tree_is_not_rearchived() {
        let dir = tempfile::tempdir().unwrap();
        write_aged(&dir.path().join("_Archive/2020/OLD.pdf"), 2000);
        assert!(archive(dir.path(), 1).is_none());
    }

    #[test]
    fn test_reincrement_closes_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Jane");
        for name in ["X.pdf", "X (2).pdf", "X (5).pdf", "Y (3).pdf", "notes.txt"] {
            write_aged(&folder.join(name), 0);
        }

        let report = reincrement(dir.path());

        assert_eq!(names(&folder), vec!["X (1).pdf", "X (2).pdf", "X.pdf", "Y.pdf", "notes.txt"]);
        assert_eq!(report.renamed.len(), 3);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_reincrement_shifts_down_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("A (1).pdf"), b"one").unwrap();
        fs::write(root.join("A (2).pdf"), b"two").unwrap();

        reincrement(root);

        assert_eq!(fs::read(root.join("A.pdf")).unwrap(), b"one");
        assert_eq!(fs::read(root.join("A (1).pdf")).unwrap(), b"two");
        assert!(!root.join("A (2).pdf").exists());
    }

    #[test]
    fn test_reincrement_keeps_stale_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let stale = root.join(".icbc-renumber-0.tmp");
        fs::write(&stale, b"interrupted").unwrap();
        fs::write(root.join("A (1).pdf"), b"one").unwrap();

        let report = reincrement(root);

        assert!(report.failed.is_empty());
        assert_eq!(fs::read(root.join("A.pdf")).unwrap(), b"one");
        assert_eq!(fs::read(&stale).unwrap(), b"interrupted");
        assert_eq!(names(root), vec![".icbc-renumber-0.tmp", "A.pdf"]);
    }

    #[test]
    fn test_reincrement_removes_empty_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Jane/2021")).unwrap();
        write_aged(&root.join("Bob/B.pdf"), 0);

        let report = reincrement(root);

        assert!(!root.join("Jane").exists());
        assert!(root.join("Bob/B.pdf").exists());
        assert_eq!(report.removed_dirs, vec![root.join("Jane/2021"), root.join("Jane")]);
        assert!(root.exists());
    }
}
