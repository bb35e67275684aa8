//! Re-filer: moves files left in the output root next to earlier documents
//! that share their leading identifier.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::archive::ARCHIVE_DIR;
use super::fs_ops::{move_file, pdf_files, subfolders, unique_path};
use crate::error::FilingError;
use crate::extract::patterns::YEAR_FOLDER;
use crate::naming::leading_token;

/// One relocated file.
#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// What one re-filing pass did.
#[derive(Debug, Default)]
pub struct RefileReport {
    pub moved: Vec<MovedFile>,
    /// Root files with no matching document in any subfolder.
    pub unmatched: Vec<PathBuf>,
    pub failed: Vec<FilingError>,
}

/// Subfolders eligible as a filing home: not archive or year buckets.
fn candidate_folders(output_root: &Path) -> Vec<PathBuf> {
    match subfolders(output_root) {
        Ok(dirs) => dirs
            .into_iter()
            .filter(|dir| {
                let name = dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                name != ARCHIVE_DIR && !YEAR_FOLDER.is_match(&name)
            })
            .collect(),
        Err(e) => {
            warn!("Cannot list {}: {}", output_root.display(), e);
            Vec::new()
        }
    }
}

/// First subfolder whose own PDFs include one with leading token `token`.
fn find_home(folders: &[PathBuf], token: &str) -> Option<PathBuf> {
    folders
        .iter()
        .find(|folder| match pdf_files(folder) {
            Ok(files) => files.iter().any(|file| {
                file.file_stem()
                    .map(|stem| leading_token(&stem.to_string_lossy()).eq_ignore_ascii_case(token))
                    .unwrap_or(false)
            }),
            Err(e) => {
                warn!("Cannot list {}: {}", folder.display(), e);
                false
            }
        })
        .cloned()
}

/// Move each of `files` that sits directly in `output_root` into the
/// subfolder already holding a document with the same leading token.
pub fn refile(output_root: &Path, files: &[PathBuf]) -> RefileReport {
    let mut report = RefileReport::default();
    let folders = candidate_folders(output_root);

    for file in files {
        if file.parent() != Some(output_root) || !file.is_file() {
            continue;
        }
        let Some(name) = file.file_name() else {
            continue;
        };
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let token = leading_token(&stem);
        if token.is_empty() {
            report.unmatched.push(file.clone());
            continue;
        }

        let Some(home) = find_home(&folders, token) else {
            debug!("No filing precedent for {}", file.display());
            report.unmatched.push(file.clone());
            continue;
        };

        let dest = unique_path(&home.join(name));
        match move_file(file, &dest) {
            Ok(()) => {
                debug!("Re-filed {} -> {}", file.display(), dest.display());
                report.moved.push(MovedFile {
                    from: file.clone(),
                    to: dest,
                });
            }
            Err(e) => {
                warn!("{}", e);
                report.failed.push(e);
            }
        }
    }

    info!(
        "Re-filed {} files ({} left in root)",
        report.moved.len(),
        report.unmatched.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"pdf").unwrap();
    }

    #[test]
    fn test_moves_next_to_matching_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("Jane Doe/ABC123 TOP.pdf"));
        write(&root.join("Bob Smith/XYZ.pdf"));
        let new = root.join("ABC123.pdf");
        write(&new);

        let report = refile(root, &[new.clone()]);

        assert_eq!(
            report.moved,
            vec![MovedFile {
                from: new.clone(),
                to: root.join("Jane Doe/ABC123.pdf"),
            }]
        );
        assert!(!new.exists());
    }

    #[test]
    fn test_token_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("Jane Doe/ABC1234.pdf"));
        let new = root.join("ABC123.pdf");
        write(&new);

        let report = refile(root, &[new.clone()]);
        assert!(report.moved.is_empty());
        assert_eq!(report.unmatched, vec![new.clone()]);
        assert!(new.exists());
    }

    #[test]
    fn test_ignores_archive_and_year_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("_Archive/2022/ABC123.pdf"));
        write(&root.join("2023/ABC123.pdf"));
        let new = root.join("ABC123 (1).pdf");
        write(&new);

        let report = refile(root, &[new.clone()]);
        assert!(report.moved.is_empty());
        assert!(new.exists());
    }

    #[test]
    fn test_nested_documents_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("Jane Doe/Old Policies/ABC123 TOP.pdf"));
        let new = root.join("ABC123.pdf");
        write(&new);

        let report = refile(root, &[new.clone()]);
        assert!(report.moved.is_empty());
        assert_eq!(report.unmatched, vec![new.clone()]);
        assert!(new.exists());
    }

    #[test]
    fn test_only_root_files_move() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("Jane Doe/ABC123.pdf"));
        let nested = root.join("Bob/ABC123.pdf");
        write(&nested);

        let report = refile(root, &[nested.clone()]);
        assert!(report.moved.is_empty());
        assert!(report.unmatched.is_empty());
        assert!(nested.exists());
    }

    #[test]
    fn test_collision_is_uniquified() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("Jane Doe/ABC123.pdf"));
        let new = root.join("ABC123.pdf");
        write(&new);

        let report = refile(root, &[new]);
        assert_eq!(report.moved[0].to, root.join("Jane Doe/ABC123 (1).pdf"));
    }
}
