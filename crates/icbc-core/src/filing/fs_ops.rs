//! Filesystem helpers shared by the copier, re-filer and archiver.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FilingError;
use crate::extract::patterns::DUPLICATE_SUFFIX;

/// Result type for filesystem operations.
pub type Result<T> = std::result::Result<T, FilingError>;

/// `path` itself when free, otherwise the first free `"{stem} ({n}){ext}"`, n from 1.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = extension_with_dot(path);

    (1u32..)
        .map(|n| parent.join(format!("{} ({}){}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// `".pdf"` style extension, empty when the path has none.
pub fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Split `"X (3)"` into `("X", Some(3))`; names without a suffix give `None`.
pub fn split_duplicate_suffix(stem: &str) -> (&str, Option<u32>) {
    match DUPLICATE_SUFFIX.captures(stem) {
        Some(caps) => {
            let base = caps.get(1).map_or(stem, |m| m.as_str());
            (base, caps[2].parse().ok())
        }
        None => (stem, None),
    }
}

/// Create `dir` and its parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| FilingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Copy a file, carrying over its modification time.
pub fn copy_preserving_mtime(from: &Path, to: &Path) -> Result<()> {
    let copy_err = |source: io::Error| FilingError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    fs::copy(from, to).map_err(copy_err)?;
    let modified = fs::metadata(from).and_then(|m| m.modified()).map_err(copy_err)?;
    File::options()
        .write(true)
        .open(to)
        .and_then(|f| f.set_modified(modified))
        .map_err(copy_err)?;
    Ok(())
}

/// Move a file, creating the destination folder. Falls back to copy and
/// delete when a rename is not possible (e.g. across devices).
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }

    if let Err(e) = fs::rename(from, to) {
        debug!("Rename {} failed ({}), copying instead", from.display(), e);
        copy_preserving_mtime(from, to).map_err(|err| match err {
            FilingError::Copy { from, to, source } => FilingError::Move { from, to, source },
            other => other,
        })?;
        fs::remove_file(from).map_err(|source| FilingError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// True for files with a `.pdf` extension in any case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// PDFs directly inside `dir`, sorted by name.
pub fn pdf_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Immediate subfolders of `dir`, sorted by name.
pub fn subfolders(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_unique_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ABC123.pdf");
        assert_eq!(unique_path(&target), target);

        fs::write(&target, b"a").unwrap();
        assert_eq!(unique_path(&target), dir.path().join("ABC123 (1).pdf"));

        fs::write(dir.path().join("ABC123 (1).pdf"), b"b").unwrap();
        assert_eq!(unique_path(&target), dir.path().join("ABC123 (2).pdf"));
    }

    #[test]
    fn test_split_duplicate_suffix() {
        assert_eq!(split_duplicate_suffix("X (5)"), ("X", Some(5)));
        assert_eq!(split_duplicate_suffix("Jane Doe - AB1 (12)"), ("Jane Doe - AB1", Some(12)));
        assert_eq!(split_duplicate_suffix("X"), ("X", None));
        assert_eq!(split_duplicate_suffix("X(2)"), ("X(2)", None));
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.pdf");
        let to = dir.path().join("b.pdf");
        fs::write(&from, b"data").unwrap();
        let old = SystemTime::now() - Duration::from_secs(86_400 * 30);
        File::options().write(true).open(&from).unwrap().set_modified(old).unwrap();

        copy_preserving_mtime(&from, &to).unwrap();

        let copied = fs::metadata(&to).unwrap().modified().unwrap();
        let delta = copied.duration_since(old).unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2));
        assert!(from.exists());
    }

    #[test]
    fn test_move_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.pdf");
        let to = dir.path().join("x/y/a.pdf");
        fs::write(&from, b"data").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"data");
    }

    #[test]
    fn test_pdf_files_and_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.PDF"), b"").unwrap();
        fs::write(dir.path().join("a.pdf"), b"").unwrap();
        fs::write(dir.path().join("c.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(
            pdf_files(dir.path()).unwrap(),
            vec![dir.path().join("a.pdf"), dir.path().join("b.PDF")]
        );
        assert_eq!(subfolders(dir.path()).unwrap(), vec![dir.path().join("sub")]);
    }
}
