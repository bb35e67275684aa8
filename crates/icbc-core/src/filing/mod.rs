//! Filing: copy into the output tree, re-file root leftovers, archive and
//! renumber.

pub mod archive;
pub mod copier;
pub mod fs_ops;
pub mod refile;

pub use archive::{archive, archive_as_of, archive_cutoff, reincrement, ReincrementReport, ARCHIVE_DIR};
pub use copier::{find_filed, CopyFailure, CopyOptions, CopyReport, Copier};
pub use refile::{refile, MovedFile, RefileReport};
