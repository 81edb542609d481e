//! File lookup across search directories

use std::path::{Path, PathBuf};

/// Locate a file by trying each search directory in turn
///
/// Absolute paths are returned as-is when they exist. Relative paths are
/// joined onto every directory in `search_dirs` (first hit wins) and finally
/// tried against the working directory.
pub fn find_file<P: AsRef<Path>>(path: P, search_dirs: &[&Path]) -> Option<PathBuf> {
    let path = path.as_ref();

    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    for dir in search_dirs {
        let candidate = dir.join(path);
        if candidate.is_file() {
            log::trace!("Resolved {} -> {}", path.display(), candidate.display());
            return Some(candidate);
        }
    }

    path.is_file().then(|| path.to_path_buf())
}
