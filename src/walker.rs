use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::filters::FileFilter;
use crate::grammar;

/// Lazily yield every Python source file under `root` that `filter` keeps.
///
/// Entries come in a stable order: siblings sorted by file name, each
/// directory's contents before the next sibling. Unreadable entries are
/// skipped with a warning rather than aborting the walk.
pub fn source_files<'a>(root: &'a Path, filter: &'a dyn FileFilter) -> impl Iterator<Item = PathBuf> + 'a {
    return WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            return match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    None
                },
            };
        })
        .filter(|e| return !e.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| return grammar::is_source_path(path))
        .filter(move |path| {
            let ignored = filter.is_ignored(path);
            if ignored {
                tracing::debug!("Filtered out {}", path.display());
            }
            return !ignored;
        });
}
