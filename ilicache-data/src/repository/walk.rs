//! Lazy traversal of local repositories for directories holding catalog files.

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Lazily yield `root` and every directory below it that directly contains a
/// file accepted by `is_catalog_file`.
///
/// Directories are visited depth first in file-name order. Unreadable
/// entries and non-UTF-8 paths are logged and skipped. Calling the function
/// again restarts the traversal.
pub fn catalog_directories<F>(
    root: &Utf8Path,
    is_catalog_file: F,
) -> impl Iterator<Item = Utf8PathBuf>
where
    F: Fn(&Utf8Path) -> bool,
{
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable repository entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(dir) => Some(dir),
            Err(path) => {
                log::warn!("skipping non UTF-8 directory {}", path.display());
                None
            }
        })
        .filter(move |dir| contains_catalog(dir, &is_catalog_file))
}

/// Files directly inside `dir` accepted by `accept`, sorted by name.
pub(crate) fn files_in<F>(dir: &Utf8Path, accept: F) -> Vec<Utf8PathBuf>
where
    F: Fn(&Utf8Path) -> bool,
{
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("could not list {dir}: {err}");
            return Vec::new();
        }
    };
    let mut files: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| accept(path.as_path()))
        .collect();
    files.sort();
    files
}

fn contains_catalog<F>(dir: &Utf8Path, is_catalog_file: &F) -> bool
where
    F: Fn(&Utf8Path) -> bool,
{
    !files_in(dir, is_catalog_file).is_empty()
}
