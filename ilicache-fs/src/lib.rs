//! Filesystem helpers for the repository cache, built on `cap-std` and `camino`.
//!
//! Catalog reads and cache writes go through capability handles opened from
//! ambient authority for the directory that contains the target file.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};
use std::path::Component;

/// Read the whole file at `path` into memory.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be opened or read.
pub fn read_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Write `contents` to `path`, replacing any previous snapshot and creating
/// missing parent directories.
///
/// # Errors
///
/// Returns the underlying I/O error when a directory or the file cannot be
/// created.
pub fn write_bytes(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dirs(parent)?;
    }
    let (dir, name) = containing_dir(path)?;
    dir.write(name, contents)
}

/// Whether `path` exists and is a regular file.
///
/// # Errors
///
/// A missing file or parent yields [`io::ErrorKind::NotFound`].
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = containing_dir(path)?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Whether `path` names an existing directory.
///
/// Any inspection failure, including a missing parent, reports `false`.
#[must_use]
pub fn is_existing_dir(path: &Utf8Path) -> bool {
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority()).is_ok()
}

/// Directory handle for the parent of `path`, with the file name.
fn containing_dir(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, &str)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Create `path` and all of its ancestors.
fn create_dirs(path: &Utf8Path) -> io::Result<()> {
    let (base, relative) = split_anchor(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?.create_dir_all(&relative)
}

/// Split `path` into the directory it is anchored at (root, drive prefix or
/// the working directory) and the remainder below it.
fn split_anchor(path: &Utf8Path) -> io::Result<(Utf8PathBuf, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let base = match std_path.components().next() {
        // Drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => return Ok((Utf8PathBuf::from("."), path.to_path_buf())),
    };
    let relative = path
        .strip_prefix(&base)
        .map_err(|_| io::Error::other(format!("cannot anchor {path} at {base}")))?;
    Ok((base, relative.to_path_buf()))
}
