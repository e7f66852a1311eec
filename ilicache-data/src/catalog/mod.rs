//! Line-oriented parser for INTERLIS model source files.
//!
//! Only two statements matter: `MODEL <name>` opens a model and
//! `VERSION "<text>"` assigns the version of the model opened last. Anything
//! after a `!!` marker is a comment.

use std::{io, sync::LazyLock};

use camino::{Utf8Path, Utf8PathBuf};
use ilicache_core::{MessageSink, ModelRecord, Severity};
use regex::Regex;
use thiserror::Error;

use crate::encoding::{DecodeError, TextEncoding};

#[cfg(test)]
mod tests;

const COMMENT_MARKER: &str = "!!";

static MODEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*MODEL\s*([\w\d_-]+).*").expect("model pattern is a valid regex")
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"VERSION "([ \w\d\._-]+)".*"#).expect("version pattern is a valid regex")
});

/// A `VERSION` statement appeared without a model to attach it to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("VERSION tag found in file {path}:{line} without previous MODEL definition")]
pub struct MalformedCatalogError {
    /// Catalog file containing the statement.
    pub path: Utf8PathBuf,
    /// One-based line number of the statement.
    pub line: usize,
}

/// Errors raised while parsing a catalog with a single encoding.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Read {
        /// Catalog path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid in the requested encoding.
    #[error("failed to decode catalog {path}: {source}")]
    Decode {
        /// Catalog path.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: DecodeError,
    },
    /// The file is structurally invalid.
    #[error(transparent)]
    Malformed(#[from] MalformedCatalogError),
}

/// Parse the models declared in `path` using `encoding`.
///
/// Every record carries the file path as its source and an empty version
/// until a `VERSION` statement is seen.
///
/// # Errors
///
/// Returns [`CatalogError::Read`] or [`CatalogError::Decode`] when the file
/// cannot be turned into text, and [`CatalogError::Malformed`] when a
/// `VERSION` statement has no open model.
pub fn parse_catalog(
    path: &Utf8Path,
    encoding: TextEncoding,
) -> Result<Vec<ModelRecord>, CatalogError> {
    let bytes = ilicache_fs::read_bytes(path).map_err(|source| CatalogError::Read {
        path: path.to_owned(),
        source,
    })?;
    let text = encoding
        .decode(&bytes)
        .map_err(|source| CatalogError::Decode {
            path: path.to_owned(),
            source,
        })?;
    Ok(scan(&text, path)?)
}

fn scan(text: &str, path: &Utf8Path) -> Result<Vec<ModelRecord>, MalformedCatalogError> {
    let mut models: Vec<ModelRecord> = Vec::new();
    let mut open = false;
    for (number, raw) in text.lines().enumerate() {
        let line = raw.split_once(COMMENT_MARKER).map_or(raw, |(code, _)| code);
        if let Some(name) = MODEL_PATTERN.captures(line).and_then(|found| found.get(1)) {
            models.push(ModelRecord::new(name.as_str(), Some(""), path.as_str()));
            open = true;
        }
        if let Some(version) = VERSION_PATTERN.captures(line).and_then(|found| found.get(1)) {
            let slot = models
                .last_mut()
                .filter(|_| open)
                .ok_or_else(|| MalformedCatalogError {
                    path: path.to_owned(),
                    line: number + 1,
                })?;
            slot.version = Some(version.as_str().to_owned());
            open = false;
        }
    }
    Ok(models)
}

/// Parse `path`, trying each encoding of `encodings` in turn.
///
/// Success with any encoding but the first emits one
/// [`Severity::Warning`]. When no encoding works, or the file is unreadable,
/// one [`Severity::Critical`] message is emitted and no models are returned.
///
/// # Errors
///
/// Only [`MalformedCatalogError`] is returned; it signals a file the user has
/// to fix.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use ilicache_core::CacheMessage;
/// use ilicache_data::{DEFAULT_ENCODINGS, process_catalog_file};
///
/// let mut messages: Vec<CacheMessage> = Vec::new();
/// let models = process_catalog_file(
///     Utf8Path::new("models/RoadsSimple.ili"),
///     &DEFAULT_ENCODINGS,
///     &mut messages,
/// )?;
/// # Ok::<(), ilicache_data::MalformedCatalogError>(())
/// ```
pub fn process_catalog_file(
    path: &Utf8Path,
    encodings: &[TextEncoding],
    sink: &mut dyn MessageSink,
) -> Result<Vec<ModelRecord>, MalformedCatalogError> {
    let file_name = path.file_name().unwrap_or(path.as_str());
    let mut last_failure = None;
    for (attempt, encoding) in encodings.iter().copied().enumerate() {
        match parse_catalog(path, encoding) {
            Ok(models) => {
                if attempt > 0 {
                    sink.notify(
                        Severity::Warning,
                        format!(
                            "Even though the ili file `{file_name}` could be read, it is not in \
                             UTF-8. Please encode your ili models in UTF-8."
                        ),
                    );
                }
                return Ok(models);
            }
            Err(CatalogError::Malformed(err)) => return Err(err),
            Err(CatalogError::Read { source, .. }) => {
                sink.notify(
                    Severity::Critical,
                    format!("Could not read ili file `{file_name}` ({source})."),
                );
                log::warn!("could not read ili file {path}: {source}");
                return Ok(Vec::new());
            }
            Err(err @ CatalogError::Decode { .. }) => {
                log::debug!("{err}; trying the next encoding");
                last_failure = Some(err);
            }
        }
    }

    let tried = encodings
        .iter()
        .map(|encoding| encoding.label())
        .collect::<Vec<_>>()
        .join(" nor ");
    sink.notify(
        Severity::Critical,
        format!(
            "Could not parse ili file `{file_name}` with {tried} encodings. Please encode your \
             ili models in UTF-8."
        ),
    );
    if let Some(err) = last_failure {
        log::warn!("could not parse ili file {path}: {err}");
    }
    Ok(Vec::new())
}
