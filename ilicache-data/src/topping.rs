//! Resolution of topping files into local paths.
//!
//! Remote topping files are cached below `<cache_root>/files/`, in a
//! directory named after the SHA-256 digest of their URL, so distinct
//! repositories never overwrite each other's payloads.

use camino::{Utf8Path, Utf8PathBuf};
use ilicache_core::ToppingRecord;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use crate::repository::{Downloader, TransportError, remote_url};

/// Directory below the cache root holding downloaded topping files.
pub const FILES_DIR_NAME: &str = "files";

const FALLBACK_FILE_NAME: &str = "download";

/// Errors raised while materialising a topping file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A record from a local repository points at a missing file.
    #[error("topping file {path} does not exist")]
    MissingLocalFile {
        /// Expected location.
        path: Utf8PathBuf,
    },
    /// The download failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Resolve `relative` against the repository `base`.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] when `base` is not a URL or the
/// joined location is invalid.
///
/// # Examples
///
/// ```
/// use ilicache_data::topping_file_url;
///
/// let url = topping_file_url("http://models.opengis.ch", "qml/roads.qml").expect("valid url");
/// assert_eq!(url.as_str(), "http://models.opengis.ch/qml/roads.qml");
/// ```
pub fn topping_file_url(base: &str, relative: &str) -> Result<Url, TransportError> {
    remote_url(base)?
        .join(relative)
        .map_err(|source| TransportError::InvalidUrl {
            location: format!("{base} + {relative}"),
            source,
        })
}

/// Cache location of the file downloaded from `url`.
#[must_use]
pub fn cached_topping_path(cache_root: &Utf8Path, url: &Url) -> Utf8PathBuf {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let key: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME);
    cache_root.join(FILES_DIR_NAME).join(key).join(file_name)
}

/// Return a local path for `record`, downloading it when needed.
///
/// Records that already carry a local path are returned as-is provided the
/// file exists. Other records are fetched from their repository into the
/// topping file cache below `cache_root`.
///
/// # Errors
///
/// Returns [`FetchError::MissingLocalFile`] for a dangling local path and
/// [`FetchError::Transport`] when the download fails.
pub async fn fetch_topping_file<D>(
    record: &ToppingRecord,
    downloader: &D,
    cache_root: &Utf8Path,
) -> Result<Utf8PathBuf, FetchError>
where
    D: Downloader + ?Sized,
{
    if let Some(local) = &record.local_file_path {
        return if ilicache_fs::file_is_file(local).unwrap_or(false) {
            Ok(local.clone())
        } else {
            Err(FetchError::MissingLocalFile {
                path: local.clone(),
            })
        };
    }
    let url = topping_file_url(&record.url, &record.relative_file_path)?;
    let destination = cached_topping_path(cache_root, &url);
    downloader.download(&url, &destination).await?;
    Ok(destination)
}
