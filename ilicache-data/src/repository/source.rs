//! Classification of repository source descriptors.

use camino::{Utf8Path, Utf8PathBuf};
use ilicache_core::PLACEHOLDER_PREFIX;
use url::Url;

use super::TransportError;

/// How a configured source descriptor is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A `%NAME` placeholder substituted by the host application; skipped.
    Placeholder(String),
    /// An existing local directory, searched recursively.
    LocalDirectory(Utf8PathBuf),
    /// A remote repository base URL, always ending in `/`.
    Remote(Url),
}

impl Source {
    /// Classify `descriptor`: placeholders first, then existing local
    /// directories, everything else is a remote repository.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] when a descriptor that is
    /// neither a placeholder nor a directory does not parse as a URL with a
    /// host.
    ///
    /// # Examples
    ///
    /// ```
    /// use ilicache_data::repository::Source;
    ///
    /// let remote = Source::classify("http://models.interlis.ch").expect("valid url");
    /// match remote {
    ///     Source::Remote(url) => assert_eq!(url.as_str(), "http://models.interlis.ch/"),
    ///     other => panic!("unexpected {other:?}"),
    /// }
    /// assert!(matches!(Source::classify("%XTF_DIR"), Ok(Source::Placeholder(_))));
    /// ```
    pub fn classify(descriptor: &str) -> Result<Self, TransportError> {
        let descriptor = descriptor.trim();
        if descriptor.starts_with(PLACEHOLDER_PREFIX) {
            return Ok(Self::Placeholder(descriptor.to_owned()));
        }
        let local = Utf8Path::new(descriptor);
        if ilicache_fs::is_existing_dir(local) {
            return Ok(Self::LocalDirectory(local.to_owned()));
        }
        remote_url(descriptor).map(Self::Remote)
    }
}

/// Parse a repository location as a base URL ending in `/`.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] for unparsable locations and for
/// URLs without a host.
pub fn remote_url(location: &str) -> Result<Url, TransportError> {
    let invalid = |source| TransportError::InvalidUrl {
        location: location.to_owned(),
        source,
    };
    let mut url = Url::parse(location).map_err(invalid)?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(url::ParseError::EmptyHost));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Host authority (`host[:port]`) identifying the bucket of a remote repository.
#[must_use]
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}
