//! Download seam for remote repositories and its HTTP implementation.

use std::{io, time::Duration};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use reqwest::{Client, header::USER_AGENT};
use thiserror::Error;
use url::Url;

/// User agent sent by [`HttpDownloader`] unless overridden.
pub const DEFAULT_USER_AGENT: &str = "ilicache/0.1";

/// Transport-level errors encountered while fetching repository files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description.
        message: String,
    },
    /// The request failed below the HTTP layer.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
    /// A location could not be turned into a URL.
    #[error("invalid repository location {location:?}: {source}")]
    InvalidUrl {
        /// The rejected location.
        location: String,
        /// Parser failure.
        source: url::ParseError,
    },
    /// The payload could not be written to the cache.
    #[error("failed to store download at {path}: {source}")]
    Storage {
        /// Cache file that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The HTTP client could not be configured.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// Builder failure.
        source: reqwest::Error,
    },
}

/// Fetches a URL into a file on disk.
///
/// Implementations write the complete payload to `destination`, creating
/// parent directories as needed, and report the number of bytes stored. The
/// destination is left untouched when the fetch fails.
#[async_trait(?Send)]
pub trait Downloader {
    /// Download `url` into `destination`.
    async fn download(&self, url: &Url, destination: &Utf8Path) -> Result<u64, TransportError>;
}

#[async_trait(?Send)]
impl<D: Downloader + ?Sized> Downloader for &D {
    async fn download(&self, url: &Url, destination: &Utf8Path) -> Result<u64, TransportError> {
        (**self).download(url, destination).await
    }
}

/// HTTP implementation of [`Downloader`].
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    user_agent: String,
}

impl HttpDownloader {
    /// Construct a downloader with connect and request timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|source| TransportError::Client { source })?;
        Ok(Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait(?Send)]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &Url, destination: &Utf8Path) -> Result<u64, TransportError> {
        let payload = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| convert_reqwest_error(err, url))?
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?;
        ilicache_fs::write_bytes(destination, &payload).map_err(|source| {
            TransportError::Storage {
                path: destination.to_owned(),
                source,
            }
        })?;
        log::debug!("stored {} bytes from {url} at {destination}", payload.len());
        Ok(u64::try_from(payload.len()).unwrap_or(u64::MAX))
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &Url) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_string(),
        source: io::Error::new(kind, error),
    }
}
