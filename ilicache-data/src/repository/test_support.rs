//! Test utilities for repository resolution.
//!
//! [`StubDownloader`] serves canned payloads from memory so refreshes can be
//! exercised without network access.

use std::{cell::RefCell, collections::HashMap};

use async_trait::async_trait;
use camino::Utf8Path;
use url::Url;

use super::{Downloader, TransportError};

/// In-memory [`Downloader`] keyed by exact URL.
///
/// Unknown URLs fail with an HTTP 404 error. Every request is recorded in
/// issue order. A URL given a delay yields to the runtime that many times
/// before completing, so completion order can differ from issue order.
///
/// # Examples
///
/// ```
/// use ilicache_data::repository::test_support::StubDownloader;
///
/// let downloader = StubDownloader::new()
///     .with_file("http://models.example/ilimodels.xml", b"<TRANSFER/>".to_vec());
/// assert!(downloader.requests().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct StubDownloader {
    files: HashMap<String, Vec<u8>>,
    delays: HashMap<String, usize>,
    requests: RefCell<Vec<String>>,
}

impl StubDownloader {
    /// Create a downloader that knows no URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_file(mut self, url: &str, body: Vec<u8>) -> Self {
        self.files.insert(url.to_owned(), body);
        self
    }

    /// Yield `polls` times before completing requests for `url`.
    #[must_use]
    pub fn with_delay(mut self, url: &str, polls: usize) -> Self {
        self.delays.insert(url.to_owned(), polls);
        self
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Downloader for StubDownloader {
    async fn download(&self, url: &Url, destination: &Utf8Path) -> Result<u64, TransportError> {
        self.requests.borrow_mut().push(url.to_string());
        for _ in 0..self.delays.get(url.as_str()).copied().unwrap_or(0) {
            tokio::task::yield_now().await;
        }
        let Some(body) = self.files.get(url.as_str()) else {
            return Err(TransportError::Http {
                url: url.to_string(),
                status: 404,
                message: "not found".to_owned(),
            });
        };
        ilicache_fs::write_bytes(destination, body).map_err(|source| TransportError::Storage {
            path: destination.to_owned(),
            source,
        })?;
        Ok(u64::try_from(body.len()).unwrap_or(u64::MAX))
    }
}
