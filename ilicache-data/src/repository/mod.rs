//! Repository resolution.
//!
//! A source descriptor is either a placeholder, a local directory or a
//! remote repository. [`IliCache`] turns a list of descriptors into buckets
//! of a [`RepositoryIndex`](ilicache_core::RepositoryIndex), one bucket per
//! local directory or remote host. The [`CacheKind`] decides which
//! information file is read and which records it yields.

mod downloader;
mod kind;
mod resolver;
mod source;
pub mod test_support;
mod walk;

pub use downloader::{DEFAULT_USER_AGENT, Downloader, HttpDownloader, TransportError};
pub use kind::{CATALOG_EXTENSION, CacheKind, MetaConfigCatalog, ModelCatalog, ToppingFileCatalog};
pub use resolver::{
    FailedFetch, IliCache, MetaConfigCache, ModelCache, NO_REPO_LOCATION, RefreshReport,
    ToppingFileCache,
};
pub use source::{Source, authority, remote_url};
pub use walk::catalog_directories;
