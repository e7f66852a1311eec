//! Facade crate for the INTERLIS repository cache.
//!
//! This crate re-exports the core record and index types and, behind the
//! `resolver` feature, the caches that walk local and remote repositories.

#![forbid(unsafe_code)]

pub use ilicache_core::{
    CacheMessage, CacheSettings, IndexRecord, MessageSink, ModelRecord, RepositoryIndex, Severity,
    SourceList, ToppingRecord, compare_versions,
};

#[cfg(feature = "resolver")]
pub use ilicache_data::repository::{
    Downloader, HttpDownloader, IliCache, MetaConfigCache, MetaConfigCatalog, ModelCache,
    ModelCatalog, RefreshReport, ToppingFileCache, ToppingFileCatalog, TransportError,
};

#[cfg(feature = "resolver")]
pub use ilicache_data::{FetchError, MalformedCatalogError};
