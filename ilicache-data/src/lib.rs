//! Parsing and resolution logic for the INTERLIS repository cache.
//!
//! Responsibilities:
//! - Read INTERLIS model source files and the XML documents published by
//!   repositories.
//! - Resolve local directories and remote repositories into buckets of a
//!   [`RepositoryIndex`](ilicache_core::RepositoryIndex).
//! - Download and cache remote metadata and topping files.
//!
//! Boundaries:
//! - Do not encode ranking or deduplication rules (live in `ilicache-core`).
//! - Keep network access behind the [`repository::Downloader`] trait.
//!
//! Invariants:
//! - A file that cannot be read contributes no records; only a malformed
//!   model source file aborts a refresh.
//! - No global mutable state.

pub mod catalog;
pub mod encoding;
pub mod metadata;
pub mod repository;
pub mod topping;
mod xml;

pub use catalog::{CatalogError, MalformedCatalogError, parse_catalog, process_catalog_file};
pub use encoding::{DEFAULT_ENCODINGS, DecodeError, TextEncoding};
pub use metadata::{
    BaseLocation, DATA_INDEX_FILE, DATASET_ID_PREFIX, DataFilter, METACONFIG_TYPE,
    MODEL_INDEX_FILE, MODELBAKER_TOOL, SITE_FILE, parse_data_index, parse_model_index,
    parse_site_index,
};
pub use topping::{FILES_DIR_NAME, FetchError, cached_topping_path, fetch_topping_file, topping_file_url};
