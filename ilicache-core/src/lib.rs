//! Core domain types for the INTERLIS repository cache.
//!
//! This crate holds the records produced by the parsers, the ordering used
//! to rank versions, the deduplicating [`RepositoryIndex`] consumed by
//! completers and lookups, and the settings naming where models and
//! toppings are searched. It performs no I/O beyond resolving the home
//! directory for default settings.

#![forbid(unsafe_code)]

mod index;
mod message;
mod record;
mod settings;
mod version;

pub use index::{IndexChange, RefreshGeneration, RepositoryIndex, SubscriptionId};
pub use message::{CacheMessage, LogSink, MessageSink, Severity};
pub use record::{IndexRecord, LocalisedText, ModelRecord, ToppingRecord};
pub use settings::{
    CacheSettings, DEFAULT_SOURCES, MODEL_CACHE_DIR_NAME, PLACEHOLDER_PREFIX, SOURCE_SEPARATOR,
    SettingsError, SourceList, TOPPING_CACHE_DIR_NAME,
};
pub use version::compare_versions;
