//! Source locations and cache directories consumed by the caches.

use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Prefix marking a source that is substituted by the host application.
pub const PLACEHOLDER_PREFIX: char = '%';

/// Separator used by semicolon-joined source strings.
pub const SOURCE_SEPARATOR: char = ';';

/// Default source list for both models and toppings.
pub const DEFAULT_SOURCES: &str = "%ILI_FROM_DB;%XTF_DIR;http://models.interlis.ch/;%JAR_DIR";

/// Directory below the home directory holding the model cache.
pub const MODEL_CACHE_DIR_NAME: &str = ".ilicache";

/// Directory below the home directory holding the topping cache.
pub const TOPPING_CACHE_DIR_NAME: &str = ".ilitoppingscache";

/// Ordered list of source descriptors.
///
/// # Examples
///
/// ```
/// use ilicache_core::SourceList;
///
/// let sources = SourceList::parse("%XTF_DIR; /data/models ;;http://models.interlis.ch/");
/// let parsed: Vec<&str> = sources.iter().collect();
/// assert_eq!(parsed, ["%XTF_DIR", "/data/models", "http://models.interlis.ch/"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SourceList(Vec<String>);

impl SourceList {
    /// Wrap an explicit list of descriptors.
    #[must_use]
    pub const fn new(sources: Vec<String>) -> Self {
        Self(sources)
    }

    /// Split a semicolon-joined source string, dropping blank entries.
    #[must_use]
    pub fn parse(joined: &str) -> Self {
        joined
            .split(SOURCE_SEPARATOR)
            .map(str::trim)
            .filter(|source| !source.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Iterate over the descriptors in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of descriptors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for SourceList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Errors raised while deriving default settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The platform reported no home directory.
    #[error("could not determine the home directory")]
    MissingHomeDirectory,
    /// The home directory is not valid UTF-8.
    #[error("home directory {0:?} is not valid UTF-8")]
    NonUtf8HomeDirectory(PathBuf),
}

/// Configuration shared by the model and topping caches.
///
/// Cache roots are explicit so tests and embedders can isolate them; the
/// defaults live below the user's home directory.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use ilicache_core::{CacheSettings, SourceList};
///
/// let settings = CacheSettings::under(Utf8Path::new("/home/gis"))
///     .with_model_sources(SourceList::parse("/data/models"));
/// assert_eq!(settings.model_cache_root, Utf8Path::new("/home/gis/.ilicache"));
/// assert_eq!(settings.model_sources.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheSettings {
    /// Locations searched for models.
    pub model_sources: SourceList,
    /// Locations searched for toppings.
    pub topping_sources: SourceList,
    /// Root of the on-disk model cache.
    pub model_cache_root: Utf8PathBuf,
    /// Root of the on-disk topping cache.
    pub topping_cache_root: Utf8PathBuf,
}

impl CacheSettings {
    /// Default sources with cache roots below `home`.
    #[must_use]
    pub fn under(home: &Utf8Path) -> Self {
        Self {
            model_sources: SourceList::parse(DEFAULT_SOURCES),
            topping_sources: SourceList::parse(DEFAULT_SOURCES),
            model_cache_root: home.join(MODEL_CACHE_DIR_NAME),
            topping_cache_root: home.join(TOPPING_CACHE_DIR_NAME),
        }
    }

    /// Default sources with cache roots below the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the home directory is unknown or not
    /// valid UTF-8.
    pub fn from_home_dir() -> Result<Self, SettingsError> {
        let home_dir = dirs::home_dir().ok_or(SettingsError::MissingHomeDirectory)?;
        let home =
            Utf8PathBuf::from_path_buf(home_dir).map_err(SettingsError::NonUtf8HomeDirectory)?;
        Ok(Self::under(&home))
    }

    /// Replace the model source list.
    #[must_use]
    pub fn with_model_sources(mut self, sources: SourceList) -> Self {
        self.model_sources = sources;
        self
    }

    /// Replace the topping source list.
    #[must_use]
    pub fn with_topping_sources(mut self, sources: SourceList) -> Self {
        self.topping_sources = sources;
        self
    }

    /// Move both cache roots below `root`.
    #[must_use]
    pub fn with_cache_roots_under(mut self, root: &Utf8Path) -> Self {
        self.model_cache_root = root.join(MODEL_CACHE_DIR_NAME);
        self.topping_cache_root = root.join(TOPPING_CACHE_DIR_NAME);
        self
    }
}
