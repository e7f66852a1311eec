//! Cache kinds: what a cache indexes and how each source is read.

use camino::{Utf8Path, Utf8PathBuf};
use ilicache_core::{
    CacheSettings, IndexRecord, MessageSink, ModelRecord, SOURCE_SEPARATOR, SourceList,
    ToppingRecord,
};
use indexmap::IndexSet;
use url::Url;

use super::walk::files_in;
use crate::{
    catalog::{MalformedCatalogError, process_catalog_file},
    encoding::DEFAULT_ENCODINGS,
    metadata::{
        BaseLocation, DATA_INDEX_FILE, DataFilter, MODEL_INDEX_FILE, parse_data_index,
        parse_model_index,
    },
    topping::topping_file_url,
};

/// Extension of INTERLIS model source files.
pub const CATALOG_EXTENSION: &str = "ili";

/// What a cache indexes and how each kind of source is read.
pub trait CacheKind {
    /// Record type stored in the index.
    type Record: IndexRecord;

    /// Metadata document fetched from every repository.
    fn information_file(&self) -> &'static str;

    /// Sources configured for this kind.
    fn sources<'s>(&self, settings: &'s CacheSettings) -> &'s SourceList;

    /// Cache root configured for this kind.
    fn cache_root<'s>(&self, settings: &'s CacheSettings) -> &'s Utf8Path;

    /// Whether a file marks its directory as a local repository.
    fn is_catalog_file(&self, path: &Utf8Path) -> bool {
        path.file_name() == Some(self.information_file())
    }

    /// Records listed by an information file.
    fn parse_information_file(
        &self,
        path: &Utf8Path,
        location: &str,
        base: &BaseLocation,
    ) -> Vec<Self::Record>;

    /// Records of one local repository directory.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCatalogError`] for a corrupt model source file.
    fn collect_directory(
        &self,
        dir: &Utf8Path,
        location: &str,
        _sink: &mut dyn MessageSink,
    ) -> Result<Vec<Self::Record>, MalformedCatalogError> {
        let information = dir.join(self.information_file());
        if !ilicache_fs::file_is_file(&information).unwrap_or(false) {
            return Ok(Vec::new());
        }
        Ok(self.parse_information_file(&information, location, &BaseLocation::Local(dir.to_owned())))
    }

    /// Records of a single file.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCatalogError`] for a corrupt model source file.
    fn collect_file(
        &self,
        path: &Utf8Path,
        location: &str,
        _sink: &mut dyn MessageSink,
    ) -> Result<Vec<Self::Record>, MalformedCatalogError> {
        let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        Ok(self.parse_information_file(path, location, &BaseLocation::Local(parent.to_owned())))
    }

    /// Remote file a record needs downloaded before it is complete.
    fn remote_file(&self, _record: &Self::Record) -> Option<Url> {
        None
    }

    /// Record the local copy of a downloaded file.
    fn attach_local_file(&self, _record: &mut Self::Record, _path: Utf8PathBuf) {}
}

/// Models from `ilimodels.xml` documents and `.ili` source files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelCatalog;

impl ModelCatalog {
    fn parse_sources(
        path: &Utf8Path,
        location: &str,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<ModelRecord>, MalformedCatalogError> {
        let mut models = process_catalog_file(path, &DEFAULT_ENCODINGS, sink)?;
        for model in &mut models {
            location.clone_into(&mut model.source);
        }
        Ok(models)
    }
}

fn is_model_source(path: &Utf8Path) -> bool {
    path.extension() == Some(CATALOG_EXTENSION)
}

impl CacheKind for ModelCatalog {
    type Record = ModelRecord;

    fn information_file(&self) -> &'static str {
        MODEL_INDEX_FILE
    }

    fn sources<'s>(&self, settings: &'s CacheSettings) -> &'s SourceList {
        &settings.model_sources
    }

    fn cache_root<'s>(&self, settings: &'s CacheSettings) -> &'s Utf8Path {
        &settings.model_cache_root
    }

    fn is_catalog_file(&self, path: &Utf8Path) -> bool {
        is_model_source(path) || path.file_name() == Some(MODEL_INDEX_FILE)
    }

    fn parse_information_file(
        &self,
        path: &Utf8Path,
        location: &str,
        _base: &BaseLocation,
    ) -> Vec<ModelRecord> {
        parse_model_index(path, location)
    }

    /// Models of the local `ilimodels.xml`, plus those of every `.ili` file
    /// in `dir` whose name the index does not already list.
    fn collect_directory(
        &self,
        dir: &Utf8Path,
        location: &str,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<ModelRecord>, MalformedCatalogError> {
        let information = dir.join(MODEL_INDEX_FILE);
        let mut models = if ilicache_fs::file_is_file(&information).unwrap_or(false) {
            parse_model_index(&information, location)
        } else {
            Vec::new()
        };
        let listed: IndexSet<String> = models.iter().map(|model| model.name.clone()).collect();
        for source in files_in(dir, is_model_source) {
            let parsed = Self::parse_sources(&source, location, sink)?;
            models.extend(
                parsed
                    .into_iter()
                    .filter(|model| !listed.contains(&model.name)),
            );
        }
        Ok(models)
    }

    fn collect_file(
        &self,
        path: &Utf8Path,
        location: &str,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<ModelRecord>, MalformedCatalogError> {
        if is_model_source(path) {
            return Self::parse_sources(path, location, sink);
        }
        Ok(parse_model_index(path, location))
    }
}

/// Model Baker metaconfigurations for a set of models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaConfigCatalog {
    filter: DataFilter,
}

impl MetaConfigCatalog {
    /// Select metaconfigurations covering any of `models`.
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filter: DataFilter::MetaConfig {
                models: models.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Select metaconfigurations for a semicolon-separated model list.
    #[must_use]
    pub fn from_joined(models: &str) -> Self {
        Self::new(
            models
                .split(SOURCE_SEPARATOR)
                .map(str::trim)
                .filter(|model| !model.is_empty()),
        )
    }

    /// The filter applied to data indexes.
    #[must_use]
    pub const fn filter(&self) -> &DataFilter {
        &self.filter
    }
}

impl CacheKind for MetaConfigCatalog {
    type Record = ToppingRecord;

    fn information_file(&self) -> &'static str {
        DATA_INDEX_FILE
    }

    fn sources<'s>(&self, settings: &'s CacheSettings) -> &'s SourceList {
        &settings.topping_sources
    }

    fn cache_root<'s>(&self, settings: &'s CacheSettings) -> &'s Utf8Path {
        &settings.topping_cache_root
    }

    fn parse_information_file(
        &self,
        path: &Utf8Path,
        location: &str,
        base: &BaseLocation,
    ) -> Vec<ToppingRecord> {
        parse_data_index(path, location, base, &self.filter)
    }
}

/// Topping files referenced by `ilidata:` identifiers.
///
/// Remote files are downloaded while the repository is refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToppingFileCatalog {
    filter: DataFilter,
}

impl ToppingFileCatalog {
    /// Select the datasets named by `ids`, each of the form `ilidata:<id>`.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filter: DataFilter::ToppingFiles {
                ids: ids.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// The filter applied to data indexes.
    #[must_use]
    pub const fn filter(&self) -> &DataFilter {
        &self.filter
    }
}

impl CacheKind for ToppingFileCatalog {
    type Record = ToppingRecord;

    fn information_file(&self) -> &'static str {
        DATA_INDEX_FILE
    }

    fn sources<'s>(&self, settings: &'s CacheSettings) -> &'s SourceList {
        &settings.topping_sources
    }

    fn cache_root<'s>(&self, settings: &'s CacheSettings) -> &'s Utf8Path {
        &settings.topping_cache_root
    }

    fn parse_information_file(
        &self,
        path: &Utf8Path,
        location: &str,
        base: &BaseLocation,
    ) -> Vec<ToppingRecord> {
        parse_data_index(path, location, base, &self.filter)
    }

    fn remote_file(&self, record: &ToppingRecord) -> Option<Url> {
        if record.local_file_path.is_some() {
            return None;
        }
        match topping_file_url(&record.url, &record.relative_file_path) {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("cannot resolve topping file of {}: {err}", record.id);
                None
            }
        }
    }

    fn attach_local_file(&self, record: &mut ToppingRecord, path: Utf8PathBuf) {
        record.local_file_path = Some(path);
    }
}
