//! Parsers for the XML documents published by INTERLIS repositories.
//!
//! Three documents are understood: the model index (`ilimodels.xml`), the
//! data index listing toppings (`ilidata.xml`) and the site document
//! (`ilisite.xml`) naming subsidiary repositories. A document that cannot be
//! read contributes nothing; the failure is logged and parsing of sibling
//! documents carries on.

use std::{fmt, sync::LazyLock};

use camino::{Utf8Path, Utf8PathBuf};
use ilicache_core::{LocalisedText, ModelRecord, ToppingRecord};
use indexmap::IndexSet;
use regex::Regex;
use url::Url;

use crate::xml::{self, Element};


/// File name of a repository's model index.
pub const MODEL_INDEX_FILE: &str = "ilimodels.xml";
/// File name of a repository's data index.
pub const DATA_INDEX_FILE: &str = "ilidata.xml";
/// File name of a repository's site document.
pub const SITE_FILE: &str = "ilisite.xml";

/// Prefix callers use when referencing a dataset by identifier.
pub const DATASET_ID_PREFIX: &str = "ilidata:";
/// Type code value selecting metaconfiguration datasets.
pub const METACONFIG_TYPE: &str = "metaconfig";
/// Tool code value selecting datasets meant for Model Baker.
pub const MODELBAKER_TOOL: &str = "modelbaker";

const MODEL_INDEX_CONTAINERS: [&str; 2] = [
    "IliRepository09.RepositoryIndex",
    "IliRepository20.RepositoryIndex",
];
const DATA_INDEX_CONTAINER: &str = "DatasetIdx16.DataIndex";
const DATASET_ENTRY: &str = "DatasetIdx16.DataIndex.DatasetMetadata";
const SITE_ENTRY: &str = "IliSite09.SiteMetadata.Site";

static MODEL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://codes\.interlis\.ch/model/(.*)").expect("model code pattern is valid")
});
static TYPE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://codes\.interlis\.ch/type/(.*)").expect("type code pattern is valid")
});
static TOOL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://codes\.opengis\.ch/(.*)").expect("tool code pattern is valid")
});

/// Location that relative file paths in a data index resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseLocation {
    /// A directory on the local filesystem.
    Local(Utf8PathBuf),
    /// A remote repository URL.
    Remote(Url),
}

impl BaseLocation {
    /// String form stored in [`ToppingRecord::url`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(dir) => dir.as_str(),
            Self::Remote(url) => url.as_str(),
        }
    }

    fn local_file(&self, relative: &str) -> Option<Utf8PathBuf> {
        match self {
            Self::Local(dir) => Some(dir.join(relative)),
            Self::Remote(_) => None,
        }
    }
}

impl fmt::Display for BaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects which data index entries become records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFilter {
    /// Metaconfigurations for Model Baker covering one of `models`.
    MetaConfig {
        /// Requested model names.
        models: IndexSet<String>,
    },
    /// Datasets whose `ilidata:`-prefixed identifier is in `ids`.
    ToppingFiles {
        /// Requested identifiers, including the prefix.
        ids: IndexSet<String>,
    },
}

/// Parse the models listed by a model index document.
///
/// Both container generations are read and merged. Entries without a name
/// are skipped.
#[must_use]
pub fn parse_model_index(path: &Utf8Path, location: &str) -> Vec<ModelRecord> {
    let Some(root) = load(path, "ilimodels") else {
        return Vec::new();
    };
    let mut models = Vec::new();
    for container in MODEL_INDEX_CONTAINERS {
        let entry_name = format!("{container}.ModelMetadata");
        for repository in root.descendants_named(container) {
            for entry in repository.children_named(&entry_name) {
                match entry.child_text("Name") {
                    Some(name) => {
                        models.push(ModelRecord::new(name, entry.child_text("Version"), location));
                    }
                    None => log::debug!("skipping nameless model entry in {path}"),
                }
            }
        }
    }
    models
}

/// Parse the datasets of a data index document that pass `filter`.
///
/// One record is produced per file of a matching dataset. Records from a
/// local `base` carry the joined local file path.
#[must_use]
pub fn parse_data_index(
    path: &Utf8Path,
    location: &str,
    base: &BaseLocation,
    filter: &DataFilter,
) -> Vec<ToppingRecord> {
    let Some(root) = load(path, "ilidata") else {
        return Vec::new();
    };
    let mut toppings = Vec::new();
    for index in root.descendants_named(DATA_INDEX_CONTAINER) {
        for entry in index.children_named(DATASET_ENTRY) {
            let Some(raw_id) = entry.child_text("id") else {
                log::debug!("skipping dataset without id in {path}");
                continue;
            };
            let Some((id, model)) = select(entry, raw_id, filter) else {
                continue;
            };
            let title = titles(entry);
            for relative in file_paths(entry) {
                toppings.push(ToppingRecord {
                    id: id.clone(),
                    version: entry.child_text("version").map(str::to_owned),
                    owner: entry.child_text("owner").map(str::to_owned),
                    repository: location.to_owned(),
                    model: model.clone(),
                    relative_file_path: relative.to_owned(),
                    title: title.clone(),
                    url: base.as_str().to_owned(),
                    local_file_path: base.local_file(relative),
                });
            }
        }
    }
    toppings
}

/// Parse the subsidiary repository locations named by a site document.
#[must_use]
pub fn parse_site_index(path: &Utf8Path) -> Vec<String> {
    let Some(root) = load(path, "ilisite") else {
        return Vec::new();
    };
    root.descendants_named(SITE_ENTRY)
        .into_iter()
        .flat_map(|site| site.children_named("subsidiarySite"))
        .flat_map(|subsidiary| subsidiary.children_named("IliSite09.RepositoryLocation_"))
        .filter_map(|location| location.child_text("value"))
        .map(str::to_owned)
        .collect()
}

fn load(path: &Utf8Path, kind: &str) -> Option<Element> {
    match xml::read_document(path) {
        Ok(root) => Some(root),
        Err(err) => {
            log::warn!("Could not parse {kind} file `{path}` ({err})");
            None
        }
    }
}

/// Identifier and model of an entry accepted by `filter`.
fn select(
    entry: &Element,
    raw_id: &str,
    filter: &DataFilter,
) -> Option<(String, Option<String>)> {
    match filter {
        DataFilter::MetaConfig { models } => {
            let codes = CategoryCodes::of(entry);
            let model = codes.models.iter().find(|model| models.contains(*model))?;
            let is_metaconfig = codes.kind.as_deref() == Some(METACONFIG_TYPE)
                && codes.tool.as_deref() == Some(MODELBAKER_TOOL);
            is_metaconfig.then(|| (raw_id.to_owned(), Some(model.clone())))
        }
        DataFilter::ToppingFiles { ids } => {
            let id = format!("{DATASET_ID_PREFIX}{raw_id}");
            ids.contains(&id).then_some((id, None))
        }
    }
}

#[derive(Debug, Default)]
struct CategoryCodes {
    models: Vec<String>,
    kind: Option<String>,
    tool: Option<String>,
}

impl CategoryCodes {
    fn of(entry: &Element) -> Self {
        let mut codes = Self::default();
        let values = entry
            .children_named("categories")
            .flat_map(|categories| categories.children_named("DatasetIdx16.Code_"))
            .filter_map(|code| code.child_text("value"));
        for value in values {
            if let Some(model) = capture(&MODEL_CODE, value) {
                codes.models.push(model);
            }
            if let Some(kind) = capture(&TYPE_CODE, value) {
                codes.kind = Some(kind);
            }
            if let Some(tool) = capture(&TOOL_CODE, value) {
                codes.tool = Some(tool);
            }
        }
        codes
    }
}

fn capture(pattern: &Regex, value: &str) -> Option<String> {
    pattern
        .captures(value)
        .and_then(|found| found.get(1))
        .map(|group| group.as_str().to_owned())
}

fn titles(entry: &Element) -> Option<Vec<LocalisedText>> {
    let texts: Vec<LocalisedText> = entry
        .children_named("title")
        .flat_map(|title| title.children_named("DatasetIdx16.MultilingualText"))
        .flat_map(|multilingual| multilingual.children_named("LocalisedText"))
        .flat_map(|localised| localised.children_named("DatasetIdx16.LocalisedText"))
        .filter_map(|localised| {
            Some(LocalisedText {
                language: localised.child_text("Language").map(str::to_owned),
                text: localised.child_text("Text")?.to_owned(),
            })
        })
        .collect();
    (!texts.is_empty()).then_some(texts)
}

fn file_paths(entry: &Element) -> impl Iterator<Item = &str> {
    entry
        .children_named("files")
        .flat_map(|files| files.children_named("DatasetIdx16.DataFile"))
        .flat_map(|data_file| data_file.children_named("file"))
        .flat_map(|file| file.children_named("DatasetIdx16.File"))
        .filter_map(|file| file.child_text("path"))
}
