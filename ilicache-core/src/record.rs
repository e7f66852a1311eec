//! Records produced by the catalog and metadata parsers.

use camino::Utf8PathBuf;

/// Common accessors used by [`RepositoryIndex`](crate::RepositoryIndex).
pub trait IndexRecord: Clone {
    /// Identifier used by [`RepositoryIndex::find_by_id`](crate::RepositoryIndex::find_by_id).
    fn id(&self) -> &str;

    /// Version string, if the source declared one.
    fn version(&self) -> Option<&str>;

    /// Location identifier of the bucket the record belongs to.
    fn location(&self) -> &str;

    /// Key used to suppress later records with the same key.
    ///
    /// Records returning `None` are never deduplicated.
    fn dedup_key(&self) -> Option<&str> {
        None
    }
}

/// An INTERLIS model discovered in a catalog file or a model index.
///
/// # Examples
///
/// ```
/// use ilicache_core::{IndexRecord, ModelRecord};
///
/// let model = ModelRecord::new("RoadsSimple", Some("2016-08-11"), "http://models.interlis.ch");
/// assert_eq!(model.id(), "RoadsSimple");
/// assert_eq!(model.dedup_key(), Some("RoadsSimple"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelRecord {
    /// Model name as declared after the `MODEL` keyword.
    pub name: String,
    /// Declared version; catalog files without a `VERSION` line yield `""`.
    pub version: Option<String>,
    /// Location identifier: a directory, a file path or a host authority.
    pub source: String,
}

impl ModelRecord {
    /// Construct a record from borrowed or owned parts.
    pub fn new(
        name: impl Into<String>,
        version: Option<&str>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_owned),
            source: source.into(),
        }
    }
}

impl IndexRecord for ModelRecord {
    fn id(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn location(&self) -> &str {
        &self.source
    }

    fn dedup_key(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// A title in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalisedText {
    /// Language code such as `de`.
    pub language: Option<String>,
    /// Title text.
    pub text: String,
}

/// A topping dataset entry selected from a data index.
///
/// Metaconfig records carry the model extracted from the category codes;
/// topping file records leave [`ToppingRecord::model`] empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToppingRecord {
    /// Dataset identifier.
    pub id: String,
    /// Dataset version.
    pub version: Option<String>,
    /// Dataset owner, usually a `mailto:` URI.
    pub owner: Option<String>,
    /// Location identifier of the owning bucket.
    pub repository: String,
    /// Model extracted from the model category code.
    pub model: Option<String>,
    /// File path relative to [`ToppingRecord::url`].
    pub relative_file_path: String,
    /// Localised titles, when the entry declares any.
    pub title: Option<Vec<LocalisedText>>,
    /// Base location the relative path resolves against.
    pub url: String,
    /// Local copy of the file: set for local repositories and completed downloads.
    pub local_file_path: Option<Utf8PathBuf>,
}

impl ToppingRecord {
    /// Text shown to users: the first title, else the identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use ilicache_core::{LocalisedText, ToppingRecord};
    ///
    /// let mut record = ToppingRecord {
    ///     id: "ch.opengis.ili.config.demo".to_owned(),
    ///     version: None,
    ///     owner: None,
    ///     repository: "models.opengis.ch".to_owned(),
    ///     model: None,
    ///     relative_file_path: "metaconfig/demo.ini".to_owned(),
    ///     title: None,
    ///     url: "http://models.opengis.ch/".to_owned(),
    ///     local_file_path: None,
    /// };
    /// assert_eq!(record.display_text(), "ch.opengis.ili.config.demo");
    /// record.title = Some(vec![LocalisedText {
    ///     language: Some("de".to_owned()),
    ///     text: "Demo".to_owned(),
    /// }]);
    /// assert_eq!(record.display_text(), "Demo");
    /// ```
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.title
            .as_deref()
            .and_then(<[LocalisedText]>::first)
            .map_or(self.id.as_str(), |title| title.text.as_str())
    }
}

impl IndexRecord for ToppingRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn location(&self) -> &str {
        &self.repository
    }
}
