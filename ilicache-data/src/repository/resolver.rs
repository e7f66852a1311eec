//! Refresh driver turning sources into buckets of the repository index.

use camino::{Utf8Path, Utf8PathBuf};
use futures_util::{
    future::{FutureExt, LocalBoxFuture},
    stream::{FuturesUnordered, StreamExt},
};
use ilicache_core::{
    CacheSettings, MessageSink, RefreshGeneration, RepositoryIndex, ToppingRecord,
};
use std::collections::HashSet;
use url::Url;

use super::{
    CacheKind, Downloader, MetaConfigCatalog, ModelCatalog, Source, ToppingFileCatalog,
    TransportError, authority, catalog_directories, remote_url,
};
use crate::{
    catalog::MalformedCatalogError,
    metadata::{BaseLocation, SITE_FILE, parse_site_index},
    topping::{FetchError, cached_topping_path, fetch_topping_file},
};

/// Bucket key used for a single file refreshed outside any repository.
pub const NO_REPO_LOCATION: &str = "no_repo";

/// Cache of INTERLIS models.
pub type ModelCache<D> = IliCache<ModelCatalog, D>;
/// Cache of Model Baker metaconfigurations.
pub type MetaConfigCache<D> = IliCache<MetaConfigCatalog, D>;
/// Cache of topping files.
pub type ToppingFileCache<D> = IliCache<ToppingFileCatalog, D>;

/// A fetch that failed during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    /// Requested location.
    pub url: String,
    /// Human readable cause.
    pub reason: String,
}

/// Outcome of [`IliCache::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Buckets written, in write order.
    pub buckets: Vec<String>,
    /// Placeholder sources that were skipped.
    pub skipped: Vec<String>,
    /// Fetches and locations that failed.
    pub failures: Vec<FailedFetch>,
}

/// Repository cache: resolves sources into buckets of a [`RepositoryIndex`].
///
/// Local directories are read synchronously. Remote repositories are fetched
/// through the [`Downloader`]; their completions are processed one at a time
/// in completion order, and subsidiary sites found along the way are fetched
/// as independent buckets.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use ilicache_core::LogSink;
/// use ilicache_data::repository::{ModelCache, ModelCatalog, test_support::StubDownloader};
///
/// let models = "<TRANSFER><DATASECTION><IliRepository20.RepositoryIndex>\
///     <IliRepository20.RepositoryIndex.ModelMetadata><Name>Units</Name>\
///     </IliRepository20.RepositoryIndex.ModelMetadata>\
///     </IliRepository20.RepositoryIndex></DATASECTION></TRANSFER>";
/// let downloader = StubDownloader::new()
///     .with_file("http://models.example/ilimodels.xml", models.as_bytes().to_vec());
/// let cache_dir = tempfile::tempdir().expect("tempdir");
/// let cache_root = Utf8Path::from_path(cache_dir.path()).expect("utf-8 tempdir");
/// let mut cache = ModelCache::new(ModelCatalog, downloader, cache_root);
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_all()
///     .build()
///     .expect("runtime");
/// let report = runtime
///     .block_on(cache.refresh(["%XTF_DIR", "http://models.example"], &mut LogSink))
///     .expect("no malformed catalogs");
/// assert_eq!(report.buckets, ["models.example"]);
/// assert!(cache.index().find_by_id("Units").is_some());
/// ```
pub struct IliCache<K: CacheKind, D> {
    kind: K,
    downloader: D,
    cache_root: Utf8PathBuf,
    index: RepositoryIndex<K::Record>,
}

impl<K: CacheKind, D: Downloader> IliCache<K, D> {
    /// Create an empty cache storing downloads below `cache_root`.
    pub fn new(kind: K, downloader: D, cache_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            kind,
            downloader,
            cache_root: cache_root.into(),
            index: RepositoryIndex::new(),
        }
    }

    /// Create an empty cache at the cache root `settings` configures for
    /// `kind`.
    pub fn from_settings(kind: K, downloader: D, settings: &CacheSettings) -> Self {
        let cache_root = kind.cache_root(settings).to_owned();
        Self::new(kind, downloader, cache_root)
    }

    /// The aggregated index.
    pub const fn index(&self) -> &RepositoryIndex<K::Record> {
        &self.index
    }

    /// Mutable access to the index, for subscribing to changes.
    pub const fn index_mut(&mut self) -> &mut RepositoryIndex<K::Record> {
        &mut self.index
    }

    /// The cache kind.
    pub const fn kind(&self) -> &K {
        &self.kind
    }

    /// The downloader used for remote repositories.
    pub const fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Root of the on-disk cache.
    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    /// Where the information file of the remote repository `url` is cached.
    pub fn cached_information_file(&self, url: &Url) -> Utf8PathBuf {
        self.cache_root
            .join(authority(url))
            .join(self.kind.information_file())
    }

    /// Clear the index and resolve every source in order.
    ///
    /// Placeholders are skipped. Local directories become one bucket per
    /// directory holding catalog files. Remote repositories are fetched, and
    /// the returned future completes once every fetch, including those of
    /// subsidiary sites, has finished. Fetch failures are logged and listed in
    /// the report.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCatalogError`] as soon as a local model source file
    /// is structurally invalid.
    pub async fn refresh<I>(
        &mut self,
        sources: I,
        sink: &mut dyn MessageSink,
    ) -> Result<RefreshReport, MalformedCatalogError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let generation = self.index.begin_refresh();
        let mut refresh = Refresh {
            kind: &self.kind,
            downloader: &self.downloader,
            cache_root: &self.cache_root,
            index: &mut self.index,
            generation,
            visited: HashSet::new(),
            fetches: FuturesUnordered::new(),
            pending: Vec::new(),
            report: RefreshReport::default(),
        };
        for source in sources {
            let descriptor = source.as_ref();
            match Source::classify(descriptor) {
                Ok(Source::Placeholder(name)) => {
                    log::debug!("skipping placeholder source {name}");
                    refresh.report.skipped.push(name);
                }
                Ok(Source::LocalDirectory(root)) => refresh.visit_local(&root, sink)?,
                Ok(Source::Remote(url)) => refresh.visit_remote(url),
                Err(err) => refresh.fail(descriptor, &err),
            }
        }
        while let Some(completion) = refresh.fetches.next().await {
            refresh.complete(completion);
        }
        Ok(refresh.report)
    }

    /// [`IliCache::refresh`] over the sources `settings` configures for this
    /// cache's kind.
    ///
    /// # Errors
    ///
    /// See [`IliCache::refresh`].
    pub async fn refresh_configured(
        &mut self,
        settings: &CacheSettings,
        sink: &mut dyn MessageSink,
    ) -> Result<RefreshReport, MalformedCatalogError> {
        let sources = self.kind.sources(settings);
        self.refresh(sources.iter(), sink).await
    }

    /// Replace the [`NO_REPO_LOCATION`] bucket with the records of `path`.
    ///
    /// Returns the number of records stored; a missing file stores nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCatalogError`] when `path` is a malformed model
    /// source file.
    pub fn refresh_single_file(
        &mut self,
        path: &Utf8Path,
        sink: &mut dyn MessageSink,
    ) -> Result<usize, MalformedCatalogError> {
        if !ilicache_fs::file_is_file(path).unwrap_or(false) {
            log::warn!("single file {path} does not exist");
            return Ok(0);
        }
        let records = self.kind.collect_file(path, NO_REPO_LOCATION, sink)?;
        let count = records.len();
        self.index.set_bucket(NO_REPO_LOCATION, records);
        Ok(count)
    }

    /// Rebuild the bucket of a remote repository from its cached snapshot.
    ///
    /// Returns the number of records stored.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] for an invalid location and
    /// [`TransportError::Storage`] when no snapshot exists.
    pub fn load_cached_repository(&mut self, location: &str) -> Result<usize, TransportError> {
        let url = remote_url(location)?;
        let snapshot = self.cached_information_file(&url);
        if !ilicache_fs::file_is_file(&snapshot).unwrap_or(false) {
            return Err(TransportError::Storage {
                path: snapshot,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let bucket = authority(&url);
        let records =
            self.kind
                .parse_information_file(&snapshot, &bucket, &BaseLocation::Remote(url));
        let count = records.len();
        self.index.set_bucket(bucket, records);
        Ok(count)
    }
}

impl<K, D> IliCache<K, D>
where
    K: CacheKind<Record = ToppingRecord>,
    D: Downloader,
{
    /// Local path of a topping record, downloading it when needed.
    ///
    /// # Errors
    ///
    /// See [`fetch_topping_file`].
    pub async fn fetch_file(&self, record: &ToppingRecord) -> Result<Utf8PathBuf, FetchError> {
        fetch_topping_file(record, &self.downloader, &self.cache_root).await
    }
}

enum Job {
    Index { location: String, base: Url },
    Site,
    File { bucket: usize, position: usize },
}

struct Completion {
    job: Job,
    url: Url,
    destination: Utf8PathBuf,
    outcome: Result<u64, TransportError>,
}

/// Records of a remote bucket waiting for their files.
struct PendingBucket<R> {
    location: String,
    records: Vec<R>,
    remaining: usize,
}

struct Refresh<'c, K: CacheKind, D> {
    kind: &'c K,
    downloader: &'c D,
    cache_root: &'c Utf8Path,
    index: &'c mut RepositoryIndex<K::Record>,
    generation: RefreshGeneration,
    visited: HashSet<String>,
    fetches: FuturesUnordered<LocalBoxFuture<'c, Completion>>,
    pending: Vec<Option<PendingBucket<K::Record>>>,
    report: RefreshReport,
}

impl<'c, K: CacheKind, D: Downloader> Refresh<'c, K, D> {
    fn store(&mut self, location: String, records: Vec<K::Record>) {
        if self
            .index
            .set_bucket_for(self.generation, location.as_str(), records)
        {
            self.report.buckets.push(location);
        }
    }

    fn fail(&mut self, location: &str, err: &TransportError) {
        log::warn!("Could not download {location} ({err})");
        self.report.failures.push(FailedFetch {
            url: location.to_owned(),
            reason: err.to_string(),
        });
    }

    fn visit_local(
        &mut self,
        root: &Utf8Path,
        sink: &mut dyn MessageSink,
    ) -> Result<(), MalformedCatalogError> {
        let kind = self.kind;
        for dir in catalog_directories(root, |path| kind.is_catalog_file(path)) {
            let records = kind.collect_directory(&dir, dir.as_str(), sink)?;
            self.store(dir.into_string(), records);
        }
        Ok(())
    }

    fn visit_remote(&mut self, url: Url) {
        if !self.visited.insert(url.as_str().to_owned()) {
            log::debug!("repository {url} already visited in this refresh");
            return;
        }
        let location = authority(&url);
        let dir = self.cache_root.join(&location);
        let jobs = [
            (
                self.kind.information_file(),
                Job::Index {
                    location,
                    base: url.clone(),
                },
            ),
            (SITE_FILE, Job::Site),
        ];
        for (file, job) in jobs {
            match url.join(file) {
                Ok(file_url) => self.fetch(job, file_url, dir.join(file)),
                Err(source) => self.fail(
                    url.as_str(),
                    &TransportError::InvalidUrl {
                        location: format!("{url}{file}"),
                        source,
                    },
                ),
            }
        }
    }

    fn fetch(&mut self, job: Job, url: Url, destination: Utf8PathBuf) {
        let downloader = self.downloader;
        self.fetches.push(
            async move {
                let outcome = downloader.download(&url, &destination).await;
                Completion {
                    job,
                    url,
                    destination,
                    outcome,
                }
            }
            .boxed_local(),
        );
    }

    fn complete(&mut self, completion: Completion) {
        let Completion {
            job,
            url,
            destination,
            outcome,
        } = completion;
        match (job, outcome) {
            (Job::File { bucket, position }, outcome) => {
                let local = match outcome {
                    Ok(_) => Some(destination),
                    Err(err) => {
                        self.fail(url.as_str(), &err);
                        None
                    }
                };
                self.file_done(bucket, position, local);
            }
            (_, Err(err)) => self.fail(url.as_str(), &err),
            (Job::Index { location, base }, Ok(_)) => {
                self.index_downloaded(&destination, location, base);
            }
            (Job::Site, Ok(_)) => self.follow_sites(&destination),
        }
    }

    fn index_downloaded(&mut self, path: &Utf8Path, location: String, base: Url) {
        let records = self
            .kind
            .parse_information_file(path, &location, &BaseLocation::Remote(base));
        let files: Vec<(usize, Url)> = records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| {
                self.kind.remote_file(record).map(|url| (position, url))
            })
            .collect();
        if files.is_empty() {
            self.store(location, records);
            return;
        }
        let bucket = self.pending.len();
        self.pending.push(Some(PendingBucket {
            location,
            records,
            remaining: files.len(),
        }));
        for (position, url) in files {
            let destination = cached_topping_path(self.cache_root, &url);
            self.fetch(Job::File { bucket, position }, url, destination);
        }
    }

    fn file_done(&mut self, bucket: usize, position: usize, local: Option<Utf8PathBuf>) {
        let Some(pending) = self.pending.get_mut(bucket).and_then(Option::as_mut) else {
            return;
        };
        if let (Some(path), Some(record)) = (local, pending.records.get_mut(position)) {
            self.kind.attach_local_file(record, path);
        }
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining > 0 {
            return;
        }
        if let Some(done) = self.pending.get_mut(bucket).and_then(Option::take) {
            self.store(done.location, done.records);
        }
    }

    fn follow_sites(&mut self, path: &Utf8Path) {
        for site in parse_site_index(path) {
            match remote_url(&site) {
                Ok(url) => self.visit_remote(url),
                Err(err) => self.fail(&site, &err),
            }
        }
    }
}
