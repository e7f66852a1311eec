//! Aggregated, deduplicated view over repository buckets.
//!
//! Records are grouped into buckets keyed by the location they were
//! discovered at. A bucket is always replaced wholesale. After every change
//! the index rebuilds a flat view: buckets are visited in insertion order,
//! records within a bucket in descending version order, and a record whose
//! [`IndexRecord::dedup_key`] was already seen is skipped. The first bucket
//! introducing a name therefore wins, even when a later bucket carries a
//! higher version of it.
//!
//! Subscribers are notified synchronously before the mutating call returns.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::{IndexRecord, compare_versions};


/// Identifies a subscription created by [`RepositoryIndex::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Token identifying one refresh cycle of an index.
///
/// Obtained from [`RepositoryIndex::begin_refresh`]. Writes carrying a token
/// from an earlier cycle are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefreshGeneration(u64);

/// Change delivered to subscribers.
#[derive(Debug)]
pub struct IndexChange<'a, R> {
    /// Bucket that changed; `None` when the whole index was cleared.
    pub location: Option<&'a str>,
    /// The rebuilt deduplicated view.
    pub records: &'a [R],
}

type Callback<R> = Box<dyn FnMut(&IndexChange<'_, R>)>;

struct Subscriber<R> {
    id: SubscriptionId,
    callback: Callback<R>,
}

/// In-memory index of records grouped by source location.
///
/// # Examples
///
/// ```
/// use ilicache_core::{ModelRecord, RepositoryIndex};
///
/// let mut index = RepositoryIndex::new();
/// index.set_bucket(
///     "repoA",
///     vec![ModelRecord::new("X", Some("2"), "repoA")],
/// );
/// index.set_bucket(
///     "repoB",
///     vec![ModelRecord::new("X", Some("5"), "repoB")],
/// );
/// let winner = index.find_by_id("X").map(|model| model.source.as_str());
/// assert_eq!(winner, Some("repoA"));
/// ```
pub struct RepositoryIndex<R> {
    buckets: IndexMap<String, Vec<R>>,
    view: Vec<R>,
    subscribers: Vec<Subscriber<R>>,
    next_subscription: u64,
    generation: u64,
}

impl<R> fmt::Debug for RepositoryIndex<R>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryIndex")
            .field("buckets", &self.buckets)
            .field("view", &self.view)
            .field("subscribers", &self.subscribers.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<R: IndexRecord> Default for RepositoryIndex<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: IndexRecord> RepositoryIndex<R> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: IndexMap::new(),
            view: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            generation: 0,
        }
    }

    /// Replace the bucket for `location` and notify subscribers.
    ///
    /// Records are stable-sorted by descending version. A location that was
    /// already present keeps its position in the bucket order.
    pub fn set_bucket(&mut self, location: impl Into<String>, mut records: Vec<R>) {
        let key = location.into();
        records.sort_by(|lhs, rhs| compare_versions(rhs.version(), lhs.version()));
        self.buckets.insert(key.clone(), records);
        self.rebuild_view();
        self.notify(Some(&key));
    }

    /// Replace a bucket on behalf of the refresh cycle `generation`.
    ///
    /// Returns `false`, leaving the index untouched, when `generation` is not
    /// the current cycle.
    pub fn set_bucket_for(
        &mut self,
        generation: RefreshGeneration,
        location: impl Into<String>,
        records: Vec<R>,
    ) -> bool {
        if generation != self.generation() {
            log::debug!("discarding bucket from stale refresh {generation:?}");
            return false;
        }
        self.set_bucket(location, records);
        true
    }

    /// Clear the index and start a new refresh cycle.
    pub fn begin_refresh(&mut self) -> RefreshGeneration {
        self.generation += 1;
        self.clear();
        self.generation()
    }

    /// Current refresh cycle.
    #[must_use]
    pub const fn generation(&self) -> RefreshGeneration {
        RefreshGeneration(self.generation)
    }

    /// Remove every bucket and notify subscribers.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.view.clear();
        self.notify(None);
    }

    /// The deduplicated view over all buckets.
    #[must_use]
    pub fn all_records(&self) -> &[R] {
        &self.view
    }

    /// Look up a record of the deduplicated view by identifier.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&R> {
        self.view.iter().find(|record| record.id() == id)
    }

    /// Identifiers of the deduplicated view, in view order.
    #[must_use]
    pub fn names(&self) -> IndexSet<String> {
        self.view
            .iter()
            .map(|record| record.id().to_owned())
            .collect()
    }

    /// Records stored for `location`, sorted by descending version.
    #[must_use]
    pub fn bucket(&self, location: &str) -> Option<&[R]> {
        self.buckets.get(location).map(Vec::as_slice)
    }

    /// Bucket locations in insertion order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Whether the index holds no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Register a callback invoked after every change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&IndexChange<'_, R>) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        self.subscribers.len() != before
    }

    fn rebuild_view(&mut self) {
        let mut seen: IndexSet<String> = IndexSet::new();
        self.view = self
            .buckets
            .values()
            .flatten()
            .filter(|record| {
                record
                    .dedup_key()
                    .is_none_or(|key| seen.insert(key.to_owned()))
            })
            .cloned()
            .collect();
    }

    fn notify(&mut self, location: Option<&str>) {
        let change = IndexChange {
            location,
            records: &self.view,
        };
        for subscriber in &mut self.subscribers {
            (subscriber.callback)(&change);
        }
    }
}
