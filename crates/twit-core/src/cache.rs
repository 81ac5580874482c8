//! In-memory catalog index
//!
//! The API hands out episodes with their shows embedded, but the catalog is
//! browsed show first. `CatalogIndex` keeps the show → episode hierarchy,
//! keyed by API identity, and grows monotonically for the lifetime of the
//! process: entries are never evicted or replaced.
//!
//! Every insertion is a single atomic check-and-set on one identity, so
//! concurrent refreshes can fold the same page without coordination. Readers
//! take snapshots (`Vec<Arc<_>>`) and never observe a half-built record.
//! Building a snapshot holds one DashMap shard read lock at a time, so a
//! writer to that shard waits until the reader moves past it; no lock is
//! held once the snapshot is returned.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::types::{Episode, Show};

/// Master index of shows and their episodes.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    shows: DashMap<u32, Arc<ShowCache>>,
    /// Days of history a completed traversal is known to cover
    request_days: AtomicU32,
    /// Milliseconds since the Unix epoch, only ever moved forward
    last_updated_ms: AtomicI64,
}

impl CatalogIndex {
    /// Create an empty index. `last_updated` starts at the Unix epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth of history, in days, the index is known to fully cover.
    pub fn request_days(&self) -> u32 {
        self.request_days.load(Ordering::Acquire)
    }

    /// Time of the last completed traversal or show insertion.
    pub fn last_updated(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_updated_ms.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    /// Number of indexed shows.
    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    /// Total number of episodes across all shows.
    pub fn episode_count(&self) -> usize {
        self.shows.iter().map(|entry| entry.value().episode_count()).sum()
    }

    /// Record that a traversal covering `request_days` days has finished.
    pub fn mark_complete(&self, request_days: u32) {
        self.mark_complete_at(request_days, Utc::now());
    }

    /// Same as [`mark_complete`](Self::mark_complete) with an explicit clock.
    ///
    /// Coverage only grows: completing a shallower traversal refreshes the
    /// timestamp but keeps the deeper coverage already recorded.
    pub fn mark_complete_at(&self, request_days: u32, at: DateTime<Utc>) {
        self.request_days.fetch_max(request_days, Ordering::AcqRel);
        self.touch(at);
    }

    /// Insert a show unless its identity is already indexed.
    ///
    /// Returns `true` for the single caller that wins the insertion.
    pub fn try_add_show(&self, show: Show) -> bool {
        let inserted = match self.shows.entry(show.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(ShowCache::new(show)));
                true
            }
        };

        if inserted {
            self.touch(Utc::now());
        }
        inserted
    }

    pub fn has_show(&self, id: u32) -> bool {
        self.shows.contains_key(&id)
    }

    /// Look up the cache entry for a show.
    pub fn get_show(&self, id: u32) -> Option<Arc<ShowCache>> {
        self.shows.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of every indexed show, ordered by identity.
    pub fn shows(&self) -> Vec<Arc<ShowCache>> {
        let mut shows: Vec<_> = self
            .shows
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        shows.sort_by_key(|cache| cache.show().id);
        shows
    }

    fn touch(&self, at: DateTime<Utc>) {
        self.last_updated_ms
            .fetch_max(at.timestamp_millis(), Ordering::AcqRel);
    }
}

/// A show together with the episodes observed under it.
#[derive(Debug)]
pub struct ShowCache {
    show: Show,
    episodes: DashMap<u32, Arc<Episode>>,
}

impl ShowCache {
    pub fn new(show: Show) -> Self {
        Self {
            show,
            episodes: DashMap::new(),
        }
    }

    pub fn show(&self) -> &Show {
        &self.show
    }

    pub fn has_episode(&self, id: u32) -> bool {
        self.episodes.contains_key(&id)
    }

    /// Add an episode. The first observation of an identity wins; later
    /// duplicates are ignored and `false` is returned.
    pub fn add_episode(&self, episode: impl Into<Arc<Episode>>) -> bool {
        let episode = episode.into();
        match self.episodes.entry(episode.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(episode);
                true
            }
        }
    }

    pub fn get_episode(&self, id: u32) -> Option<Arc<Episode>> {
        self.episodes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// Snapshot of the owned episodes, ordered by identity.
    pub fn episodes(&self) -> Vec<Arc<Episode>> {
        let mut episodes: Vec<_> = self
            .episodes
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        episodes.sort_by_key(|episode| episode.id);
        episodes
    }

    /// Episode with the latest airing date.
    ///
    /// Ties on airing date go to the highest episode identity.
    pub fn latest_episode(&self) -> Option<Arc<Episode>> {
        self.episodes
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .max_by_key(|episode| (episode.airing_date, episode.id))
    }
}
