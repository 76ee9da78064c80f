use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;

use super::accumulator::DailyAccumulator;
use super::cache::TtlCache;
use super::clock::Clock;
use super::fetcher::{MetadataProvider, fetch_snapshot};
use super::store::{HistoricalStore, History};
use crate::models::PlaylistSnapshot;

/// Everything the report needs from one refresh
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub snapshot: PlaylistSnapshot,
    pub history: History,
    /// Calendar day the refresh was accounted to
    pub date: NaiveDate,
    /// True when this refresh recorded today's stats
    pub appended: bool,
}

/// Fetches a playlist (through the snapshot cache) and feeds it to the daily accumulator
pub struct PlaylistTracker<P: MetadataProvider, C: Clock> {
    provider: P,
    store: HistoricalStore,
    clock: C,
    cache: TtlCache<String, PlaylistSnapshot>,
}

impl<P: MetadataProvider, C: Clock> PlaylistTracker<P, C> {
    pub fn new(provider: P, store: HistoricalStore, clock: C, cache_ttl: Duration) -> Self {
        Self {
            provider,
            store,
            clock,
            cache: TtlCache::new(cache_ttl),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &HistoricalStore {
        &self.store
    }

    #[cfg(test)]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Snapshot of `playlist_id`, from the cache when it is still fresh
    pub fn snapshot(&mut self, playlist_id: &str) -> Result<PlaylistSnapshot> {
        let now = Instant::now();
        self.cache.purge_expired(now);
        let key = playlist_id.to_string();
        if let Some(snapshot) = self.cache.get(&key, now) {
            log::debug!("Using cached snapshot of {playlist_id}");
            return Ok(snapshot.clone());
        }

        log::info!("Fetching playlist {playlist_id}");
        let snapshot = fetch_snapshot(&self.provider, playlist_id)?;
        log::info!(
            "Fetched '{}': {} tracks, {} followers",
            snapshot.name,
            snapshot.tracks.len(),
            snapshot.follower_count
        );
        self.cache.insert(key, snapshot.clone(), now);
        Ok(snapshot)
    }

    /// Fetch, record today's stats if not yet recorded, and return the combined view.
    /// Only the snapshot is cached; the history is reloaded from the store on every call.
    /// A provider failure aborts before anything is recorded.
    pub fn refresh(&mut self, playlist_id: &str) -> Result<Dashboard> {
        let snapshot = self.snapshot(playlist_id)?;
        let accumulation = DailyAccumulator::new(&self.store, &self.clock).accumulate(&snapshot)?;
        log::debug!(
            "History for {}: {} days, {} track rows",
            accumulation.date,
            accumulation.history.playlist.len(),
            accumulation.history.tracks.len()
        );

        Ok(Dashboard {
            snapshot,
            history: accumulation.history,
            date: accumulation.date,
            appended: accumulation.appended,
        })
    }
}
