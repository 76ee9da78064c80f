use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::clock::Clock;
use super::store::{HistoricalStore, History};
use crate::models::{PlaylistDailyRecord, PlaylistSnapshot, TrackDailyRecord};

/// Outcome of one accumulation attempt
#[derive(Debug, Clone)]
pub struct Accumulation {
    pub date: NaiveDate,
    pub history: History,
    /// False when the day was already recorded and nothing was written
    pub appended: bool,
}

/// Appends at most one snapshot per calendar day to the historical store.
///
/// The check for an existing record and the append are not guarded against
/// other processes writing the same store concurrently.
pub struct DailyAccumulator<'a, C: Clock> {
    store: &'a HistoricalStore,
    clock: C,
}

impl<'a, C: Clock> DailyAccumulator<'a, C> {
    pub fn new(store: &'a HistoricalStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Record today's snapshot unless today is already in the store.
    /// The first call of the day wins; later calls return the stored history untouched.
    pub fn accumulate(&self, snapshot: &PlaylistSnapshot) -> Result<Accumulation> {
        let today = self.clock.today();
        let mut history = self
            .store
            .load()
            .context("Failed to load historical data")?;

        if history.contains_date(today) {
            log::debug!("Stats for {today} already recorded, skipping");
            return Ok(Accumulation {
                date: today,
                history,
                appended: false,
            });
        }

        let record = daily_record(today, snapshot);
        let batch = track_records(today, snapshot);
        log::info!(
            "Recording {}: {} saves, {} tracks",
            today,
            record.saves,
            record.total_tracks
        );

        history.append_day(record, batch);
        self.store
            .save(&history)
            .context("Failed to save historical data")?;

        Ok(Accumulation {
            date: today,
            history,
            appended: true,
        })
    }
}

/// Playlist-level aggregate of a snapshot for `date`
pub fn daily_record(date: NaiveDate, snapshot: &PlaylistSnapshot) -> PlaylistDailyRecord {
    PlaylistDailyRecord {
        date,
        saves: snapshot.follower_count,
        total_tracks: snapshot.tracks.len(),
        avg_popularity: mean_popularity(snapshot),
    }
}

/// One popularity row per track of the snapshot, all dated `date`
pub fn track_records(date: NaiveDate, snapshot: &PlaylistSnapshot) -> Vec<TrackDailyRecord> {
    snapshot
        .tracks
        .iter()
        .map(|track| TrackDailyRecord {
            date,
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist: track.artist.clone(),
            popularity: track.popularity,
        })
        .collect()
}

/// None for an empty playlist
fn mean_popularity(snapshot: &PlaylistSnapshot) -> Option<f64> {
    if snapshot.tracks.is_empty() {
        return None;
    }
    let total: u64 = snapshot.tracks.iter().map(|t| u64::from(t.popularity)).sum();
    Some(total as f64 / snapshot.tracks.len() as f64)
}
