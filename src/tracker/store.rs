use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{PlaylistDailyRecord, TrackDailyRecord};

pub const PLAYLIST_HISTORY_FILE: &str = "playlist_history.csv";
pub const TRACK_HISTORY_FILE: &str = "track_popularity_history.csv";

pub const PLAYLIST_COLUMNS: [&str; 4] = ["date", "saves", "total_tracks", "avg_popularity"];
pub const TRACK_COLUMNS: [&str; 5] = ["date", "track_id", "track_name", "artist", "popularity"];

/// The two accumulated time series, in append order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub playlist: Vec<PlaylistDailyRecord>,
    pub tracks: Vec<TrackDailyRecord>,
}

impl History {
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.playlist.iter().any(|r| r.date == date)
    }

    /// Append one day's playlist record together with its track batch
    pub fn append_day(&mut self, record: PlaylistDailyRecord, batch: Vec<TrackDailyRecord>) {
        self.playlist.push(record);
        self.tracks.extend(batch);
    }

    /// Dates where the track table's row count disagrees with the playlist record
    pub fn unsynced_dates(&self) -> Vec<NaiveDate> {
        let mut track_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for record in &self.tracks {
            *track_counts.entry(record.date).or_default() += 1;
        }

        let mut unsynced: Vec<NaiveDate> = self
            .playlist
            .iter()
            .filter(|r| track_counts.get(&r.date).copied().unwrap_or(0) != r.total_tracks)
            .map(|r| r.date)
            .collect();

        // Track rows for a day the playlist table never recorded
        unsynced.extend(
            track_counts
                .keys()
                .filter(|date| !self.contains_date(**date))
                .copied(),
        );

        unsynced.sort();
        unsynced.dedup();
        unsynced
    }
}

/// Durable storage of the history as two CSV tables in one directory
#[derive(Debug, Clone)]
pub struct HistoricalStore {
    playlist_path: PathBuf,
    track_path: PathBuf,
}

impl HistoricalStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        HistoricalStore {
            playlist_path: dir.join(PLAYLIST_HISTORY_FILE),
            track_path: dir.join(TRACK_HISTORY_FILE),
        }
    }

    pub fn playlist_path(&self) -> &Path {
        &self.playlist_path
    }

    pub fn track_path(&self) -> &Path {
        &self.track_path
    }

    /// Load both tables. Missing files are an empty history, not an error.
    pub fn load(&self) -> Result<History> {
        let history = History {
            playlist: read_table(&self.playlist_path, &PLAYLIST_COLUMNS)?,
            tracks: read_table(&self.track_path, &TRACK_COLUMNS)?,
        };

        let unsynced = history.unsynced_dates();
        if !unsynced.is_empty() {
            log::warn!(
                "Playlist and track history disagree on {} date(s): {:?}",
                unsynced.len(),
                unsynced
            );
        }

        Ok(history)
    }

    /// Overwrite both tables with `history`.
    ///
    /// Both tables are written to temporary files first and only renamed over
    /// the originals once both writes succeeded.
    pub fn save(&self, history: &History) -> Result<()> {
        for path in [&self.playlist_path, &self.track_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let playlist_tmp = write_temp_table(&self.playlist_path, &PLAYLIST_COLUMNS, &history.playlist)?;
        let track_tmp = match write_temp_table(&self.track_path, &TRACK_COLUMNS, &history.tracks) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&playlist_tmp);
                return Err(e);
            }
        };

        fs::rename(&playlist_tmp, &self.playlist_path)
            .with_context(|| format!("Failed to replace {}", self.playlist_path.display()))?;
        fs::rename(&track_tmp, &self.track_path)
            .with_context(|| format!("Failed to replace {}", self.track_path.display()))?;

        log::debug!(
            "Saved {} playlist rows and {} track rows",
            history.playlist.len(),
            history.tracks.len()
        );
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_table<T: DeserializeOwned>(path: &Path, columns: &[&str]) -> Result<Vec<T>> {
    if !path.exists() {
        log::debug!("{} not found, starting with an empty table", path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if headers.iter().collect::<Vec<_>>() != columns {
        anyhow::bail!(
            "Unexpected columns in {}: expected [{}], found [{}]",
            path.display(),
            columns.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        );
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            // +2: one-based, after the header line
            row.with_context(|| format!("Invalid row {} in {}", i + 2, path.display()))
        })
        .collect()
}

/// Write a full table next to `path` and return the temporary file's path
fn write_temp_table<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<PathBuf> {
    let tmp = temp_path(path);
    let write = || -> Result<()> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        writer.write_record(columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(e.context(format!("Failed to write {}", tmp.display())));
    }
    Ok(tmp)
}
