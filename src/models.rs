use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Playlist metadata as returned by the `playlists/{id}` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInfo {
    pub name: String,
    pub owner: Owner,
    pub followers: Followers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Followers {
    pub total: u64,
}

/// One page of the `playlists/{id}/tracks` collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracksPage {
    pub items: Vec<RawTrackItem>,
    /// URL of the following page, absent on the last one
    pub next: Option<String>,
}

/// A playlist entry. `track` is null for tracks that were removed from the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrackItem {
    #[serde(default)]
    pub track: Option<RawTrack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    pub album: RawAlbum,
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlbum {
    pub name: String,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Token response of the client-credentials grant
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Release date with the precision the provider knows it at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseDate {
    Year(i32),
    YearMonth(i32, u32),
    Day(NaiveDate),
}

impl ReleaseDate {
    pub fn year(&self) -> i32 {
        match self {
            ReleaseDate::Year(y) | ReleaseDate::YearMonth(y, _) => *y,
            ReleaseDate::Day(d) => d.year(),
        }
    }
}

impl FromStr for ReleaseDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [year] => Ok(ReleaseDate::Year(year.parse()?)),
            [year, month] => {
                let month: u32 = month.parse()?;
                if !(1..=12).contains(&month) {
                    anyhow::bail!("invalid month in release date '{s}'");
                }
                Ok(ReleaseDate::YearMonth(year.parse()?, month))
            }
            [_, _, _] => Ok(ReleaseDate::Day(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)),
            _ => anyhow::bail!("unrecognized release date '{s}'"),
        }
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseDate::Year(y) => write!(f, "{y:04}"),
            ReleaseDate::YearMonth(y, m) => write!(f, "{y:04}-{m:02}"),
            ReleaseDate::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A normalized playlist track, as seen at fetch time
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    /// Artist display names joined with ", "
    pub artist: String,
    pub album: String,
    pub popularity: u8,
    pub duration_ms: u64,
    pub release_date: Option<ReleaseDate>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            id: String::new(),
            name: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            popularity: 0,
            duration_ms: 0,
            release_date: None,
            preview_url: None,
            external_url: None,
        }
    }
}

/// One fetch's complete view of the playlist
#[derive(Debug, Clone)]
pub struct PlaylistSnapshot {
    pub id: String,
    pub name: String,
    pub owner_display_name: String,
    pub follower_count: u64,
    pub tracks: Vec<Track>,
}

/// Playlist-level aggregate for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDailyRecord {
    pub date: NaiveDate,
    pub saves: u64,
    pub total_tracks: usize,
    /// None when the day's snapshot had no tracks
    pub avg_popularity: Option<f64>,
}

/// Popularity of one track on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDailyRecord {
    pub date: NaiveDate,
    pub track_id: String,
    pub track_name: String,
    pub artist: String,
    pub popularity: u8,
}
