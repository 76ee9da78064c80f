// End-to-end refresh scenarios: mocked provider, real CSV store, fixed clock

use std::time::Duration;

use chrono::NaiveDate;

use crate::models::{
    Followers, Owner, PlaylistInfo, RawAlbum, RawArtist, RawTrack, RawTrackItem, TracksPage,
};
use crate::tracker::{FixedClock, HistoricalStore, MockMetadataProvider, PlaylistTracker, TrendDeriver};

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn info(followers: u64) -> PlaylistInfo {
        PlaylistInfo {
            name: "South African Hits".to_string(),
            owner: Owner {
                display_name: Some("curator".to_string()),
            },
            followers: Followers { total: followers },
        }
    }

    fn item(id: &str, popularity: u8) -> RawTrackItem {
        RawTrackItem {
            track: Some(RawTrack {
                id: Some(id.to_string()),
                name: format!("Track {id}"),
                artists: vec![
                    RawArtist { name: "Uncle Waffles".to_string() },
                    RawArtist { name: "Tony Duardo".to_string() },
                ],
                album: RawAlbum {
                    name: "Red Dragon".to_string(),
                    release_date: Some("2023-04-28".to_string()),
                },
                popularity,
                duration_ms: 240_000,
                ..Default::default()
            }),
        }
    }

    /// Two pages with a removed track in the middle of the first one
    fn expect_two_pages(provider: &mut MockMetadataProvider) {
        provider
            .expect_get_tracks_page()
            .withf(|_, cursor| cursor.is_none())
            .returning(|_, _| {
                Ok(TracksPage {
                    items: vec![item("a", 70), RawTrackItem { track: None }, item("b", 50)],
                    next: Some("page-2".to_string()),
                })
            });
        provider
            .expect_get_tracks_page()
            .withf(|_, cursor| cursor.as_deref() == Some("page-2"))
            .returning(|_, _| {
                Ok(TracksPage {
                    items: vec![item("c", 30)],
                    next: None,
                })
            });
    }

    #[test]
    fn test_refresh_records_once_and_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMetadataProvider::new();
        provider.expect_get_playlist().times(1).returning(|_| Ok(info(42)));
        expect_two_pages(&mut provider);

        let mut tracker = PlaylistTracker::new(
            provider,
            HistoricalStore::new(dir.path()),
            FixedClock(date("2024-06-01")),
            Duration::from_secs(3600),
        );

        let first = tracker.refresh("pl").unwrap();
        assert!(first.appended);
        assert_eq!(first.snapshot.tracks.len(), 3);
        assert_eq!(first.snapshot.tracks[0].artist, "Uncle Waffles, Tony Duardo");
        assert_eq!(first.history.playlist.len(), 1);
        assert_eq!(first.history.playlist[0].total_tracks, 3);
        assert_eq!(first.history.playlist[0].avg_popularity, Some(50.0));
        assert_eq!(first.history.tracks.len(), 3);

        // Served from the cache: get_playlist is expected exactly once
        let second = tracker.refresh("pl").unwrap();
        assert!(!second.appended);
        assert_eq!(second.history, first.history);
    }

    #[test]
    fn test_cached_refresh_still_reloads_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMetadataProvider::new();
        provider.expect_get_playlist().times(1).returning(|_| Ok(info(42)));
        expect_two_pages(&mut provider);

        let store = HistoricalStore::new(dir.path());
        let mut tracker = PlaylistTracker::new(
            provider,
            store.clone(),
            FixedClock(date("2024-06-01")),
            Duration::from_secs(3600),
        );
        tracker.refresh("pl").unwrap();

        // Another writer empties the tables while the snapshot is still cached
        store.save(&Default::default()).unwrap();

        let second = tracker.refresh("pl").unwrap();
        assert!(second.appended);
        assert_eq!(second.history.playlist.len(), 1);
        assert_eq!(store.load().unwrap().playlist.len(), 1);
    }

    #[test]
    fn test_first_call_of_the_day_wins_then_next_day_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMetadataProvider::new();
        let mut calls = 0;
        provider.expect_get_playlist().times(3).returning(move |_| {
            calls += 1;
            Ok(info(if calls == 1 { 10 } else { 20 }))
        });
        expect_two_pages(&mut provider);

        let mut tracker = PlaylistTracker::new(
            provider,
            HistoricalStore::new(dir.path()),
            FixedClock(date("2024-06-01")),
            Duration::ZERO,
        );

        tracker.refresh("pl").unwrap();
        let same_day = tracker.refresh("pl").unwrap();
        assert!(!same_day.appended);
        // The in-memory view is fresh even though nothing was recorded
        assert_eq!(same_day.snapshot.follower_count, 20);

        let persisted = tracker.store().load().unwrap();
        assert_eq!(persisted.playlist.len(), 1);
        assert_eq!(persisted.playlist[0].saves, 10);

        tracker.clock_mut().0 = date("2024-06-02");
        let next_day = tracker.refresh("pl").unwrap();
        assert!(next_day.appended);

        let history = tracker.store().load().unwrap();
        assert_eq!(history.playlist.len(), 2);
        assert!(history.unsynced_dates().is_empty());
        for record in &history.playlist {
            let rows = history.tracks.iter().filter(|t| t.date == record.date).count();
            assert_eq!(rows, record.total_tracks);
        }

        let series = TrendDeriver::derive_growth(&history.playlist);
        let growth: Vec<i64> = series.rows.iter().map(|r| r.daily_growth).collect();
        assert_eq!(growth, vec![0, 10]);
        assert_eq!(series.summary().unwrap().total_growth, 10);
    }

    #[test]
    fn test_provider_failure_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = MockMetadataProvider::new();
        provider.expect_get_playlist().returning(|_| Ok(info(5)));
        provider
            .expect_get_tracks_page()
            .withf(|_, cursor| cursor.is_none())
            .returning(|_, _| {
                Ok(TracksPage {
                    items: vec![item("a", 1)],
                    next: Some("page-2".to_string()),
                })
            });
        provider
            .expect_get_tracks_page()
            .withf(|_, cursor| cursor.is_some())
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let store = HistoricalStore::new(dir.path());
        let mut tracker = PlaylistTracker::new(
            provider,
            store.clone(),
            FixedClock(date("2024-06-01")),
            Duration::from_secs(3600),
        );

        assert!(tracker.refresh("pl").is_err());
        assert!(!store.playlist_path().exists());
        assert!(!store.track_path().exists());
    }
}
