use std::collections::{BTreeMap, HashMap};

use crate::models::Track;

/// Five-number summary plus mean
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl Distribution {
    /// None for an empty sample
    pub fn from_values(values: &[f64]) -> Option<Distribution> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Distribution {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Composition statistics of a single snapshot's tracks
pub struct SnapshotAnalysis;

impl SnapshotAnalysis {
    /// The `n` most popular tracks, most popular first; ties keep playlist order
    pub fn top_tracks(tracks: &[Track], n: usize) -> Vec<&Track> {
        let mut ranked: Vec<&Track> = tracks.iter().collect();
        ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        ranked.truncate(n);
        ranked
    }

    /// Artists (display strings) with the most tracks, most tracks first.
    /// Ties are ordered by name.
    pub fn artist_counts(tracks: &[Track], n: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for track in tracks {
            *counts.entry(track.artist.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(artist, count)| (artist.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn popularity_summary(tracks: &[Track]) -> Option<Distribution> {
        let values: Vec<f64> = tracks.iter().map(|t| f64::from(t.popularity)).collect();
        Distribution::from_values(&values)
    }

    pub fn duration_minutes_summary(tracks: &[Track]) -> Option<Distribution> {
        let values: Vec<f64> = tracks
            .iter()
            .map(|t| t.duration_ms as f64 / 60_000.0)
            .collect();
        Distribution::from_values(&values)
    }

    /// Track count per release year; tracks without a release date are skipped
    pub fn release_year_counts(tracks: &[Track]) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for year in tracks.iter().filter_map(|t| t.release_date.map(|d| d.year())) {
            *counts.entry(year).or_insert(0) += 1;
        }
        counts
    }

    /// Track counts over `bins` equal-width popularity buckets covering 0..=100.
    /// The last bucket includes 100.
    pub fn popularity_histogram(tracks: &[Track], bins: usize) -> Vec<usize> {
        let bins = bins.max(1);
        let mut histogram = vec![0; bins];
        for track in tracks {
            let bucket = (usize::from(track.popularity.min(100)) * bins / 100).min(bins - 1);
            histogram[bucket] += 1;
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReleaseDate;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn track(id: &str, artist: &str, popularity: u8, duration_ms: u64) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {id}"),
            artist: artist.to_string(),
            popularity,
            duration_ms,
            ..Default::default()
        }
    }

    fn sample() -> Vec<Track> {
        vec![
            track("a", "Tyla", 80, 180_000),
            track("b", "Kabza De Small", 65, 420_000),
            track("c", "Tyla", 92, 210_000),
            track("d", "Black Coffee", 65, 360_000),
            track("e", "Kabza De Small", 40, 300_000),
        ]
    }

    #[test]
    fn test_top_tracks() {
        let tracks = sample();
        let top: Vec<&str> = SnapshotAnalysis::top_tracks(&tracks, 3)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(top, vec!["c", "a", "b"]);
        assert_eq!(SnapshotAnalysis::top_tracks(&tracks, 50).len(), 5);
    }

    #[test]
    fn test_artist_counts() {
        let counts = SnapshotAnalysis::artist_counts(&sample(), 15);
        assert_eq!(
            counts,
            vec![
                ("Kabza De Small".to_string(), 2),
                ("Tyla".to_string(), 2),
                ("Black Coffee".to_string(), 1),
            ]
        );
        assert_eq!(SnapshotAnalysis::artist_counts(&sample(), 1).len(), 1);
    }

    #[test]
    fn test_popularity_summary() {
        let summary = SnapshotAnalysis::popularity_summary(&sample()).unwrap();
        assert_eq!(summary.count, 5);
        assert_relative_eq!(summary.min, 40.0);
        assert_relative_eq!(summary.q1, 65.0);
        assert_relative_eq!(summary.median, 65.0);
        assert_relative_eq!(summary.q3, 80.0);
        assert_relative_eq!(summary.max, 92.0);
        assert_relative_eq!(summary.mean, 68.4, epsilon = 1e-9);
        assert!(SnapshotAnalysis::popularity_summary(&[]).is_none());
    }

    #[test]
    fn test_duration_summary_in_minutes() {
        let summary = SnapshotAnalysis::duration_minutes_summary(&sample()).unwrap();
        assert_relative_eq!(summary.min, 3.0);
        assert_relative_eq!(summary.max, 7.0);
        assert_relative_eq!(summary.median, 5.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let summary = Distribution::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(summary.q1, 1.75);
        assert_relative_eq!(summary.median, 2.5);
        assert_relative_eq!(summary.q3, 3.25);
    }

    #[test]
    fn test_release_year_counts() {
        let mut tracks = sample();
        tracks[0].release_date = Some(ReleaseDate::Year(2023));
        tracks[1].release_date = Some(ReleaseDate::YearMonth(2020, 3));
        tracks[2].release_date = Some(ReleaseDate::Day(
            NaiveDate::from_ymd_opt(2023, 8, 4).unwrap(),
        ));

        let counts = SnapshotAnalysis::release_year_counts(&tracks);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(2020, 1), (2023, 2)]);
    }

    #[test]
    fn test_popularity_histogram() {
        let mut tracks = sample();
        tracks.push(track("f", "X", 100, 1));
        tracks.push(track("g", "Y", 0, 1));

        let histogram = SnapshotAnalysis::popularity_histogram(&tracks, 5);
        // buckets: [0,20) [20,40) [40,60) [60,80) [80,100]
        assert_eq!(histogram, vec![1, 0, 1, 2, 3]);
        assert_eq!(histogram.iter().sum::<usize>(), tracks.len());
    }
}
