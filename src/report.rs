use std::fmt::Write;

use crate::tracker::{Dashboard, Distribution, SnapshotAnalysis, TrendDeriver};

/// Rows of the growth table shown in the report
const GROWTH_ROWS_SHOWN: usize = 14;

const POPULARITY_BINS: usize = 20;

/// Width of the longest histogram bar
const BAR_WIDTH: usize = 30;

/// Render the dashboard as plain text. `top` bounds the track and artist rankings.
pub fn render(dashboard: &Dashboard, top: usize) -> String {
    let mut out = String::new();
    let snapshot = &dashboard.snapshot;
    let tracks = &snapshot.tracks;

    let _ = writeln!(out, "{}", snapshot.name);
    let _ = writeln!(out, "{}", "=".repeat(snapshot.name.chars().count()));
    let _ = writeln!(
        out,
        "Owner: {} | Tracks: {} | Followers: {} | Id: {}",
        snapshot.owner_display_name,
        tracks.len(),
        group_thousands(snapshot.follower_count),
        snapshot.id
    );
    if dashboard.appended {
        let _ = writeln!(out, "Recorded stats for {}.", dashboard.date);
    } else {
        let _ = writeln!(out, "Stats for {} were already recorded.", dashboard.date);
    }

    // Growth
    let _ = writeln!(out, "\n📈 Growth");
    let series = TrendDeriver::derive_growth(&dashboard.history.playlist);
    match series.summary() {
        Some(summary) => {
            let skip = series.rows.len().saturating_sub(GROWTH_ROWS_SHOWN);
            for row in &series.rows[skip..] {
                let avg = row
                    .avg_popularity
                    .map(|p| format!("{p:.1}"))
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "   {} | saves {:>8} | {:>+6} ({:>+6.1}%) | avg popularity {}",
                    row.date, row.saves, row.daily_growth, row.growth_rate, avg
                );
            }
            let _ = writeln!(
                out,
                "   Total growth: {:+} | Avg daily growth: {:+.1} | Overall growth rate: {:.1}% | Days tracked: {}",
                summary.total_growth,
                summary.avg_daily_growth,
                summary.overall_growth_rate,
                summary.days_tracked
            );
        }
        None => {
            let _ = writeln!(
                out,
                "   Growth tracking will be available after collecting data for multiple days."
            );
            let _ = writeln!(
                out,
                "   Current saves: {}",
                group_thousands(snapshot.follower_count)
            );
        }
    }

    // Track popularity
    let top_tracks = SnapshotAnalysis::top_tracks(tracks, top);
    if !top_tracks.is_empty() {
        let _ = writeln!(out, "\n🎯 Top {} tracks by popularity", top_tracks.len());
        for (i, track) in top_tracks.iter().enumerate() {
            let _ = writeln!(
                out,
                "   {:>2}. [{:>3}] \"{}\" by {}",
                i + 1,
                track.popularity,
                track.name,
                track.artist
            );
        }
    }

    let trend_ids: Vec<String> = top_tracks.iter().take(5).map(|t| t.id.clone()).collect();
    let trends = TrendDeriver::track_popularity_trend(&dashboard.history.tracks, &trend_ids);
    if trends.values().any(|series| series.len() > 1) {
        let _ = writeln!(out, "\nPopularity trends");
        for track in top_tracks.iter().take(5) {
            if let Some(series) = trends.get(&track.id) {
                let points: Vec<String> = series.iter().map(|(_, p)| p.to_string()).collect();
                let _ = writeln!(out, "   {}: {}", track.name, points.join(" → "));
            }
        }
    }

    // Playlist composition
    let _ = writeln!(out, "\n📊 Playlist analysis");
    write_distribution(
        &mut out,
        "Popularity",
        SnapshotAnalysis::popularity_summary(tracks),
    );
    write_distribution(
        &mut out,
        "Duration (min)",
        SnapshotAnalysis::duration_minutes_summary(tracks),
    );
    if !tracks.is_empty() {
        let _ = writeln!(out, "   Popularity distribution:");
        write_histogram(
            &mut out,
            &SnapshotAnalysis::popularity_histogram(tracks, POPULARITY_BINS),
        );
    }

    let artists = SnapshotAnalysis::artist_counts(tracks, top);
    if !artists.is_empty() {
        let listed: Vec<String> = artists
            .iter()
            .map(|(artist, count)| format!("{artist} ({count})"))
            .collect();
        let _ = writeln!(out, "   Top artists: {}", listed.join(", "));
    }

    let years = SnapshotAnalysis::release_year_counts(tracks);
    if !years.is_empty() {
        let listed: Vec<String> = years
            .iter()
            .map(|(year, count)| format!("{year}: {count}"))
            .collect();
        let _ = writeln!(out, "   Tracks by release year: {}", listed.join(", "));
    }

    out
}

fn write_distribution(out: &mut String, label: &str, distribution: Option<Distribution>) {
    match distribution {
        Some(d) => {
            let _ = writeln!(
                out,
                "   {label}: min {:.1} | q1 {:.1} | median {:.1} | q3 {:.1} | max {:.1} | mean {:.1}",
                d.min, d.q1, d.median, d.q3, d.max, d.mean
            );
        }
        None => {
            let _ = writeln!(out, "   {label}: no tracks");
        }
    }
}

/// One text bar per bucket of a 0..=100 histogram, scaled to the fullest bucket
fn write_histogram(out: &mut String, histogram: &[usize]) {
    let bins = histogram.len();
    let fullest = histogram.iter().copied().max().unwrap_or(0).max(1);
    for (i, count) in histogram.iter().enumerate() {
        let low = i * 100 / bins;
        let high = (i + 1) * 100 / bins;
        let bar = "█".repeat((count * BAR_WIDTH).div_ceil(fullest));
        let _ = writeln!(out, "   {low:>3}-{high:<3} | {bar} {count}");
    }
}

/// 1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
