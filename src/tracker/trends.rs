use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{PlaylistDailyRecord, TrackDailyRecord};

/// One day of the growth series
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRow {
    pub date: NaiveDate,
    pub saves: u64,
    pub avg_popularity: Option<f64>,
    /// Change in saves since the previous row; 0 on the first row
    pub daily_growth: i64,
    /// Percentage change since the previous row; 0 on the first row
    pub growth_rate: f64,
}

/// Whole-series aggregates, only defined with two or more days
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub total_growth: i64,
    pub avg_daily_growth: f64,
    pub overall_growth_rate: f64,
    pub days_tracked: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthSeries {
    pub rows: Vec<GrowthRow>,
}

impl GrowthSeries {
    /// Latest saves count, if anything was recorded
    pub fn current_saves(&self) -> Option<u64> {
        self.rows.last().map(|r| r.saves)
    }

    pub fn summary(&self) -> Option<GrowthSummary> {
        let (first, last) = match self.rows.as_slice() {
            [first, .., last] => (first, last),
            _ => return None,
        };

        let growth: Vec<i64> = self.rows[1..].iter().map(|r| r.daily_growth).collect();
        let avg_daily_growth = growth.iter().sum::<i64>() as f64 / growth.len() as f64;

        Some(GrowthSummary {
            total_growth: last.saves as i64 - first.saves as i64,
            avg_daily_growth,
            overall_growth_rate: percent_change(first.saves, last.saves),
            days_tracked: self.rows.len(),
        })
    }
}

/// Growth computations over the accumulated history
pub struct TrendDeriver;

impl TrendDeriver {
    /// Day-over-day growth of the playlist table, sorted by date
    pub fn derive_growth(records: &[PlaylistDailyRecord]) -> GrowthSeries {
        let mut sorted: Vec<&PlaylistDailyRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let mut rows = Vec::with_capacity(sorted.len());
        let mut previous: Option<u64> = None;
        for record in sorted {
            let (daily_growth, growth_rate) = match previous {
                Some(prev) => (
                    record.saves as i64 - prev as i64,
                    percent_change(prev, record.saves),
                ),
                None => (0, 0.0),
            };
            rows.push(GrowthRow {
                date: record.date,
                saves: record.saves,
                avg_popularity: record.avg_popularity,
                daily_growth,
                growth_rate,
            });
            previous = Some(record.saves);
        }

        GrowthSeries { rows }
    }

    /// Date-ordered popularity series for each requested track id, one point per date.
    /// When an id has several rows on one date (a track listed twice, local files
    /// without an id) the first row of that date is kept. Ids with no history are left out.
    pub fn track_popularity_trend(
        records: &[TrackDailyRecord],
        track_ids: &[String],
    ) -> BTreeMap<String, Vec<(NaiveDate, u8)>> {
        let mut trends: BTreeMap<String, Vec<(NaiveDate, u8)>> = BTreeMap::new();
        for record in records.iter().filter(|r| track_ids.contains(&r.track_id)) {
            trends
                .entry(record.track_id.clone())
                .or_default()
                .push((record.date, record.popularity));
        }
        for series in trends.values_mut() {
            series.sort_by_key(|(date, _)| *date);
            series.dedup_by_key(|(date, _)| *date);
        }
        trends
    }
}

/// Percentage change from `from` to `to`; 0 when `from` is 0
fn percent_change(from: u64, to: u64) -> f64 {
    if from == 0 {
        return 0.0;
    }
    (to as f64 / from as f64 - 1.0) * 100.0
}
