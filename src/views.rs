//! # Dashboard Views
//!
//! Read-only summaries built from the canonical table with the primitives in
//! [`crate::aggregate`]. Each view is a plain struct so the report layer and
//! the JSON export can render it however they like.
//!
//! ## Views
//!
//! - [`overview`]: totals and top-N rankings
//! - [`hour_profile`] / [`heatmap`]: when the listening happens
//! - [`compare_years`]: side-by-side years, only for multi-year sessions
//! - [`evolution`]: monthly trends
//! - [`monthly_by_year`]: one measure per month, split by year
//! - [`artist_profile`]: one artist's tracks

use crate::aggregate::{
    bucket_by_hour_period, count_by, play_tallies, rank_counts, sum_by, top_by, Dimension,
    EventFilter, HourPeriod, Metric,
};
use crate::record::{PlaybackEvent, WEEKDAYS};
use crate::table::CanonicalTable;
use chrono::Weekday;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Share of the heatmap maximum a cell must exceed to count as hot.
pub const HOT_CELL_RATIO: f64 = 0.7;

/// Trailing window of the monthly moving average, in months.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// Artists listed per year by [`compare_years`] in the CLI.
pub const YEAR_TOP_ARTISTS: usize = 5;

/// All-time top artists followed month by month in [`evolution`].
pub const EVOLUTION_TOP_ARTISTS: usize = 3;

/// Most recent years picked by [`default_years`].
pub const DEFAULT_TREND_YEARS: usize = 2;

/// Names offered by [`suggest`] when the artist lookup misses.
pub const SUGGESTION_LIMIT: usize = 10;

/// Headline numbers of the whole session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub plays: usize,
    pub skipped: usize,
    pub completed: usize,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub total_days: f64,
    pub distinct_tracks: usize,
    pub distinct_artists: usize,
    pub top_artists: Vec<(String, f64)>,
    pub top_tracks: Vec<(String, f64)>,
    pub top_albums: Vec<(String, f64)>,
    pub top_platforms: Vec<(String, usize)>,
}

/// Totals plus the top `limit` artists, tracks and albums by minutes and
/// platforms by play count.
#[must_use]
pub fn overview(table: &CanonicalTable, limit: usize) -> Overview {
    let skipped = table.iter().filter(|e| e.was_skipped).count();
    let total_hours = table.total_hours();

    Overview {
        plays: table.len(),
        skipped,
        completed: table.len() - skipped,
        total_minutes: table.total_minutes(),
        total_hours,
        total_days: total_hours / 24.0,
        distinct_tracks: table.distinct_tracks().len(),
        distinct_artists: table.distinct_artists().len(),
        top_artists: top_by(table, Dimension::Artist, Metric::Minutes, limit),
        top_tracks: top_by(table, Dimension::Track, Metric::Minutes, limit),
        top_albums: top_by(table, Dimension::Album, Metric::Minutes, limit),
        top_platforms: rank_counts(count_by(table, Dimension::Platform.key()), limit),
    }
}

/// Minutes per hour of day and per period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourProfile {
    pub minutes_by_hour: [f64; 24],
    /// Earliest hour with the most minutes; `None` without timestamped rows.
    pub peak_hour: Option<u32>,
    pub minutes_by_period: Vec<(HourPeriod, f64)>,
}

impl HourProfile {
    #[must_use]
    pub fn peak_period(&self) -> Option<HourPeriod> {
        self.peak_hour.map(bucket_by_hour_period)
    }
}

pub fn hour_profile<'a, I>(rows: I) -> HourProfile
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
{
    let by_hour = sum_by(rows, PlaybackEvent::hour, Metric::Minutes.value());

    let mut minutes_by_hour = [0.0; 24];
    for (&hour, &minutes) in &by_hour {
        if let Some(slot) = minutes_by_hour.get_mut(hour as usize) {
            *slot = minutes;
        }
    }

    let peak_hour = by_hour
        .iter()
        .fold(None, |best: Option<(u32, f64)>, (&hour, &minutes)| match best {
            Some((_, top)) if top >= minutes => best,
            _ => Some((hour, minutes)),
        })
        .map(|(hour, _)| hour);

    let minutes_by_period = HourPeriod::ALL
        .iter()
        .map(|&period| {
            let minutes: f64 = period.hours().map(|hour| minutes_by_hour[hour as usize]).sum();
            (period, minutes)
        })
        .collect();

    HourProfile {
        minutes_by_hour,
        peak_hour,
        minutes_by_period,
    }
}

/// Minutes per weekday (rows, Monday first) and hour (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cells: [[f64; 24]; 7],
}

impl Heatmap {
    #[must_use]
    pub fn max(&self) -> f64 {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .fold(0.0, |max, &value| if value > max { value } else { max })
    }

    #[must_use]
    pub fn cell(&self, weekday: Weekday, hour: u32) -> f64 {
        self.cells[weekday.num_days_from_monday() as usize]
            .get(hour as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Cells strictly above [`HOT_CELL_RATIO`] of the maximum, in weekday
    /// then hour order. Empty when nothing was played.
    #[must_use]
    pub fn hot_cells(&self) -> Vec<(Weekday, u32, f64)> {
        let max = self.max();
        if max <= 0.0 {
            return Vec::new();
        }
        let threshold = max * HOT_CELL_RATIO;

        WEEKDAYS
            .iter()
            .flat_map(|&weekday| {
                (0..24u32).filter_map(move |hour| {
                    let value = self.cell(weekday, hour);
                    (value > threshold).then_some((weekday, hour, value))
                })
            })
            .collect()
    }
}

pub fn heatmap<'a, I>(rows: I) -> Heatmap
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
{
    let sums = sum_by(
        rows,
        |e: &PlaybackEvent| e.calendar.map(|c| (c.weekday.num_days_from_monday(), c.hour)),
        Metric::Minutes.value(),
    );

    let mut cells = [[0.0; 24]; 7];
    for ((day, hour), minutes) in sums {
        cells[day as usize][hour as usize] = minutes;
    }
    Heatmap { cells }
}

/// Details of a single year for side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSnapshot {
    pub year: i32,
    pub top_artists: Vec<(String, f64)>,
    pub minutes_by_hour: BTreeMap<u32, f64>,
    pub skipped: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearComparison {
    /// Every year with data, ascending.
    pub minutes_by_year: Vec<(i32, f64)>,
    /// The two most recent years, older first.
    pub recent: Vec<YearSnapshot>,
}

/// Compare years; `None` unless the session spans more than one.
#[must_use]
pub fn compare_years(table: &CanonicalTable, limit: usize) -> Option<YearComparison> {
    let years = table.years();
    if years.len() < 2 {
        return None;
    }

    let minutes_by_year = sum_by(table, PlaybackEvent::year, Metric::Minutes.value())
        .into_iter()
        .collect();

    let recent = years[years.len() - 2..]
        .iter()
        .map(|&year| {
            let rows = table.filter(|e| e.year() == Some(year));
            let skipped = rows.iter().filter(|e| e.was_skipped).count();
            YearSnapshot {
                year,
                top_artists: top_by(
                    rows.iter().copied(),
                    Dimension::Artist,
                    Metric::Minutes,
                    limit,
                ),
                minutes_by_hour: sum_by(
                    rows.iter().copied(),
                    PlaybackEvent::hour,
                    Metric::Minutes.value(),
                ),
                skipped,
                completed: rows.len() - skipped,
            }
        })
        .collect();

    Some(YearComparison {
        minutes_by_year,
        recent,
    })
}

/// Calendar month key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub fn of(event: &PlaybackEvent) -> Option<Self> {
        event.calendar.map(|c| Self {
            year: c.year,
            month: c.month,
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMinutes {
    pub month: YearMonth,
    pub minutes: f64,
    pub moving_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistTrend {
    pub artist: String,
    pub monthly: Vec<(YearMonth, f64)>,
}

/// Month-by-month view of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evolution {
    pub monthly: Vec<MonthlyMinutes>,
    pub artist_trends: Vec<ArtistTrend>,
    /// Percentage of each month's plays that were offline.
    pub offline_share: Vec<(YearMonth, f64)>,
    /// Percentage of each month's plays that were skipped.
    pub skipped_share: Vec<(YearMonth, f64)>,
}

/// Monthly minutes with a trailing moving average, monthly minutes of the
/// `top_artists` biggest artists, and monthly offline and skip shares.
#[must_use]
pub fn evolution(table: &CanonicalTable, top_artists: usize) -> Evolution {
    let monthly_sums = sum_by(table, YearMonth::of, Metric::Minutes.value());
    let minutes: Vec<f64> = monthly_sums.values().copied().collect();
    let averages = trailing_mean(&minutes, MOVING_AVERAGE_WINDOW);

    let monthly = monthly_sums
        .keys()
        .zip(minutes.iter().zip(averages))
        .map(|(&month, (&minutes, moving_average))| MonthlyMinutes {
            month,
            minutes,
            moving_average,
        })
        .collect();

    let artist_trends = top_by(table, Dimension::Artist, Metric::Minutes, top_artists)
        .into_iter()
        .map(|(artist, _)| {
            let rows = table.filter(|e| e.artist_name.as_deref() == Some(artist.as_str()));
            let monthly = sum_by(rows.iter().copied(), YearMonth::of, Metric::Minutes.value())
                .into_iter()
                .collect();
            ArtistTrend { artist, monthly }
        })
        .collect();

    Evolution {
        monthly,
        artist_trends,
        offline_share: monthly_share(table, |e| e.was_offline),
        skipped_share: monthly_share(table, |e| e.was_skipped),
    }
}

/// Mean of each value and up to `window - 1` values before it.
fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let slice = &values[i.saturating_sub(window - 1)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn monthly_share<P>(table: &CanonicalTable, predicate: P) -> Vec<(YearMonth, f64)>
where
    P: Fn(&PlaybackEvent) -> bool,
{
    let totals = count_by(table, YearMonth::of);
    let hits = count_by(table.filter(|e| predicate(e)), YearMonth::of);

    totals
        .into_iter()
        .map(|(month, total)| {
            let hit = hits.get(&month).copied().unwrap_or(0);
            (month, hit as f64 / total as f64 * 100.0)
        })
        .collect()
}

/// Measure followed by [`monthly_by_year`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendMetric {
    Minutes,
    Plays,
    /// Percentage of the month's plays that were skipped.
    SkippedShare,
}

impl TrendMetric {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Minutes => "Minutes listened",
            Self::Plays => "Plays",
            Self::SkippedShare => "Skipped plays (%)",
        }
    }
}

/// One selected year, month by month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTrend {
    pub year: i32,
    /// Months with plays, ascending.
    pub months: Vec<(u32, f64)>,
}

/// The [`DEFAULT_TREND_YEARS`] most recent years with data, ascending.
#[must_use]
pub fn default_years(table: &CanonicalTable) -> Vec<i32> {
    let years = table.years();
    let skip = years.len().saturating_sub(DEFAULT_TREND_YEARS);
    years[skip..].to_vec()
}

/// `metric` per month for each of `years`, in ascending year order.
/// Duplicates are ignored and years without plays are left out.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_by_year(
    table: &CanonicalTable,
    years: &[i32],
    metric: TrendMetric,
) -> Vec<YearTrend> {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();

    years
        .into_iter()
        .filter_map(|year| {
            let rows = EventFilter {
                year: Some(year),
                ..EventFilter::default()
            }
            .apply(table);

            let months: Vec<(u32, f64)> = match metric {
                TrendMetric::Minutes => sum_by(rows, PlaybackEvent::month, Metric::Minutes.value())
                    .into_iter()
                    .collect(),
                TrendMetric::Plays => count_by(rows, PlaybackEvent::month)
                    .into_iter()
                    .map(|(month, plays)| (month, plays as f64))
                    .collect(),
                TrendMetric::SkippedShare => play_tallies(rows, PlaybackEvent::month)
                    .into_iter()
                    .map(|(month, tally)| (month, tally.skips as f64 / tally.plays as f64 * 100.0))
                    .collect(),
            };

            (!months.is_empty()).then_some(YearTrend { year, months })
        })
        .collect()
}

/// Case-insensitive substring matches over `names`, in their given order.
#[must_use]
pub fn suggest<'a>(names: &[&'a str], query: &str, limit: usize) -> Vec<&'a str> {
    let needle = query.to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(limit)
        .copied()
        .collect()
}

/// One artist's tracks ranked by minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistProfile {
    pub artist: String,
    pub tracks: Vec<(String, f64)>,
    pub total_minutes: f64,
    pub mean_minutes_per_track: f64,
}

impl ArtistProfile {
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Profile of an exactly named artist; `None` if they never appear.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn artist_profile(table: &CanonicalTable, artist: &str) -> Option<ArtistProfile> {
    let rows = table.filter(|e| e.artist_name.as_deref() == Some(artist));
    if rows.is_empty() {
        return None;
    }

    let tracks = top_by(rows.iter().copied(), Dimension::Track, Metric::Minutes, usize::MAX);
    let total_minutes: f64 = tracks.iter().map(|(_, minutes)| minutes).sum();
    let mean_minutes_per_track = if tracks.is_empty() {
        0.0
    } else {
        total_minutes / tracks.len() as f64
    };

    Some(ArtistProfile {
        artist: artist.to_string(),
        tracks,
        total_minutes,
        mean_minutes_per_track,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn raw(ts: &str, track: &str, artist: &str, minutes: u64) -> RawRecord {
        RawRecord {
            ts: Some(ts.to_string()),
            ms_played: Some(minutes * 60_000),
            track_name: Some(track.to_string()),
            artist_name: Some(artist.to_string()),
            album_name: Some(format!("{artist} album")),
            skipped: Some(false),
            offline: Some(false),
            platform: Some("android".to_string()),
        }
    }

    fn multi_year_table() -> CanonicalTable {
        let mut records = vec![
            raw("2023-11-06T08:00:00Z", "Old", "Veteran", 10),
            raw("2024-01-01T08:00:00Z", "A", "X", 5),
            raw("2024-01-01T08:30:00Z", "B", "X", 3),
            raw("2024-02-05T21:00:00Z", "C", "Y", 4),
            raw("2024-03-04T21:00:00Z", "A", "X", 2),
        ];
        records[2].skipped = Some(true);
        records[3].offline = Some(true);
        records[4].platform = Some("ios".to_string());
        CanonicalTable::from_raw(&records)
    }

    #[test]
    fn test_overview_totals() {
        let table = multi_year_table();
        let view = overview(&table, 10);

        assert_eq!(view.plays, 5);
        assert_eq!(view.skipped, 1);
        assert_eq!(view.completed, 4);
        assert_eq!(view.total_minutes, 24.0);
        assert!((view.total_days - 24.0 / 60.0 / 24.0).abs() < 1e-9);
        assert_eq!(view.top_artists[0], ("Veteran".to_string(), 10.0));
        assert_eq!(view.top_tracks[0], ("Old".to_string(), 10.0));
        assert_eq!(view.top_platforms[0], ("android".to_string(), 4));
    }

    #[test]
    fn test_hour_profile_peak_and_periods() {
        let table = multi_year_table();
        let profile = hour_profile(&table);

        assert_eq!(profile.minutes_by_hour[8], 18.0);
        assert_eq!(profile.minutes_by_hour[21], 6.0);
        assert_eq!(profile.peak_hour, Some(8));
        assert_eq!(profile.peak_period(), Some(HourPeriod::Morning));

        let total: f64 = profile.minutes_by_period.iter().map(|(_, m)| m).sum();
        assert_eq!(total, 24.0);
    }

    #[test]
    fn test_hour_profile_empty() {
        let profile = hour_profile(&CanonicalTable::default());

        assert_eq!(profile.peak_hour, None);
        assert!(profile.minutes_by_hour.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_heatmap_hot_cells() {
        let table = multi_year_table();
        let map = heatmap(&table);

        // Every 08:00 row is a Monday.
        assert_eq!(map.cell(Weekday::Mon, 8), 18.0);
        assert_eq!(map.max(), 18.0);
        assert_eq!(map.hot_cells(), vec![(Weekday::Mon, 8, 18.0)]);

        assert!(heatmap(&CanonicalTable::default()).hot_cells().is_empty());
    }

    #[test]
    fn test_compare_years_needs_two_years() {
        let single = CanonicalTable::from_raw(&vec![raw("2024-01-01T08:00:00Z", "A", "X", 1)]);
        assert!(compare_years(&single, 5).is_none());

        let comparison = compare_years(&multi_year_table(), 5).expect("two years present");
        assert_eq!(comparison.minutes_by_year, vec![(2023, 10.0), (2024, 14.0)]);
        assert_eq!(comparison.recent.len(), 2);
        assert_eq!(comparison.recent[0].year, 2023);
        assert_eq!(comparison.recent[1].skipped, 1);
        assert_eq!(comparison.recent[1].completed, 3);
        assert_eq!(comparison.recent[1].top_artists[0], ("X".to_string(), 10.0));
    }

    #[test]
    fn test_evolution_moving_average_and_shares() {
        let table = multi_year_table();
        let view = evolution(&table, 3);

        let minutes: Vec<f64> = view.monthly.iter().map(|m| m.minutes).collect();
        assert_eq!(minutes, vec![10.0, 8.0, 4.0, 2.0]);

        let averages: Vec<f64> = view.monthly.iter().map(|m| m.moving_average).collect();
        assert_eq!(averages, vec![10.0, 9.0, 22.0 / 3.0, 14.0 / 3.0]);

        assert_eq!(view.monthly[1].month.to_string(), "2024-01");
        assert_eq!(view.artist_trends[0].artist, "Veteran");
        assert_eq!(view.artist_trends[1].monthly.len(), 2);

        let january = YearMonth { year: 2024, month: 1 };
        let february = YearMonth { year: 2024, month: 2 };
        assert!(view.skipped_share.contains(&(january, 50.0)));
        assert!(view.offline_share.contains(&(february, 100.0)));
    }

    #[test]
    fn test_suggest_is_case_insensitive() {
        let names = ["The Beatles", "Beach House", "Radiohead"];

        assert_eq!(suggest(&names, "BEA", 10), vec!["The Beatles", "Beach House"]);
        assert_eq!(suggest(&names, "bea", 1), vec!["The Beatles"]);
        assert!(suggest(&names, "zzz", 10).is_empty());
    }

    #[test]
    fn test_artist_profile() {
        let table = multi_year_table();
        let profile = artist_profile(&table, "X").expect("X is present");

        assert_eq!(profile.tracks, vec![("A".to_string(), 7.0), ("B".to_string(), 3.0)]);
        assert_eq!(profile.track_count(), 2);
        assert_eq!(profile.total_minutes, 10.0);
        assert_eq!(profile.mean_minutes_per_track, 5.0);

        assert!(artist_profile(&table, "x").is_none(), "lookup is exact");
    }

    #[test]
    fn test_monthly_by_year_per_metric() {
        let table = multi_year_table();
        assert_eq!(default_years(&table), vec![2023, 2024]);

        let minutes = monthly_by_year(&table, &[2024], TrendMetric::Minutes);
        assert_eq!(minutes.len(), 1);
        assert_eq!(minutes[0].months, vec![(1, 8.0), (2, 4.0), (3, 2.0)]);

        let plays = monthly_by_year(&table, &[2024, 2023, 2024], TrendMetric::Plays);
        let years: Vec<i32> = plays.iter().map(|trend| trend.year).collect();
        assert_eq!(years, vec![2023, 2024]);
        assert_eq!(plays[1].months[0], (1, 2.0));

        let skipped = monthly_by_year(&table, &[2024], TrendMetric::SkippedShare);
        assert_eq!(skipped[0].months, vec![(1, 50.0), (2, 0.0), (3, 0.0)]);
    }

    #[test]
    fn test_monthly_by_year_skips_years_without_plays() {
        let table = multi_year_table();

        assert!(monthly_by_year(&table, &[1999], TrendMetric::Minutes).is_empty());
        assert!(default_years(&CanonicalTable::default()).is_empty());

        let single = CanonicalTable::from_raw(&vec![raw("2024-01-01T08:00:00Z", "A", "X", 1)]);
        assert_eq!(default_years(&single), vec![2024]);
    }
}
