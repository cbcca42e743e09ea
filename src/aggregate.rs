//! Grouping primitives over canonical rows.
//!
//! Every function here is pure: it reads rows (the whole table or any
//! filtered view of it) and returns a fresh aggregate. Group keys are
//! closures returning `Option<K>`; rows whose key is missing are left out
//! of the group, and missing played-time values count as zero.
//!
//! Ordered results use a `BTreeMap`, so ties between groups always break on
//! the key's natural order and repeated calls on the same input agree.

use crate::record::PlaybackEvent;
use crate::table::CanonicalTable;
use chrono::Weekday;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Range;

/// Categorical column to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Track,
    Artist,
    Album,
    Platform,
}

impl Dimension {
    #[must_use]
    pub fn value(self, event: &PlaybackEvent) -> Option<&str> {
        match self {
            Self::Track => event.track_name.as_deref(),
            Self::Artist => event.artist_name.as_deref(),
            Self::Album => event.album_name.as_deref(),
            Self::Platform => event.platform.as_deref(),
        }
    }

    /// Owned group key for use with [`sum_by`] and friends.
    pub fn key(self) -> impl Fn(&PlaybackEvent) -> Option<String> {
        move |event: &PlaybackEvent| self.value(event).map(str::to_owned)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Track => "Track",
            Self::Artist => "Artist",
            Self::Album => "Album",
            Self::Platform => "Platform",
        }
    }
}

/// Quantity summed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Seconds,
    Minutes,
    Hours,
    /// Each row counts as one play.
    Plays,
}

impl Metric {
    #[must_use]
    pub fn of(self, event: &PlaybackEvent) -> f64 {
        match self {
            Self::Seconds => event.played.map_or(0.0, |p| p.seconds),
            Self::Minutes => event.played.map_or(0.0, |p| p.minutes),
            Self::Hours => event.played.map_or(0.0, |p| p.hours),
            Self::Plays => 1.0,
        }
    }

    pub fn value(self) -> impl Fn(&PlaybackEvent) -> f64 {
        move |event: &PlaybackEvent| self.of(event)
    }
}

/// Sum `value` per group.
///
/// # Examples
///
/// ```
/// use replay::aggregate::{sum_by, Dimension, Metric};
/// use replay::record::RawRecord;
/// use replay::table::CanonicalTable;
///
/// let records = vec![
///     RawRecord { artist_name: Some("X".into()), ms_played: Some(60_000), ..Default::default() },
///     RawRecord { artist_name: Some("X".into()), ms_played: Some(120_000), ..Default::default() },
///     RawRecord { artist_name: None, ms_played: Some(60_000), ..Default::default() },
/// ];
/// let table = CanonicalTable::from_raw(&records);
///
/// let sums = sum_by(&table, Dimension::Artist.key(), Metric::Minutes.value());
/// assert_eq!(sums.len(), 1);
/// assert_eq!(sums["X"], 3.0);
/// ```
pub fn sum_by<'a, I, K, G, V>(rows: I, group: G, value: V) -> BTreeMap<K, f64>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
    V: Fn(&PlaybackEvent) -> f64,
{
    rows.into_iter().fold(BTreeMap::new(), |mut sums, event| {
        if let Some(key) = group(event) {
            *sums.entry(key).or_insert(0.0) += value(event);
        }
        sums
    })
}

/// Number of rows per group.
pub fn count_by<'a, I, K, G>(rows: I, group: G) -> BTreeMap<K, usize>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
{
    rows.into_iter().fold(BTreeMap::new(), |mut counts, event| {
        if let Some(key) = group(event) {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    })
}

/// Sort sums descending and keep the first `n`.
///
/// The sort is stable over the map's key order, so equal sums rank by key.
#[must_use]
pub fn rank_descending<K>(sums: BTreeMap<K, f64>, n: usize) -> Vec<(K, f64)> {
    let mut ranked: Vec<(K, f64)> = sums.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    ranked.truncate(n);
    ranked
}

/// Count counterpart of [`rank_descending`].
#[must_use]
pub fn rank_counts<K>(counts: BTreeMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
    ranked.truncate(n);
    ranked
}

/// Top `n` groups by summed `value`, ties broken by group key.
pub fn top_n<'a, I, K, G, V>(rows: I, group: G, value: V, n: usize) -> Vec<(K, f64)>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
    V: Fn(&PlaybackEvent) -> f64,
{
    rank_descending(sum_by(rows, group, value), n)
}

/// [`top_n`] over a named column and metric.
pub fn top_by<'a, I>(rows: I, dimension: Dimension, metric: Metric, n: usize) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
{
    top_n(rows, dimension.key(), metric.value(), n)
}

/// Plays and skips of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayTally {
    pub plays: usize,
    pub skips: usize,
}

impl PlayTally {
    /// `1 - mean(was_skipped)`; undefined for an empty group.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_rate(&self) -> Option<f64> {
        match self.plays {
            0 => None,
            plays => Some(1.0 - self.skips as f64 / plays as f64),
        }
    }
}

pub fn play_tallies<'a, I, K, G>(rows: I, group: G) -> BTreeMap<K, PlayTally>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
{
    rows.into_iter().fold(BTreeMap::new(), |mut tallies, event| {
        if let Some(key) = group(event) {
            let tally: &mut PlayTally = tallies.entry(key).or_default();
            tally.plays += 1;
            tally.skips += usize::from(event.was_skipped);
        }
        tallies
    })
}

/// Fraction of plays per group that were not skipped, in `[0, 1]`.
///
/// Only groups that have rows appear. Callers wanting a minimum sample size
/// pre-filter with [`rows_in_frequent_groups`].
pub fn completion_rate_by<'a, I, K, G>(rows: I, group: G) -> BTreeMap<K, f64>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
{
    play_tallies(rows, group)
        .into_iter()
        .filter_map(|(key, tally)| tally.completion_rate().map(|rate| (key, rate)))
        .collect()
}

/// Rows whose group has at least `min_plays` rows.
pub fn rows_in_frequent_groups<'a, I, K, G>(
    rows: I,
    group: G,
    min_plays: usize,
) -> Vec<&'a PlaybackEvent>
where
    I: IntoIterator<Item = &'a PlaybackEvent>,
    K: Ord,
    G: Fn(&PlaybackEvent) -> Option<K>,
{
    let rows: Vec<&'a PlaybackEvent> = rows.into_iter().collect();
    let counts = count_by(rows.iter().copied(), &group);

    rows.into_iter()
        .filter(|event| {
            group(*event)
                .and_then(|key| counts.get(&key))
                .is_some_and(|&plays| plays >= min_plays)
        })
        .collect()
}

/// Time-of-day bucket. Each covers a half-open hour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HourPeriod {
    /// `[0, 6)`
    Dawn,
    /// `[6, 12)`
    Morning,
    /// `[12, 18)`
    Afternoon,
    /// `[18, 24)`
    Night,
}

impl HourPeriod {
    pub const ALL: [Self; 4] = [Self::Dawn, Self::Morning, Self::Afternoon, Self::Night];

    #[must_use]
    pub const fn hours(self) -> Range<u32> {
        match self {
            Self::Dawn => 0..6,
            Self::Morning => 6..12,
            Self::Afternoon => 12..18,
            Self::Night => 18..24,
        }
    }

    #[must_use]
    pub fn contains(self, hour: u32) -> bool {
        self.hours().contains(&hour)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dawn => "Dawn (0h-6h)",
            Self::Morning => "Morning (6h-12h)",
            Self::Afternoon => "Afternoon (12h-18h)",
            Self::Night => "Night (18h-24h)",
        }
    }
}

/// Bucket an hour of the day.
///
/// Event hours are always `0..24`; anything larger lands in `Night`.
///
/// ```
/// use replay::aggregate::{bucket_by_hour_period, HourPeriod};
///
/// assert_eq!(bucket_by_hour_period(5), HourPeriod::Dawn);
/// assert_eq!(bucket_by_hour_period(6), HourPeriod::Morning);
/// assert_eq!(bucket_by_hour_period(23), HourPeriod::Night);
/// ```
#[must_use]
pub const fn bucket_by_hour_period(hour: u32) -> HourPeriod {
    match hour {
        0..=5 => HourPeriod::Dawn,
        6..=11 => HourPeriod::Morning,
        12..=17 => HourPeriod::Afternoon,
        _ => HourPeriod::Night,
    }
}

/// Row filter for the personalized time-of-day view.
///
/// A set criterion excludes rows whose matching field is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub period: Option<HourPeriod>,
    pub weekday: Option<Weekday>,
    pub year: Option<i32>,
}

impl EventFilter {
    #[must_use]
    pub fn matches(&self, event: &PlaybackEvent) -> bool {
        let period_ok = self
            .period
            .map_or(true, |period| event.hour().is_some_and(|hour| period.contains(hour)));
        let weekday_ok = self
            .weekday
            .map_or(true, |weekday| event.weekday() == Some(weekday));
        let year_ok = self.year.map_or(true, |year| event.year() == Some(year));

        period_ok && weekday_ok && year_ok
    }

    /// Derived view of `table`; the table itself is untouched.
    #[must_use]
    pub fn apply<'a>(&self, table: &'a CanonicalTable) -> Vec<&'a PlaybackEvent> {
        table.filter(|event| self.matches(event))
    }
}
