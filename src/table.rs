//! The session's canonical table.
//!
//! Built once from every accepted batch and never mutated afterwards.
//! Views over it are slices of references (`Vec<&PlaybackEvent>`) or
//! aggregates; nothing hands out `&mut` access to the rows.

use crate::record::{PlaybackEvent, RawRecord};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Immutable, ordered collection of canonical playback events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    events: Vec<PlaybackEvent>,
}

impl CanonicalTable {
    /// Normalize raw records, preserving their order.
    pub fn from_raw<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        Self {
            events: records.into_iter().map(PlaybackEvent::from_raw).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rows in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, PlaybackEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn events(&self) -> &[PlaybackEvent] {
        &self.events
    }

    /// Rows in ascending timestamp order.
    ///
    /// The sort is stable, so equal timestamps keep their input order.
    /// Rows without a timestamp go last.
    #[must_use]
    pub fn chronological(&self) -> Vec<&PlaybackEvent> {
        let mut ordered: Vec<&PlaybackEvent> = self.events.iter().collect();
        ordered.sort_by(|a, b| compare_timestamps(a, b));
        ordered
    }

    /// Rows matching `predicate`, in input order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&PlaybackEvent>
    where
        P: Fn(&PlaybackEvent) -> bool,
    {
        self.events.iter().filter(|event| predicate(*event)).collect()
    }

    /// Distinct calendar years present, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.events.iter().filter_map(PlaybackEvent::year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Distinct track names in first-seen order.
    #[must_use]
    pub fn distinct_tracks(&self) -> Vec<&str> {
        first_seen(self.events.iter().filter_map(|e| e.track_name.as_deref()))
    }

    /// Distinct artist names in first-seen order.
    #[must_use]
    pub fn distinct_artists(&self) -> Vec<&str> {
        first_seen(self.events.iter().filter_map(|e| e.artist_name.as_deref()))
    }

    /// Total listening time in minutes; rows without a duration add nothing.
    #[must_use]
    pub fn total_minutes(&self) -> f64 {
        self.events.iter().filter_map(PlaybackEvent::minutes_played).sum()
    }

    #[must_use]
    pub fn total_hours(&self) -> f64 {
        self.events.iter().filter_map(PlaybackEvent::hours_played).sum()
    }

    /// Re-export every row in the source layout.
    #[must_use]
    pub fn to_raw_records(&self) -> Vec<RawRecord> {
        self.events.iter().map(PlaybackEvent::to_raw).collect()
    }
}

impl<'a> IntoIterator for &'a CanonicalTable {
    type Item = &'a PlaybackEvent;
    type IntoIter = std::slice::Iter<'a, PlaybackEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn compare_timestamps(a: &PlaybackEvent, b: &PlaybackEvent) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn first_seen<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|name| seen.insert(*name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(ts: Option<&str>, track: &str, artist: &str) -> RawRecord {
        RawRecord {
            ts: ts.map(str::to_string),
            ms_played: Some(30_000),
            track_name: Some(track.to_string()),
            artist_name: Some(artist.to_string()),
            album_name: Some("Album".to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_chronological_is_stable_with_missing_last() {
        let records = vec![
            raw(Some("2024-01-01T10:00:00Z"), "late", "X"),
            raw(None, "undated", "X"),
            raw(Some("2024-01-01T09:00:00Z"), "tie-first", "X"),
            raw(Some("2024-01-01T09:00:00Z"), "tie-second", "X"),
        ];
        let table = CanonicalTable::from_raw(&records);

        let order: Vec<_> = table
            .chronological()
            .iter()
            .map(|e| e.track_name.clone().unwrap())
            .collect();
        assert_eq!(order, vec!["tie-first", "tie-second", "late", "undated"]);

        // The table itself keeps input order.
        assert_eq!(table.events()[0].track_name.as_deref(), Some("late"));
    }

    #[test]
    fn test_distinct_names_keep_first_seen_order() {
        let records = vec![
            raw(Some("2024-01-01T10:00:00Z"), "B", "Y"),
            raw(Some("2024-01-01T11:00:00Z"), "A", "X"),
            raw(Some("2024-01-01T12:00:00Z"), "B", "Y"),
        ];
        let table = CanonicalTable::from_raw(&records);

        assert_eq!(table.distinct_tracks(), vec!["B", "A"]);
        assert_eq!(table.distinct_artists(), vec!["Y", "X"]);
    }

    #[test]
    fn test_years_and_totals() {
        let records = vec![
            raw(Some("2023-06-01T10:00:00Z"), "A", "X"),
            raw(Some("2024-01-01T11:00:00Z"), "B", "X"),
            raw(Some("2024-02-01T11:00:00Z"), "C", "X"),
        ];
        let table = CanonicalTable::from_raw(&records);

        assert_eq!(table.years(), vec![2023, 2024]);
        assert!((table.total_minutes() - 1.5).abs() < 1e-9);
        assert!((table.total_hours() - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_reexport_renormalizes_identically() {
        let records = vec![
            raw(Some("2024-01-01T10:00:00Z"), "A", "X"),
            raw(Some("not a date"), "B", "Y"),
            RawRecord::default(),
        ];
        let table = CanonicalTable::from_raw(&records);
        let again = CanonicalTable::from_raw(&table.to_raw_records());

        assert_eq!(table, again);
    }
}
