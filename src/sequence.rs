//! Sequence adjacency: what gets played right before or right after a track.
//!
//! Neighbors are positional in the chronologically sorted table, so two
//! plays with the same timestamp keep their input order and the first and
//! last rows simply have no predecessor or successor.

use crate::record::PlaybackEvent;
use crate::table::CanonicalTable;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
}

impl Direction {
    /// Position of the neighbor of `index`, if it can exist.
    const fn neighbor(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Before if index > 0 => Some(index - 1),
            Self::After if index + 1 < len => Some(index + 1),
            _ => None,
        }
    }
}

/// A neighboring `(track, artist)` pair and how often it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacentTrack {
    pub track: String,
    pub artist: Option<String>,
    pub count: usize,
}

/// Most frequent neighbors of `target` in the given direction.
///
/// Sorted by count descending; equal counts keep the order in which the
/// pairs were first encountered. Neighbors without a track name are
/// ignored. An absent target yields an empty list.
#[must_use]
pub fn adjacent_tracks(
    table: &CanonicalTable,
    target: &str,
    direction: Direction,
    top_n: usize,
) -> Vec<AdjacentTrack> {
    let ordered = table.chronological();

    let mut found: Vec<AdjacentTrack> = Vec::new();
    let mut positions: HashMap<(String, Option<String>), usize> = HashMap::new();

    let neighbors = ordered
        .iter()
        .enumerate()
        .filter(|(_, event)| event.track_name.as_deref() == Some(target))
        .filter_map(|(index, _)| direction.neighbor(index, ordered.len()))
        .map(|index| ordered[index]);

    for neighbor in neighbors {
        let Some(track) = neighbor.track_name.as_ref() else {
            continue;
        };
        let key = (track.clone(), neighbor.artist_name.clone());
        match positions.get(&key) {
            Some(&slot) => found[slot].count += 1,
            None => {
                positions.insert(key, found.len());
                found.push(AdjacentTrack {
                    track: track.clone(),
                    artist: neighbor.artist_name.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable: ties stay in discovery order.
    found.sort_by(|a, b| b.count.cmp(&a.count));
    found.truncate(top_n);

    debug!("Found {} neighbors {direction:?} '{target}'", found.len());
    found
}

/// Both directions around a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceFlow {
    pub track: String,
    pub artist: Option<String>,
    pub before: Vec<AdjacentTrack>,
    pub after: Vec<AdjacentTrack>,
}

impl SequenceFlow {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

#[must_use]
pub fn track_flow(table: &CanonicalTable, track: &str, top_n: usize) -> SequenceFlow {
    SequenceFlow {
        track: track.to_string(),
        artist: primary_artist(table, track).map(str::to_string),
        before: adjacent_tracks(table, track, Direction::Before, top_n),
        after: adjacent_tracks(table, track, Direction::After, top_n),
    }
}

/// Artist of the first row carrying `track`.
#[must_use]
pub fn primary_artist<'a>(table: &'a CanonicalTable, track: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|event: &&PlaybackEvent| event.track_name.as_deref() == Some(track))
        .and_then(|event| event.artist_name.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn play(minute: u32, track: Option<&str>, artist: Option<&str>) -> RawRecord {
        RawRecord {
            ts: Some(format!("2024-01-01T10:{minute:02}:00Z")),
            ms_played: Some(60_000),
            track_name: track.map(str::to_string),
            artist_name: artist.map(str::to_string),
            album_name: Some("Album".to_string()),
            ..RawRecord::default()
        }
    }

    fn table_of(tracks: &[&str]) -> CanonicalTable {
        let records: Vec<RawRecord> = tracks
            .iter()
            .enumerate()
            .map(|(i, track)| play(i as u32, Some(track), Some("Artist")))
            .collect();
        CanonicalTable::from_raw(&records)
    }

    fn names(found: &[AdjacentTrack]) -> Vec<(&str, usize)> {
        found.iter().map(|a| (a.track.as_str(), a.count)).collect()
    }

    #[test]
    fn test_after_scenario() {
        let table = table_of(&["A", "B", "A", "C"]);

        let after = adjacent_tracks(&table, "A", Direction::After, 10);
        assert_eq!(names(&after), vec![("B", 1), ("C", 1)]);

        let before = adjacent_tracks(&table, "A", Direction::Before, 10);
        assert_eq!(names(&before), vec![("B", 1)], "first row has no predecessor");
    }

    #[test]
    fn test_after_never_yields_predecessor() {
        let table = table_of(&["P", "T", "N"]);

        let after = adjacent_tracks(&table, "T", Direction::After, 10);
        assert_eq!(names(&after), vec![("N", 1)]);
        assert!(after.iter().all(|a| a.track != "P"));
    }

    #[test]
    fn test_absent_track_is_empty() {
        let table = table_of(&["A", "B"]);

        assert!(adjacent_tracks(&table, "Z", Direction::After, 10).is_empty());
        assert!(track_flow(&table, "Z", 10).is_empty());
    }

    #[test]
    fn test_last_row_has_no_successor() {
        let table = table_of(&["A", "B"]);

        assert!(adjacent_tracks(&table, "B", Direction::After, 10).is_empty());
        assert!(adjacent_tracks(&table, "A", Direction::Before, 10).is_empty());
    }

    #[test]
    fn test_counts_sort_and_truncate() {
        let table = table_of(&["A", "X", "A", "Y", "A", "Y", "A", "Z"]);

        let after = adjacent_tracks(&table, "A", Direction::After, 2);
        assert_eq!(names(&after), vec![("Y", 2), ("X", 1)]);
    }

    #[test]
    fn test_uses_chronological_not_input_order() {
        let records = vec![
            play(5, Some("C"), Some("Artist")),
            play(0, Some("A"), Some("Artist")),
            play(1, Some("B"), Some("Artist")),
        ];
        let table = CanonicalTable::from_raw(&records);

        let after = adjacent_tracks(&table, "B", Direction::After, 10);
        assert_eq!(names(&after), vec![("C", 1)]);
    }

    #[test]
    fn test_groups_by_track_and_artist() {
        let records = vec![
            play(0, Some("A"), Some("Artist")),
            play(1, Some("Song"), Some("One")),
            play(2, Some("A"), Some("Artist")),
            play(3, Some("Song"), Some("Two")),
            play(4, Some("A"), Some("Artist")),
            play(5, None, Some("Ghost")),
            play(6, Some("A"), Some("Artist")),
            play(7, Some("Song"), None),
        ];
        let table = CanonicalTable::from_raw(&records);

        let after = adjacent_tracks(&table, "A", Direction::After, 10);
        let artists: Vec<_> = after.iter().map(|a| a.artist.as_deref()).collect();
        assert_eq!(artists, vec![Some("One"), Some("Two"), None]);
    }

    #[test]
    fn test_track_flow() {
        let records = vec![
            play(0, Some("Intro"), Some("Band")),
            play(1, Some("Hit"), Some("Band")),
            play(2, Some("Outro"), Some("Band")),
        ];
        let table = CanonicalTable::from_raw(&records);

        let flow = track_flow(&table, "Hit", 5);
        assert_eq!(flow.artist.as_deref(), Some("Band"));
        assert_eq!(names(&flow.before), vec![("Intro", 1)]);
        assert_eq!(names(&flow.after), vec![("Outro", 1)]);
    }
}
