//! Listening-pattern recommendations.
//!
//! Everything here is derived from the session alone: completion rates pick
//! the artists and tracks the user reliably finishes, and the busiest hour
//! and weekday pick the artists that fit the user's routine. "Similar"
//! artists are placeholders; there is no catalogue to draw real ones from.

use crate::aggregate::{play_tallies, rows_in_frequent_groups, sum_by, top_by, Dimension, Metric};
use crate::config::RuntimeConfig;
use crate::record::{PlaybackEvent, WEEKDAYS};
use crate::table::CanonicalTable;
use crate::views::hour_profile;
use chrono::Weekday;
use serde::Serialize;
use std::cmp::Ordering;

const PICKS: usize = 5;
const ROUTINE_PICKS: usize = 3;
const SIMILAR_PER_ARTIST: usize = 3;

/// An artist with a high completion rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistAffinity {
    pub artist: String,
    pub completion_rate: f64,
    pub plays: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteTrack {
    pub track: String,
    pub artist: Option<String>,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarArtists {
    pub artist: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourPicks {
    pub hour: u32,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayPicks {
    pub weekday: Weekday,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    /// Rarely played but hardly ever skipped.
    pub underplayed_artists: Vec<ArtistAffinity>,
    /// Tracks the user tends to hear to the end.
    pub favorite_tracks: Vec<FavoriteTrack>,
    pub similar_artists: Vec<SimilarArtists>,
    pub favorite_hour: Option<HourPicks>,
    pub favorite_weekday: Option<WeekdayPicks>,
}

#[must_use]
pub fn generate(table: &CanonicalTable, config: &RuntimeConfig) -> Recommendations {
    Recommendations {
        underplayed_artists: underplayed_artists(table, config.min_artist_plays),
        favorite_tracks: favorite_tracks(table, config.min_track_plays),
        similar_artists: similar_artists(table),
        favorite_hour: favorite_hour(table),
        favorite_weekday: favorite_weekday(table),
    }
}

/// Artists with at least `min_plays` plays, by completion rate descending
/// and then by fewest plays.
#[must_use]
pub fn underplayed_artists(table: &CanonicalTable, min_plays: usize) -> Vec<ArtistAffinity> {
    let rows = rows_in_frequent_groups(table, Dimension::Artist.key(), min_plays);

    let mut ranked: Vec<ArtistAffinity> = play_tallies(rows, Dimension::Artist.key())
        .into_iter()
        .filter_map(|(artist, tally)| {
            tally.completion_rate().map(|completion_rate| ArtistAffinity {
                artist,
                completion_rate,
                plays: tally.plays,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.completion_rate
            .partial_cmp(&a.completion_rate)
            .unwrap_or(Ordering::Equal)
            .then(a.plays.cmp(&b.plays))
    });
    ranked.truncate(PICKS);
    ranked
}

/// Tracks with at least `min_plays` plays, by completion rate descending.
/// The artist is the first one recorded for the track.
#[must_use]
pub fn favorite_tracks(table: &CanonicalTable, min_plays: usize) -> Vec<FavoriteTrack> {
    let rows = rows_in_frequent_groups(table, Dimension::Track.key(), min_plays);

    let mut ranked: Vec<FavoriteTrack> = play_tallies(rows.iter().copied(), Dimension::Track.key())
        .into_iter()
        .filter_map(|(track, tally)| {
            let completion_rate = tally.completion_rate()?;
            let artist = rows
                .iter()
                .filter(|e| e.track_name.as_deref() == Some(track.as_str()))
                .find_map(|e| e.artist_name.clone());
            Some(FavoriteTrack {
                track,
                artist,
                completion_rate,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.completion_rate
            .partial_cmp(&a.completion_rate)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(PICKS);
    ranked
}

/// Placeholder suggestions for the top artists by minutes.
#[must_use]
pub fn similar_artists(table: &CanonicalTable) -> Vec<SimilarArtists> {
    top_by(table, Dimension::Artist, Metric::Minutes, ROUTINE_PICKS)
        .into_iter()
        .map(|(artist, _)| SimilarArtists {
            suggestions: (1..=SIMILAR_PER_ARTIST)
                .map(|i| format!("Artist similar to {artist} #{i}"))
                .collect(),
            artist,
        })
        .collect()
}

fn top_artists_where<P>(table: &CanonicalTable, predicate: P) -> Vec<String>
where
    P: Fn(&PlaybackEvent) -> bool,
{
    top_by(table.filter(predicate), Dimension::Artist, Metric::Minutes, ROUTINE_PICKS)
        .into_iter()
        .map(|(artist, _)| artist)
        .collect()
}

/// Top artists during the hour with the most minutes.
#[must_use]
pub fn favorite_hour(table: &CanonicalTable) -> Option<HourPicks> {
    let hour = hour_profile(table).peak_hour?;
    Some(HourPicks {
        hour,
        artists: top_artists_where(table, |e| e.hour() == Some(hour)),
    })
}

/// Top artists on the weekday with the most minutes.
#[must_use]
pub fn favorite_weekday(table: &CanonicalTable) -> Option<WeekdayPicks> {
    let by_day = sum_by(
        table,
        |e: &PlaybackEvent| e.weekday().map(|day| day.num_days_from_monday()),
        Metric::Minutes.value(),
    );

    let (day, _) = by_day
        .into_iter()
        .fold(None, |best: Option<(u32, f64)>, (day, minutes)| match best {
            Some((_, top)) if top >= minutes => best,
            _ => Some((day, minutes)),
        })?;
    let weekday = WEEKDAYS[day as usize];

    Some(WeekdayPicks {
        weekday,
        artists: top_artists_where(table, |e| e.weekday() == Some(weekday)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn play(
        day: u32,
        hour: u32,
        track: &str,
        artist: &str,
        minutes: u64,
        skipped: bool,
    ) -> RawRecord {
        RawRecord {
            ts: Some(format!("2024-01-{day:02}T{hour:02}:00:00Z")),
            ms_played: Some(minutes * 60_000),
            track_name: Some(track.to_string()),
            artist_name: Some(artist.to_string()),
            album_name: Some("Album".to_string()),
            skipped: Some(skipped),
            ..RawRecord::default()
        }
    }

    fn repeat(n: usize, record: RawRecord) -> impl Iterator<Item = RawRecord> {
        std::iter::repeat(record).take(n)
    }

    #[test]
    fn test_underplayed_artists_need_five_plays() {
        let mut records: Vec<RawRecord> = Vec::new();
        records.extend(repeat(4, play(1, 10, "t", "Rare", 1, false)));
        records.extend(repeat(5, play(1, 10, "t", "Loyal", 1, false)));
        records.extend(repeat(8, play(1, 10, "t", "Heavy", 1, false)));
        records.extend(repeat(6, play(1, 10, "t", "Skippy", 1, true)));
        let table = CanonicalTable::from_raw(&records);

        let picks = underplayed_artists(&table, 5);
        let names: Vec<_> = picks.iter().map(|a| a.artist.as_str()).collect();
        assert_eq!(names, vec!["Loyal", "Heavy", "Skippy"], "rate desc, then fewest plays");
        assert_eq!(picks[2].completion_rate, 0.0);
    }

    #[test]
    fn test_favorite_tracks_use_first_artist() {
        let mut records: Vec<RawRecord> = Vec::new();
        records.push(RawRecord {
            artist_name: None,
            ..play(1, 9, "Anthem", "ignored", 3, false)
        });
        records.push(play(1, 10, "Anthem", "First", 3, false));
        records.push(play(1, 11, "Anthem", "Second", 3, false));
        records.extend(repeat(3, play(2, 10, "Filler", "Other", 3, true)));
        records.extend(repeat(2, play(2, 10, "Rarely", "Other", 3, false)));
        let table = CanonicalTable::from_raw(&records);

        let picks = favorite_tracks(&table, 3);
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].track, "Anthem");
        assert_eq!(picks[0].artist.as_deref(), Some("First"));
        assert_eq!(picks[0].completion_rate, 1.0);
        assert_eq!(picks[1].track, "Filler");
    }

    #[test]
    fn test_routine_picks() {
        // 2024-01-03 is a Wednesday.
        let records = vec![
            play(3, 22, "a", "Night Owl", 30, false),
            play(3, 22, "b", "Late Band", 10, false),
            play(1, 8, "c", "Early Bird", 20, false),
        ];
        let table = CanonicalTable::from_raw(&records);

        let hour = favorite_hour(&table).expect("timestamps present");
        assert_eq!(hour.hour, 22);
        assert_eq!(hour.artists, vec!["Night Owl", "Late Band"]);

        let day = favorite_weekday(&table).expect("timestamps present");
        assert_eq!(day.weekday, Weekday::Wed);
        assert_eq!(day.artists, vec!["Night Owl", "Late Band"]);
    }

    #[test]
    fn test_generate_on_sparse_table() {
        let table = CanonicalTable::from_raw(&vec![RawRecord::default()]);
        let recs = generate(&table, &RuntimeConfig::default());

        assert!(recs.underplayed_artists.is_empty());
        assert!(recs.favorite_tracks.is_empty());
        assert!(recs.similar_artists.is_empty());
        assert!(recs.favorite_hour.is_none());
        assert!(recs.favorite_weekday.is_none());
    }

    #[test]
    fn test_similar_artist_placeholders() {
        let table = CanonicalTable::from_raw(&vec![play(1, 10, "a", "Solo", 1, false)]);
        let similar = similar_artists(&table);

        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].suggestions.len(), 3);
        assert_eq!(similar[0].suggestions[0], "Artist similar to Solo #1");
    }
}
