//! # Playback Records
//!
//! Two shapes of the same listening event live here:
//!
//! - [`RawRecord`]: the loosely typed entry found in a streaming-history
//!   export, where every field may be absent or hold the wrong JSON type
//! - [`PlaybackEvent`]: the canonical row, with calendar and played-time
//!   features derived once at ingestion
//!
//! Missing or unparsable source values never fail a record. They become
//! explicit `None` states and flow through every derived field.

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FIELD_TIMESTAMP: &str = "ts";
pub const FIELD_MS_PLAYED: &str = "ms_played";
pub const FIELD_TRACK: &str = "master_metadata_track_name";
pub const FIELD_ARTIST: &str = "master_metadata_album_artist_name";
pub const FIELD_ALBUM: &str = "master_metadata_album_album_name";
pub const FIELD_SKIPPED: &str = "skipped";
pub const FIELD_OFFLINE: &str = "offline";
pub const FIELD_PLATFORM: &str = "platform";

/// Keys every accepted batch must carry on its first record.
pub const MANDATORY_FIELDS: [&str; 5] = [
    FIELD_TIMESTAMP,
    FIELD_MS_PLAYED,
    FIELD_TRACK,
    FIELD_ARTIST,
    FIELD_ALBUM,
];

/// Offset-less layouts accepted after RFC 3339 fails. Read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Weekdays in display order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One export entry, as read from disk.
///
/// Serializes back to the export layout, so a canonical table can be
/// re-exported and ingested again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub ts: Option<String>,
    pub ms_played: Option<u64>,
    #[serde(rename = "master_metadata_track_name")]
    pub track_name: Option<String>,
    #[serde(rename = "master_metadata_album_artist_name")]
    pub artist_name: Option<String>,
    #[serde(rename = "master_metadata_album_album_name")]
    pub album_name: Option<String>,
    pub skipped: Option<bool>,
    pub offline: Option<bool>,
    pub platform: Option<String>,
}

impl RawRecord {
    /// Lenient extraction from an arbitrary JSON value.
    ///
    /// Values of the wrong type read as missing; a value that is not an
    /// object yields a record with every field missing.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        let flag = |key: &str| value.get(key).and_then(Value::as_bool);

        Self {
            ts: text(FIELD_TIMESTAMP),
            ms_played: value.get(FIELD_MS_PLAYED).and_then(played_ms),
            track_name: text(FIELD_TRACK),
            artist_name: text(FIELD_ARTIST),
            album_name: text(FIELD_ALBUM),
            skipped: flag(FIELD_SKIPPED),
            offline: flag(FIELD_OFFLINE),
            platform: text(FIELD_PLATFORM),
        }
    }
}

/// Milliseconds may arrive as an integer or a float; negatives are garbage.
fn played_ms(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms as u64)
    })
}

/// Calendar features of an event timestamp (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub weekday: Weekday,
}

impl CalendarFields {
    #[must_use]
    pub fn from_timestamp(timestamp: &DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour(),
            weekday: timestamp.weekday(),
        }
    }
}

/// Played time in the three units the views aggregate over.
///
/// Each unit is derived from the previous one with no rounding:
/// `minutes == ms / 1000 / 60`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayedTime {
    pub seconds: f64,
    pub minutes: f64,
    pub hours: f64,
}

impl PlayedTime {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_millis(ms: u64) -> Self {
        let seconds = ms as f64 / 1000.0;
        let minutes = seconds / 60.0;
        let hours = minutes / 60.0;
        Self { seconds, minutes, hours }
    }
}

/// A canonical row of the session table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub duration_played_ms: Option<u64>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub was_skipped: bool,
    pub was_offline: bool,
    pub platform: Option<String>,
    pub calendar: Option<CalendarFields>,
    pub played: Option<PlayedTime>,
}

impl PlaybackEvent {
    /// Derive a canonical event from a raw record in one pass.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Self {
        let timestamp = raw.ts.as_deref().and_then(parse_timestamp);

        Self {
            timestamp,
            duration_played_ms: raw.ms_played,
            track_name: raw.track_name.clone(),
            artist_name: raw.artist_name.clone(),
            album_name: raw.album_name.clone(),
            // Only a literal `true` counts as skipped.
            was_skipped: raw.skipped == Some(true),
            was_offline: raw.offline == Some(true),
            platform: raw.platform.clone(),
            calendar: timestamp.as_ref().map(CalendarFields::from_timestamp),
            played: raw.ms_played.map(PlayedTime::from_millis),
        }
    }

    /// Convert back to the export layout.
    #[must_use]
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            ts: self.timestamp.as_ref().map(format_timestamp),
            ms_played: self.duration_played_ms,
            track_name: self.track_name.clone(),
            artist_name: self.artist_name.clone(),
            album_name: self.album_name.clone(),
            skipped: Some(self.was_skipped),
            offline: Some(self.was_offline),
            platform: self.platform.clone(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.calendar.map(|c| c.year)
    }

    pub fn month(&self) -> Option<u32> {
        self.calendar.map(|c| c.month)
    }

    pub fn hour(&self) -> Option<u32> {
        self.calendar.map(|c| c.hour)
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.calendar.map(|c| c.weekday)
    }

    pub fn minutes_played(&self) -> Option<f64> {
        self.played.map(|p| p.minutes)
    }

    pub fn hours_played(&self) -> Option<f64> {
        self.played.map(|p| p.hours)
    }
}

/// Parse an export timestamp into a UTC instant.
///
/// Accepts RFC 3339 (any offset, converted to UTC) and offset-less
/// `YYYY-MM-DD[T ]HH:MM:SS[.fff]` read as UTC. Anything else is `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Export layout of a timestamp, e.g. `2024-01-01T00:00:00Z`.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Full English weekday name.
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
