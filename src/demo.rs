//! Built-in demonstration dataset.
//!
//! Five template plays repeated over twenty rounds. Every round after the
//! first moves the plays to a new date and hour, and every third round
//! renames the track and artist so the rankings have some spread.

use crate::ingest::{accept_value, AcceptedBatch, BatchRejection, ValidationPolicy};
use serde_json::{json, Value};

pub const DEMO_BATCH_NAME: &str = "demo.json";
const ROUNDS: usize = 20;

fn templates() -> [Value; 5] {
    [
        json!({
            "ts": "2024-01-01T12:30:45Z",
            "ms_played": 18_000_000,
            "master_metadata_track_name": "Sample Song",
            "master_metadata_album_artist_name": "Sample Artist",
            "master_metadata_album_album_name": "Sample Album",
            "skipped": false,
            "offline": false,
            "platform": "android"
        }),
        json!({
            "ts": "2024-01-01T12:34:45Z",
            "ms_played": 24_000_000,
            "master_metadata_track_name": "Another Song",
            "master_metadata_album_artist_name": "Another Artist",
            "master_metadata_album_album_name": "Another Album",
            "skipped": true,
            "offline": true,
            "platform": "ios"
        }),
        json!({
            "ts": "2024-01-02T18:30:45Z",
            "ms_played": 30_000_000,
            "master_metadata_track_name": "Popular Song",
            "master_metadata_album_artist_name": "Famous Artist",
            "master_metadata_album_album_name": "Famous Album",
            "skipped": false,
            "offline": false,
            "platform": "desktop"
        }),
        json!({
            "ts": "2023-01-01T12:30:45Z",
            "ms_played": 18_000_000,
            "master_metadata_track_name": "Old Song",
            "master_metadata_album_artist_name": "Old Artist",
            "master_metadata_album_album_name": "Old Album",
            "skipped": false,
            "offline": false,
            "platform": "android"
        }),
        json!({
            "ts": "2024-01-01T12:38:45Z",
            "ms_played": 24_000_000,
            "master_metadata_track_name": "Sequel Song",
            "master_metadata_album_artist_name": "Sample Artist",
            "master_metadata_album_album_name": "Sample Album",
            "skipped": false,
            "offline": false,
            "platform": "android"
        }),
    ]
}

fn append_to(record: &mut Value, field: &str, suffix: &str) {
    if let Some(Value::String(text)) = record.get_mut(field) {
        text.push_str(suffix);
    }
}

/// The demo export as a JSON array, exactly as a user upload would look.
#[must_use]
pub fn demo_records() -> Value {
    let templates = templates();
    let mut records = Vec::with_capacity(ROUNDS * templates.len());

    for round in 0..ROUNDS {
        for template in &templates {
            let mut record = template.clone();
            if round > 0 {
                record["ts"] = Value::String(format!(
                    "2024-{:02}-{:02}T{:02}:30:45Z",
                    round % 12 + 1,
                    round % 28 + 1,
                    round % 24
                ));
                if round % 3 == 0 {
                    append_to(&mut record, "master_metadata_track_name", &format!(" {round}"));
                    append_to(
                        &mut record,
                        "master_metadata_album_artist_name",
                        &format!(" {}", round % 5),
                    );
                }
            }
            records.push(record);
        }
    }

    Value::Array(records)
}

/// The demo export screened like any other batch.
///
/// # Errors
///
/// Only if the built-in data stopped passing validation.
pub fn demo_batch() -> Result<AcceptedBatch, BatchRejection> {
    accept_value(DEMO_BATCH_NAME, &demo_records(), ValidationPolicy::EveryRecord)
}
