//! # Batch Ingestion
//!
//! Screens uploaded batches (one export file each) and turns the accepted
//! ones into the canonical table.
//!
//! Validation is all-or-nothing per batch. Under the default
//! [`ValidationPolicy::FirstRecord`] only the first record is checked for
//! the mandatory keys; records after it are accepted as they are and any
//! malformed values surface as missing fields in the canonical table.
//! A rejected batch never aborts the others.

use crate::record::{RawRecord, MANDATORY_FIELDS};
use crate::table::CanonicalTable;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How deep batch validation looks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Check the mandatory keys on the first record only.
    #[default]
    FirstRecord,
    /// Every record must be an object carrying every mandatory key.
    EveryRecord,
}

/// Why a batch was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRejection {
    #[error("batch could not be read: {0}")]
    Unreadable(String),

    #[error("batch is not valid JSON: {0}")]
    Malformed(String),

    #[error("batch must be a list of playback records")]
    NotASequence,

    #[error("batch contains no playback data")]
    Empty,

    #[error("record {index} is not an object")]
    RecordNotObject { index: usize },

    #[error("required field '{field}' not found in record {index}")]
    MissingField { field: &'static str, index: usize },
}

/// Ingestion as a whole failed: nothing usable was uploaded.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no valid batch was provided ({} rejected)", .0.len())]
    NoValidBatches(Vec<RejectedBatch>),
}

/// A batch that passed validation, already mapped to [`RawRecord`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedBatch {
    pub name: String,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBatch {
    pub name: String,
    pub reason: BatchRejection,
}

/// Outcome of screening a set of uploaded batches, in upload order.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub accepted: Vec<AcceptedBatch>,
    pub rejected: Vec<RejectedBatch>,
}

impl IngestReport {
    /// File the outcome of screening one batch.
    pub fn push(&mut self, name: &str, outcome: Result<AcceptedBatch, BatchRejection>) {
        match outcome {
            Ok(batch) => self.accepted.push(batch),
            Err(reason) => {
                warn!("Rejected batch '{name}': {reason}");
                self.rejected.push(RejectedBatch {
                    name: name.to_string(),
                    reason,
                });
            }
        }
    }

    /// Records across every accepted batch.
    #[must_use]
    pub fn accepted_records(&self) -> usize {
        self.accepted.iter().map(|batch| batch.records.len()).sum()
    }

    /// Hand over the accepted batches, failing when there are none.
    ///
    /// # Errors
    ///
    /// [`IngestError::NoValidBatches`] carrying every rejection.
    pub fn into_accepted(self) -> Result<Vec<AcceptedBatch>, IngestError> {
        if self.accepted.is_empty() {
            return Err(IngestError::NoValidBatches(self.rejected));
        }
        Ok(self.accepted)
    }
}

/// Validate one parsed batch.
///
/// # Errors
///
/// The first [`BatchRejection`] found.
pub fn validate(batch: &Value, policy: ValidationPolicy) -> Result<(), BatchRejection> {
    let records = batch.as_array().ok_or(BatchRejection::NotASequence)?;
    let first = records.first().ok_or(BatchRejection::Empty)?;

    match policy {
        ValidationPolicy::FirstRecord => check_record(first, 0),
        ValidationPolicy::EveryRecord => records
            .iter()
            .enumerate()
            .try_for_each(|(index, record)| check_record(record, index)),
    }
}

/// Key presence only: an explicit `null` still counts as present.
fn check_record(record: &Value, index: usize) -> Result<(), BatchRejection> {
    let object = record
        .as_object()
        .ok_or(BatchRejection::RecordNotObject { index })?;

    match MANDATORY_FIELDS.iter().find(|field| !object.contains_key(**field)) {
        Some(field) => Err(BatchRejection::MissingField {
            field: *field,
            index,
        }),
        None => Ok(()),
    }
}

/// Validate an already-parsed batch and map its records.
///
/// # Errors
///
/// The [`BatchRejection`] from [`validate`].
pub fn accept_value(
    name: &str,
    batch: &Value,
    policy: ValidationPolicy,
) -> Result<AcceptedBatch, BatchRejection> {
    validate(batch, policy)?;

    let records: Vec<RawRecord> = batch
        .as_array()
        .map(|items| items.iter().map(RawRecord::from_value).collect())
        .unwrap_or_default();

    debug!("Accepted batch '{name}' with {} records", records.len());
    Ok(AcceptedBatch {
        name: name.to_string(),
        records,
    })
}

/// Parse and validate one batch from its file contents.
///
/// # Errors
///
/// [`BatchRejection::Malformed`] for invalid JSON, otherwise whatever
/// [`validate`] reports.
pub fn accept_batch(
    name: &str,
    contents: &str,
    policy: ValidationPolicy,
) -> Result<AcceptedBatch, BatchRejection> {
    accept_bytes(name, contents.as_bytes(), policy)
}

/// Like [`accept_batch`], for raw file bytes. Text that is not UTF-8 is
/// malformed.
///
/// # Errors
///
/// [`BatchRejection::Malformed`] for invalid JSON or encoding, otherwise
/// whatever [`validate`] reports.
pub fn accept_bytes(
    name: &str,
    contents: &[u8],
    policy: ValidationPolicy,
) -> Result<AcceptedBatch, BatchRejection> {
    let parsed: Value = serde_json::from_slice(contents)
        .map_err(|e| BatchRejection::Malformed(e.to_string()))?;
    accept_value(name, &parsed, policy)
}

/// Screen every uploaded batch independently.
pub fn screen_batches<'a, I>(sources: I, policy: ValidationPolicy) -> IngestReport
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    sources
        .into_iter()
        .fold(IngestReport::default(), |mut report, (name, contents)| {
            report.push(name, accept_batch(name, contents, policy));
            report
        })
}

/// Build the canonical table from accepted batches, in acceptance order.
#[must_use]
pub fn normalize(batches: &[AcceptedBatch]) -> CanonicalTable {
    let table = CanonicalTable::from_raw(batches.iter().flat_map(|batch| batch.records.iter()));
    info!(
        "Normalized {} records from {} batches",
        table.len(),
        batches.len()
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(ts: &str, track: &str) -> Value {
        json!({
            "ts": ts,
            "ms_played": 60000,
            "master_metadata_track_name": track,
            "master_metadata_album_artist_name": "Artist",
            "master_metadata_album_album_name": "Album"
        })
    }

    #[test]
    fn test_rejects_non_sequence() {
        let result = validate(
            &json!({"ts": "2024-01-01T00:00:00Z"}),
            ValidationPolicy::FirstRecord,
        );
        assert_eq!(result, Err(BatchRejection::NotASequence));

        let scalar = validate(&json!(42), ValidationPolicy::FirstRecord);
        assert_eq!(scalar, Err(BatchRejection::NotASequence));
    }

    #[test]
    fn test_rejects_empty_batch_with_no_data_message() {
        let rejection = validate(&json!([]), ValidationPolicy::FirstRecord).unwrap_err();

        assert_eq!(rejection, BatchRejection::Empty);
        assert!(rejection.to_string().contains("no playback data"));
    }

    #[test]
    fn test_first_record_missing_field_rejects_whole_batch() {
        let batch = json!([
            {
                "ts": "2024-01-01T00:00:00Z",
                "ms_played": 1000,
                "master_metadata_track_name": "A",
                "master_metadata_album_artist_name": "X"
            },
            record("2024-01-01T00:05:00Z", "B")
        ]);

        let rejection = validate(&batch, ValidationPolicy::FirstRecord).unwrap_err();
        assert_eq!(
            rejection,
            BatchRejection::MissingField {
                field: "master_metadata_album_album_name",
                index: 0
            }
        );
    }

    #[test]
    fn test_shallow_policy_accepts_bad_later_records() {
        let batch = json!([
            record("2024-01-01T00:00:00Z", "A"),
            {"ts": "garbage"},
            "not even an object"
        ]);

        let accepted = accept_value("upload.json", &batch, ValidationPolicy::FirstRecord)
            .expect("only the first record is checked");
        assert_eq!(accepted.records.len(), 3);
        assert_eq!(accepted.records[2], RawRecord::default());
    }

    #[test]
    fn test_strict_policy_checks_every_record() {
        let batch = json!([record("2024-01-01T00:00:00Z", "A"), {"ts": "2024-01-01T00:01:00Z"}]);

        let rejection = validate(&batch, ValidationPolicy::EveryRecord).unwrap_err();
        assert_eq!(
            rejection,
            BatchRejection::MissingField { field: "ms_played", index: 1 }
        );

        let not_object = json!([record("2024-01-01T00:00:00Z", "A"), 7]);
        assert_eq!(
            validate(&not_object, ValidationPolicy::EveryRecord),
            Err(BatchRejection::RecordNotObject { index: 1 })
        );
    }

    #[test]
    fn test_null_values_count_as_present() {
        let batch = json!([{
            "ts": null,
            "ms_played": null,
            "master_metadata_track_name": null,
            "master_metadata_album_artist_name": null,
            "master_metadata_album_album_name": null
        }]);

        assert!(validate(&batch, ValidationPolicy::FirstRecord).is_ok());
    }

    #[test]
    fn test_rejection_does_not_abort_other_batches() {
        let good = json!([
            record("2024-01-01T00:00:00Z", "A"),
            record("2024-01-01T00:03:00Z", "B")
        ])
        .to_string();
        let other = json!([record("2024-01-02T00:00:00Z", "C")]).to_string();

        let report = screen_batches(
            [
                ("first.json", good.as_str()),
                ("broken.json", "{ not json"),
                ("empty.json", "[]"),
                ("second.json", other.as_str()),
            ],
            ValidationPolicy::FirstRecord,
        );

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0].reason, BatchRejection::Malformed(_)));
        assert_eq!(report.rejected[1].reason, BatchRejection::Empty);
        assert_eq!(report.accepted_records(), 3);
    }

    #[test]
    fn test_zero_valid_batches_is_an_error() {
        let report = screen_batches([("only.json", "[]")], ValidationPolicy::FirstRecord);

        match report.into_accepted() {
            Err(IngestError::NoValidBatches(rejected)) => {
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].name, "only.json");
            }
            Ok(_) => panic!("an empty sole batch must not be accepted"),
        }
    }

    #[test]
    fn test_table_length_matches_accepted_records() {
        let a = json!([
            record("2024-01-01T00:00:00Z", "A"),
            record("2024-01-01T00:03:00Z", "B")
        ])
        .to_string();
        let b = json!([record("2023-05-01T10:00:00Z", "C")]).to_string();
        let report = screen_batches(
            [("a", a.as_str()), ("b", b.as_str())],
            ValidationPolicy::FirstRecord,
        );
        let expected = report.accepted_records();

        let table = normalize(&report.into_accepted().unwrap());
        assert_eq!(table.len(), expected);
        // Batch order, then record order.
        let tracks: Vec<_> = table.iter().map(|e| e.track_name.as_deref()).collect();
        assert_eq!(tracks, vec![Some("A"), Some("B"), Some("C")]);
    }

    #[test]
    fn test_non_utf8_bytes_are_malformed() {
        let mut bytes = json!([record("2024-01-01T00:00:00Z", "Caf")]).to_string().into_bytes();
        let at = bytes.windows(3).position(|w| w == b"Caf").unwrap() + 3;
        bytes.insert(at, 0xE9);

        let rejection = accept_bytes("latin1.json", &bytes, ValidationPolicy::FirstRecord);
        assert!(matches!(rejection, Err(BatchRejection::Malformed(_))));
    }

    #[test]
    fn test_push_keeps_upload_order() {
        let good = json!([record("2024-01-01T00:00:00Z", "A")]).to_string();
        let mut report = IngestReport::default();

        report.push(
            "missing.json",
            Err(BatchRejection::Unreadable("No such file".to_string())),
        );
        report.push("good.json", accept_batch("good.json", &good, ValidationPolicy::FirstRecord));
        report.push("bad.json", accept_bytes("bad.json", b"\xff[", ValidationPolicy::FirstRecord));

        assert_eq!(report.accepted.len(), 1);
        let rejected: Vec<_> = report.rejected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(rejected, vec!["missing.json", "bad.json"]);
        assert!(report.rejected[0].reason.to_string().contains("could not be read"));
    }
}
