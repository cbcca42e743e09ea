//! # Session Storage
//!
//! A session is the set of batches accepted by the last `load` (or `demo`)
//! and the canonical table normalized from them. The batches are stored as
//! one JSON file each so later commands can rebuild the exact same table:
//!
//! ```text
//! <data_dir>/session/batch_0.json
//! <data_dir>/session/batch_1.json
//! ```
//!
//! Loading new data always replaces the previous dataset. The new batches
//! are first written to a staging directory beside the session and only
//! swapped in once every one of them is on disk, so a failed write leaves
//! the previous session as it was.

use crate::ingest::{normalize, AcceptedBatch};
use crate::table::CanonicalTable;
use anyhow::{bail, Context, Result};
use log::{debug, info, trace};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const BATCH_PREFIX: &str = "batch_";
const BATCH_SUFFIX: &str = ".json";
const STAGING_PREFIX: &str = ".session-staging-";

/// The active dataset.
#[derive(Debug, Clone)]
pub struct Session {
    dir: PathBuf,
    batches: Vec<AcceptedBatch>,
    table: CanonicalTable,
}

impl Session {
    /// Open the session stored in `dir`. A missing directory is an empty
    /// session.
    ///
    /// # Errors
    ///
    /// Fails when a stored batch cannot be read or decoded.
    pub fn open(dir: &Path) -> Result<Self> {
        let batches = read_batches(dir)?;
        let table = normalize(&batches);
        debug!("Opened session at {} with {} rows", dir.display(), table.len());

        Ok(Self {
            dir: dir.to_path_buf(),
            batches,
            table,
        })
    }

    /// Replace whatever is stored in `dir` with `batches`.
    ///
    /// # Errors
    ///
    /// Fails when a batch cannot be written or the old session cannot be
    /// swapped out. A write failure leaves the old session in place.
    pub fn replace(dir: &Path, batches: Vec<AcceptedBatch>) -> Result<Self> {
        Self::replace_with(dir, batches, write_batch)
    }

    fn replace_with<W>(dir: &Path, batches: Vec<AcceptedBatch>, write: W) -> Result<Self>
    where
        W: Fn(&Path, usize, &AcceptedBatch) -> Result<()>,
    {
        if batches.is_empty() {
            bail!("Refusing to store a session without any batch");
        }

        let parent = parent_dir(dir);
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .with_context(|| {
                format!("Failed to create staging directory in {}", parent.display())
            })?;

        for (index, batch) in batches.iter().enumerate() {
            write(staging.path(), index, batch)?;
        }

        Self::reset(dir)?;
        fs::rename(staging.path(), dir)
            .with_context(|| format!("Failed to move the new session into {}", dir.display()))?;

        let table = normalize(&batches);
        info!(
            "Stored {} batches ({} rows) in {}",
            batches.len(),
            table.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            batches,
            table,
        })
    }

    /// Delete the stored session. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Fails when the directory exists but cannot be removed.
    pub fn reset(dir: &Path) -> Result<bool> {
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to remove session directory {}", dir.display()))?;
        debug!("Removed session directory {}", dir.display());
        Ok(true)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.batches.is_empty()
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn batches(&self) -> &[AcceptedBatch] {
        &self.batches
    }

    #[must_use]
    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    /// The table, or an error telling the user how to load one.
    ///
    /// # Errors
    ///
    /// Fails when no dataset has been loaded.
    pub fn require_table(&self) -> Result<&CanonicalTable> {
        if !self.is_loaded() {
            bail!(
                "No listening history loaded. Run `replay load <FILES>...` or `replay demo` first."
            );
        }
        Ok(&self.table)
    }
}

fn batch_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{BATCH_PREFIX}{index}{BATCH_SUFFIX}"))
}

fn batch_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(BATCH_PREFIX)?
        .strip_suffix(BATCH_SUFFIX)?
        .parse()
        .ok()
}

/// Directory a temporary file for `path` can be created in.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Serialize `value` as JSON to `path`, replacing it atomically through a
/// temporary file in the same directory.
///
/// # Errors
///
/// Fails when the temporary file cannot be created, written or renamed.
pub fn write_json_atomic<T>(path: &Path, value: &T, pretty: bool) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let dir = parent_dir(path);
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let written = if pretty {
        serde_json::to_writer_pretty(&mut file, value)
    } else {
        serde_json::to_writer(&mut file, value)
    };
    written.with_context(|| format!("Failed to serialize {}", path.display()))?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_batch(dir: &Path, index: usize, batch: &AcceptedBatch) -> Result<()> {
    let path = batch_path(dir, index);
    write_json_atomic(&path, batch, false)
        .with_context(|| format!("Failed to store batch '{}'", batch.name))?;
    trace!("Wrote batch '{}' to {}", batch.name, path.display());
    Ok(())
}

/// Stored batches in index order. Unrelated files are ignored.
fn read_batches(dir: &Path) -> Result<Vec<AcceptedBatch>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read session directory {}", dir.display()))?;

    let mut indexed = Vec::new();
    for entry in entries {
        let path = entry?.path();
        match batch_index(&path) {
            Some(index) => indexed.push((index, path)),
            None => trace!("Ignoring {}", path.display()),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .map(|(_, path)| {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read stored batch {}", path.display()))?;
            serde_json::from_str::<AcceptedBatch>(&contents).with_context(|| {
                format!("Stored batch {} is corrupt; run `replay reset`", path.display())
            })
        })
        .collect()
}
