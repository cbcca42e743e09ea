//! # Configuration Module
//!
//! Data directory resolution and the optional runtime configuration file.
//!
//! ## Data Storage
//!
//! Replay keeps the current session in the platform-standard data directory:
//! - Linux: `~/.local/share/replay/`
//! - macOS: `~/Library/Application Support/replay/`
//! - Windows: `%APPDATA%\replay\`
//!
//! The location can be overridden with `--data-dir` or `REPLAY_DATA_DIR`.
//!
//! ## Runtime Configuration
//!
//! An optional `config.json` in the data directory tunes thresholds and
//! defaults. Missing keys fall back to [`RuntimeConfig::default`]:
//!
//! ```json
//! { "min_artist_plays": 5, "min_track_plays": 3, "validation": "every_record" }
//! ```

use crate::ingest::ValidationPolicy;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
const SESSION_DIR: &str = "session";

/// Returns the platform-appropriate data directory for Replay, creating it
/// if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The replay subdirectory cannot be created due to permissions
///
/// # Examples
///
/// ```no_run
/// use replay::config::get_data_dir;
///
/// let data_dir = get_data_dir()?;
/// println!("Session data lives in {}", data_dir.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Use --data-dir or REPLAY_DATA_DIR to choose one."
        )
    })?;

    let replay_dir = data_dir.join("replay");
    ensure_dir(&replay_dir)?;
    Ok(replay_dir)
}

/// Resolve the data directory, preferring an explicit override.
///
/// # Errors
///
/// Fails when the directory cannot be determined or created.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => {
            ensure_dir(dir)?;
            Ok(dir.to_path_buf())
        }
        None => get_data_dir(),
    }
}

/// Directory holding the stored batches of the current session.
#[must_use]
pub fn session_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_DIR)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "Failed to create Replay data directory at {}. Please check file permissions.",
            dir.display()
        )
    })
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Plays an artist needs before its completion rate is trusted
    pub min_artist_plays: usize,
    /// Plays a track needs before its completion rate is trusted
    pub min_track_plays: usize,
    /// Default length of ranked lists
    pub top_n: usize,
    pub validation: ValidationPolicy,
    /// Speed of the road trips in travel comparisons, km/h
    pub travel_speed_kmh: f64,
    pub fun_fact_count: usize,
    pub destination_count: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            min_artist_plays: 5,
            min_track_plays: 3,
            top_n: 10,
            validation: ValidationPolicy::FirstRecord,
            travel_speed_kmh: 80.0,
            fun_fact_count: 2,
            destination_count: 2,
        }
    }
}

impl RuntimeConfig {
    /// Load `config.json` from `data_dir`, or the defaults when absent.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("No {} in {}, using defaults", CONFIG_FILE, data_dir.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        debug!("Loaded runtime config: {config:?}");
        Ok(config)
    }
}
