//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Replay using Clap derive macros.
//! Every analysis command reads the session stored by the last `load` or `demo`.
//!
//! ## Commands
//!
//! - `load`: Validate export files and make them the active session
//! - `demo`: Load the built-in demonstration dataset
//! - `overview`, `hours`, `heatmap`, `years`, `evolution`: Dashboard views
//! - `top`: Ranked artists, tracks, albums or platforms, optionally filtered
//! - `artist`: Search an artist and list their tracks
//! - `flow`: What gets played before and after a track
//! - `recommend`: Listening-pattern recommendations
//! - `facts`: Fun facts and travel comparisons
//! - `export`: Write the session back out in the export layout
//!
//! ## Examples
//!
//! ```bash
//! replay load StreamingHistory0.json StreamingHistory1.json
//! replay top artist --period night --weekday friday
//! replay flow "Bohemian Rhapsody"
//! replay facts --city London
//! ```

use crate::aggregate::{Dimension, HourPeriod};
use crate::views::TrendMetric;
use chrono::Weekday;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Column ranked by `top`
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Column {
    Artist,
    Track,
    Album,
    /// Ranked by play count instead of minutes
    Platform,
}

impl From<Column> for Dimension {
    fn from(column: Column) -> Self {
        match column {
            Column::Artist => Self::Artist,
            Column::Track => Self::Track,
            Column::Album => Self::Album,
            Column::Platform => Self::Platform,
        }
    }
}

/// Time-of-day filter
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Period {
    /// 0h to 6h
    Dawn,
    /// 6h to 12h
    Morning,
    /// 12h to 18h
    Afternoon,
    /// 18h to 24h
    Night,
}

impl From<Period> for HourPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Dawn => Self::Dawn,
            Period::Morning => Self::Morning,
            Period::Afternoon => Self::Afternoon,
            Period::Night => Self::Night,
        }
    }
}

/// Day-of-week filter
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Day> for Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Monday => Self::Mon,
            Day::Tuesday => Self::Tue,
            Day::Wednesday => Self::Wed,
            Day::Thursday => Self::Thu,
            Day::Friday => Self::Fri,
            Day::Saturday => Self::Sat,
            Day::Sunday => Self::Sun,
        }
    }
}

/// Measure for the per-year evolution breakdown
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Trend {
    /// Minutes listened
    Minutes,
    /// Number of plays
    Plays,
    /// Share of plays that were skipped, in percent
    Skipped,
}

impl From<Trend> for TrendMetric {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::Minutes => Self::Minutes,
            Trend::Plays => Self::Plays,
            Trend::Skipped => Self::SkippedShare,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "replay")]
#[command(about = "Replay: personal listening-history analytics from streaming exports")]
#[command(version)]
pub struct Args {
    /// Directory holding the session and config.json
    ///
    /// Defaults to the platform data directory (e.g. ~/.local/share/replay).
    #[arg(long, global = true, env = "REPLAY_DATA_DIR", value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Load streaming-history export files
    ///
    /// Each file must be a JSON list of playback records. Files that fail
    /// validation are reported and skipped; the rest replace the current
    /// session.
    Load {
        /// Export files to load
        #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,

        /// Check every record for the mandatory fields, not only the first
        #[arg(long)]
        strict: bool,
    },

    /// Load the built-in demonstration dataset
    Demo,

    /// Discard the current session
    Reset,

    /// Totals and top artists, tracks, albums and platforms
    Overview {
        /// Number of entries per ranking
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Minutes per hour of the day and per period
    Hours,

    /// Weekday by hour listening heatmap
    Heatmap,

    /// Compare the most recent years
    Years,

    /// Month-by-month trends
    ///
    /// With --year or --metric, one measure per month is shown for each
    /// selected year instead (the two most recent years by default).
    Evolution {
        /// Year to include; repeat for several
        #[arg(long = "year", value_name = "YEAR")]
        years: Vec<i32>,

        /// Measure to follow per month
        #[arg(long)]
        metric: Option<Trend>,
    },

    /// Rank a column by minutes listened
    ///
    /// With --period or --weekday only matching plays count.
    Top {
        /// What to rank
        column: Column,

        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only plays in this part of the day
        #[arg(long)]
        period: Option<Period>,

        /// Only plays on this day of the week
        #[arg(long)]
        weekday: Option<Day>,
    },

    /// Show an artist's tracks, or suggestions when the name is not exact
    Artist {
        /// Artist name or part of it (case-insensitive)
        #[arg(value_hint = clap::ValueHint::Other)]
        name: String,
    },

    /// Tracks most often played right before and after a track
    Flow {
        /// Exact track name
        #[arg(value_hint = clap::ValueHint::Other)]
        track: String,

        /// Number of neighbors per direction
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Recommendations drawn from listening patterns
    Recommend,

    /// Fun facts about the total listening time
    Facts {
        /// Your city, for travel comparisons
        #[arg(long)]
        city: Option<String>,

        /// Number of fun facts
        #[arg(short, long)]
        count: Option<usize>,

        /// Skip the travel comparisons even when a city is given
        #[arg(long)]
        facts_only: bool,

        /// Seed for repeatable picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the session back out as a single export file
    Export {
        /// Destination JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Generate shell completions
    ///
    /// Usage: replay completion bash > ~/.local/share/bash-completion/completions/replay
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate completion with track and artist name completion
    ///
    /// Usage: replay completion-enhanced fish > ~/.config/fish/completions/replay.fish
    CompletionEnhanced {
        /// Shell to generate enhanced completions for (currently bash and fish supported)
        shell: Shell,
    },

    /// List track names for completion (hidden command)
    #[command(hide = true)]
    CompleteTracks,

    /// List artist names for completion (hidden command)
    #[command(hide = true)]
    CompleteArtists,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_filtered_top() {
        let args = Args::try_parse_from([
            "replay", "top", "artist", "--period", "night", "--weekday", "friday", "-l", "3",
        ])
        .unwrap();

        match args.command {
            Command::Top {
                column,
                limit,
                period,
                weekday,
            } => {
                assert_eq!(column, Column::Artist);
                assert_eq!(limit, Some(3));
                assert_eq!(period.map(HourPeriod::from), Some(HourPeriod::Night));
                assert_eq!(weekday.map(Weekday::from), Some(Weekday::Fri));
            }
            _ => panic!("expected top"),
        }
    }

    #[test]
    fn test_load_requires_files() {
        assert!(Args::try_parse_from(["replay", "load"]).is_err());

        let args =
            Args::try_parse_from(["replay", "load", "a.json", "b.json", "--strict"]).unwrap();
        match args.command {
            Command::Load { files, strict } => {
                assert_eq!(files.len(), 2);
                assert!(strict);
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn test_global_data_dir() {
        let args =
            Args::try_parse_from(["replay", "overview", "--data-dir", "/tmp/replay"]).unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/replay")));
    }

    #[test]
    fn test_parse_evolution_years_and_metric() {
        let args = Args::try_parse_from([
            "replay", "evolution", "--year", "2023", "--year", "2024", "--metric", "skipped",
        ])
        .unwrap();

        match args.command {
            Command::Evolution { years, metric } => {
                assert_eq!(years, vec![2023, 2024]);
                assert_eq!(metric.map(TrendMetric::from), Some(TrendMetric::SkippedShare));
            }
            _ => panic!("expected evolution"),
        }

        let plain = Args::try_parse_from(["replay", "evolution"]).unwrap();
        assert!(matches!(
            plain.command,
            Command::Evolution { ref years, metric: None } if years.is_empty()
        ));
    }
}
