//! # Replay - Listening History Analytics
//!
//! Replay reads the streaming-history exports a music service hands out and
//! turns them into rankings, time-of-day profiles, sequence flows and fun
//! facts. The last loaded dataset is kept as a session so every analysis
//! command works on the same table.
//!
//! ## Usage
//!
//! ```bash
//! # Load one or more export files (replaces the previous session)
//! replay load StreamingHistory0.json StreamingHistory1.json
//!
//! # Or try the built-in dataset
//! replay demo
//!
//! # Explore
//! replay overview
//! replay top artist --period night
//! replay evolution --year 2023 --year 2024 --metric skipped
//! replay flow "Popular Song"
//! replay facts --city "Rio de Janeiro"
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{thread_rng, RngCore, SeedableRng};
use replay::aggregate::{count_by, rank_counts, top_by, Dimension, EventFilter, Metric};
use replay::cli::{self, Column, Command};
use replay::completion::{self, NameKind};
use replay::config::{self, RuntimeConfig};
use replay::ingest::{accept_bytes, BatchRejection, IngestReport, ValidationPolicy};
use replay::session::{self, Session};
use replay::views::TrendMetric;
use replay::{demo, funfacts, recommend, report, sequence, views};
use std::fs;
use std::path::{Path, PathBuf};

/// Entries shown by a filtered `top` when no limit is given.
const FILTERED_TOP_DEFAULT: usize = 5;

/// Resolved data directory, its configuration and the session location.
struct Workspace {
    config: RuntimeConfig,
    session_dir: PathBuf,
}

impl Workspace {
    fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let data_dir = config::resolve_data_dir(explicit)?;
        debug!("Using data directory {}", data_dir.display());
        Ok(Self {
            config: RuntimeConfig::load(&data_dir)?,
            session_dir: config::session_dir(&data_dir),
        })
    }

    fn open_session(&self) -> Result<Session> {
        Session::open(&self.session_dir)
    }
}

/// Main entry point for Replay.
///
/// Initializes logging, parses command-line arguments, and routes commands
/// to the library. The data directory is only resolved by commands that
/// need it, so completion helpers never create it.
///
/// # Logging
///
/// Controlled via `RUST_LOG`:
/// - `RUST_LOG=debug replay load export.json` - Show rejected batches in detail
/// - `RUST_LOG=replay::sequence=debug replay flow "Song"` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let cli::Args { data_dir, command } = cli::Args::parse();
    let workspace = || Workspace::resolve(data_dir.as_deref());

    match command {
        Command::Load { files, strict } => {
            let ws = workspace()?;
            let policy = if strict {
                ValidationPolicy::EveryRecord
            } else {
                ws.config.validation
            };
            load_files(&ws.session_dir, &files, policy)?;
        }
        Command::Demo => {
            let ws = workspace()?;
            let batch = demo::demo_batch().context("Built-in demo data failed validation")?;
            let session = Session::replace(&ws.session_dir, vec![batch])?;
            println!("Loaded the demo dataset ({} plays).", session.table().len());
        }
        Command::Reset => {
            if Session::reset(&workspace()?.session_dir)? {
                println!("Session cleared.");
            } else {
                println!("No session to clear.");
            }
        }
        Command::Overview { limit } => {
            let ws = workspace()?;
            let session = ws.open_session()?;
            let view = views::overview(session.require_table()?, limit.unwrap_or(ws.config.top_n));
            report::print_overview(&view);
        }
        Command::Hours => {
            let session = workspace()?.open_session()?;
            report::print_hour_profile(&views::hour_profile(session.require_table()?));
        }
        Command::Heatmap => {
            let session = workspace()?.open_session()?;
            report::print_heatmap(&views::heatmap(session.require_table()?));
        }
        Command::Years => {
            let session = workspace()?.open_session()?;
            let table = session.require_table()?;
            let comparison = views::compare_years(table, views::YEAR_TOP_ARTISTS);
            report::print_years(comparison.as_ref());
        }
        Command::Evolution { years, metric } => {
            let session = workspace()?.open_session()?;
            let table = session.require_table()?;
            if years.is_empty() && metric.is_none() {
                let view = views::evolution(table, views::EVOLUTION_TOP_ARTISTS);
                report::print_evolution(&view);
            } else {
                let years = if years.is_empty() {
                    views::default_years(table)
                } else {
                    years
                };
                let metric = metric.map_or(TrendMetric::Minutes, Into::into);
                info!("Following {metric:?} per month for {years:?}");
                let trends = views::monthly_by_year(table, &years, metric);
                report::print_monthly_by_year(metric, &trends);
            }
        }
        Command::Top {
            column,
            limit,
            period,
            weekday,
        } => {
            let ws = workspace()?;
            let session = ws.open_session()?;
            let table = session.require_table()?;

            let filter = EventFilter {
                period: period.map(Into::into),
                weekday: weekday.map(Into::into),
                year: None,
            };
            let default_limit = if filter == EventFilter::default() {
                ws.config.top_n
            } else {
                FILTERED_TOP_DEFAULT
            };
            let limit = limit.unwrap_or(default_limit);
            let rows = filter.apply(table);
            info!("Ranking {} of {} plays", rows.len(), table.len());

            let dimension = Dimension::from(column);
            if column == Column::Platform {
                let ranked = rank_counts(count_by(rows.iter().copied(), dimension.key()), limit);
                report::print_top_plays(dimension, &ranked);
            } else {
                let ranked = top_by(rows.iter().copied(), dimension, Metric::Minutes, limit);
                report::print_top_minutes(dimension, &ranked);
            }
        }
        Command::Artist { name } => {
            let session = workspace()?.open_session()?;
            let table = session.require_table()?;
            match views::artist_profile(table, &name) {
                Some(profile) => report::print_artist_profile(&profile),
                None => {
                    let artists = table.distinct_artists();
                    let suggestions = views::suggest(&artists, &name, views::SUGGESTION_LIMIT);
                    report::print_artist_suggestions(&name, &suggestions);
                }
            }
        }
        Command::Flow { track, limit } => {
            let session = workspace()?.open_session()?;
            info!("Finding the flow around '{track}'");
            report::print_flow(&sequence::track_flow(session.require_table()?, &track, limit));
        }
        Command::Recommend => {
            let ws = workspace()?;
            let session = ws.open_session()?;
            let recommendations = recommend::generate(session.require_table()?, &ws.config);
            report::print_recommendations(&recommendations);
        }
        Command::Facts {
            city,
            count,
            facts_only,
            seed,
        } => {
            let ws = workspace()?;
            let session = ws.open_session()?;
            let hours = session.require_table()?.total_hours();
            let mut rng: Box<dyn RngCore> = match seed {
                Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
                None => Box::new(thread_rng()),
            };

            let travel = match city.as_deref() {
                Some(city) if !facts_only => funfacts::travel_comparisons(
                    hours,
                    city,
                    ws.config.destination_count,
                    ws.config.travel_speed_kmh,
                    &mut rng,
                ),
                _ => Vec::new(),
            };
            let count = count.unwrap_or(ws.config.fun_fact_count);
            let facts = funfacts::pick_fun_facts(hours, count, &mut rng);
            report::print_facts(hours, &travel, &facts);
        }
        Command::Export { path } => {
            let session = workspace()?.open_session()?;
            let records = session.require_table()?.to_raw_records();
            session::write_json_atomic(&path, &records, true)?;
            println!("Exported {} records to {}", records.len(), path.display());
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
        Command::CompletionEnhanced { shell } => match shell {
            cli::Shell::Fish => print!("{}", completion::enhanced_fish_completion()),
            cli::Shell::Bash => print!("{}", completion::enhanced_bash_completion()),
            _ => bail!(
                "Enhanced completion is only available for bash and fish. \
                 Use `replay completion` for {shell:?}."
            ),
        },
        Command::CompleteTracks => {
            completion::print_name_completions(data_dir.as_deref(), NameKind::Tracks)?;
        }
        Command::CompleteArtists => {
            completion::print_name_completions(data_dir.as_deref(), NameKind::Artists)?;
        }
    }

    Ok(())
}

/// Screen `files` and make the accepted ones the new session. A file that
/// cannot be read is rejected like any other bad batch.
fn load_files(session_dir: &Path, files: &[PathBuf], policy: ValidationPolicy) -> Result<()> {
    let report = files.iter().fold(IngestReport::default(), |mut report, path| {
        let name = path.display().to_string();
        let outcome = fs::read(path)
            .map_err(|e| BatchRejection::Unreadable(e.to_string()))
            .and_then(|contents| accept_bytes(&name, &contents, policy));
        report.push(&name, outcome);
        report
    });
    report::print_ingest_report(&report);

    let session = Session::replace(session_dir, report.into_accepted()?)?;
    info!("Session now holds {} plays", session.table().len());
    Ok(())
}
