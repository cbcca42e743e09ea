//! Personal listening-history analytics built from streaming-service exports.
//!
//! Core modules:
//! - [`record`] - Raw export records and the normalized playback event
//! - [`ingest`] - Batch validation and normalization
//! - [`table`] - The canonical table every view reads from
//! - [`aggregate`] - Generic group/sum/rank primitives and row filters
//! - [`views`] - Overview, hour profile, heatmap, year comparison, evolution
//! - [`sequence`] - Tracks played right before and after a track
//! - [`recommend`] - Completion-rate and routine based recommendations
//! - [`funfacts`] - Fun facts and travel comparisons for the total time
//!
//! ### Supporting Modules
//!
//! - [`config`] - Data directory and runtime configuration
//! - [`session`] - Persistence of the active dataset between commands
//! - [`demo`] - Built-in demonstration dataset
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`report`] - Terminal rendering of the views
//!
//! ## Quick Start Example
//!
//! ```
//! use replay::{aggregate, demo, ingest, sequence};
//!
//! let batch = demo::demo_batch()?;
//! let table = ingest::normalize(&[batch]);
//!
//! let top = aggregate::top_by(
//!     &table,
//!     aggregate::Dimension::Artist,
//!     aggregate::Metric::Minutes,
//!     3,
//! );
//! assert_eq!(top.len(), 3);
//!
//! let after = sequence::adjacent_tracks(&table, "Popular Song", sequence::Direction::After, 5);
//! assert!(!after.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Data Flow
//!
//! Export files are screened batch by batch: a batch that is not a JSON list
//! of objects carrying the mandatory fields is rejected with a reason while
//! the others proceed. Accepted batches are concatenated into a
//! [`table::CanonicalTable`] with calendar fields and played time derived
//! once per row. Every analysis is a pure function of that table, so filters
//! produce views and never mutate it.
//!
//! ## Error Handling
//!
//! Batch-level problems are typed ([`ingest::BatchRejection`]); everything
//! touching the filesystem returns `anyhow::Result` with context.

pub mod aggregate;
pub mod cli;
pub mod completion;
pub mod config;
pub mod demo;
pub mod funfacts;
pub mod ingest;
pub mod recommend;
pub mod record;
pub mod report;
pub mod sequence;
pub mod session;
pub mod table;
pub mod views;
