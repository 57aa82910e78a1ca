//! # MBP-10 Reconstructor
//!
//! Offline reconstruction of a limit order book from Market-By-Order (MBO)
//! events, emitting depth-10 Market-By-Price (MBP-10) snapshots for every
//! event that changes the visible top of book.
//!
//! ## Features
//!
//! - **📊 MBO → MBP-10 reconstruction**: order-level events in, aggregated
//!   depth-10 snapshot rows out, single-pass and deterministic
//! - **⚡ Event-driven book**: FIFO queues within price levels, price
//!   priority across levels, O(1) order-id lookups
//! - **🔁 Composite trade collapsing**: the venue's Trade→Fill→Cancel
//!   encoding of one execution becomes one attributed snapshot
//! - **🧹 Feed hygiene**: orphan cancels and their retransmitted re-adds
//!   are suppressed; no-op snapshots are diffed away
//! - **📈 Run statistics**: per-category warning counts and emission totals
//!
//! ## Quick Start
//!
//! ```rust
//! use mbp10_reconstructor::{Action, MboEvent, MbpPipeline, PipelineConfig, Side};
//!
//! let events = vec![
//!     // $100.50 bid for 1000, $100.75 ask for 500
//!     MboEvent::new(1001, Action::Add, Side::Bid, 100_500_000_000, 1000),
//!     MboEvent::new(1002, Action::Add, Side::Ask, 100_750_000_000, 500),
//! ];
//!
//! let mut pipeline = MbpPipeline::new(PipelineConfig::default());
//! let mut snapshots = Vec::new();
//! pipeline.run(&events, &mut snapshots).unwrap();
//!
//! assert_eq!(snapshots.len(), 2);
//! assert_eq!(snapshots[1].levels.bids[0].size, 1000);
//! assert_eq!(snapshots[1].levels.asks[0].size, 500);
//! ```
//!
//! ## Processing a CSV file
//!
//! ```ignore
//! use mbp10_reconstructor::{parse_file, MbpCsvWriter, MbpPipeline, PipelineConfig, WarningTracker};
//!
//! let mut warnings = WarningTracker::new(true);
//! let (events, _stats) = parse_file("mbo.csv", &mut warnings)?;
//!
//! let mut writer = MbpCsvWriter::create("output.csv")?;
//! let mut pipeline = MbpPipeline::new(PipelineConfig::default());
//! pipeline.run(&events, &mut writer)?;
//! writer.flush()?;
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `MboEvent`, `Action`, `Side`, fixed-point prices |
//! | [`lob`] | Book store and event processor: `Book`, `EventProcessor` |
//! | [`snapshot`] | Snapshot projection: `Top10State`, `MbpSnapshot` |
//! | [`pipeline`] | Emission policy: `MbpPipeline`, `PipelineConfig` |
//! | [`parser`] | MBO CSV input |
//! | [`writer`] | MBP-10 CSV output |
//! | [`warnings`] | Categorized warning counters |

pub mod error;
pub mod lob;
pub mod parser;
pub mod pipeline;
pub mod snapshot;
pub mod types;
pub mod warnings;
pub mod writer;

// Re-exports - Core types
pub use error::{ReconError, Result};
pub use types::{price_from_decimal, price_to_f64, Action, MboEvent, Order, Side, PRICE_SCALE};

// Re-exports - Book and processor
pub use lob::{Book, EventProcessor, ProcessOutcome};

// Re-exports - Snapshots
pub use snapshot::{LevelView, MbpSnapshot, Top10State, DEPTH};

// Re-exports - Pipeline
pub use pipeline::{MbpPipeline, PipelineConfig, PipelineStats, SnapshotSink};

// Re-exports - I/O collaborators
pub use parser::{parse_file, parse_line, ParserStats};
pub use writer::{MbpCsvWriter, MBP_HEADER};

// Re-exports - Warnings
pub use warnings::{WarningKind, WarningTracker};
