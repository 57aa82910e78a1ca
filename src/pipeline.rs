//! Emission pipeline: decides which events become MBP-10 rows.
//!
//! The pipeline owns the book and the event processor and drives them over
//! the input in source order, single-threaded and single-pass apart from a
//! cheap prefix scan that marks composite Trade→Fill→Cancel triples. Its
//! emission policy:
//!
//! - the leading Reset is applied but not emitted (the day starts empty);
//! - a composite triple collapses into one row, written on the closing
//!   Cancel and attributed to the resting side the Fill reported;
//! - cancels for unknown order ids are suppressed, and a later Add
//!   re-using such an id is suppressed with it (retransmitted stale pairs);
//! - standalone adds and cancels emit only when the visible top ten levels
//!   actually changed across the mutation;
//! - standalone directional trades consume the opposite side and emit
//!   unconditionally by default — prints are market-observable even when
//!   the visible depth is untouched.

use ahash::AHashSet;
use serde::Serialize;

use crate::error::Result;
use crate::lob::{Book, EventProcessor};
use crate::snapshot::MbpSnapshot;
use crate::types::{Action, MboEvent, Side};
use crate::warnings::{WarningKind, WarningTracker};

/// Where the pipeline writes finished snapshots.
pub trait SnapshotSink {
    fn write_snapshot(&mut self, snapshot: &MbpSnapshot) -> Result<()>;
}

/// Collect snapshots in memory (tests and library callers).
impl SnapshotSink for Vec<MbpSnapshot> {
    fn write_snapshot(&mut self, snapshot: &MbpSnapshot) -> Result<()> {
        self.push(*snapshot);
        Ok(())
    }
}

/// Configuration for pipeline behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Emit standalone directional trades even when the top ten levels did
    /// not change (cross/dark prints). Default: true.
    pub emit_unchanged_trades: bool,

    /// Forward warnings to the `log` facade. Default: true.
    pub log_warnings: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            emit_unchanged_trades: true,
            log_warnings: true,
        }
    }
}

impl PipelineConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether standalone trades emit without a visible depth change.
    pub fn with_emit_unchanged_trades(mut self, emit: bool) -> Self {
        self.emit_unchanged_trades = emit;
        self
    }

    /// Enable/disable warning logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }
}

/// Statistics for monitoring a reconstruction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Total events consumed
    pub events_processed: u64,

    /// Snapshot rows handed to the sink
    pub snapshots_written: u64,

    /// Trade→Fill→Cancel triples collapsed into single rows
    pub triples_collapsed: u64,

    /// Cancels suppressed because the order id was unknown
    pub orphan_cancels_filtered: u64,

    /// Adds suppressed because they re-used a failed-cancel id
    pub readds_suppressed: u64,

    /// Add/Cancel events that left the top ten levels unchanged
    pub unchanged_suppressed: u64,
}

/// Role of an event position in the composite-triple prefix scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TripleRole {
    /// Not part of a triple
    Standalone,
    /// Trade or Fill leg: process silently
    Leg,
    /// Closing Cancel: process and emit the collapsed row
    Close,
}

/// The MBO → MBP-10 emission pipeline.
#[derive(Debug, Clone)]
pub struct MbpPipeline {
    config: PipelineConfig,
    book: Book,
    processor: EventProcessor,
    warnings: WarningTracker,
    /// Ids of cancels that referenced unknown orders; a later Add with one
    /// of these ids is a retransmission artifact and is dropped
    failed_cancels: AHashSet<u64>,
    stats: PipelineStats,
}

impl Default for MbpPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl MbpPipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let warnings = WarningTracker::new(config.log_warnings);
        Self {
            config,
            book: Book::new(),
            processor: EventProcessor::new(),
            warnings,
            failed_cancels: AHashSet::new(),
            stats: PipelineStats::default(),
        }
    }

    /// Run the full event sequence through the book, writing snapshots to
    /// the sink. May be called repeatedly; book and filter state carry over.
    pub fn run<S: SnapshotSink>(&mut self, events: &[MboEvent], sink: &mut S) -> Result<()> {
        let roles = scan_triples(events);

        for (i, event) in events.iter().enumerate() {
            self.stats.events_processed += 1;

            // The day begins with an empty book by construction: apply the
            // leading Reset but do not publish it
            if self.stats.events_processed == 1 && event.action == Action::Reset {
                self.processor
                    .process(&mut self.book, event, &mut self.warnings);
                log::debug!("initial reset suppressed");
                continue;
            }

            match roles[i] {
                TripleRole::Leg => {
                    self.processor
                        .process(&mut self.book, event, &mut self.warnings);
                }
                TripleRole::Close => {
                    let outcome =
                        self.processor
                            .process(&mut self.book, event, &mut self.warnings);
                    if outcome.should_emit {
                        self.emit(
                            event,
                            outcome.attributed_action,
                            outcome.attributed_side,
                            sink,
                        )?;
                        self.stats.triples_collapsed += 1;
                    }
                }
                TripleRole::Standalone => self.process_standalone(event, sink)?,
            }
        }

        Ok(())
    }

    fn process_standalone<S: SnapshotSink>(
        &mut self,
        event: &MboEvent,
        sink: &mut S,
    ) -> Result<()> {
        match event.action {
            Action::Cancel => {
                // Orphan cancel: remember the id and drop the event. Id 0 is
                // the "no specific order" sentinel, not a real orphan.
                if event.order_id != 0 && !self.book.order_exists(event.order_id) {
                    self.failed_cancels.insert(event.order_id);
                    self.warnings.record(
                        WarningKind::UnknownCancel,
                        format!("cancel for unknown order {}", event.order_id),
                    );
                    self.stats.orphan_cancels_filtered += 1;
                    return Ok(());
                }
                self.apply_diffed(event, sink)
            }
            Action::Add => {
                if self.failed_cancels.remove(&event.order_id) {
                    self.stats.readds_suppressed += 1;
                    log::debug!(
                        "suppressed re-add of order {} after failed cancel",
                        event.order_id
                    );
                    return Ok(());
                }
                self.apply_diffed(event, sink)
            }
            Action::Trade => self.apply_standalone_trade(event, sink),
            Action::Fill | Action::Reset => {
                let outcome = self
                    .processor
                    .process(&mut self.book, event, &mut self.warnings);
                if outcome.should_emit {
                    self.emit(
                        event,
                        outcome.attributed_action,
                        outcome.attributed_side,
                        sink,
                    )?;
                }
                Ok(())
            }
        }
    }

    /// Standalone adds and cancels publish only when they moved the
    /// visible book.
    fn apply_diffed<S: SnapshotSink>(&mut self, event: &MboEvent, sink: &mut S) -> Result<()> {
        let pre = self.book.top10();
        let outcome = self
            .processor
            .process(&mut self.book, event, &mut self.warnings);
        if !outcome.should_emit {
            return Ok(());
        }

        let post = self.book.top10();
        if pre == post {
            self.stats.unchanged_suppressed += 1;
            log::debug!(
                "suppressed no-op {:?} for order {}",
                event.action,
                event.order_id
            );
            return Ok(());
        }

        self.emit(event, outcome.attributed_action, outcome.attributed_side, sink)
    }

    /// A directional trade outside a triple consumes the resting side
    /// directly; the composite latch stays untouched. Non-directional
    /// trades are observable prints that leave the book alone.
    fn apply_standalone_trade<S: SnapshotSink>(
        &mut self,
        event: &MboEvent,
        sink: &mut S,
    ) -> Result<()> {
        if event.side == Side::None {
            return self.emit(event, Action::Trade, Side::None, sink);
        }

        let pre = self.book.top10();
        self.book
            .fill_level(event.side.opposite(), event.price, event.size);
        let post = self.book.top10();

        if !self.config.emit_unchanged_trades && pre == post {
            self.stats.unchanged_suppressed += 1;
            return Ok(());
        }
        self.emit(event, Action::Trade, event.side, sink)
    }

    fn emit<S: SnapshotSink>(
        &mut self,
        event: &MboEvent,
        action: Action,
        side: Side,
        sink: &mut S,
    ) -> Result<()> {
        let snapshot = MbpSnapshot::project(event, action, side, self.book.top10());
        sink.write_snapshot(&snapshot)?;
        self.stats.snapshots_written += 1;
        Ok(())
    }

    /// Run statistics so far.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Warning counters so far.
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// The reconstructed book (for end-of-run inspection).
    pub fn book(&self) -> &Book {
        &self.book
    }
}

/// Mark composite Trade→Fill→Cancel triples in one pass.
///
/// Positions (i, i+1, i+2) form a triple iff the actions are T, F, C in
/// order, the Fill matches the Trade's price and size, and the Cancel
/// names the Fill's order. The scan is greedy left-to-right and a position
/// belongs to at most one triple.
fn scan_triples(events: &[MboEvent]) -> Vec<TripleRole> {
    let mut roles = vec![TripleRole::Standalone; events.len()];

    let mut i = 0;
    while i + 2 < events.len() {
        let (t, f, c) = (&events[i], &events[i + 1], &events[i + 2]);
        if t.action == Action::Trade
            && f.action == Action::Fill
            && c.action == Action::Cancel
            && f.price == t.price
            && f.size == t.size
            && c.order_id == f.order_id
        {
            roles[i] = TripleRole::Leg;
            roles[i + 1] = TripleRole::Leg;
            roles[i + 2] = TripleRole::Close;
            i += 3;
        } else {
            i += 1;
        }
    }

    roles
}
