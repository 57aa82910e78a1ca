//! MBP-10 snapshot projection.
//!
//! [`Top10State`] is the comparable view of the ten best levels per side,
//! used both for emission (every snapshot embeds one) and for pre/post
//! diffing by the pipeline. [`MbpSnapshot::project`] is pure: two
//! projections from the same book yield identical level fields.

use crate::types::{Action, MboEvent, Side};

/// Depth of the published book view.
pub const DEPTH: usize = 10;

/// One aggregated price level as it appears in a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelView {
    /// Fixed-point price; 0 for an absent level
    pub price: i64,
    /// Total resting size at the level
    pub size: u64,
    /// Number of live orders at the level
    pub count: u32,
}

/// Top-10 bid and ask levels, zero-padded below the live depth.
///
/// Bids run highest-first, asks lowest-first. Equality compares every
/// field of every level, which is exactly the "did the visible book
/// change" question the emission logic asks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Top10State {
    pub bids: [LevelView; DEPTH],
    pub asks: [LevelView; DEPTH],
}

impl Top10State {
    /// Number of non-empty bid levels.
    pub fn bid_depth(&self) -> usize {
        self.bids.iter().take_while(|l| l.price != 0).count()
    }

    /// Number of non-empty ask levels.
    pub fn ask_depth(&self) -> usize {
        self.asks.iter().take_while(|l| l.price != 0).count()
    }
}

/// An MBP-10 snapshot row: the triggering event's metadata, the attributed
/// action/side, and the book's top ten levels per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbpSnapshot {
    /// Timestamp of the triggering event (nanoseconds since UNIX epoch)
    pub ts_event: i64,
    /// Venue sequence number of the triggering event
    pub sequence: u64,
    /// Attributed action (a collapsed composite emits `Trade`)
    pub action: Action,
    /// Attributed side (the resting side for a collapsed composite)
    pub side: Side,
    /// Triggering event's price (fixed-point; 0 renders empty)
    pub price: i64,
    /// Triggering event's size
    pub size: u64,
    /// Triggering event's order id
    pub order_id: u64,
    /// Triggering event's venue flags
    pub flags: u8,
    /// Triggering event's matching-engine delta
    pub ts_in_delta: i32,
    /// Ten best levels per side at projection time
    pub levels: Top10State,
}

impl MbpSnapshot {
    /// Build a snapshot from the triggering event, the attributed
    /// action/side, and the current top-of-book state.
    pub fn project(event: &MboEvent, action: Action, side: Side, levels: Top10State) -> Self {
        Self {
            ts_event: event.ts_event,
            sequence: event.sequence,
            action,
            side,
            price: event.price,
            size: event.size,
            order_id: event.order_id,
            flags: event.flags,
            ts_in_delta: event.ts_in_delta,
            levels,
        }
    }
}
