//! Book store: the pure data plane of the limit order book.
//!
//! Two ordered price ladders (bids iterated highest-first, asks
//! lowest-first) hold [`PriceLevel`]s keyed by fixed-point price, and an
//! `ahash` index maps order id → order for O(1) cancel/fill lookups. The
//! store carries no event semantics; the processor decides what mutations
//! mean.

use ahash::AHashMap;
use std::collections::BTreeMap;

use super::price_level::PriceLevel;
use crate::snapshot::{LevelView, Top10State, DEPTH};
use crate::types::{Order, Side};

/// In-memory limit order book for a single instrument.
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Bid levels keyed by price; best bid is the last key
    bids: BTreeMap<i64, PriceLevel>,

    /// Ask levels keyed by price; best ask is the first key
    asks: BTreeMap<i64, PriceLevel>,

    /// Order index: order_id → order, for O(1) lookup on cancel/fill
    orders: AHashMap<u64, Order>,
}

impl Book {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: AHashMap::with_capacity(10_000),
        }
    }

    fn ladder_mut(&mut self, side: Side) -> Option<&mut BTreeMap<i64, PriceLevel>> {
        match side {
            Side::Bid => Some(&mut self.bids),
            Side::Ask => Some(&mut self.asks),
            Side::None => None,
        }
    }

    /// Insert a new resting order.
    ///
    /// `order_id == 0` (the "no specific order" sentinel) and non-directional
    /// sides are no-op successes. Re-adding a live id is a caller bug; the
    /// processor screens duplicates before calling in.
    pub fn add_order(&mut self, order_id: u64, price: i64, size: u64, side: Side) {
        if order_id == 0 || side == Side::None {
            return;
        }
        debug_assert!(
            !self.orders.contains_key(&order_id),
            "order {order_id} already live"
        );
        debug_assert!(size > 0, "zero-size add for order {order_id}");

        let Some(ladder) = self.ladder_mut(side) else {
            return;
        };
        ladder.entry(price).or_default().push_order(order_id, size);
        self.orders.insert(
            order_id,
            Order {
                side,
                price,
                remaining_size: size,
            },
        );
    }

    /// Cancel an order fully or partially.
    ///
    /// `cancel_size == 0` means "cancel the remainder"; an oversized cancel
    /// is clamped to the remaining size. Unknown ids are a no-op. Returns
    /// the side the order rested on before the cancel.
    pub fn cancel_order(&mut self, order_id: u64, cancel_size: u64) -> Option<Side> {
        let order = *self.orders.get(&order_id)?;
        let actual = if cancel_size == 0 {
            order.remaining_size
        } else {
            cancel_size.min(order.remaining_size)
        };

        let mut level_emptied = false;
        if let Some(ladder) = self.ladder_mut(order.side) {
            if let Some(level) = ladder.get_mut(&order.price) {
                level.reduce_order(order_id, actual);
                level_emptied = level.is_empty();
            }
            if level_emptied {
                ladder.remove(&order.price);
            }
        }

        if actual == order.remaining_size {
            self.orders.remove(&order_id);
        } else if let Some(entry) = self.orders.get_mut(&order_id) {
            entry.remaining_size -= actual;
        }

        Some(order.side)
    }

    /// Consume liquidity at (side, price) in FIFO order.
    ///
    /// Absent levels are a no-op; a fill larger than the level's total size
    /// is silently absorbed. Fully consumed orders are erased from the
    /// index; a partially consumed head order keeps its queue position.
    /// Returns the size actually consumed.
    pub fn fill_level(&mut self, side: Side, price: i64, size: u64) -> u64 {
        let Some(ladder) = self.ladder_mut(side) else {
            return 0;
        };
        let Some(level) = ladder.get_mut(&price) else {
            return 0;
        };

        let result = level.fill_front(size);
        let level_emptied = level.is_empty();
        if level_emptied {
            ladder.remove(&price);
        }

        for order_id in &result.filled_order_ids {
            self.orders.remove(order_id);
        }
        if let Some((order_id, remaining)) = result.reduced {
            if let Some(order) = self.orders.get_mut(&order_id) {
                order.remaining_size = remaining;
            }
        }

        result.consumed
    }

    /// Check whether any orders rest at (side, price).
    pub fn has_orders_at(&self, side: Side, price: i64) -> bool {
        match side {
            Side::Bid => self.bids.contains_key(&price),
            Side::Ask => self.asks.contains_key(&price),
            Side::None => false,
        }
    }

    /// Check whether an order id is live in the book.
    #[inline]
    pub fn order_exists(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Look up a live order.
    #[inline]
    pub fn order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Highest bid price, if any bids rest.
    #[inline]
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price, if any asks rest.
    #[inline]
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Capture the ten best levels per side, zero-padded below the live
    /// depth. Bids are read highest-first, asks lowest-first.
    pub fn top10(&self) -> Top10State {
        let mut state = Top10State::default();

        for (i, (&price, level)) in self.bids.iter().rev().take(DEPTH).enumerate() {
            state.bids[i] = LevelView {
                price,
                size: level.total_size(),
                count: level.order_count() as u32,
            };
        }
        for (i, (&price, level)) in self.asks.iter().take(DEPTH).enumerate() {
            state.asks[i] = LevelView {
                price,
                size: level.total_size(),
                count: level.order_count() as u32,
            };
        }

        state
    }

    /// Remove all orders and levels.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Number of live orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of bid price levels.
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask price levels.
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Verify the order/level graph invariants.
    ///
    /// Every live order must appear exactly once in the queue of exactly
    /// one level on its side at its price, every level's aggregates must
    /// match its queue, and empty levels must not exist. Intended for
    /// tests and debugging; O(orders + levels).
    pub fn verify_invariants(&self) -> crate::error::Result<()> {
        use crate::error::ReconError;

        for (&order_id, order) in &self.orders {
            let ladder = match order.side {
                Side::Bid => &self.bids,
                Side::Ask => &self.asks,
                Side::None => {
                    return Err(ReconError::InconsistentState(format!(
                        "order {order_id} indexed with side N"
                    )))
                }
            };
            let level = ladder.get(&order.price).ok_or_else(|| {
                ReconError::InconsistentState(format!(
                    "order {order_id} references missing level {}",
                    order.price
                ))
            })?;
            if level.get(order_id) != Some(order.remaining_size) {
                return Err(ReconError::InconsistentState(format!(
                    "order {order_id} size mismatch between index and level queue"
                )));
            }
            if order.remaining_size == 0 {
                return Err(ReconError::InconsistentState(format!(
                    "order {order_id} live with zero remaining size"
                )));
            }
        }

        for (ladder, name) in [(&self.bids, "bid"), (&self.asks, "ask")] {
            for (&price, level) in ladder {
                if level.is_empty() || level.total_size() == 0 {
                    return Err(ReconError::InconsistentState(format!(
                        "empty {name} level at {price} not erased"
                    )));
                }
                if level.compute_actual_total() != level.total_size() {
                    return Err(ReconError::InconsistentState(format!(
                        "{name} level {price} aggregate size drifted"
                    )));
                }
                for (order_id, size) in level.iter() {
                    match self.orders.get(&order_id) {
                        Some(order) if order.remaining_size == size && order.price == price => {}
                        _ => {
                            return Err(ReconError::InconsistentState(format!(
                                "{name} level {price} queues unindexed order {order_id}"
                            )))
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
