//! Price level with FIFO order queue and cached aggregates.
//!
//! # Invariant
//!
//! `total_size` MUST always equal the sum of queue entry sizes, and every
//! queue entry MUST have a size > 0. The invariant is enforced through
//! encapsulated mutation methods and verified in debug builds via
//! `verify_invariant()`.
//!
//! # Design
//!
//! The queue is an `IndexMap` keyed by order id: iteration order is
//! insertion order (oldest first, the fill priority), lookups by id are
//! O(1), and `shift_remove` preserves the relative order of the survivors.
//! Partial cancels rewrite the entry in place, so an order keeps its queue
//! position when it shrinks.

use indexmap::IndexMap;

/// Result of consuming liquidity from the front of a level's queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillResult {
    /// Total size actually consumed (≤ requested; excess is absorbed)
    pub consumed: u64,
    /// Orders that were fully consumed, in fill order
    pub filled_order_ids: Vec<u64>,
    /// Head order that was partially consumed: (order_id, new remaining)
    pub reduced: Option<(u64, u64)>,
}

/// A price level in the order book.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Orders in arrival order: order_id → remaining size
    queue: IndexMap<u64, u64>,
    /// Cached total size (invariant: == queue.values().sum())
    total_size: u64,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue.
    #[inline]
    pub fn push_order(&mut self, order_id: u64, size: u64) {
        debug_assert!(
            !self.queue.contains_key(&order_id),
            "order {order_id} already queued at this level"
        );
        debug_assert!(size > 0, "zero-size order {order_id}");
        self.queue.insert(order_id, size);
        self.total_size = self.total_size.saturating_add(size);

        #[cfg(debug_assertions)]
        self.verify_invariant();
    }

    /// Reduce an order's size in place, preserving its queue position.
    ///
    /// The reduction is clamped to the order's remaining size. An entry
    /// that reaches zero is removed from the queue (the survivors keep
    /// their relative order). Returns the new remaining size, or `None`
    /// if the order is not at this level.
    #[inline]
    pub fn reduce_order(&mut self, order_id: u64, delta: u64) -> Option<u64> {
        let size = self.queue.get_mut(&order_id)?;
        let actual = delta.min(*size);
        *size -= actual;
        let remaining = *size;
        if remaining == 0 {
            self.queue.shift_remove(&order_id);
        }
        self.total_size = self.total_size.saturating_sub(actual);

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(remaining)
    }

    /// Consume up to `size` from the front of the queue (FIFO).
    ///
    /// Head entries are fully consumed and removed until the request is
    /// exhausted; a final head entry may be partially consumed in place.
    /// A request larger than the level's total size is silently absorbed.
    pub fn fill_front(&mut self, size: u64) -> FillResult {
        let mut result = FillResult::default();
        let mut remaining_fill = size;

        while remaining_fill > 0 {
            let Some((&order_id, &entry_size)) = self.queue.get_index(0) else {
                break;
            };

            if entry_size <= remaining_fill {
                // Fully consume the head order
                self.queue.shift_remove_index(0);
                self.total_size -= entry_size;
                remaining_fill -= entry_size;
                result.consumed += entry_size;
                result.filled_order_ids.push(order_id);
            } else {
                // Partially consume the head order; it keeps its position
                if let Some((_, entry)) = self.queue.get_index_mut(0) {
                    *entry = entry_size - remaining_fill;
                }
                self.total_size -= remaining_fill;
                result.consumed += remaining_fill;
                result.reduced = Some((order_id, entry_size - remaining_fill));
                remaining_fill = 0;
            }
        }

        #[cfg(debug_assertions)]
        self.verify_invariant();

        result
    }

    /// Get the cached total size (O(1)).
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Get the number of live orders at this price level.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.queue.len()
    }

    /// Check if the price level has no orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get an order's remaining size at this level.
    #[inline]
    pub fn get(&self, order_id: u64) -> Option<u64> {
        self.queue.get(&order_id).copied()
    }

    /// Check if an order is queued at this price level.
    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.queue.contains_key(&order_id)
    }

    /// Iterate over all orders (order_id, remaining size) in queue order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.queue.iter().map(|(&id, &size)| (id, size))
    }

    /// Compute the actual total by summing the queue (O(n)).
    #[inline]
    pub fn compute_actual_total(&self) -> u64 {
        self.queue.values().fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Verify the size invariant holds.
    #[cfg(debug_assertions)]
    #[inline]
    pub fn verify_invariant(&self) {
        let actual = self.compute_actual_total();
        debug_assert_eq!(
            actual, self.total_size,
            "PriceLevel invariant violated: actual={}, cached={}",
            actual, self.total_size
        );
        debug_assert!(
            self.queue.values().all(|&size| size > 0),
            "PriceLevel holds a zero-size entry"
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn verify_invariant(&self) {}
}
