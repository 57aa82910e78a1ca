//! Core data types for MBO events.
//!
//! These types are designed to be:
//! - Memory efficient (fixed-size fields, byte-backed enums)
//! - Hash- and equality-safe (fixed-point prices, no floats in map keys)
//! - Compatible with the MBO CSV feed format

use serde::{Deserialize, Serialize};

/// Fixed-point price scale: 1e9 units per dollar.
///
/// Prices are stored as `i64` in 1e-9 dollar units so they can be used as
/// ordered map keys without float hash/equality hazards. A two-decimal
/// feed price like `100.50` becomes `100_500_000_000`.
pub const PRICE_SCALE: i64 = 1_000_000_000;

/// Convert a decimal dollar price to fixed-point units.
#[inline]
pub fn price_from_decimal(dollars: f64) -> i64 {
    (dollars * PRICE_SCALE as f64).round() as i64
}

/// Convert a fixed-point price back to floating-point dollars.
#[inline]
pub fn price_to_f64(price: i64) -> f64 {
    price as f64 / PRICE_SCALE as f64
}

/// MBO action type (what happened to the order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Add new order to book
    Add = b'A',
    /// Cancel/remove order (full or partial)
    Cancel = b'C',
    /// Trade execution (opens a Trade→Fill→Cancel composite)
    Trade = b'T',
    /// Fill against a resting order (middle leg of a composite)
    Fill = b'F',
    /// Clear the book
    Reset = b'R',
}

impl Action {
    /// Parse action from a byte (feed format).
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Action::Add),
            b'C' => Some(Action::Cancel),
            b'T' => Some(Action::Trade),
            b'F' => Some(Action::Fill),
            b'R' => Some(Action::Reset),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Order side (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional (cross/dark trades, resets)
    #[default]
    None = b'N',
}

impl Side {
    /// Parse side from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// The side a trade on this side consumes liquidity from.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
            Side::None => Side::None,
        }
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }
}

/// Market By Order (MBO) event.
///
/// One row of the input feed. All fields use fixed-size types for
/// predictable memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MboEvent {
    /// Event timestamp (nanoseconds since UNIX epoch)
    pub ts_event: i64,

    /// Event action (add, cancel, trade, fill, reset)
    pub action: Action,

    /// Event side
    pub side: Side,

    /// Price in fixed-point units (see [`PRICE_SCALE`])
    pub price: i64,

    /// Order size in shares/contracts
    pub size: u64,

    /// Unique order identifier; 0 means "no specific order"
    pub order_id: u64,

    /// Venue flags, passed through to the output
    pub flags: u8,

    /// Matching-engine delta, passed through to the output
    pub ts_in_delta: i32,

    /// Venue sequence number, passed through to the output
    pub sequence: u64,
}

impl MboEvent {
    /// Create a new MBO event with zeroed pass-through metadata.
    pub fn new(order_id: u64, action: Action, side: Side, price: i64, size: u64) -> Self {
        Self {
            ts_event: 0,
            action,
            side,
            price,
            size,
            order_id,
            flags: 0,
            ts_in_delta: 0,
            sequence: 0,
        }
    }

    /// Set the event timestamp.
    pub fn with_ts_event(mut self, ts_event: i64) -> Self {
        self.ts_event = ts_event;
        self
    }

    /// Set the venue sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Get price as floating point dollars.
    #[inline]
    pub fn price_as_f64(&self) -> f64 {
        price_to_f64(self.price)
    }
}

/// Order information stored in the book's order index.
///
/// Minimal representation: the price doubles as the key into the level map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: i64,
    pub remaining_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_byte() {
        assert_eq!(Action::from_byte(b'A'), Some(Action::Add));
        assert_eq!(Action::from_byte(b'C'), Some(Action::Cancel));
        assert_eq!(Action::from_byte(b'T'), Some(Action::Trade));
        assert_eq!(Action::from_byte(b'F'), Some(Action::Fill));
        assert_eq!(Action::from_byte(b'R'), Some(Action::Reset));
        assert_eq!(Action::from_byte(b'X'), None);
    }

    #[test]
    fn test_action_to_byte() {
        assert_eq!(Action::Add.to_byte(), b'A');
        assert_eq!(Action::Cancel.to_byte(), b'C');
        assert_eq!(Action::Trade.to_byte(), b'T');
        assert_eq!(Action::Fill.to_byte(), b'F');
        assert_eq!(Action::Reset.to_byte(), b'R');
    }

    #[test]
    fn test_side_from_byte() {
        assert_eq!(Side::from_byte(b'B'), Some(Side::Bid));
        assert_eq!(Side::from_byte(b'A'), Some(Side::Ask));
        assert_eq!(Side::from_byte(b'N'), Some(Side::None));
        assert_eq!(Side::from_byte(b'X'), None);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::None.opposite(), Side::None);
    }

    #[test]
    fn test_side_checks() {
        assert!(Side::Bid.is_bid());
        assert!(!Side::Ask.is_bid());
        assert!(Side::Ask.is_ask());
        assert!(!Side::None.is_bid());
        assert!(!Side::None.is_ask());
    }

    #[test]
    fn test_price_conversion_round_trip() {
        assert_eq!(price_from_decimal(100.50), 100_500_000_000);
        assert_eq!(price_from_decimal(0.01), 10_000_000);
        assert_eq!(price_to_f64(100_500_000_000), 100.50);
    }

    #[test]
    fn test_event_builder() {
        let event = MboEvent::new(1001, Action::Add, Side::Bid, 100_500_000_000, 1000)
            .with_ts_event(1_752_739_503_000_000_000)
            .with_sequence(42);

        assert_eq!(event.order_id, 1001);
        assert_eq!(event.ts_event, 1_752_739_503_000_000_000);
        assert_eq!(event.sequence, 42);
        assert_eq!(event.price_as_f64(), 100.50);
    }
}
