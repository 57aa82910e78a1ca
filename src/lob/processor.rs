//! Event processor: the state machine that gives MBO actions their
//! book-level meaning.
//!
//! Most actions map one-to-one onto a [`Book`](super::Book) mutation. The
//! exception is the venue's composite encoding of an aggressing trade as
//! three consecutive events — Trade, Fill, Cancel against the same passive
//! order. The processor latches the Trade, records the resting side from
//! the Fill, and materializes the whole composite when the closing Cancel
//! arrives, attributing the outcome to the side the Fill reported.
//!
//! Attribution convention: this feed reports the aggressor's side on the
//! Trade leg and the passive (resting) side on the Fill leg. Venues that
//! report the aggressor on both legs need the attribution inverted.

use crate::types::{Action, MboEvent, Side};
use crate::warnings::{WarningKind, WarningTracker};

use super::Book;

/// Where the processor is in a composite trade sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TradePhase {
    /// No composite in flight
    #[default]
    Idle,
    /// A directional Trade has been latched; waiting for Fill and Cancel
    ExpectingFill,
}

/// What the processor decided about one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Whether a snapshot should be considered for this event
    pub should_emit: bool,
    /// Action to stamp on the snapshot (a collapsed composite yields `Trade`)
    pub attributed_action: Action,
    /// Side to stamp on the snapshot
    pub attributed_side: Side,
}

impl ProcessOutcome {
    #[inline]
    fn emit(action: Action, side: Side) -> Self {
        Self {
            should_emit: true,
            attributed_action: action,
            attributed_side: side,
        }
    }

    #[inline]
    fn skip(action: Action, side: Side) -> Self {
        Self {
            should_emit: false,
            attributed_action: action,
            attributed_side: side,
        }
    }
}

/// Event processor holding the composite-trade latch.
#[derive(Debug, Clone, Default)]
pub struct EventProcessor {
    phase: TradePhase,
    /// Side reported on the latched Trade (the aggressor)
    pending_trade_side: Side,
    /// Side reported on the Fill (the resting side that was hit)
    pending_fill_side: Side,
    pending_trade_price: i64,
    pending_trade_size: u64,
    /// Whether a Fill has arrived since the latched Trade
    saw_fill_since_trade: bool,
}

impl EventProcessor {
    /// Create a processor in the idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a directional Trade is latched awaiting its Fill/Cancel.
    #[inline]
    pub fn in_trade_sequence(&self) -> bool {
        self.phase == TradePhase::ExpectingFill
    }

    /// Apply one event to the book and report what it meant.
    pub fn process(
        &mut self,
        book: &mut Book,
        event: &MboEvent,
        warnings: &mut WarningTracker,
    ) -> ProcessOutcome {
        match event.action {
            Action::Add => self.on_add(book, event, warnings),
            Action::Cancel => self.on_cancel(book, event),
            Action::Trade => self.on_trade(event),
            Action::Fill => self.on_fill(event, warnings),
            Action::Reset => self.on_reset(book),
        }
    }

    fn on_add(
        &mut self,
        book: &mut Book,
        event: &MboEvent,
        warnings: &mut WarningTracker,
    ) -> ProcessOutcome {
        if event.order_id == 0 {
            // "No specific order" sentinel: nothing rests, but the event is
            // still attributable
            return ProcessOutcome::emit(Action::Add, event.side);
        }
        if book.order_exists(event.order_id) {
            warnings.record(
                WarningKind::DuplicateAdd,
                format!("order {} already exists", event.order_id),
            );
            return ProcessOutcome::skip(Action::Add, Side::None);
        }

        book.add_order(event.order_id, event.price, event.size, event.side);
        self.phase = TradePhase::Idle;
        self.saw_fill_since_trade = false;
        ProcessOutcome::emit(Action::Add, event.side)
    }

    fn on_cancel(&mut self, book: &mut Book, event: &MboEvent) -> ProcessOutcome {
        if self.phase == TradePhase::ExpectingFill && self.saw_fill_since_trade {
            // Closing leg of a Trade→Fill→Cancel composite: materialize the
            // latched trade against the resting side
            let target = self.pending_trade_side.opposite();
            book.fill_level(target, self.pending_trade_price, self.pending_trade_size);

            let filled_side = self.pending_fill_side;
            self.clear_latch();
            return ProcessOutcome::emit(Action::Trade, filled_side);
        }

        match book.cancel_order(event.order_id, event.size) {
            Some(resting_side) => ProcessOutcome::emit(Action::Cancel, resting_side),
            // Unknown id: the pipeline suppresses these and remembers the id
            None => ProcessOutcome::emit(Action::Cancel, Side::None),
        }
    }

    fn on_trade(&mut self, event: &MboEvent) -> ProcessOutcome {
        if event.side == Side::None {
            // Cross/dark trade: observable, but touches no resting order
            return ProcessOutcome::emit(Action::Trade, Side::None);
        }

        self.phase = TradePhase::ExpectingFill;
        self.pending_trade_side = event.side;
        self.pending_trade_price = event.price;
        self.pending_trade_size = event.size;
        self.pending_fill_side = Side::None;
        self.saw_fill_since_trade = false;
        ProcessOutcome::skip(Action::Trade, event.side)
    }

    fn on_fill(&mut self, event: &MboEvent, warnings: &mut WarningTracker) -> ProcessOutcome {
        if self.phase != TradePhase::ExpectingFill {
            warnings.record(
                WarningKind::StrayFill,
                format!("fill for order {} outside a trade sequence", event.order_id),
            );
            return ProcessOutcome::skip(Action::Fill, Side::None);
        }

        // The Fill names the resting side that was hit; the book mutation
        // waits for the closing Cancel
        self.pending_fill_side = event.side;
        self.saw_fill_since_trade = true;
        ProcessOutcome::skip(Action::Fill, event.side)
    }

    fn on_reset(&mut self, book: &mut Book) -> ProcessOutcome {
        book.clear();
        self.clear_latch();
        ProcessOutcome::emit(Action::Reset, Side::None)
    }

    fn clear_latch(&mut self) {
        self.phase = TradePhase::Idle;
        self.pending_trade_side = Side::None;
        self.pending_fill_side = Side::None;
        self.pending_trade_price = 0;
        self.pending_trade_size = 0;
        self.saw_fill_since_trade = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PX: i64 = 100_750_000_000;

    fn event(order_id: u64, action: Action, side: Side, price: i64, size: u64) -> MboEvent {
        MboEvent::new(order_id, action, side, price, size)
    }

    fn quiet_tracker() -> WarningTracker {
        WarningTracker::new(false)
    }

    #[test]
    fn test_add_emits_and_mutates() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        let outcome = proc.process(
            &mut book,
            &event(1, Action::Add, Side::Bid, PX, 100),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(outcome.attributed_action, Action::Add);
        assert_eq!(outcome.attributed_side, Side::Bid);
        assert!(book.order_exists(1));
    }

    #[test]
    fn test_add_sentinel_id_emits_without_mutation() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        let outcome = proc.process(
            &mut book,
            &event(0, Action::Add, Side::Bid, PX, 100),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_duplicate_add_is_skipped_and_warned() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        let add = event(1, Action::Add, Side::Bid, PX, 100);
        proc.process(&mut book, &add, &mut warnings);
        let outcome = proc.process(&mut book, &add, &mut warnings);

        assert!(!outcome.should_emit);
        assert_eq!(book.order_count(), 1);
        assert_eq!(warnings.count(WarningKind::DuplicateAdd), 1);
    }

    #[test]
    fn test_cancel_reports_resting_side() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        proc.process(
            &mut book,
            &event(1, Action::Add, Side::Ask, PX, 100),
            &mut warnings,
        );
        // Side on the cancel event itself is not trusted
        let outcome = proc.process(
            &mut book,
            &event(1, Action::Cancel, Side::None, PX, 0),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(outcome.attributed_action, Action::Cancel);
        assert_eq!(outcome.attributed_side, Side::Ask);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_cancel_unknown_attributes_none() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        let outcome = proc.process(
            &mut book,
            &event(9999, Action::Cancel, Side::Bid, PX, 100),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(outcome.attributed_side, Side::None);
    }

    #[test]
    fn test_trade_fill_cancel_composite() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        proc.process(
            &mut book,
            &event(2001, Action::Add, Side::Ask, PX, 75),
            &mut warnings,
        );

        // Aggressing buy reported on T; resting ask reported on F
        let t = proc.process(
            &mut book,
            &event(0, Action::Trade, Side::Bid, PX, 30),
            &mut warnings,
        );
        assert!(!t.should_emit);
        assert!(proc.in_trade_sequence());
        assert_eq!(book.order(2001).unwrap().remaining_size, 75);

        let f = proc.process(
            &mut book,
            &event(2001, Action::Fill, Side::Ask, PX, 30),
            &mut warnings,
        );
        assert!(!f.should_emit);
        assert_eq!(book.order(2001).unwrap().remaining_size, 75);

        let c = proc.process(
            &mut book,
            &event(2001, Action::Cancel, Side::Ask, PX, 30),
            &mut warnings,
        );
        assert!(c.should_emit);
        assert_eq!(c.attributed_action, Action::Trade);
        assert_eq!(c.attributed_side, Side::Ask);
        assert!(!proc.in_trade_sequence());
        assert_eq!(book.order(2001).unwrap().remaining_size, 45);
        book.verify_invariants().unwrap();
    }

    #[test]
    fn test_composite_attribution_comes_from_fill_side() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        book.add_order(10, PX, 50, Side::Ask);

        // A venue reporting the aggressor on both legs would hand us
        // side=Bid on the Fill; attribution follows the Fill verbatim
        proc.process(
            &mut book,
            &event(0, Action::Trade, Side::Bid, PX, 20),
            &mut warnings,
        );
        proc.process(
            &mut book,
            &event(10, Action::Fill, Side::Bid, PX, 20),
            &mut warnings,
        );
        let c = proc.process(
            &mut book,
            &event(10, Action::Cancel, Side::Bid, PX, 20),
            &mut warnings,
        );

        assert_eq!(c.attributed_action, Action::Trade);
        assert_eq!(c.attributed_side, Side::Bid);
        // The fill still lands on the opposite of the Trade side
        assert_eq!(book.order(10).unwrap().remaining_size, 30);
    }

    #[test]
    fn test_trade_side_none_emits_without_latch() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        book.add_order(1, PX, 100, Side::Ask);
        let outcome = proc.process(
            &mut book,
            &event(0, Action::Trade, Side::None, PX, 30),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(outcome.attributed_action, Action::Trade);
        assert_eq!(outcome.attributed_side, Side::None);
        assert!(!proc.in_trade_sequence());
        assert_eq!(book.order(1).unwrap().remaining_size, 100);
    }

    #[test]
    fn test_stray_fill_is_skipped_and_warned() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        let outcome = proc.process(
            &mut book,
            &event(1, Action::Fill, Side::Ask, PX, 30),
            &mut warnings,
        );

        assert!(!outcome.should_emit);
        assert_eq!(warnings.count(WarningKind::StrayFill), 1);
        assert!(!proc.in_trade_sequence());
    }

    #[test]
    fn test_cancel_without_fill_is_regular_cancel() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        book.add_order(5, PX, 100, Side::Ask);
        // T latches, but no F arrives before the C
        proc.process(
            &mut book,
            &event(0, Action::Trade, Side::Bid, PX, 30),
            &mut warnings,
        );
        let c = proc.process(
            &mut book,
            &event(5, Action::Cancel, Side::Ask, PX, 0),
            &mut warnings,
        );

        assert_eq!(c.attributed_action, Action::Cancel);
        assert_eq!(c.attributed_side, Side::Ask);
        assert!(!book.order_exists(5));
    }

    #[test]
    fn test_add_rearms_latch_to_idle() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        proc.process(
            &mut book,
            &event(0, Action::Trade, Side::Bid, PX, 30),
            &mut warnings,
        );
        assert!(proc.in_trade_sequence());

        proc.process(
            &mut book,
            &event(7, Action::Add, Side::Bid, PX, 10),
            &mut warnings,
        );
        assert!(!proc.in_trade_sequence());
    }

    #[test]
    fn test_reset_clears_book_and_latch() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        book.add_order(1, PX, 100, Side::Ask);
        proc.process(
            &mut book,
            &event(0, Action::Trade, Side::Bid, PX, 30),
            &mut warnings,
        );

        let outcome = proc.process(
            &mut book,
            &event(0, Action::Reset, Side::None, 0, 0),
            &mut warnings,
        );

        assert!(outcome.should_emit);
        assert_eq!(outcome.attributed_action, Action::Reset);
        assert_eq!(outcome.attributed_side, Side::None);
        assert_eq!(book.order_count(), 0);
        assert!(!proc.in_trade_sequence());
    }

    #[test]
    fn test_reset_round_trip_matches_fresh_state() {
        let mut book = Book::new();
        let mut proc = EventProcessor::new();
        let mut warnings = quiet_tracker();

        for i in 1..=20u64 {
            let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
            let px = PX + (i as i64 % 5) * 10_000_000;
            proc.process(
                &mut book,
                &event(i, Action::Add, side, px, i * 10),
                &mut warnings,
            );
        }
        proc.process(
            &mut book,
            &event(0, Action::Reset, Side::None, 0, 0),
            &mut warnings,
        );

        let fresh = Book::new();
        assert_eq!(book.top10(), fresh.top10());
        assert_eq!(book.order_count(), 0);
        book.verify_invariants().unwrap();
    }
}
