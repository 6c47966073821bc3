use std::fmt;

/// State of the receive window.
///
/// ```text
///              1            2           3
///    ----------|------------|----------->
///            head      head + window_cap
///
/// 1 - segments folded into the cumulative head
/// 2 - acceptance window, arrival recorded per-bit
/// 3 - too far ahead, dropped
/// ```
///
/// Bit `i` of the bitmap means segment `head + i` has arrived but has not
/// yet been folded into `head`. Bit 0 never survives an ack generation:
/// the reduction always shifts consecutive set low bits into `head`.
#[derive(Debug)]
pub struct RxWindow {
    /// Next segment expected in strict order; the cumulative-ack boundary.
    head: i64,
    /// Arrival bits relative to `head`. 64 bits comfortably covers any
    /// practical window capacity here.
    bitmap: u64,
}

/// What became of an arriving sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Recorded in the bitmap.
    Marked,
    /// Below the head; already delivered, nothing to record.
    Duplicate,
    /// At or beyond the acceptance window; dropped.
    OutOfWindow,
}

impl RxWindow {
    pub fn new() -> Self {
        RxWindow { head: 0, bitmap: 0 }
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// Records an arrival. `window_cap` bounds how far ahead of the head
    /// an arrival may land; the bitmap width caps it regardless, so a
    /// wire-supplied sequence number can never shift past bit 63.
    pub fn accept(&mut self, seq: i64, window_cap: i64) -> AcceptOutcome {
        let offset = seq - self.head;
        if offset < 0 {
            return AcceptOutcome::Duplicate;
        }
        if offset >= window_cap.min(u64::BITS as i64) {
            return AcceptOutcome::OutOfWindow;
        }
        self.bitmap |= 1 << offset;
        AcceptOutcome::Marked
    }

    /// Reduces the bitmap to a cumulative ack: consumes consecutive set
    /// bits from bit 0 upward, advancing the head past them. Returns the
    /// highest contiguously received sequence number, which is `head - 1`
    /// (possibly `-1`) when bit 0 is unset — a re-ack of the previous
    /// boundary. Gaps beyond the first stay in the bitmap.
    pub fn generate_ack(&mut self) -> i64 {
        let mut ack = self.head - 1;
        while self.bitmap & 1 == 1 {
            self.bitmap >>= 1;
            ack += 1;
        }
        self.head = ack + 1;
        ack
    }
}

/// Window picture for diagnostics: `[head]` then one glyph per slot for
/// the first ten slots (`*` arrived, `o` pending).
impl fmt::Display for RxWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.head)?;
        let mut bits = self.bitmap;
        for _ in 0..10 {
            write!(f, "{}", if bits & 1 == 1 { '*' } else { 'o' })?;
            bits >>= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_arrivals_fold_completely() {
        // Scenario: seqs 0, 1, 2 in order -> ack 2, head 3.
        let mut w = RxWindow::new();
        for seq in 0..3 {
            assert_eq!(w.accept(seq, 10), AcceptOutcome::Marked);
        }
        assert_eq!(w.generate_ack(), 2);
        assert_eq!(w.head(), 3);
    }

    #[test]
    fn gap_stops_the_cumulative_ack() {
        // Scenario: seqs 0 and 2 arrive, 1 is missing -> ack 0, head 1,
        // and the bit for seq 2 survives at offset 1.
        let mut w = RxWindow::new();
        w.accept(0, 10);
        w.accept(2, 10);
        assert_eq!(w.generate_ack(), 0);
        assert_eq!(w.head(), 1);
        assert_eq!(w.bitmap, 0b10);
    }

    #[test]
    fn late_arrival_folds_the_retained_bit() {
        // Scenario continuation: seq 1 arrives later -> ack 2, head 3.
        let mut w = RxWindow::new();
        w.accept(0, 10);
        w.accept(2, 10);
        w.generate_ack();
        assert_eq!(w.accept(1, 10), AcceptOutcome::Marked);
        assert_eq!(w.generate_ack(), 2);
        assert_eq!(w.head(), 3);
        assert_eq!(w.bitmap, 0);
    }

    #[test]
    fn below_head_is_duplicate_and_mutates_nothing() {
        let mut w = RxWindow::new();
        for seq in 0..4 {
            w.accept(seq, 10);
        }
        w.generate_ack();
        assert_eq!(w.accept(2, 10), AcceptOutcome::Duplicate);
        assert_eq!(w.bitmap, 0);
        assert_eq!(w.head(), 4);
        // Re-acking the boundary is harmless.
        assert_eq!(w.generate_ack(), 3);
    }

    #[test]
    fn beyond_window_is_dropped() {
        let mut w = RxWindow::new();
        assert_eq!(w.accept(10, 10), AcceptOutcome::OutOfWindow);
        assert_eq!(w.bitmap, 0);
        assert_eq!(w.accept(9, 10), AcceptOutcome::Marked);
    }

    #[test]
    fn wide_window_cannot_overflow_the_bitmap() {
        // A capacity beyond the bitmap width must not let an arrival
        // shift past bit 63 (offset 64 would alias onto bit 0 and fake
        // head advancement).
        let mut w = RxWindow::new();
        assert_eq!(w.accept(70, 100), AcceptOutcome::OutOfWindow);
        assert_eq!(w.accept(64, 100), AcceptOutcome::OutOfWindow);
        assert_eq!(w.bitmap, 0);
        assert_eq!(w.generate_ack(), -1);
        assert_eq!(w.head(), 0);
        // The widest offset that fits is still accepted.
        assert_eq!(w.accept(63, 100), AcceptOutcome::Marked);
    }

    #[test]
    fn nothing_contiguous_acks_minus_one() {
        let mut w = RxWindow::new();
        w.accept(3, 10);
        assert_eq!(w.generate_ack(), -1);
        assert_eq!(w.head(), 0);
    }

    #[test]
    fn reduction_is_sound() {
        // Shuffled arrivals; every seq below ack + 1 was accepted.
        let mut w = RxWindow::new();
        for &seq in &[1, 0, 4, 3, 2, 7] {
            w.accept(seq, 10);
        }
        let ack = w.generate_ack();
        assert_eq!(ack, 4);
        assert_eq!(w.head(), ack + 1);
        // Seq 7 is retained at offset 2 from the new head.
        assert_eq!(w.bitmap, 1 << 2);
    }

    #[test]
    fn display_matches_lab_rendering() {
        let mut w = RxWindow::new();
        w.accept(0, 10);
        w.accept(2, 10);
        assert_eq!(w.to_string(), "[0] *o*ooooooo");
    }
}
