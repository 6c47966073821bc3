/// State of the transmit window, sequence numbers counting segments.
///
/// ```text
///         1          2           3          4
///    ----------|-----------|----------|---------->
///            head        sent      credit
///
/// 1 - segments acknowledged by the receiver
/// 2 - segments in flight, awaiting acknowledgment
/// 3 - segments the current credit still permits
/// 4 - segments beyond the advertised window
/// ```
///
/// Fields are signed so the empty-window sentinel (`sent = -1`, nothing
/// transmitted yet) and pre-head ack values stay representable without
/// wrapping tricks.
#[derive(Debug)]
pub struct TxWindow {
    /// Oldest unacknowledged segment; non-decreasing.
    head: i64,
    /// Highest segment transmitted so far, `-1` before the first send.
    sent: i64,
    /// Highest segment the receiver has permitted (inclusive).
    credit: i64,
}

/// What an inbound ack did to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    /// Head and credit moved forward.
    Advanced,
    /// Ack below head; the range was already acknowledged.
    Stale,
    /// Ack references a segment that was never sent; ignored.
    Unsent,
    /// Head moved, but the new credit fell below the in-flight count.
    Shrunk,
}

impl TxWindow {
    /// A fresh window. There is no handshake, so the receiver's window is
    /// assumed maximal; the initial credit reserves one slot fewer than
    /// `window_cap`, matching `can_send`'s strict comparison so a capacity
    /// of 10 permits exactly segments 0..=9 before the first ack.
    pub fn new(window_cap: i64) -> Self {
        TxWindow {
            head: 0,
            sent: -1,
            credit: window_cap - 1,
        }
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn sent(&self) -> i64 {
        self.sent
    }

    pub fn credit(&self) -> i64 {
        self.credit
    }

    /// Whether the window permits another transmission.
    pub fn can_send(&self) -> bool {
        self.credit > self.sent
    }

    /// Sequence number the next transmission will carry.
    pub fn next_seq(&self) -> i64 {
        self.sent + 1
    }

    /// Records one transmission. Caller must have checked `can_send`.
    pub fn on_transmit(&mut self) {
        debug_assert!(self.can_send());
        self.sent += 1;
    }

    /// Applies one acknowledgment carrying the receiver's advertised
    /// window. Stale and never-sent acks leave the window untouched.
    pub fn on_ack(&mut self, ack: i64, window: i64) -> AckOutcome {
        if ack < self.head {
            return AckOutcome::Stale;
        }
        if ack > self.sent {
            return AckOutcome::Unsent;
        }
        self.head = ack + 1;
        self.credit = ack + window;
        if self.sent > self.credit {
            // The receiver shrank the window below what is already in
            // flight. There is no recovery path; the overhang simply
            // drains as acks arrive.
            AckOutcome::Shrunk
        } else {
            AckOutcome::Advanced
        }
    }

    /// True once every segment of the budget has been transmitted.
    pub fn done_sending(&self, total_segments: i64) -> bool {
        self.sent >= total_segments - 1
    }

    /// True once every segment of the budget has been acknowledged.
    pub fn complete(&self, total_segments: i64) -> bool {
        self.head >= total_segments
    }
}
