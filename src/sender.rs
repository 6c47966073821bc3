use std::io;
use std::sync::{Arc, Mutex};

use crate::config::{Config, BURST_SIZE};
use crate::flow::port_of;
use crate::frame::{self, Flags, Segment};
use crate::transport::FrameIo;
use crate::window::{AckOutcome, TxWindow};

/// Per-flow transmit windows behind per-flow locks. Send pacing and ack
/// processing may run on separate contexts and both mutate the same
/// window, so the lock is always real; flows never contend with each
/// other and no global lock exists.
pub type TxWindows = Arc<Vec<Mutex<TxWindow>>>;

/// Local diagnostics; none of these conditions is fatal.
#[derive(Debug, Default)]
pub struct SenderStats {
    pub segments_sent: u64,
    pub acks_applied: u64,
    pub stale_acks: u64,
    pub unsent_acks: u64,
    pub shrink_warnings: u64,
    pub frames_dropped: u64,
}

/// Client role: paces one segment stream per flow through its transmit
/// window, round-robin across flows, folding acks back in between sends.
pub struct Sender {
    cfg: Config,
    windows: TxWindows,
    /// Round-robin cursor over flows.
    current: usize,
    buf: [u8; 1504],
    pub stats: SenderStats,
}

impl Sender {
    pub fn new(cfg: Config) -> Self {
        let windows = Arc::new(
            (0..cfg.flow_num)
                .map(|_| Mutex::new(TxWindow::new(cfg.window_cap)))
                .collect::<Vec<_>>(),
        );
        Sender {
            cfg,
            windows,
            current: 0,
            buf: [0u8; 1504],
            stats: SenderStats::default(),
        }
    }

    /// Handle to the window table for a dedicated ack-processing context.
    pub fn windows(&self) -> TxWindows {
        self.windows.clone()
    }

    /// True once every flow's budget has been transmitted.
    pub fn done_sending(&self) -> bool {
        let total = self.cfg.total_segments();
        self.windows
            .iter()
            .all(|w| w.lock().unwrap().done_sending(total))
    }

    /// True once every flow's budget has been acknowledged.
    pub fn complete(&self) -> bool {
        let total = self.cfg.total_segments();
        self.windows
            .iter()
            .all(|w| w.lock().unwrap().complete(total))
    }

    /// One scheduler cycle: at most one send decision for the current
    /// flow, then an opportunistic receive poll, then advance the cursor.
    /// Each cycle visits exactly one flow regardless of how much that
    /// flow has pending, so no flow starves the others.
    pub fn step(&mut self, io: &mut dyn FrameIo) -> io::Result<()> {
        let flow = self.current;
        let total = self.cfg.total_segments();

        let seq = {
            let w = self.windows[flow].lock().unwrap();
            if w.done_sending(total) || !w.can_send() {
                None
            } else {
                Some(w.next_seq())
            }
        };

        if let Some(seq) = seq {
            let mut flags = Flags::empty();
            if seq == total - 1 {
                flags |= Flags::FIN;
            }
            let seg = Segment {
                src_mac: self.cfg.local_mac,
                dst_mac: self.cfg.peer_mac,
                src_ip: self.cfg.local_ip,
                dst_ip: self.cfg.peer_ip,
                src_port: port_of(flow),
                dst_port: port_of(flow),
                seq,
                ack: 0,
                window: self.cfg.window_cap as u16,
                flags,
                payload_len: self.cfg.segment_len,
            };
            let n = frame::encode(&seg, &mut self.buf);
            io.transmit(&self.buf[..n])?;
            self.windows[flow].lock().unwrap().on_transmit();
            self.stats.segments_sent += 1;
        }

        self.poll_once(io)?;
        self.current = (self.current + 1) % self.cfg.flow_num;
        Ok(())
    }

    /// Drains one bounded batch of inbound frames, feeding acks into the
    /// matching windows.
    pub fn poll_once(&mut self, io: &mut dyn FrameIo) -> io::Result<()> {
        for _ in 0..BURST_SIZE {
            let n = match io.poll_recv(&mut self.buf)? {
                Some(n) => n,
                None => break,
            };
            let inbound = match frame::decode(&self.buf[..n], &self.cfg.local_mac) {
                Ok(inbound) => inbound,
                Err(e) => {
                    self.stats.frames_dropped += 1;
                    eprintln!("dropping inbound frame: {:?}", e);
                    continue;
                }
            };
            if !inbound.checksum_ok {
                eprintln!("transport checksum mismatch (accepting anyway)");
            }
            let flow = match inbound.flow {
                // Within our port range but beyond the configured flow
                // count still means "not for us".
                Some(f) if f < self.cfg.flow_num => f,
                _ => continue,
            };
            if !inbound.flags.contains(Flags::ACK) {
                continue;
            }
            let outcome = self.windows[flow]
                .lock()
                .unwrap()
                .on_ack(inbound.ack, inbound.window);
            match outcome {
                AckOutcome::Advanced => self.stats.acks_applied += 1,
                AckOutcome::Stale => {
                    self.stats.stale_acks += 1;
                    eprintln!("flow #{}: already acked {}", flow, inbound.ack);
                }
                AckOutcome::Unsent => {
                    self.stats.unsent_acks += 1;
                    eprintln!(
                        "flow #{}: ack {} references an unsent segment",
                        flow, inbound.ack
                    );
                }
                AckOutcome::Shrunk => {
                    self.stats.acks_applied += 1;
                    self.stats.shrink_warnings += 1;
                    eprintln!("flow #{}: window shrank below in-flight count", flow);
                }
            }
        }
        Ok(())
    }

    /// Runs to completion: cycles the scheduler until every budget is
    /// transmitted, then keeps polling until every segment is
    /// acknowledged. A lost frame stalls its flow here forever; there is
    /// no retransmission, by contract.
    pub fn run(&mut self, io: &mut dyn FrameIo) -> io::Result<()> {
        while !self.done_sending() {
            self.step(io)?;
        }
        println!("all sending done, draining acks");
        while !self.complete() {
            self.poll_once(io)?;
        }
        println!(
            "transfer complete: {} segments sent, {} acks applied, {} stale, {} dropped frames",
            self.stats.segments_sent,
            self.stats.acks_applied,
            self.stats.stale_acks,
            self.stats.frames_dropped
        );
        Ok(())
    }
}
