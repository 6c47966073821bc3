use std::io;

use crate::config::{Config, BURST_SIZE, MAX_FLOWS};
use crate::frame::{self, Flags, Segment};
use crate::transport::FrameIo;
use crate::window::{AcceptOutcome, RxWindow};

/// Payload bytes on an ack reply; the frame exists for its header.
const ACK_PAYLOAD_LEN: usize = 10;

/// Local diagnostics; none of these conditions is fatal.
#[derive(Debug, Default)]
pub struct ReceiverStats {
    pub segments_accepted: u64,
    pub duplicates: u64,
    pub out_of_window: u64,
    pub frames_dropped: u64,
    pub acks_sent: u64,
}

/// Server role: owns one lazily created receive window per flow, folds
/// arrivals into cumulative acks, and replies to every in-session frame.
///
/// Presence in the table is the session: a slot is `Some` from the first
/// segment (sequence 0) until the terminal flag tears it down.
pub struct Receiver {
    cfg: Config,
    windows: Vec<Option<RxWindow>>,
    /// Which configured flows have been torn down at least once; a flow
    /// that restarts and closes again is not counted twice.
    closed: Vec<bool>,
    buf: [u8; 1504],
    pub stats: ReceiverStats,
}

impl Receiver {
    pub fn new(cfg: Config) -> Self {
        let closed = vec![false; cfg.flow_num];
        Receiver {
            cfg,
            windows: (0..MAX_FLOWS).map(|_| None).collect(),
            closed,
            buf: [0u8; 1504],
            stats: ReceiverStats::default(),
        }
    }

    /// True once every configured flow has opened and closed.
    pub fn complete(&self) -> bool {
        self.closed.iter().all(|&c| c)
    }

    /// Drains one bounded batch of inbound frames, replying with an ack
    /// for each one that belongs to a live (or starting) session.
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
                // count still means "not for us"; such traffic must not
                // open sessions or count toward completion.
                Some(f) if f < self.cfg.flow_num => f,
                _ => continue,
            };

            if self.windows[flow].is_none() {
                if inbound.seq != 0 {
                    // Traffic for a closed (or never opened) session only
                    // restarts it from sequence 0.
                    self.stats.frames_dropped += 1;
                    eprintln!(
                        "flow #{}: segment {} with no open session",
                        flow, inbound.seq
                    );
                    continue;
                }
                self.windows[flow] = Some(RxWindow::new());
                println!("window for flow #{} is created", flow);
            }

            let window_cap = self.cfg.window_cap;
            let w = self.windows[flow].as_mut().unwrap();
            let outcome = w.accept(inbound.seq, window_cap);
            match outcome {
                AcceptOutcome::Marked => self.stats.segments_accepted += 1,
                AcceptOutcome::Duplicate => self.stats.duplicates += 1,
                AcceptOutcome::OutOfWindow => {
                    self.stats.out_of_window += 1;
                    eprintln!(
                        "flow #{}: segment {} out of window {}",
                        flow, inbound.seq, w
                    );
                }
            }
            let ack = w.generate_ack();

            if inbound.flags.contains(Flags::FIN) && outcome == AcceptOutcome::Marked {
                self.windows[flow] = None;
                self.closed[flow] = true;
                println!("window for flow #{} is closed", flow);
            }

            let reply = Segment {
                src_mac: self.cfg.local_mac,
                dst_mac: inbound.src_mac,
                src_ip: inbound.dst_ip,
                dst_ip: inbound.src_ip,
                src_port: inbound.dst_port,
                dst_port: inbound.src_port,
                seq: 0,
                ack,
                window: self.cfg.window_cap as u16,
                flags: Flags::ACK,
                payload_len: ACK_PAYLOAD_LEN,
            };
            let mut out = [0u8; 128];
            let n = frame::encode(&reply, &mut out);
            io.transmit(&out[..n])?;
            self.stats.acks_sent += 1;
        }
        Ok(())
    }

    /// Polls until every configured flow has run to teardown.
    pub fn run(&mut self, io: &mut dyn FrameIo) -> io::Result<()> {
        while !self.complete() {
            self.poll_once(io)?;
        }
        println!(
            "all flows closed: {} segments accepted, {} duplicates, {} out of window, {} acks sent",
            self.stats.segments_accepted,
            self.stats.duplicates,
            self.stats.out_of_window,
            self.stats.acks_sent
        );
        Ok(())
    }
}
