/// Upper bound on concurrently tracked flows. Destination ports
/// `BASE_PORT + 1 ..= BASE_PORT + MAX_FLOWS` map to flow indices.
pub const MAX_FLOWS: usize = 8;

/// Flow 0 talks on port BASE_PORT + 1.
pub const BASE_PORT: u16 = 5000;

/// Upper bound on frames pulled off the wire in one poll.
pub const BURST_SIZE: usize = 32;

/// Everything the send/receive paths share: addressing, flow geometry,
/// window capacity. Built once at startup and passed down; there are no
/// process-wide globals.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of concurrent flows, `1..=MAX_FLOWS`.
    pub flow_num: usize,
    /// Bytes to transfer per flow.
    pub flow_size: u64,
    /// Fixed payload bytes per segment.
    pub segment_len: usize,
    /// Window capacity in segments.
    pub window_cap: i64,

    pub local_mac: [u8; 6],
    pub peer_mac: [u8; 6],
    pub local_ip: [u8; 4],
    pub peer_ip: [u8; 4],
}

impl Config {
    /// Segments per flow, by ceiling division (a short tail still costs a
    /// whole segment). An empty flow has nothing to segment.
    pub fn total_segments(&self) -> i64 {
        if self.flow_size == 0 {
            return 0;
        }
        (1 + (self.flow_size - 1) / self.segment_len as u64) as i64
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            flow_num: 1,
            flow_size: 10_000,
            segment_len: 1000,
            window_cap: 10,
            local_mac: [0; 6],
            peer_mac: [0; 6],
            local_ip: [127, 0, 0, 1],
            peer_ip: [127, 0, 0, 1],
        }
    }
}
