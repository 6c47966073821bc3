use crate::config::{BASE_PORT, MAX_FLOWS};

/// Index of a flow in the fixed flow set.
pub type FlowId = usize;

/// Maps a destination port to a flow index. Ports outside
/// `BASE_PORT + 1 ..= BASE_PORT + MAX_FLOWS` belong to somebody else.
pub fn flow_of(dst_port: u16) -> Option<FlowId> {
    for i in 0..MAX_FLOWS {
        if dst_port == port_of(i) {
            return Some(i);
        }
    }
    None
}

/// The well-known port a flow sends and receives on.
pub fn port_of(flow: FlowId) -> u16 {
    BASE_PORT + 1 + flow as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_map_to_flows_and_back() {
        for i in 0..MAX_FLOWS {
            assert_eq!(flow_of(port_of(i)), Some(i));
        }
        assert_eq!(port_of(0), 5001);
    }

    #[test]
    fn foreign_ports_are_nobodys_flow() {
        assert_eq!(flow_of(BASE_PORT), None);
        assert_eq!(flow_of(BASE_PORT + MAX_FLOWS as u16 + 1), None);
        assert_eq!(flow_of(80), None);
    }
}
