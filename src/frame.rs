use bitflags::bitflags;

use crate::checksum;
use crate::flow::{self, FlowId};

/// Ethernet II header length; parsed by hand since it is three fixed
/// fields (etherparse is used from the IP layer down, as in the rest of
/// the crate's header handling).
pub const ETHER_HDR_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const PROTO_TCP: u8 = 0x06;

bitflags! {
    /// Transport flag bits, at TCP bit positions.
    pub struct Flags: u8 {
        /// Terminal segment of a flow; tears down the receiver window.
        const FIN = 0b0000_0001;
        /// Frame carries a meaningful acknowledgment number.
        const ACK = 0b0001_0000;
    }
}

/// Logical view of one outbound frame. Sequence and ack values are signed
/// segment counters; they wrap into the 32-bit wire fields on encode.
pub struct Segment {
    pub src_mac: [u8; 6],
    pub dst_mac: [u8; 6],
    pub src_ip: [u8; 4],
    pub dst_ip: [u8; 4],
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: i64,
    pub ack: i64,
    pub window: u16,
    pub flags: Flags,
    /// Filler payload bytes to append.
    pub payload_len: usize,
}

/// Fields recovered from an inbound frame that passed the identity checks.
#[derive(Debug)]
pub struct Inbound {
    /// Which of our flows the destination port addresses, if any. `None`
    /// is not an error; the frame simply is not for a tracked flow.
    pub flow: Option<FlowId>,
    pub seq: i64,
    /// Sign-reinterpreted from the wire so a wrapped pre-head ack
    /// (0xFFFFFFFF meaning "nothing yet") compares below any head.
    pub ack: i64,
    pub window: i64,
    pub flags: Flags,
    /// Advisory; a failed transport checksum does not reject the frame.
    pub checksum_ok: bool,

    pub src_mac: [u8; 6],
    pub src_ip: [u8; 4],
    pub dst_ip: [u8; 4],
    pub src_port: u16,
    pub dst_port: u16,
}

/// Why an inbound frame was dropped before touching any window.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Too short or unparseable at some header layer.
    Truncated,
    /// Destination hardware address is not ours.
    BadMac([u8; 6]),
    /// Link-layer payload is not IPv4.
    BadEtherType(u16),
    /// Network-layer payload is not the expected transport.
    BadProtocol(u8),
}

/// Serializes `seg` into `buf`, returning the frame length. `buf` must
/// hold the three headers plus the payload (1504 bytes always suffices
/// for the default segment size).
pub fn encode(seg: &Segment, buf: &mut [u8]) -> usize {
    let mut ip = etherparse::Ipv4Header::new(
        0,
        64,
        etherparse::IpTrafficClass::Tcp,
        seg.src_ip,
        seg.dst_ip,
    );
    ip.identification = 1;

    let mut tcp = etherparse::TcpHeader::new(
        seg.src_port,
        seg.dst_port,
        seg.seq as u32,
        seg.window,
    );
    tcp.acknowledgment_number = seg.ack as u32;
    tcp.fin = seg.flags.contains(Flags::FIN);
    tcp.ack = seg.flags.contains(Flags::ACK);

    let tcp_len = tcp.header_len() as usize + seg.payload_len;
    let _ = ip.set_payload_len(tcp_len);

    let total = ETHER_HDR_LEN + ip.header_len() as usize + tcp_len;
    assert!(buf.len() >= total, "frame buffer too small");

    buf[0..6].copy_from_slice(&seg.dst_mac);
    buf[6..12].copy_from_slice(&seg.src_mac);
    buf[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    // IP header goes out directly (its own checksum is computed by the
    // writer); the TCP header is serialized to a scratch buffer first so
    // the transport checksum can cover it with the checksum field zero.
    let buf_len = buf.len();
    let mut unwritten = &mut buf[ETHER_HDR_LEN..];
    let _ = ip.write(&mut unwritten);
    let ip_ends_at = buf_len - unwritten.len();
    let tcp_ends_at = ip_ends_at + tcp.header_len() as usize;

    for b in &mut buf[tcp_ends_at..total] {
        *b = b'a';
    }

    let mut scratch = [0u8; 20];
    {
        let mut cursor = &mut scratch[..];
        let _ = tcp.write(&mut cursor);
    }

    let mut acc = checksum::sum(&seg.src_ip, 0);
    acc = checksum::sum(&seg.dst_ip, acc);
    acc = checksum::sum(&[0, PROTO_TCP], acc);
    acc = checksum::sum(&(tcp_len as u16).to_be_bytes(), acc);
    acc = checksum::sum(&scratch, acc);
    acc = checksum::sum(&buf[tcp_ends_at..total], acc);
    tcp.checksum = checksum::finalize(acc);

    let mut tcp_buf = &mut buf[ip_ends_at..tcp_ends_at];
    let _ = tcp.write(&mut tcp_buf);

    total
}

/// Parses an inbound frame, enforcing the three identity checks. On
/// success the caller still has to route by `flow` and classify the
/// sequence/ack values against its windows.
pub fn decode(buf: &[u8], own_mac: &[u8; 6]) -> Result<Inbound, DecodeError> {
    if buf.len() < ETHER_HDR_LEN {
        return Err(DecodeError::Truncated);
    }
    let mut dst_mac = [0u8; 6];
    let mut src_mac = [0u8; 6];
    dst_mac.copy_from_slice(&buf[0..6]);
    src_mac.copy_from_slice(&buf[6..12]);
    if dst_mac != *own_mac {
        return Err(DecodeError::BadMac(dst_mac));
    }
    let eth_type = u16::from_be_bytes([buf[12], buf[13]]);
    if eth_type != ETHERTYPE_IPV4 {
        return Err(DecodeError::BadEtherType(eth_type));
    }

    let iph = etherparse::Ipv4HeaderSlice::from_slice(&buf[ETHER_HDR_LEN..])
        .map_err(|_| DecodeError::Truncated)?;
    if iph.protocol() != PROTO_TCP {
        return Err(DecodeError::BadProtocol(iph.protocol()));
    }
    let ip_hlen = iph.slice().len();

    let tcph = etherparse::TcpHeaderSlice::from_slice(&buf[ETHER_HDR_LEN + ip_hlen..])
        .map_err(|_| DecodeError::Truncated)?;
    let tcp_hlen = tcph.slice().len();

    // Frames may arrive padded to the Ethernet minimum; the IP total
    // length (bytes 2..4 of the header) is authoritative for where the
    // payload ends.
    let total_len = u16::from_be_bytes([iph.slice()[2], iph.slice()[3]]) as usize;
    let tcp_len = total_len
        .checked_sub(ip_hlen)
        .ok_or(DecodeError::Truncated)?;
    let payload_end = ETHER_HDR_LEN + ip_hlen + tcp_len;
    if tcp_len < tcp_hlen || payload_end > buf.len() {
        return Err(DecodeError::Truncated);
    }

    // Advisory verification: summing the covered range with the stored
    // checksum in place must complement to zero.
    let mut acc = checksum::sum(&iph.source_addr().octets(), 0);
    acc = checksum::sum(&iph.destination_addr().octets(), acc);
    acc = checksum::sum(&[0, PROTO_TCP], acc);
    acc = checksum::sum(&(tcp_len as u16).to_be_bytes(), acc);
    acc = checksum::sum(&buf[ETHER_HDR_LEN + ip_hlen..payload_end], acc);
    let checksum_ok = checksum::finalize(acc) == 0;

    let mut flags = Flags::empty();
    if tcph.fin() {
        flags |= Flags::FIN;
    }
    if tcph.ack() {
        flags |= Flags::ACK;
    }

    Ok(Inbound {
        flow: flow::flow_of(tcph.destination_port()),
        seq: i64::from(tcph.sequence_number()),
        ack: i64::from(tcph.acknowledgment_number() as i32),
        window: i64::from(tcph.window_size()),
        flags,
        checksum_ok,
        src_mac,
        src_ip: iph.source_addr().octets(),
        dst_ip: iph.destination_addr().octets(),
        src_port: tcph.source_port(),
        dst_port: tcph.destination_port(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::port_of;

    const MAC_A: [u8; 6] = [0x02, 0, 0, 0, 0, 0xaa];
    const MAC_B: [u8; 6] = [0x02, 0, 0, 0, 0, 0xbb];

    fn sample(flow: FlowId) -> Segment {
        Segment {
            src_mac: MAC_A,
            dst_mac: MAC_B,
            src_ip: [10, 0, 0, 1],
            dst_ip: [10, 0, 0, 2],
            src_port: port_of(flow),
            dst_port: port_of(flow),
            seq: 7,
            ack: 3,
            window: 10,
            flags: Flags::ACK,
            payload_len: 48,
        }
    }

    #[test]
    fn round_trip() {
        let seg = sample(2);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        assert_eq!(n, ETHER_HDR_LEN + 20 + 20 + 48);

        let got = decode(&buf[..n], &MAC_B).unwrap();
        assert_eq!(got.flow, Some(2));
        assert_eq!(got.seq, 7);
        assert_eq!(got.ack, 3);
        assert_eq!(got.window, 10);
        assert_eq!(got.flags, Flags::ACK);
        assert_eq!(got.src_mac, MAC_A);
        assert_eq!(got.src_ip, [10, 0, 0, 1]);
        assert_eq!(got.dst_ip, [10, 0, 0, 2]);
        assert_eq!(got.src_port, port_of(2));
        assert!(got.checksum_ok);
    }

    #[test]
    fn fin_flag_survives() {
        let mut seg = sample(0);
        seg.flags = Flags::FIN;
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        let got = decode(&buf[..n], &MAC_B).unwrap();
        assert!(got.flags.contains(Flags::FIN));
        assert!(!got.flags.contains(Flags::ACK));
    }

    #[test]
    fn wrong_mac_is_rejected() {
        let seg = sample(0);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        assert!(matches!(
            decode(&buf[..n], &MAC_A),
            Err(DecodeError::BadMac(m)) if m == MAC_B
        ));
    }

    #[test]
    fn wrong_ether_type_is_rejected() {
        let seg = sample(0);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        buf[12] = 0x86;
        buf[13] = 0xdd;
        assert!(matches!(
            decode(&buf[..n], &MAC_B),
            Err(DecodeError::BadEtherType(0x86dd))
        ));
    }

    #[test]
    fn wrong_protocol_is_rejected() {
        let seg = sample(0);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        buf[ETHER_HDR_LEN + 9] = 17; // protocol byte: claim UDP
        match decode(&buf[..n], &MAC_B) {
            Err(DecodeError::BadProtocol(17)) => {}
            other => panic!("expected BadProtocol, got {:?}", other),
        }
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let seg = sample(0);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        assert!(matches!(
            decode(&buf[..20], &MAC_B),
            Err(DecodeError::Truncated)
        ));
        assert!(matches!(
            decode(&buf[..n - 40], &MAC_B),
            Err(DecodeError::Truncated)
        ));
    }

    #[test]
    fn foreign_port_is_not_a_tracked_flow() {
        let mut seg = sample(0);
        seg.dst_port = 80;
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        let got = decode(&buf[..n], &MAC_B).unwrap();
        assert_eq!(got.flow, None);
    }

    #[test]
    fn corrupted_payload_fails_the_advisory_checksum() {
        let seg = sample(1);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        buf[n - 1] ^= 0xff;
        let got = decode(&buf[..n], &MAC_B).unwrap();
        assert!(!got.checksum_ok);
    }

    #[test]
    fn padded_frame_decodes_by_ip_total_length() {
        let seg = sample(0);
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        // Hand the decoder extra trailing padding, as a link layer would.
        let got = decode(&buf[..n + 18], &MAC_B).unwrap();
        assert!(got.checksum_ok);
        assert_eq!(got.seq, 7);
    }

    #[test]
    fn pre_head_ack_wraps_to_negative() {
        let mut seg = sample(0);
        seg.ack = -1;
        let mut buf = [0u8; 1504];
        let n = encode(&seg, &mut buf);
        let got = decode(&buf[..n], &MAC_B).unwrap();
        assert_eq!(got.ack, -1);
    }
}
