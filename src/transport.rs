use std::fs;
use std::io;

/// The raw-frame boundary. The windows and scheduler never create or
/// destroy the underlying transport; they are handed buffers to fill or
/// to interpret through this seam.
pub trait FrameIo {
    /// Sends one complete link-layer frame.
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Non-blocking receive: `Ok(None)` when nothing is pending.
    fn poll_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// A TAP device, so frames cross the boundary with their Ethernet
/// headers intact.
pub struct Tap {
    iface: tun_tap::Iface,
}

impl Tap {
    pub fn open(name: &str) -> io::Result<Self> {
        let iface = tun_tap::Iface::without_packet_info(name, tun_tap::Mode::Tap)?;
        Ok(Tap { iface })
    }

    pub fn name(&self) -> &str {
        self.iface.name()
    }
}

impl FrameIo for Tap {
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        self.iface.send(frame)?;
        Ok(())
    }

    fn poll_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        use std::os::unix::io::AsRawFd;
        let mut pfd = [nix::poll::PollFd::new(
            self.iface.as_raw_fd(),
            nix::poll::EventFlags::POLLIN,
        )];
        // Zero timeout: an empty poll is a no-op iteration, never a wait.
        let n = nix::poll::poll(&mut pfd[..], 0)
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poll on tap fd failed"))?;
        if n == 0 {
            return Ok(None);
        }
        let nbytes = self.iface.recv(buf)?;
        Ok(Some(nbytes))
    }
}

/// Reads an interface's hardware address out of sysfs.
pub fn mac_of(iface: &str) -> io::Result<[u8; 6]> {
    let text = fs::read_to_string(format!("/sys/class/net/{}/address", iface))?;
    parse_mac(text.trim())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unparseable sysfs mac"))
}

/// Parses `aa:bb:cc:dd:ee:ff`.
pub fn parse_mac(s: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = s.split(':');
    for byte in mac.iter_mut() {
        *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_mac() {
        assert_eq!(
            parse_mac("14:58:d0:58:2f:33"),
            Some([0x14, 0x58, 0xd0, 0x58, 0x2f, 0x33])
        );
    }

    #[test]
    fn rejects_malformed_macs() {
        assert_eq!(parse_mac(""), None);
        assert_eq!(parse_mac("14:58:d0:58:2f"), None);
        assert_eq!(parse_mac("14:58:d0:58:2f:33:99"), None);
        assert_eq!(parse_mac("zz:58:d0:58:2f:33"), None);
    }
}
