use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::warn;

/// Size of the remote socket record
pub const SOCKADDR_SIZE: usize = 28;

const PORT_RANGE: std::ops::Range<usize> = 6..8;
const MAPPED_MARKER_RANGE: std::ops::Range<usize> = 22..24;
const IPV4_RANGE: std::ops::Range<usize> = 24..28;

/// Remote server address recovered from an IPv4-mapped IPv6 socket record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoteEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl RemoteEndpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Bytes identifying this server in the game's server list entry:
    /// `FF FF`, the four IPv4 octets, then the port in network order
    pub fn search_pattern(&self) -> [u8; 8] {
        let [a, b, c, d] = self.ip.octets();
        let [p0, p1] = self.port.to_be_bytes();
        [0xFF, 0xFF, a, b, c, d, p0, p1]
    }

    /// Authority part of a connect URI, e.g.
    /// `[::ffff:c0a8:10a]:54210/[::1]:54210`
    pub fn mapped_authority(&self) -> String {
        let [a, b, c, d] = self.ip.octets();
        let high = u16::from_be_bytes([a, b]);
        let low = u16::from_be_bytes([c, d]);
        format!(
            "[::ffff:{:x}:{:x}]:{}/[::1]:{}",
            high, low, self.port, self.port
        )
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Decode the raw socket record.
///
/// `None` when the record is all zero (not connected), too short, or not in
/// IPv4-mapped form. The last case is logged since the server cannot be
/// identified then.
pub fn decode_sockaddr(raw: &[u8]) -> Option<RemoteEndpoint> {
    if raw.iter().all(|&b| b == 0) {
        return None;
    }
    if raw.len() < SOCKADDR_SIZE {
        warn!("Socket record too short: {} bytes", raw.len());
        return None;
    }
    if raw[MAPPED_MARKER_RANGE] != [0xFF, 0xFF] {
        warn!("Remote socket is not an IPv4-mapped IPv6 address, server details unavailable");
        return None;
    }

    let ip = &raw[IPV4_RANGE];
    let port = &raw[PORT_RANGE];
    Some(RemoteEndpoint {
        ip: Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]),
        port: u16::from_be_bytes([port[0], port[1]]),
    })
}

#[cfg(test)]
pub(crate) fn mapped_sockaddr(ip: [u8; 4], port: u16) -> [u8; SOCKADDR_SIZE] {
    let mut raw = [0u8; SOCKADDR_SIZE];
    raw[4] = 0x17; // AF_INET6
    raw[PORT_RANGE].copy_from_slice(&port.to_be_bytes());
    raw[MAPPED_MARKER_RANGE].copy_from_slice(&[0xFF, 0xFF]);
    raw[IPV4_RANGE].copy_from_slice(&ip);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;

    #[test]
    fn test_all_zero_is_offline() {
        assert_eq!(decode_sockaddr(&[0u8; SOCKADDR_SIZE]), None);
    }

    #[test]
    fn test_unmapped_is_unsupported() {
        let mut raw = mapped_sockaddr([192, 168, 1, 10], 54210);
        raw[22] = 0x00;
        assert_eq!(decode_sockaddr(&raw), None);

        let mut raw = mapped_sockaddr([192, 168, 1, 10], 54210);
        raw[23] = 0xFE;
        assert_eq!(decode_sockaddr(&raw), None);
    }

    #[test]
    fn test_unmapped_record_is_logged() {
        let mut raw = mapped_sockaddr([192, 168, 1, 10], 54210);
        raw[22] = 0x00;
        let logs = capture_logs(|| assert_eq!(decode_sockaddr(&raw), None));
        assert!(logs.contains("WARN"));
        assert!(logs.contains("not an IPv4-mapped IPv6 address"));
    }

    #[test]
    fn test_offline_record_is_silent() {
        let logs = capture_logs(|| assert_eq!(decode_sockaddr(&[0u8; SOCKADDR_SIZE]), None));
        assert!(logs.is_empty());

        let logs = capture_logs(|| {
            assert!(decode_sockaddr(&mapped_sockaddr([10, 0, 0, 1], 1000)).is_some())
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn test_short_record() {
        assert_eq!(decode_sockaddr(&[0xFF; 12]), None);
    }

    #[test]
    fn test_decode_mapped() {
        let raw = mapped_sockaddr([192, 168, 1, 10], 54210);
        let endpoint = decode_sockaddr(&raw).unwrap();
        assert_eq!(endpoint.ip, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(endpoint.port, 54210);
        assert_eq!(endpoint.to_string(), "192.168.1.10:54210");
    }

    #[test]
    fn test_search_pattern_layout() {
        let raw = mapped_sockaddr([10, 0, 0, 7], 0x1234);
        let pattern = decode_sockaddr(&raw).unwrap().search_pattern();
        assert_eq!(pattern, [0xFF, 0xFF, 10, 0, 0, 7, 0x12, 0x34]);
        assert_eq!(&pattern[..6], &raw[22..28]);
        assert_eq!(&pattern[6..], &raw[6..8]);
    }

    #[test]
    fn test_mapped_authority() {
        let endpoint = RemoteEndpoint::new(Ipv4Addr::new(192, 168, 1, 10), 54210);
        assert_eq!(
            endpoint.mapped_authority(),
            "[::ffff:c0a8:10a]:54210/[::1]:54210"
        );

        let endpoint = RemoteEndpoint::new(Ipv4Addr::new(0, 0, 0, 1), 80);
        assert_eq!(endpoint.mapped_authority(), "[::ffff:0:1]:80/[::1]:80");
    }
}
