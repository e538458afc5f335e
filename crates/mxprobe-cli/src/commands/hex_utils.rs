//! Hex address parsing and dump formatting.

use anyhow::{Result, anyhow};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex address '{}': {}", s, e))
}

pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}

/// Render bytes as 16-byte hexdump lines labelled with absolute addresses
pub fn format_hexdump(base: u64, bytes: &[u8], ascii: bool) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("{:>12}: ", format_hex_address(base + (i * 16) as u64));

            for j in 0..16 {
                if j == 8 {
                    line.push(' ');
                }
                match chunk.get(j) {
                    Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                    None => line.push_str("   "),
                }
            }

            if ascii {
                line.push_str(" |");
                for byte in chunk {
                    if (0x20..0x7F).contains(byte) {
                        line.push(*byte as char);
                    } else {
                        line.push('.');
                    }
                }
                for _ in chunk.len()..16 {
                    line.push(' ');
                }
                line.push('|');
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address_with_prefix() {
        assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
    }

    #[test]
    fn test_parse_hex_address_without_prefix() {
        assert_eq!(parse_hex_address("1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("9D6768").unwrap(), 0x9D6768);
    }

    #[test]
    fn test_parse_hex_address_invalid() {
        assert!(parse_hex_address("GHIJK").is_err());
        assert!(parse_hex_address("0xZZZ").is_err());
        assert!(parse_hex_address("").is_err());
    }

    #[test]
    fn test_format_hex_address() {
        assert_eq!(format_hex_address(0x58B2BC), "0x58B2BC");
        assert_eq!(format_hex_address(0), "0x0");
    }

    #[test]
    fn test_format_hexdump() {
        let lines = format_hexdump(0x1000, b"SERVER\0\0\0\0\0\0\0\0\0\0\x01\x02", true);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("      0x1000: 53 45 52 56 45 52 00 00  00 00"));
        assert!(lines[0].ends_with("|SERVER..........|"));
        assert!(lines[1].starts_with("      0x1010: 01 02 "));
        assert!(lines[1].ends_with("|..              |"));
    }
}
