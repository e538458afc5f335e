//! Hex formatting and parsing for byte buffers.

use crate::error::{Error, Result};

/// Format bytes as contiguous uppercase hex (`"FFFF7F000001"`)
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Format bytes as space-separated uppercase hex (`"FF FF 7F"`)
pub fn to_spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex bytes, with or without whitespace between them.
///
/// Accepts `"FF FF 7F 00"`, `"ffff7f00"` and an optional `0x` prefix.
pub fn parse_hex_bytes(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex(format!("non-hex characters in '{}'", input)));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!(
            "odd number of hex digits in '{}'",
            input
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| Error::InvalidHex(format!("'{}': {}", &digits[i..i + 2], e)))
        })
        .collect()
}
