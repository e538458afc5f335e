//! Plausibility check for strings extracted next to a pattern match.
//!
//! Game memory is dense with bytes that happen to decode as text. A
//! candidate is accepted only if it looks like a fixed-size, NUL-padded
//! ASCII field:
//!
//! ```text
//! S E R V E R 00 00 00   accepted
//! 00 S E R V E R 00      rejected: empty value
//! S E 01 V E R 00        rejected: control byte before the terminator
//! S E R V E R            rejected: no terminator
//! S E R 00 V E R         rejected: garbage after the terminator
//! ```

/// Lowest accepted byte (space)
const PRINTABLE_MIN: u8 = 32;
/// Highest accepted byte (`}`); `~` and DEL are excluded
const PRINTABLE_MAX: u8 = 125;

/// Decide whether `bytes` holds a real NUL-padded ASCII value.
///
/// Accepts iff the first NUL sits at a position `p > 0`, every byte before
/// `p` is in `[32, 125]` and every byte from `p` to the end is NUL.
pub fn is_valid_candidate(bytes: &[u8]) -> bool {
    let Some(nul) = memchr::memchr(0, bytes) else {
        return false;
    };
    if nul == 0 {
        return false;
    }

    bytes[..nul]
        .iter()
        .all(|&b| (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&b))
        && bytes[nul..].iter().all(|&b| b == 0)
}

/// Cut `bytes` at the first NUL and decode the rest as text
pub fn truncate_at_nul(bytes: &[u8]) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
