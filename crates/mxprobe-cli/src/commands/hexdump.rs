//! Hexdump command implementation.
//!
//! ```text
//!   0x1409D6768: 4D 79 20 53 65 72 76 65  72 00 00 00 00 00 00 00  |My Server.......|
//! ```

use std::path::Path;

use anyhow::Result;
use mxprobe_core::Address;

use super::hex_utils::{format_hexdump, parse_hex_address};
use super::open_probe;

pub fn run(config: &Path, address: &str, size: usize, relative: bool, ascii: bool) -> Result<()> {
    let value = parse_hex_address(address)?;
    let address = if relative {
        Address::ModuleRelative(value)
    } else {
        Address::Absolute(value)
    };

    let probe = open_probe(config)?;
    let reader = probe.reader();
    let absolute = reader.resolve(address)?;
    let bytes = reader.read_bytes(address, size)?;

    println!("Hexdump at {} ({} bytes):", address, size);
    println!();
    for line in format_hexdump(absolute, &bytes, ascii) {
        println!("{}", line);
    }

    Ok(())
}
