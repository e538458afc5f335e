use anyhow::Result;
use mxprobe_core::is_valid_candidate;
use mxprobe_core::memory::hex::{parse_hex_bytes, to_spaced_hex};
use mxprobe_core::scan::truncate_at_nul;
use owo_colors::OwoColorize;

pub fn run(bytes: &str) -> Result<()> {
    let bytes = parse_hex_bytes(bytes)?;

    println!("Bytes: {}", to_spaced_hex(&bytes));
    if is_valid_candidate(&bytes) {
        println!("{} \"{}\"", "valid".green().bold(), truncate_at_nul(&bytes));
    } else {
        println!("{}", "rejected".red().bold());
    }
    Ok(())
}
