use anyhow::{Result, bail};
use mxprobe_core::decode::SOCKADDR_SIZE;
use mxprobe_core::decode_sockaddr;
use mxprobe_core::memory::hex::{parse_hex_bytes, to_spaced_hex};
use owo_colors::OwoColorize;

pub fn run(bytes: &str) -> Result<()> {
    let raw = parse_hex_bytes(bytes)?;
    if raw.len() != SOCKADDR_SIZE {
        bail!("Expected {} bytes, got {}", SOCKADDR_SIZE, raw.len());
    }

    if raw.iter().all(|&b| b == 0) {
        println!("{}", "offline (all zero)".yellow());
        return Ok(());
    }

    match decode_sockaddr(&raw) {
        Some(endpoint) => {
            println!("Endpoint:  {}", endpoint.bold());
            println!("Authority: {}", endpoint.mapped_authority());
            println!("Pattern:   {}", to_spaced_hex(&endpoint.search_pattern()));
        }
        None => println!("{}", "not an IPv4-mapped address".red()),
    }
    Ok(())
}
