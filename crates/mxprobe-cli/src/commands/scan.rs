use std::path::Path;

use anyhow::{Result, bail};
use mxprobe_core::memory::hex::{parse_hex_bytes, to_spaced_hex};
use owo_colors::OwoColorize;

use super::hex_utils::format_hex_address;
use super::open_probe;

pub fn run(config: &Path, pattern: &str, offset: usize, size: usize, json: bool) -> Result<()> {
    let pattern = parse_hex_bytes(pattern)?;
    if pattern.is_empty() {
        bail!("Pattern is empty");
    }

    let probe = open_probe(config)?;
    if !json {
        println!(
            "Searching for {} (string at +0x{:X}, {} bytes)...",
            to_spaced_hex(&pattern),
            offset,
            size
        );
    }
    let report = probe.scanner().search(&pattern, offset, size);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.hit {
        Some(hit) => println!(
            "{} at {}: \"{}\"",
            "Found".green().bold(),
            format_hex_address(hit.address),
            hit.value
        ),
        None => println!("{}", "Not found".yellow().bold()),
    }

    let stats = &report.stats;
    println!(
        "Read {:.2} MB in {} ms ({} regions scanned, {} skipped, {} candidates rejected)",
        stats.megabytes_scanned(),
        stats.elapsed_ms,
        stats.regions_scanned,
        stats.regions_skipped,
        stats.candidates_rejected
    );
    Ok(())
}
