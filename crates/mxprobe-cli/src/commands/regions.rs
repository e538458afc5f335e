use std::path::Path;

use anyhow::Result;
use mxprobe_core::{MemoryRegion, RegionWalker};
use owo_colors::OwoColorize;

use super::hex_utils::format_hex_address;
use super::open_probe;

pub fn run(config: &Path, all: bool, min_size: u64) -> Result<()> {
    let probe = open_probe(config)?;
    let source = probe.reader().source();

    let mut walker = RegionWalker::over(source, min_size);
    if all {
        walker = walker.unfiltered();
    }

    println!(
        "{:>18} {:>12} {:<8} {:<8} {}",
        "Base", "Size", "State", "Type", "Protect"
    );

    let mut count = 0usize;
    let mut total = 0u64;
    for region in walker.by_ref() {
        print_region(&region, min_size);
        count += 1;
        total += region.size;
    }

    println!();
    println!(
        "{} regions, {:.2} MB ({} skipped)",
        count,
        total as f64 / (1024.0 * 1024.0),
        walker.skipped()
    );
    Ok(())
}

fn print_region(region: &MemoryRegion, min_size: u64) {
    let line = format!(
        "{:>18} {:>12} {:<8} {:<8} {}",
        format_hex_address(region.base),
        format_hex_address(region.size),
        format!("{:?}", region.state),
        format!("{:?}", region.kind),
        region.protection
    );
    if region.is_scannable(min_size) {
        println!("{}", line.green());
    } else {
        println!("{}", line.dimmed());
    }
}
