use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::kmp::FailureTable;
use super::regions::RegionWalker;
use super::validity::{is_valid_candidate, truncate_at_nul};
use crate::error::{Error, Result};
use crate::memory::{MemoryRegion, ReadMemory, trace_hex_dump};

/// Default bytes per region read
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// A pattern occurrence whose adjacent payload passed the validity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    /// Absolute address of the first pattern byte
    pub address: u64,
    /// Payload truncated at its first NUL
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub bytes_scanned: u64,
    pub regions_scanned: usize,
    pub regions_skipped: usize,
    pub candidates_rejected: usize,
    pub elapsed_ms: u64,
}

impl ScanStats {
    pub fn megabytes_scanned(&self) -> f64 {
        self.bytes_scanned as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub hit: Option<PatternMatch>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn into_result(self) -> Result<PatternMatch> {
        self.hit.ok_or(Error::NotFound)
    }
}

/// Searches eligible regions for a byte pattern and extracts the value
/// stored at a fixed distance from it.
pub struct PatternScanner<'a, M> {
    source: &'a M,
    options: ScanOptions,
    log_values: bool,
    label: &'a str,
}

impl<'a, M: ReadMemory> PatternScanner<'a, M> {
    pub fn new(source: &'a M) -> Self {
        Self {
            source,
            options: ScanOptions::default(),
            log_values: false,
            label: "pattern_search",
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Hex-dump each accepted payload at debug level
    pub fn with_value_logging(mut self, enabled: bool) -> Self {
        self.log_values = enabled;
        self
    }

    /// Name used in log lines, usually the decoder running the scan
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    /// Find the first occurrence of `pattern` whose payload of `read_size`
    /// bytes at `match + read_offset` is a valid NUL-padded string.
    pub fn search(&self, pattern: &[u8], read_offset: usize, read_size: usize) -> ScanReport {
        let mut stats = ScanStats::default();

        let Some(table) = FailureTable::new(pattern) else {
            warn!("Pattern search skipped: {}", Error::EmptyPattern);
            return ScanReport { hit: None, stats };
        };

        let Some(min_size) = pattern
            .len()
            .checked_add(read_offset)
            .and_then(|n| n.checked_add(read_size))
        else {
            let e = Error::BoundsOverflow {
                address: 0,
                size: read_offset.saturating_add(read_size),
            };
            debug!("{}() skipped: {}", self.label, e);
            return ScanReport { hit: None, stats };
        };

        let started = Instant::now();
        let min_size = min_size as u64;
        let mut walker = RegionWalker::over(self.source, min_size);

        let mut hit = None;
        for region in walker.by_ref() {
            stats.regions_scanned += 1;
            match self.scan_region(&table, &region, read_offset, read_size, &mut stats) {
                Ok(Some(found)) => {
                    hit = Some(found);
                    break;
                }
                Ok(None) => {}
                Err(e) => debug!("Region 0x{:X} abandoned: {}", region.base, e),
            }
        }
        stats.regions_skipped = walker.skipped();
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            "Read {:.2} MB, Time elapsed: {} ms",
            stats.megabytes_scanned(),
            stats.elapsed_ms
        );
        match &hit {
            Some(found) => debug!("Pattern found at 0x{:X}: {}", found.address, found.value),
            None => info!("Pattern not found ({} regions scanned)", stats.regions_scanned),
        }

        ScanReport { hit, stats }
    }

    /// Like `search`, but an absent match is `Error::NotFound`
    pub fn find(
        &self,
        pattern: &[u8],
        read_offset: usize,
        read_size: usize,
    ) -> Result<PatternMatch> {
        if pattern.is_empty() {
            return Err(Error::EmptyPattern);
        }
        self.search(pattern, read_offset, read_size).into_result()
    }

    fn scan_region(
        &self,
        table: &FailureTable<'_>,
        region: &MemoryRegion,
        read_offset: usize,
        read_size: usize,
        stats: &mut ScanStats,
    ) -> Result<Option<PatternMatch>> {
        let overlap = table.len() - 1;
        let chunk_size = self.options.chunk_size.max(table.len());
        let end = region.end();
        let mut pos = region.base;

        while pos < end {
            let len = (end - pos).min(chunk_size as u64) as usize;
            let chunk = self.source.read_bytes(pos, len)?;
            stats.bytes_scanned += len as u64;

            for index in table.find_iter(&chunk) {
                let found = pos + index as u64;
                match self.read_candidate(region, found, read_offset, read_size, stats) {
                    Ok(value) => return Ok(Some(PatternMatch { address: found, value })),
                    Err(e) => {
                        stats.candidates_rejected += 1;
                        debug!("Candidate at 0x{:X} skipped: {}", found, e);
                    }
                }
            }

            if pos + len as u64 >= end {
                break;
            }
            pos += (len - overlap) as u64;
        }
        Ok(None)
    }

    fn read_candidate(
        &self,
        region: &MemoryRegion,
        found: u64,
        read_offset: usize,
        read_size: usize,
        stats: &mut ScanStats,
    ) -> Result<String> {
        let overflow = || Error::BoundsOverflow {
            address: found,
            size: read_offset.saturating_add(read_size),
        };
        let address = found.checked_add(read_offset as u64).ok_or_else(overflow)?;
        if !region.contains_range(address, read_size as u64) {
            return Err(overflow());
        }

        let payload = self.source.read_bytes(address, read_size)?;
        stats.bytes_scanned += read_size as u64;

        if !is_valid_candidate(&payload) {
            return Err(Error::InvalidCandidate { address });
        }
        if self.log_values {
            trace_hex_dump(self.label, found, &payload, Some("valid"));
        }
        Ok(truncate_at_nul(&payload))
    }
}
