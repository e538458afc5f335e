use tracing::info;

use crate::config::{OffsetTable, ProbeConfig};
use crate::decode::Decoders;
use crate::error::Result;
use crate::memory::{LocalProcess, MemoryReader, ReadMemory};
use crate::scan::{PatternScanner, ScanOptions};

/// The engine: one reader, one offset table, one set of scan options.
///
/// Construct once and hand out references; decoders and scanners borrow
/// from it.
pub struct Probe<M> {
    reader: MemoryReader<M>,
    offsets: OffsetTable,
    scan: ScanOptions,
}

impl<M: ReadMemory> Probe<M> {
    pub fn new(source: M, config: &ProbeConfig) -> Self {
        Self {
            reader: MemoryReader::new(source).with_value_logging(config.engine.log_memory_values),
            offsets: config.offsets.clone(),
            scan: ScanOptions {
                chunk_size: config.engine.scan_chunk_size,
            },
        }
    }

    pub fn reader(&self) -> &MemoryReader<M> {
        &self.reader
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn scan_options(&self) -> ScanOptions {
        self.scan
    }

    pub fn decoders(&self) -> Decoders<'_, M> {
        Decoders::new(&self.reader, &self.offsets).with_scan_options(self.scan)
    }

    pub fn scanner(&self) -> PatternScanner<'_, M> {
        PatternScanner::new(self.reader.source())
            .with_options(self.scan)
            .with_value_logging(self.reader.logs_values())
    }
}

impl Probe<LocalProcess> {
    /// Engine over the current process, with the module base captured up
    /// front
    pub fn local(config: &ProbeConfig) -> Result<Self> {
        let probe = Self::new(LocalProcess, config);
        let base = probe.reader.initialize()?;
        info!("Attached to own process (base: 0x{:X})", base);
        Ok(probe)
    }
}
