//! Simulated address space for tests.

use super::{ByteBuffer, MemoryRegion, ReadMemory, RegionState};
use crate::error::{Error, Result};

const DEFAULT_MIN_ADDRESS: u64 = 0x10000;
const DEFAULT_MAX_ADDRESS: u64 = 0x7FFF_FFFE_FFFF;

struct MockRegion {
    region: MemoryRegion,
    data: Vec<u8>,
    faulting: bool,
}

/// In-memory stand-in for a process address space.
///
/// Regions are kept sorted; gaps between them report as free, the way
/// `VirtualQuery` does. A faulting region advertises normal metadata but
/// every read inside it fails.
pub struct MockMemory {
    regions: Vec<MockRegion>,
    module_base: Option<u64>,
    min_address: u64,
    max_address: u64,
    unqueryable: Vec<(u64, u64)>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            module_base: None,
            min_address: DEFAULT_MIN_ADDRESS,
            max_address: DEFAULT_MAX_ADDRESS,
            unqueryable: Vec::new(),
        }
    }

    pub fn with_module_base(mut self, base: u64) -> Self {
        self.module_base = Some(base);
        self
    }

    pub fn with_address_range(mut self, min: u64, max: u64) -> Self {
        self.min_address = min;
        self.max_address = max;
        self
    }

    /// Add a committed, private, read-write region holding `data`
    pub fn with_region(self, base: u64, data: Vec<u8>) -> Self {
        let region = MemoryRegion::private_rw(base, data.len() as u64);
        self.with_custom_region(region, data)
    }

    /// Add a region with arbitrary attributes
    pub fn with_custom_region(mut self, region: MemoryRegion, mut data: Vec<u8>) -> Self {
        data.resize(region.size as usize, 0);
        self.insert(MockRegion {
            region,
            data,
            faulting: false,
        });
        self
    }

    /// Add a scannable-looking region whose reads always fault
    pub fn with_faulting_region(mut self, base: u64, size: u64) -> Self {
        self.insert(MockRegion {
            region: MemoryRegion::private_rw(base, size),
            data: Vec::new(),
            faulting: true,
        });
        self
    }

    /// Make region queries fail for `[base, base + size)`
    pub fn with_unqueryable_range(mut self, base: u64, size: u64) -> Self {
        self.unqueryable.push((base, base + size));
        self
    }

    /// Overwrite bytes at an absolute address inside an existing region
    pub fn write(&mut self, address: u64, bytes: &[u8]) {
        if let Some(entry) = self
            .regions
            .iter_mut()
            .find(|r| r.region.contains_range(address, bytes.len() as u64))
        {
            let start = (address - entry.region.base) as usize;
            entry.data[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }

    fn insert(&mut self, entry: MockRegion) {
        let pos = self
            .regions
            .partition_point(|r| r.region.base < entry.region.base);
        self.regions.insert(pos, entry);
    }
}

impl Default for MockMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<ByteBuffer> {
        let fault = || Error::AccessFault { address, size };
        let entry = self
            .regions
            .iter()
            .find(|r| r.region.contains_range(address, size as u64))
            .ok_or_else(fault)?;

        if entry.faulting
            || entry.region.state != RegionState::Commit
            || !entry.region.protection.is_readable()
        {
            return Err(fault());
        }

        let start = (address - entry.region.base) as usize;
        Ok(entry.data[start..start + size].to_vec())
    }

    fn module_base(&self) -> Result<u64> {
        self.module_base
            .ok_or_else(|| Error::ModuleBase("mock has no module base".to_string()))
    }

    fn address_range(&self) -> Result<(u64, u64)> {
        Ok((self.min_address, self.max_address))
    }

    fn query_region(&self, address: u64) -> Result<MemoryRegion> {
        if address >= self.max_address
            || self
                .unqueryable
                .iter()
                .any(|&(start, end)| (start..end).contains(&address))
        {
            return Err(Error::RegionQuery { address });
        }

        if let Some(entry) = self.regions.iter().find(|r| r.region.contains(address)) {
            return Ok(entry.region);
        }

        let gap_end = self
            .regions
            .iter()
            .map(|r| r.region.base)
            .chain(self.unqueryable.iter().map(|&(start, _)| start))
            .filter(|&base| base > address)
            .min()
            .unwrap_or(self.max_address);
        Ok(MemoryRegion::free(address, gap_end - address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Protection, RegionKind};

    #[test]
    fn test_mock_read_bytes() {
        let mock = MockMemory::new().with_region(0x1000, vec![0x41, 0x42, 0x43, 0x44]);
        assert_eq!(mock.read_bytes(0x1000, 4).unwrap(), vec![0x41, 0x42, 0x43, 0x44]);
        assert_eq!(mock.read_bytes(0x1001, 2).unwrap(), vec![0x42, 0x43]);
    }

    #[test]
    fn test_mock_read_out_of_bounds() {
        let mock = MockMemory::new().with_region(0x1000, vec![0x41, 0x42, 0x43, 0x44]);
        assert!(mock.read_bytes(0x1002, 10).is_err());
        assert!(mock.read_bytes(0x500, 4).is_err());
    }

    #[test]
    fn test_mock_faulting_region() {
        let mock = MockMemory::new().with_faulting_region(0x2000, 0x1000);
        let region = mock.query_region(0x2000).unwrap();
        assert!(region.is_scannable(1));
        assert!(mock.read_bytes(0x2000, 1).unwrap_err().is_access_fault());
    }

    #[test]
    fn test_mock_guard_page_read_fails() {
        let region = MemoryRegion {
            base: 0x3000,
            size: 0x1000,
            state: RegionState::Commit,
            protection: Protection::READWRITE | Protection::GUARD,
            kind: RegionKind::Private,
        };
        let mock = MockMemory::new().with_custom_region(region, vec![1; 0x1000]);
        assert!(mock.read_bytes(0x3000, 4).is_err());
    }

    #[test]
    fn test_mock_query_gap_is_free() {
        let mock = MockMemory::new()
            .with_region(0x20000, vec![0; 0x1000])
            .with_region(0x40000, vec![0; 0x1000]);

        let gap = mock.query_region(0x21000).unwrap();
        assert_eq!(gap.state, RegionState::Free);
        assert_eq!(gap.base, 0x21000);
        assert_eq!(gap.end(), 0x40000);

        let inside = mock.query_region(0x40800).unwrap();
        assert_eq!(inside.base, 0x40000);
    }

    #[test]
    fn test_mock_write() {
        let mut mock = MockMemory::new().with_region(0x1000, vec![0; 8]);
        mock.write(0x1002, &[0xAA, 0xBB]);
        assert_eq!(
            mock.read_bytes(0x1000, 8).unwrap(),
            vec![0, 0, 0xAA, 0xBB, 0, 0, 0, 0]
        );
    }
}
