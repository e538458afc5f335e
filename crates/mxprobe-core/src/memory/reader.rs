//! Fault-isolated memory access.
//!
//! `ReadMemory` is the seam to the operating system. `MemoryReader` layers
//! address resolution, the one-time module base capture and optional
//! hex-dump tracing on top of any source.

use std::sync::OnceLock;

use tracing::debug;

use super::hex::to_hex;
use super::{Address, MemoryRegion};
use crate::error::{Error, Result};

/// Owned bytes read from memory
pub type ByteBuffer = Vec<u8>;

/// Raw access to an address space.
///
/// Implementations must never let a read of unmapped or guarded memory
/// take the process down: such reads return `Error::AccessFault`.
pub trait ReadMemory {
    /// Copy `size` bytes starting at an absolute address
    fn read_bytes(&self, address: u64, size: usize) -> Result<ByteBuffer>;

    /// Load address of the main executable image
    fn module_base(&self) -> Result<u64>;

    /// Lowest and highest application addresses
    fn address_range(&self) -> Result<(u64, u64)>;

    /// Metadata of the region containing `address`
    fn query_region(&self, address: u64) -> Result<MemoryRegion>;
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<ByteBuffer> {
        (**self).read_bytes(address, size)
    }

    fn module_base(&self) -> Result<u64> {
        (**self).module_base()
    }

    fn address_range(&self) -> Result<(u64, u64)> {
        (**self).address_range()
    }

    fn query_region(&self, address: u64) -> Result<MemoryRegion> {
        (**self).query_region(address)
    }
}

/// Reader over a memory source with module-relative addressing.
///
/// The module base is captured on first use and is immutable afterwards;
/// concurrent first use from several threads observes a single value.
pub struct MemoryReader<M> {
    source: M,
    module_base: OnceLock<u64>,
    log_values: bool,
}

impl<M: ReadMemory> MemoryReader<M> {
    pub fn new(source: M) -> Self {
        Self {
            source,
            module_base: OnceLock::new(),
            log_values: false,
        }
    }

    /// Emit a hex dump for every labelled read
    pub fn with_value_logging(mut self, enabled: bool) -> Self {
        self.log_values = enabled;
        self
    }

    pub fn logs_values(&self) -> bool {
        self.log_values
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    /// Capture the module base address.
    ///
    /// Optional: the first module-relative read does the same.
    pub fn initialize(&self) -> Result<u64> {
        let base = self.module_base()?;
        debug!("MemoryReader initialized with base address: 0x{:X}", base);
        Ok(base)
    }

    pub fn module_base(&self) -> Result<u64> {
        if let Some(base) = self.module_base.get() {
            return Ok(*base);
        }
        let base = self.source.module_base()?;
        Ok(*self.module_base.get_or_init(|| base))
    }

    /// Resolve an address to its absolute form
    pub fn resolve(&self, address: Address) -> Result<u64> {
        let base = match address {
            Address::Absolute(_) => 0,
            Address::ModuleRelative(_) => self.module_base()?,
        };
        address.resolve(base).ok_or(Error::BoundsOverflow {
            address: base,
            size: 0,
        })
    }

    /// Read `size` bytes without tracing
    pub fn read_bytes(&self, address: Address, size: usize) -> Result<ByteBuffer> {
        let target = self.resolve(address)?;
        if target.checked_add(size as u64).is_none() {
            return Err(Error::BoundsOverflow {
                address: target,
                size,
            });
        }
        self.source.read_bytes(target, size)
    }

    /// Read `size` bytes, tracing a hex dump tagged with `label` when value
    /// logging is enabled
    pub fn read_labeled(&self, address: Address, size: usize, label: &str) -> Result<ByteBuffer> {
        let bytes = self.read_bytes(address, size)?;
        if self.log_values {
            let target = self.resolve(address)?;
            trace_hex_dump(label, target, &bytes, None);
        }
        Ok(bytes)
    }

    pub fn read_u8(&self, address: Address) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    pub fn read_u16_le(&self, address: Address) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

/// Log `bytes` as a single hex line
pub(crate) fn trace_hex_dump(label: &str, address: u64, bytes: &[u8], suffix: Option<&str>) {
    match suffix {
        Some(suffix) => debug!(
            "{}() @ 0x{:X} [{} bytes] {}: {}",
            label,
            address,
            bytes.len(),
            suffix,
            to_hex(bytes)
        ),
        None => debug!(
            "{}() @ 0x{:X} [{} bytes]: {}",
            label,
            address,
            bytes.len(),
            to_hex(bytes)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;
    use std::sync::Arc;
    use std::thread;

    fn reader() -> MemoryReader<MockMemory> {
        let mut data = vec![0u8; 0x100];
        data[0x10..0x14].copy_from_slice(&[0x34, 0x12, 0xFF, 0x00]);
        let mock = MockMemory::new()
            .with_module_base(0x140000000)
            .with_region(0x140000000, data);
        MemoryReader::new(mock)
    }

    #[test]
    fn test_read_relative_and_absolute_agree() {
        let reader = reader();
        let relative = reader
            .read_bytes(Address::ModuleRelative(0x10), 4)
            .unwrap();
        let absolute = reader.read_bytes(Address::Absolute(0x140000010), 4).unwrap();
        assert_eq!(relative, absolute);
        assert_eq!(relative, vec![0x34, 0x12, 0xFF, 0x00]);
    }

    #[test]
    fn test_read_u16_le() {
        let reader = reader();
        assert_eq!(reader.read_u16_le(Address::ModuleRelative(0x10)).unwrap(), 0x1234);
        assert_eq!(reader.read_u8(Address::ModuleRelative(0x12)).unwrap(), 0xFF);
    }

    #[test]
    fn test_read_unmapped_is_access_fault() {
        let reader = reader();
        let err = reader.read_bytes(Address::Absolute(0x10), 4).unwrap_err();
        assert!(err.is_access_fault());

        let err = reader
            .read_bytes(Address::ModuleRelative(0xFE), 4)
            .unwrap_err();
        assert!(err.is_access_fault());
    }

    #[test]
    fn test_read_overflowing_range() {
        let reader = reader();
        let err = reader
            .read_bytes(Address::Absolute(u64::MAX - 1), 4)
            .unwrap_err();
        assert!(matches!(err, Error::BoundsOverflow { .. }));
    }

    #[test]
    fn test_module_base_captured_once() {
        let reader = reader();
        assert_eq!(reader.initialize().unwrap(), 0x140000000);
        assert_eq!(reader.module_base().unwrap(), 0x140000000);
    }

    #[test]
    fn test_module_base_concurrent_first_use() {
        let reader = Arc::new(reader());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reader = Arc::clone(&reader);
                thread::spawn(move || reader.module_base().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0x140000000);
        }
    }

    #[test]
    fn test_module_base_failure_is_not_cached() {
        let reader = MemoryReader::new(MockMemory::new().with_region(0x1000, vec![0; 16]));
        assert!(reader.read_bytes(Address::ModuleRelative(0), 4).is_err());
        // Absolute reads are unaffected by the missing base
        assert!(reader.read_bytes(Address::Absolute(0x1000), 4).is_ok());
    }

    #[test]
    fn test_read_labeled_with_logging() {
        let reader = reader().with_value_logging(true);
        assert!(reader.logs_values());
        let bytes = reader
            .read_labeled(Address::ModuleRelative(0x10), 2, "test_read")
            .unwrap();
        assert_eq!(bytes, vec![0x34, 0x12]);
    }
}
