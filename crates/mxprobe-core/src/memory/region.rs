//! Virtual memory region metadata.
//!
//! Mirrors the fields the OS reports for a region (`MEMORY_BASIC_INFORMATION`
//! on Windows) in a platform-neutral form so region filtering can be tested
//! against simulated address spaces.

use std::fmt;

/// Allocation state of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Backed by physical storage or the page file
    Commit,
    /// Address range reserved but not backed
    Reserve,
    /// Not allocated
    Free,
}

/// Backing type of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Private to the process (heap, stack, VirtualAlloc)
    Private,
    /// View of a mapped file or shared section
    Mapped,
    /// View of an executable image
    Image,
    /// Free regions carry no backing type
    Unknown,
}

/// Page protection flags, using the Windows `PAGE_*` bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protection(pub u32);

impl Protection {
    pub const NOACCESS: Self = Self(0x01);
    pub const READONLY: Self = Self(0x02);
    pub const READWRITE: Self = Self(0x04);
    pub const WRITECOPY: Self = Self(0x08);
    pub const EXECUTE: Self = Self(0x10);
    pub const EXECUTE_READ: Self = Self(0x20);
    pub const EXECUTE_READWRITE: Self = Self(0x40);
    pub const GUARD: Self = Self(0x100);
    pub const NOCACHE: Self = Self(0x200);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_guard(self) -> bool {
        self.contains(Self::GUARD)
    }

    /// True only for plain `PAGE_READWRITE`, with no modifier bits set
    pub fn is_exact_read_write(self) -> bool {
        self == Self::READWRITE
    }

    pub fn is_readable(self) -> bool {
        let access = self.0 & 0xFF;
        access != 0 && access != Self::NOACCESS.0 && access != Self::EXECUTE.0 && !self.is_guard()
    }
}

impl std::ops::BitOr for Protection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.0 & 0xFF {
            0x01 => "---",
            0x02 => "r--",
            0x04 => "rw-",
            0x08 => "rc-",
            0x10 => "--x",
            0x20 => "r-x",
            0x40 => "rwx",
            0x80 => "rcx",
            _ => "???",
        };
        write!(f, "{}", access)?;
        if self.is_guard() {
            write!(f, "+guard")?;
        }
        Ok(())
    }
}

/// A contiguous range of pages sharing the same attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
    pub state: RegionState,
    pub protection: Protection,
    pub kind: RegionKind,
}

impl MemoryRegion {
    /// A committed, private, read-write region
    pub fn private_rw(base: u64, size: u64) -> Self {
        Self {
            base,
            size,
            state: RegionState::Commit,
            protection: Protection::READWRITE,
            kind: RegionKind::Private,
        }
    }

    /// An unallocated gap
    pub fn free(base: u64, size: u64) -> Self {
        Self {
            base,
            size,
            state: RegionState::Free,
            protection: Protection::NOACCESS,
            kind: RegionKind::Unknown,
        }
    }

    /// One past the last address of the region
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    /// Check whether `[address, address + size)` lies entirely inside this region
    pub fn contains_range(&self, address: u64, size: u64) -> bool {
        match address.checked_add(size) {
            Some(end) => address >= self.base && end <= self.end(),
            None => false,
        }
    }

    /// Whether the region can hold live, mutable game state worth scanning.
    ///
    /// Requires committed, privately backed, exactly read-write memory with
    /// no guard bit, at least `min_size` bytes long.
    pub fn is_scannable(&self, min_size: u64) -> bool {
        self.state == RegionState::Commit
            && self.kind == RegionKind::Private
            && self.protection.is_exact_read_write()
            && !self.protection.is_guard()
            && self.size >= min_size
    }
}
