use std::fmt;

/// A target address together with its addressing mode.
///
/// Every read names its mode explicitly: an `Absolute` address is used as
/// is, a `ModuleRelative` one is added to the main module's base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Absolute(u64),
    ModuleRelative(u64),
}

impl Address {
    /// Resolve to an absolute address. `None` on arithmetic overflow.
    pub fn resolve(self, module_base: u64) -> Option<u64> {
        match self {
            Address::Absolute(address) => Some(address),
            Address::ModuleRelative(offset) => module_base.checked_add(offset),
        }
    }

    pub fn is_relative(self) -> bool {
        matches!(self, Address::ModuleRelative(_))
    }

    /// Shift the address by `delta` bytes, keeping its mode
    pub fn offset(self, delta: u64) -> Option<Self> {
        match self {
            Address::Absolute(address) => address.checked_add(delta).map(Address::Absolute),
            Address::ModuleRelative(offset) => {
                offset.checked_add(delta).map(Address::ModuleRelative)
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Absolute(address) => write!(f, "0x{:X}", address),
            Address::ModuleRelative(offset) => write!(f, "base+0x{:X}", offset),
        }
    }
}
